//! SLFの書き出し
//!
//! [`Lattice::read_htk`]の逆変換です。書き出したテキストを再度読み込むと、
//! 同じノード数・リンク数・開始/終了ノードのラティスが得られます。
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::SlfConfig;
use crate::dictionary::WordId;
use crate::errors::{LatticeError, Result};
use crate::lattice::Lattice;
use crate::slf::{NULL_WORD, is_zstd_path};

impl Lattice {
    /// 単語IDを基本形の表記と発音バリアント番号に戻します。
    ///
    /// 辞書にない単語IDは`!NULL`になります。
    pub(crate) fn spelling(&self, word: WordId) -> (&str, u32) {
        let dict = self.dictionary();
        let alt = dict.alt_index(word).unwrap_or(1);
        let base = dict.base_word_id(word).unwrap_or(word);
        match dict.word_str(base) {
            Some(w) => (w, alt),
            None => (NULL_WORD, 1),
        }
    }

    /// 各リンクの (始点, 終点) を隣接リストから復元します。
    ///
    /// # エラー
    ///
    /// いずれかのノードの出リンクまたは入リンクに登録されていないリンクがある場合に
    /// [`LatticeError`]を返します。
    pub fn link_endpoints(&self) -> Result<Vec<(usize, usize)>> {
        let mut endpoints = vec![(None, None); self.num_links()];
        for (i, node) in self.nodes().iter().enumerate() {
            for &lid in node.exits() {
                endpoints[lid].0 = Some(i);
            }
            for &lid in node.entries() {
                endpoints[lid].1 = Some(i);
            }
        }
        endpoints
            .into_iter()
            .enumerate()
            .map(|(lid, ends)| match ends {
                (Some(src), Some(dest)) => Ok((src, dest)),
                _ => Err(LatticeError::invalid_reference(
                    lid,
                    "link is missing from the adjacency lists",
                )),
            })
            .collect()
    }

    /// SLF形式でラティスを書き出します。
    ///
    /// # エラー
    ///
    /// `frame_rate`が0の場合、または書き込みに失敗した場合に[`LatticeError`]を返します。
    pub fn write_htk<W>(&self, wtr: W, frame_rate: u32) -> Result<()>
    where
        W: Write,
    {
        self.write_htk_with_config(wtr, &SlfConfig::new(frame_rate)?)
    }

    /// 設定を指定してSLF形式でラティスを書き出します。
    ///
    /// ヘッダには開始・終了ノードとノード数・リンク数が、続いて
    /// すべてのノード行とアーク行が出力されます。
    /// 音響スコアは自然対数に、遷移確率は線形確率に戻されます。
    pub fn write_htk_with_config<W>(&self, wtr: W, config: &SlfConfig) -> Result<()>
    where
        W: Write,
    {
        let mut wtr = BufWriter::new(wtr);
        let lmath = self.logmath();
        let tp = config.time_digits();
        let sp = config.score_digits();

        writeln!(wtr, "# Lattice written by wordlattice")?;
        writeln!(wtr, "VERSION=1.0")?;
        if let Some(utterance) = self.utterance() {
            writeln!(wtr, "UTTERANCE={utterance}")?;
        }
        if let Some(idx) = self.start_idx() {
            writeln!(wtr, "start={idx}")?;
        }
        if let Some(idx) = self.end_idx() {
            writeln!(wtr, "end={idx}")?;
        }
        writeln!(wtr, "N={}\tL={}", self.num_nodes(), self.num_links())?;

        for (i, node) in self.nodes().iter().enumerate() {
            let (word, alt) = self.spelling(node.lm_state());
            let t = config.frame_to_seconds(node.sf());
            writeln!(wtr, "I={i}\tt={t:.tp$}\tW={word}\tv={alt}")?;
        }

        let endpoints = self.link_endpoints()?;
        for (j, (link, &(src, dest))) in self.links().iter().zip(&endpoints).enumerate() {
            let (word, alt) = self.spelling(link.word());
            let a = lmath.log_to_ln(link.ascr());
            write!(wtr, "J={j}\tS={src}\tE={dest}\tW={word}\tv={alt}\ta={a:.sp$}")?;
            if let Some(prob) = link.prob() {
                write!(wtr, "\tp={:.sp$}", lmath.exp(prob))?;
            }
            writeln!(wtr)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// SLFファイルを書き出します。
    ///
    /// 拡張子が`.zst`の場合、Zstandardで圧縮して書き出します。
    pub fn write_htk_path<P>(&self, path: P, config: &SlfConfig) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::create(path)?;
        if is_zstd_path(path) {
            let mut encoder = zstd::Encoder::new(file, 0)?;
            self.write_htk_with_config(&mut encoder, config)?;
            encoder.finish()?;
        } else {
            self.write_htk_with_config(file, config)?;
        }
        Ok(())
    }
}
