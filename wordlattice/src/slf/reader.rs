//! SLFの読み込み
//!
//! ヘッダ部とエントリ部の2状態で行単位に解析します。
//! 各行は状態ごとの純粋な関数で分類され、その結果がラティスに適用されます。
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::config::SlfConfig;
use crate::dictionary::Dictionary;
use crate::errors::{LatticeError, Result};
use crate::lattice::{Lattice, MAX_ALT};
use crate::logmath::LogMath;
use crate::slf::is_zstd_path;
use crate::utils;

static COUNTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^N=\s*([0-9]+)[^=]*=\s*([0-9]+)").unwrap());

/// 解析器の状態
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ParseState {
    /// ノード数・リンク数の宣言行を探している
    Header,
    /// ノード行とアーク行を読んでいる
    Entries,
}

/// ヘッダ部の1フィールド
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum HeaderField<'a> {
    Start(usize),
    End(usize),
    Utterance(&'a str),
    Other(&'a str),
}

/// 分類済みの1行
#[derive(Debug, PartialEq)]
pub(crate) enum Line<'a> {
    /// 空行またはコメント行
    Blank,
    /// ノード数・リンク数の宣言
    Counts { nodes: usize, links: usize },
    /// その他のヘッダ宣言
    Header(Vec<HeaderField<'a>>),
    /// ノード行
    Node(Vec<(&'a str, &'a str)>),
    /// アーク行
    Arc(Vec<(&'a str, &'a str)>),
    /// ノードでもアークでもない行
    Unknown,
}

/// 現在の状態で1行を分類し、次の状態とともに返します。
///
/// 行は前後の空白を除去済みである必要があります。
/// 返されるエラーは行番号を持たないため、呼び出し側で付与してください。
pub(crate) fn transition(state: ParseState, line: &str) -> Result<(ParseState, Line<'_>)> {
    if line.is_empty() || line.starts_with('#') {
        return Ok((state, Line::Blank));
    }
    match state {
        ParseState::Header => {
            let line = classify_header(line)?;
            let next = match line {
                Line::Counts { .. } => ParseState::Entries,
                _ => ParseState::Header,
            };
            Ok((next, line))
        }
        ParseState::Entries => Ok((state, classify_entry(line)?)),
    }
}

fn classify_header(line: &str) -> Result<Line<'_>> {
    if line.starts_with("N=") {
        let cap = COUNTS_RE.captures(line).ok_or_else(|| {
            LatticeError::invalid_format(0, format!("invalid node/link count line: {line}"))
        })?;
        return Ok(Line::Counts {
            nodes: cap[1].parse()?,
            links: cap[2].parse()?,
        });
    }
    let mut fields = vec![];
    for field in line.split_whitespace() {
        let (key, value) = utils::split_field(field).ok_or_else(|| {
            LatticeError::invalid_format(0, format!("invalid header line: {line}"))
        })?;
        fields.push(match key {
            "start" => HeaderField::Start(value.parse()?),
            "end" => HeaderField::End(value.parse()?),
            "UTTERANCE" | "U" => HeaderField::Utterance(value),
            _ => HeaderField::Other(key),
        });
    }
    Ok(Line::Header(fields))
}

fn classify_entry(line: &str) -> Result<Line<'_>> {
    let fields = line
        .split_whitespace()
        .map(|f| {
            utils::split_field(f)
                .ok_or_else(|| LatticeError::invalid_format(0, format!("invalid field {f}")))
        })
        .collect::<Result<Vec<_>>>()?;
    for &(key, _) in &fields {
        match key {
            "I" => return Ok(Line::Node(fields)),
            "J" => return Ok(Line::Arc(fields)),
            _ => {}
        }
    }
    Ok(Line::Unknown)
}

fn parse_alt(value: &str) -> Result<u32> {
    let alt: i64 = value.parse()?;
    if !(1..=i64::from(MAX_ALT)).contains(&alt) {
        return Err(LatticeError::out_of_range("v", alt));
    }
    Ok(alt as u32)
}

struct HtkReader<'a> {
    lattice: &'a mut Lattice,
    config: &'a SlfConfig,
    state: ParseState,
    lineno: usize,
    start_idx: Option<usize>,
    end_idx: Option<usize>,
    counts: Option<(usize, usize)>,
}

impl<'a> HtkReader<'a> {
    fn new(lattice: &'a mut Lattice, config: &'a SlfConfig) -> Self {
        Self {
            lattice,
            config,
            state: ParseState::Header,
            lineno: 0,
            start_idx: None,
            end_idx: None,
            counts: None,
        }
    }

    fn read<R: BufRead>(mut self, rdr: R) -> Result<()> {
        for line in rdr.lines() {
            let line = line?;
            self.lineno += 1;
            self.process_line(line.trim())
                .map_err(|e| e.at_line(self.lineno))?;
        }
        self.finish()
    }

    fn process_line(&mut self, line: &str) -> Result<()> {
        let (next, line) = transition(self.state, line)?;
        self.state = next;
        match line {
            Line::Blank => {}
            Line::Counts { nodes, links } => self.counts = Some((nodes, links)),
            Line::Header(fields) => {
                for field in fields {
                    match field {
                        HeaderField::Start(idx) => self.start_idx = Some(idx),
                        HeaderField::End(idx) => self.end_idx = Some(idx),
                        HeaderField::Utterance(name) => self.lattice.set_utterance(Some(name)),
                        HeaderField::Other(key) => {
                            log::debug!("Ignored header field {key} in line {}", self.lineno);
                        }
                    }
                }
            }
            Line::Node(fields) => self.process_node(&fields)?,
            Line::Arc(fields) => self.process_arc(&fields)?,
            Line::Unknown => log::warn!("Not a node or arc on line {}", self.lineno),
        }
        Ok(())
    }

    fn process_node(&mut self, fields: &[(&str, &str)]) -> Result<()> {
        let mut idx = None;
        let mut sf = 0;
        let mut word = None;
        let mut alt = 1;
        for &(key, value) in fields {
            match key {
                "I" => idx = Some(value.parse::<usize>()?),
                "t" => sf = self.config.seconds_to_frame(value.parse()?)?,
                "W" => word = Some(value),
                "v" => alt = parse_alt(value)?,
                _ => log::warn!("Unknown field type {key} in line {}", self.lineno),
            }
        }
        let idx = idx.ok_or_else(|| LatticeError::invalid_format(0, "found no node ID"))?;
        // Slots beyond the declared count may only be appended one at a time.
        let declared = self.counts.map_or(0, |(n, _)| n);
        let limit = declared.max(self.lattice.num_nodes().saturating_add(1));
        if idx >= limit {
            return Err(LatticeError::invalid_format(
                0,
                format!("node ID {idx} exceeds the declared node count {declared}"),
            ));
        }
        let word =
            word.ok_or_else(|| LatticeError::invalid_format(0, format!("node {idx} has no word")))?;
        let wid = self.lattice.resolve_word(word, alt)?;
        self.lattice.init_node(idx, sf, wid)
    }

    fn node_ref(&self, value: &str) -> Result<usize> {
        let idx: usize = value.parse()?;
        match self.lattice.node(idx) {
            Some(node) if node.is_defined() => Ok(idx),
            Some(_) => Err(LatticeError::invalid_reference(idx, "node is not defined")),
            None => Err(LatticeError::invalid_reference(idx, "node is out of range")),
        }
    }

    fn process_arc(&mut self, fields: &[(&str, &str)]) -> Result<()> {
        let lmath = Arc::clone(self.lattice.logmath());
        let mut src = None;
        let mut dest = None;
        let mut word = None;
        let mut alt = 1;
        let mut ascr = 0;
        let mut prob = None;
        for &(key, value) in fields {
            match key {
                // Link IDs are implied by the order of arc lines.
                "J" => {}
                "S" => src = Some(self.node_ref(value)?),
                "E" => dest = Some(self.node_ref(value)?),
                "W" => word = Some(value),
                "v" => alt = parse_alt(value)?,
                "a" => ascr = lmath.ln_to_log(value.parse()?),
                "p" => prob = Some(lmath.log(value.parse()?)),
                _ => log::warn!("Unknown field type {key} in line {}", self.lineno),
            }
        }
        let (Some(src), Some(dest)) = (src, dest) else {
            return Err(LatticeError::invalid_format(
                0,
                "found no valid src and dest IDs",
            ));
        };
        let wid = match word {
            Some(word) => self.lattice.resolve_word(word, alt)?,
            None => self.lattice.nodes()[src].lm_state(),
        };
        self.lattice.link_with_prob(src, dest, wid, ascr, prob)?;
        Ok(())
    }

    fn finish(self) -> Result<()> {
        let Some((n_nodes, n_links)) = self.counts else {
            return Err(LatticeError::invalid_format(
                self.lineno,
                "found no node/link count line",
            ));
        };
        let lattice = self.lattice;
        if n_nodes != lattice.num_nodes() || n_links != lattice.num_links() {
            log::warn!(
                "Declared {n_nodes} nodes and {n_links} links, but read {} nodes and {} links",
                lattice.num_nodes(),
                lattice.num_links(),
            );
        }
        if lattice.num_nodes() == 0 {
            log::warn!("Lattice has no nodes, start and end nodes are left unset");
            return Ok(());
        }
        let start_idx = self.start_idx.unwrap_or_else(|| {
            log::warn!("No explicit start node, using first node");
            0
        });
        let end_idx = self.end_idx.unwrap_or_else(|| {
            let idx = lattice.num_nodes() - 1;
            log::warn!("No explicit end node, using last node {idx}");
            idx
        });
        lattice.set_start(start_idx)?;
        lattice.set_end(end_idx)?;
        log::debug!(
            "Read a lattice with {} nodes and {} links",
            lattice.num_nodes(),
            lattice.num_links(),
        );
        Ok(())
    }
}

impl Lattice {
    /// SLF形式のラティスを読み込みます。
    ///
    /// 時刻`t=`は`frame_rate`を用いてフレームに変換されます。
    /// 詳細は[`read_htk_with_config`](Self::read_htk_with_config)を参照してください。
    ///
    /// # エラー
    ///
    /// `frame_rate`が0の場合、または読み込みに失敗した場合に[`LatticeError`]を返します。
    pub fn read_htk<R>(&mut self, rdr: R, frame_rate: u32) -> Result<()>
    where
        R: Read,
    {
        self.read_htk_with_config(rdr, &SlfConfig::new(frame_rate)?)
    }

    /// 設定を指定してSLF形式のラティスを読み込みます。
    ///
    /// 未知のフィールド、ノードでもアークでもない行、`start=`・`end=`宣言の欠落は
    /// 警告を出力して読み込みを続けます。宣言がない場合、開始ノードは0、
    /// 終了ノードは最後のノードになります。
    ///
    /// # エラー
    ///
    /// 以下の場合に読み込み全体が中断されます。途中まで構築されたラティスは破棄してください。
    ///
    /// - `key=value`形式でないフィールド、ノードID・単語・始点・終点の欠落、数値の不正
    ///   ([`LatticeError::InvalidFormat`])
    /// - 存在しないノードへの参照 ([`LatticeError::InvalidReference`])
    /// - 固定辞書で解決できない単語 ([`LatticeError::WordLookup`])
    /// - [1, 255]の範囲外の発音バリアント番号 ([`LatticeError::OutOfRange`])
    pub fn read_htk_with_config<R>(&mut self, rdr: R, config: &SlfConfig) -> Result<()>
    where
        R: Read,
    {
        HtkReader::new(self, config).read(BufReader::new(rdr))
    }

    /// SLFファイルを読み込みます。
    ///
    /// 拡張子が`.zst`の場合、Zstandardで展開しながら読み込みます。
    pub fn read_htk_path<P>(&mut self, path: P, config: &SlfConfig) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path)?;
        if is_zstd_path(path) {
            self.read_htk_with_config(zstd::Decoder::new(file)?, config)
        } else {
            self.read_htk_with_config(file, config)
        }
    }

    /// SLF形式のテキストから新しいラティスを作成します。
    ///
    /// 引数の意味は[`Lattice::new`]と[`Lattice::read_htk`]と同じです。
    pub fn from_htk<R>(
        lmath: Arc<LogMath>,
        dict: Option<Arc<Dictionary>>,
        rdr: R,
        frame_rate: u32,
    ) -> Result<Self>
    where
        R: Read,
    {
        let mut lattice = Self::new(lmath, dict);
        lattice.read_htk(rdr, frame_rate)?;
        Ok(lattice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_header() {
        let (state, line) = transition(ParseState::Header, "start=0 end=2").unwrap();
        assert_eq!(state, ParseState::Header);
        assert_eq!(
            line,
            Line::Header(vec![HeaderField::Start(0), HeaderField::End(2)])
        );

        let (state, line) = transition(ParseState::Header, "VERSION=1.0").unwrap();
        assert_eq!(state, ParseState::Header);
        assert_eq!(line, Line::Header(vec![HeaderField::Other("VERSION")]));
    }

    #[test]
    fn test_transition_counts() {
        for text in ["N=3=2", "N=3 L=2", "N=3\tL=2"] {
            let (state, line) = transition(ParseState::Header, text).unwrap();
            assert_eq!(state, ParseState::Entries);
            assert_eq!(line, Line::Counts { nodes: 3, links: 2 });
        }
        assert!(transition(ParseState::Header, "N=3").is_err());
    }

    #[test]
    fn test_transition_header_without_key() {
        let err = transition(ParseState::Header, "garbage").unwrap_err();
        assert!(matches!(err, LatticeError::InvalidFormat(_)));
    }

    #[test]
    fn test_transition_blank_and_comment() {
        for state in [ParseState::Header, ParseState::Entries] {
            assert_eq!(transition(state, "").unwrap(), (state, Line::Blank));
            assert_eq!(transition(state, "# x").unwrap(), (state, Line::Blank));
        }
    }

    #[test]
    fn test_transition_entries() {
        let (_, line) = transition(ParseState::Entries, "t=0.5 I=1 W=A").unwrap();
        assert_eq!(line, Line::Node(vec![("t", "0.5"), ("I", "1"), ("W", "A")]));
        let (_, line) = transition(ParseState::Entries, "J=0 S=0 E=1").unwrap();
        assert!(matches!(line, Line::Arc(_)));
        let (_, line) = transition(ParseState::Entries, "x=1 y=2").unwrap();
        assert_eq!(line, Line::Unknown);
        assert!(transition(ParseState::Entries, "I=0 HELLO").is_err());
    }

    #[test]
    fn test_parse_alt() {
        assert_eq!(parse_alt("1").unwrap(), 1);
        assert_eq!(parse_alt("255").unwrap(), 255);
        assert!(matches!(parse_alt("0"), Err(LatticeError::OutOfRange(_))));
        assert!(matches!(parse_alt("-3"), Err(LatticeError::OutOfRange(_))));
        assert!(matches!(parse_alt("x"), Err(LatticeError::ParseInt(_))));
    }
}
