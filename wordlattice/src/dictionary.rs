//! 発音辞書モジュール。
//!
//! ラティスが参照する単語表記と単語IDの双方向マッピングを提供します。
//! 音素列の内部表現はこのクレートの対象外であり、発音は不透明な文字列として保持されます。
//!
//! 発音バリアントは `WORD(2)` のように接尾辞付きの別単語として登録され、
//! 基本形の単語IDを記録します。
pub(crate) mod word_id;

use std::io::{BufRead, BufReader, Read};

use hashbrown::HashMap;

use crate::errors::{LatticeError, Result};
use crate::utils;

pub use crate::dictionary::word_id::WordId;

/// 文頭記号
pub const SENTENCE_START: &str = "<s>";

/// 文末記号
pub const SENTENCE_END: &str = "</s>";

/// 無音記号
pub const SILENCE: &str = "<sil>";

/// 単語を持たないノードの表記
pub const NULL_WORD: &str = "!NULL";

/// 辞書の1エントリ
#[derive(Debug, Clone)]
struct DictEntry {
    word: String,
    pron: Option<String>,
    base: WordId,
    alt: u32,
}

/// 単語表記と単語IDの発音辞書
///
/// 単語IDは登録順に0から割り当てられ、再利用されません。
#[derive(Debug, Clone)]
pub struct Dictionary {
    entries: Vec<DictEntry>,
    map: HashMap<String, WordId>,
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Dictionary {
    /// 文頭・文末・無音記号と`!NULL`のみを含む辞書を作成します。
    pub fn new() -> Self {
        let mut dict = Self::empty();
        for w in [SENTENCE_START, SENTENCE_END, SILENCE] {
            dict.add_word_with_pron(w, Some("SIL".into()));
        }
        dict.add_word(NULL_WORD);
        dict
    }

    /// 記号も含まない空の辞書を作成します。
    pub fn empty() -> Self {
        Self {
            entries: vec![],
            map: HashMap::new(),
        }
    }

    /// 発音辞書ファイルから辞書を読み込みます。
    ///
    /// 各行は `WORD PH1 PH2 ...` の形式で、発音バリアントは `WORD(2) ...` と記述します。
    /// 空行と `;;` で始まるコメント行は無視されます。
    /// 文頭・文末・無音記号と`!NULL`は常に含まれます。
    ///
    /// # 引数
    ///
    /// * `rdr` - 発音辞書ファイルのリーダー
    ///
    /// # エラー
    ///
    /// 発音バリアントの基本形が先に定義されていない場合、
    /// または読み込み中にI/Oエラーが発生した場合に[`LatticeError`]を返します。
    pub fn from_reader<R>(rdr: R) -> Result<Self>
    where
        R: Read,
    {
        let mut dict = Self::new();
        let rdr = BufReader::new(rdr);
        for (i, line) in rdr.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with(";;") {
                continue;
            }
            let (word, pron) = match line.split_once(char::is_whitespace) {
                Some((w, p)) => (w, Some(p.trim())),
                None => (line, None),
            };
            if dict.word_id(word).is_some() {
                log::warn!("Skipped a duplicate word {word:?} at line {}", i + 1);
                continue;
            }
            let (base, alt) = utils::split_alt(word);
            if alt != 1 && dict.word_id(base).is_none() {
                return Err(LatticeError::invalid_format(
                    i + 1,
                    format!("no base word for {word:?}"),
                ));
            }
            dict.add_word_with_pron(word, pron.filter(|p| !p.is_empty()).map(String::from));
        }
        Ok(dict)
    }

    /// 単語表記から単語IDを検索します。
    #[inline]
    pub fn word_id(&self, word: &str) -> Option<WordId> {
        self.map.get(word).copied()
    }

    /// 単語IDから単語表記を取得します。
    #[inline]
    pub fn word_str(&self, word_id: WordId) -> Option<&str> {
        self.entries
            .get(word_id.as_usize())
            .map(|e| e.word.as_str())
    }

    /// 単語の発音を取得します。発音なしで登録された単語では`None`です。
    pub fn pron(&self, word_id: WordId) -> Option<&str> {
        self.entries
            .get(word_id.as_usize())
            .and_then(|e| e.pron.as_deref())
    }

    /// 発音バリアントの基本形の単語IDを取得します。
    ///
    /// 基本形の単語では自身の単語IDを返します。
    pub fn base_word_id(&self, word_id: WordId) -> Option<WordId> {
        self.entries.get(word_id.as_usize()).map(|e| e.base)
    }

    /// 発音バリアント番号を取得します。基本形は1です。
    pub fn alt_index(&self, word_id: WordId) -> Option<u32> {
        self.entries.get(word_id.as_usize()).map(|e| e.alt)
    }

    /// 発音を指定せずに単語を追加します。
    ///
    /// 既に登録されている場合は既存の単語IDを返します。
    pub fn add_word(&mut self, word: &str) -> WordId {
        self.add_word_with_pron(word, None)
    }

    /// 発音付きで単語を追加します。
    ///
    /// 既に登録されている場合は何も変更せず、既存の単語IDを返します。
    /// `WORD(n)` 形式の単語は、基本形が登録済みであればそれを基本形として記録します。
    pub fn add_word_with_pron(&mut self, word: &str, pron: Option<String>) -> WordId {
        if let Some(wid) = self.word_id(word) {
            return wid;
        }
        let wid = WordId::new(u32::try_from(self.entries.len()).unwrap_or(u32::MAX - 1));
        let (base_str, alt) = utils::split_alt(word);
        let (base, alt) = match self.word_id(base_str) {
            Some(base) if alt != 1 => (base, alt),
            _ => (wid, 1),
        };
        self.entries.push(DictEntry {
            word: word.to_string(),
            pron,
            base,
            alt,
        });
        self.map.insert(word.to_string(), wid);
        wid
    }

    /// 登録されている単語数を返します。
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 単語が1つも登録されていないかどうかを返します。
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
