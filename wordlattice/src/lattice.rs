//! 単語ラティスの実装モジュール。
//!
//! ラティスは、音声デコーダが1発話に対して生成する単語仮説を表す
//! 有向重み付きグラフです。ノードとリンクは追記のみの配列に格納され、
//! 一度割り当てられたインデックスは変わりません。
//!
//! 配列への追加は内部領域を再配置する可能性があるため、ノードやリンクへの参照を
//! 追加操作をまたいで保持せず、常にインデックスで再取得してください。
pub(crate) mod node;
pub(crate) mod node_map;

use std::sync::Arc;

use crate::dictionary::{Dictionary, SENTENCE_END, SENTENCE_START, WordId};
use crate::errors::{LatticeError, Result};
use crate::lattice::node_map::NodeMap;
use crate::logmath::LogMath;
use crate::utils;

pub use crate::lattice::node::{Link, Node, NodeId};

/// 発音バリアント番号の最大値
pub const MAX_ALT: u32 = 255;

/// 単語ラティス
///
/// 辞書と対数変換器は [`Arc`] で他の利用者と共有されます。
/// ラティス自体も [`Lattice::into_shared`] で共有でき、最後の所有者が解放した時点で
/// ノード・リンク・重複排除マップと共有参照がすべて破棄されます。
///
/// # 例
///
/// ```
/// use std::sync::Arc;
/// use wordlattice::{Lattice, LogMath};
///
/// let mut lattice = Lattice::new(Arc::new(LogMath::default()), None);
/// let w = lattice.resolve_word("HELLO", 1)?;
/// let a = lattice.add_node(0, w);
/// let b = lattice.add_node(10, w);
/// lattice.link(a, b, w, -100)?;
///
/// assert_eq!(lattice.num_links(), 1);
/// assert_eq!(lattice.node_idx_by_id(10, w), Some(b));
/// # Ok::<(), wordlattice::errors::LatticeError>(())
/// ```
#[derive(Debug)]
pub struct Lattice {
    nodes: Vec<Node>,
    links: Vec<Link>,
    node_map: NodeMap,
    start_idx: Option<usize>,
    end_idx: Option<usize>,
    dict: Arc<Dictionary>,
    lmath: Arc<LogMath>,
    autodict: bool,
    utterance: Option<String>,
}

impl Lattice {
    /// 空のラティスを作成します。
    ///
    /// # 引数
    ///
    /// * `lmath` - 対数変換器
    /// * `dict` - 共有する辞書。指定した場合、辞書は固定され単語は追加されません。
    ///   `None`の場合、単語を必要に応じて追加する専用の辞書が作成されます。
    pub fn new(lmath: Arc<LogMath>, dict: Option<Arc<Dictionary>>) -> Self {
        let (dict, autodict) = match dict {
            Some(dict) => (dict, false),
            None => (Arc::new(Dictionary::new()), true),
        };
        Self {
            nodes: vec![],
            links: vec![],
            node_map: NodeMap::new(),
            start_idx: None,
            end_idx: None,
            dict,
            lmath,
            autodict,
            utterance: None,
        }
    }

    /// 共有所有権のハンドルに変換します。参照カウントは1から始まります。
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 参照カウントを1増やした新しいハンドルを返します。
    pub fn retain(this: &Arc<Self>) -> Arc<Self> {
        Arc::clone(this)
    }

    /// ハンドルを解放し、残りの参照カウントを返します。
    ///
    /// 0が返された場合、このハンドルが最後の所有者であり、ラティスは破棄されています。
    pub fn release(this: Arc<Self>) -> usize {
        match Arc::try_unwrap(this) {
            Ok(lattice) => {
                drop(lattice);
                0
            }
            Err(shared) => Arc::strong_count(&shared) - 1,
        }
    }

    /// 辞書を返します。
    #[inline(always)]
    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dict
    }

    /// 対数変換器を返します。
    #[inline(always)]
    pub fn logmath(&self) -> &Arc<LogMath> {
        &self.lmath
    }

    /// 辞書が自動的に拡張されるかどうかを返します。
    #[inline(always)]
    pub fn autodict(&self) -> bool {
        self.autodict
    }

    /// 発話名を返します。
    #[inline(always)]
    pub fn utterance(&self) -> Option<&str> {
        self.utterance.as_deref()
    }

    /// 発話名を設定します。
    pub fn set_utterance<S>(&mut self, utterance: Option<S>)
    where
        S: Into<String>,
    {
        self.utterance = utterance.map(Into::into);
    }

    /// ノード数を返します。
    #[inline(always)]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// リンク数を返します。
    #[inline(always)]
    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    /// すべてのノードを返します。
    #[inline(always)]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// すべてのリンクを返します。
    #[inline(always)]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// インデックスでノードを取得します。範囲外の場合は`None`です。
    #[inline(always)]
    pub fn node(&self, idx: usize) -> Option<&Node> {
        self.nodes.get(idx)
    }

    /// インデックスでリンクを取得します。範囲外の場合は`None`です。
    #[inline(always)]
    pub fn link_at(&self, idx: usize) -> Option<&Link> {
        self.links.get(idx)
    }

    /// 開始フレームと言語モデル状態でノードのインデックスを検索します。
    #[inline]
    pub fn node_idx_by_id(&self, sf: u32, lm_state: WordId) -> Option<usize> {
        self.node_map.get(sf, lm_state)
    }

    /// 開始フレームと言語モデル状態でノードを検索します。
    #[inline]
    pub fn node_by_id(&self, sf: u32, lm_state: WordId) -> Option<&Node> {
        self.node_idx_by_id(sf, lm_state)
            .and_then(|idx| self.nodes.get(idx))
    }

    /// 開始ノードのインデックスを返します。
    #[inline(always)]
    pub fn start_idx(&self) -> Option<usize> {
        self.start_idx
    }

    /// 終了ノードのインデックスを返します。
    #[inline(always)]
    pub fn end_idx(&self) -> Option<usize> {
        self.end_idx
    }

    /// 開始ノードを返します。
    pub fn start(&self) -> Option<&Node> {
        self.start_idx.and_then(|idx| self.nodes.get(idx))
    }

    /// 終了ノードを返します。
    pub fn end(&self) -> Option<&Node> {
        self.end_idx.and_then(|idx| self.nodes.get(idx))
    }

    /// 開始ノードを設定します。
    ///
    /// # エラー
    ///
    /// `idx`が存在しないノードを指す場合に[`LatticeError`]を返します。
    pub fn set_start(&mut self, idx: usize) -> Result<()> {
        self.check_node_idx(idx, "start node")?;
        self.start_idx = Some(idx);
        Ok(())
    }

    /// 終了ノードを設定します。
    ///
    /// # エラー
    ///
    /// `idx`が存在しないノードを指す場合に[`LatticeError`]を返します。
    pub fn set_end(&mut self, idx: usize) -> Result<()> {
        self.check_node_idx(idx, "end node")?;
        self.end_idx = Some(idx);
        Ok(())
    }

    fn check_node_idx(&self, idx: usize, what: &str) -> Result<()> {
        if idx < self.nodes.len() {
            Ok(())
        } else {
            Err(LatticeError::invalid_reference(
                idx,
                format!("{what} is out of range (lattice has {} nodes)", self.nodes.len()),
            ))
        }
    }

    /// ノードを末尾に追加し、重複排除マップに登録します。
    ///
    /// # 戻り値
    ///
    /// 追加されたノードのインデックス
    pub fn add_node(&mut self, sf: u32, lm_state: WordId) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(Node::new(sf, lm_state));
        self.node_map.add(sf, lm_state, idx);
        idx
    }

    /// 指定したスロットのノードを初期化し、重複排除マップに登録します。
    ///
    /// スロットが存在しない場合、ノード配列はそのインデックスを含むまで拡張されます。
    /// 定義済みのスロットを再定義した場合、識別子だけが置き換えられ、
    /// 隣接リストは保持されます。古い識別子はこのスロットを指している場合に限り
    /// 重複排除マップから削除されます。
    ///
    /// # エラー
    ///
    /// `idx`を含むまで配列を拡張できない場合に[`LatticeError`]を返します。
    pub(crate) fn init_node(&mut self, idx: usize, sf: u32, lm_state: WordId) -> Result<()> {
        if self.nodes.len() <= idx {
            let len = idx.checked_add(1).ok_or_else(|| {
                LatticeError::invalid_reference(idx, "node index is too large")
            })?;
            self.nodes.resize_with(len, Node::default);
        }
        let node = &mut self.nodes[idx];
        if node.is_defined() {
            let old = node.id;
            log::debug!(
                "Node {idx} redefined from ({}, {}) to ({sf}, {})",
                old.sf,
                old.lm_state.get(),
                lm_state.get()
            );
            self.node_map.remove_if_eq(old.sf, old.lm_state, idx);
        }
        node.id = NodeId::new(sf, lm_state);
        self.node_map.add(sf, lm_state, idx);
        Ok(())
    }

    /// 2つのノードの間にリンクを作成します。
    ///
    /// 同じノード対の間の並行リンクも許容されます。
    ///
    /// # 引数
    ///
    /// * `src` - 始点ノードのインデックス
    /// * `dest` - 終点ノードのインデックス
    /// * `word` - リンクの単語ID
    /// * `ascr` - 内部対数領域の音響スコア
    ///
    /// # 戻り値
    ///
    /// 作成されたリンクのインデックス
    ///
    /// # エラー
    ///
    /// `src`または`dest`が存在しないノードを指す場合に[`LatticeError`]を返します。
    pub fn link(&mut self, src: usize, dest: usize, word: WordId, ascr: i32) -> Result<usize> {
        self.link_with_prob(src, dest, word, ascr, None)
    }

    /// 遷移確率付きでリンクを作成します。
    ///
    /// `prob`は内部対数領域の値です。それ以外は[`link`](Self::link)と同じです。
    pub fn link_with_prob(
        &mut self,
        src: usize,
        dest: usize,
        word: WordId,
        ascr: i32,
        prob: Option<i32>,
    ) -> Result<usize> {
        self.check_node_idx(src, "source node")?;
        self.check_node_idx(dest, "destination node")?;
        let lid = self.links.len();
        self.links.push(Link { word, ascr, prob });
        self.nodes[src].exits.push(lid);
        self.nodes[dest].entries.push(lid);
        Ok(lid)
    }

    /// 単語表記と発音バリアント番号を単語IDに解決します。
    ///
    /// `!SENT_START`と`!SENT_END`はそれぞれ文頭記号・文末記号に置き換えられます。
    /// バリアント番号が1以外の場合、まず基本形の単語が存在することを確認し、
    /// `WORD(n)`形式の語彙素を解決します。
    /// 辞書が自動拡張の場合、存在しない単語は発音なしで追加されます。
    ///
    /// # エラー
    ///
    /// - `alt`が[1, 255]の範囲外の場合
    /// - 辞書が固定されており、基本形または語彙素が存在しない場合
    pub fn resolve_word(&mut self, token: &str, alt: u32) -> Result<WordId> {
        if !(1..=MAX_ALT).contains(&alt) {
            return Err(LatticeError::out_of_range("alt", i64::from(alt)));
        }
        let word = match token {
            "!SENT_END" => SENTENCE_END,
            "!SENT_START" => SENTENCE_START,
            w => w,
        };
        if alt == 1 {
            return self.get_or_add_word(word, word, alt);
        }
        // The base form must exist before its variant.
        self.get_or_add_word(word, word, alt)?;
        let lexeme = utils::alt_lexeme(word, alt);
        self.get_or_add_word(&lexeme, word, alt)
    }

    fn get_or_add_word(&mut self, lexeme: &str, word: &str, alt: u32) -> Result<WordId> {
        if let Some(wid) = self.dict.word_id(lexeme) {
            return Ok(wid);
        }
        if !self.autodict {
            return Err(LatticeError::word_lookup(word, alt));
        }
        // The dictionary is copied only if someone else still holds it.
        Ok(Arc::make_mut(&mut self.dict).add_word(lexeme))
    }

    /// 単語IDの表記を返します。
    #[inline]
    pub fn word_str(&self, word: WordId) -> Option<&str> {
        self.dict.word_str(word)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_lattice(words: &[&str]) -> Lattice {
        let mut dict = Dictionary::new();
        for w in words {
            dict.add_word(w);
        }
        Lattice::new(Arc::new(LogMath::default()), Some(Arc::new(dict)))
    }

    #[test]
    fn test_new_autodict() {
        let lattice = Lattice::new(Arc::new(LogMath::default()), None);
        assert!(lattice.autodict());
        assert_eq!(lattice.num_nodes(), 0);
        assert!(lattice.start().is_none());
        assert!(lattice.end().is_none());
    }

    #[test]
    fn test_new_fixed() {
        let lattice = fixed_lattice(&[]);
        assert!(!lattice.autodict());
    }

    #[test]
    fn test_retain_release() {
        let lmath = Arc::new(LogMath::default());
        let dict = Arc::new(Dictionary::new());
        let lattice = Lattice::new(lmath.clone(), Some(dict.clone())).into_shared();
        assert_eq!(Arc::strong_count(&dict), 2);
        let other = Lattice::retain(&lattice);
        assert_eq!(Lattice::release(other), 1);
        assert_eq!(Lattice::release(lattice), 0);
        assert_eq!(Arc::strong_count(&dict), 1);
        assert_eq!(Arc::strong_count(&lmath), 1);
    }

    #[test]
    fn test_resolve_alt_autodict() {
        let mut lattice = Lattice::new(Arc::new(LogMath::default()), None);
        let the2 = lattice.resolve_word("THE", 2).unwrap();
        let dict = lattice.dictionary();
        let the = dict.word_id("THE").unwrap();
        assert_eq!(dict.word_id("THE(2)"), Some(the2));
        assert_eq!(dict.base_word_id(the2), Some(the));
        assert_eq!(dict.alt_index(the2), Some(2));
    }

    #[test]
    fn test_resolve_alt_fixed() {
        let mut lattice = fixed_lattice(&[]);
        let err = lattice.resolve_word("THE", 2).unwrap_err();
        assert!(matches!(err, LatticeError::WordLookup(_)));

        let mut lattice = fixed_lattice(&["THE"]);
        let err = lattice.resolve_word("THE", 2).unwrap_err();
        assert!(matches!(err, LatticeError::WordLookup(_)));

        let mut lattice = fixed_lattice(&["THE", "THE(2)"]);
        assert!(lattice.resolve_word("THE", 2).is_ok());
    }

    #[test]
    fn test_resolve_range() {
        let mut lattice = Lattice::new(Arc::new(LogMath::default()), None);
        for alt in [0, 256] {
            let err = lattice.resolve_word("A", alt).unwrap_err();
            assert!(matches!(err, LatticeError::OutOfRange(_)));
        }
        assert!(lattice.resolve_word("A", 255).is_ok());
    }

    #[test]
    fn test_resolve_sentence_markers() {
        let mut lattice = fixed_lattice(&[]);
        let s = lattice.resolve_word("!SENT_START", 1).unwrap();
        let e = lattice.resolve_word("!SENT_END", 1).unwrap();
        assert_eq!(lattice.word_str(s), Some(SENTENCE_START));
        assert_eq!(lattice.word_str(e), Some(SENTENCE_END));
    }

    #[test]
    fn test_autodict_does_not_mutate_shared_dictionary() {
        let mut lattice = Lattice::new(Arc::new(LogMath::default()), None);
        let before = Arc::clone(lattice.dictionary());
        lattice.resolve_word("NEW", 1).unwrap();
        assert!(before.word_id("NEW").is_none());
        assert!(lattice.dictionary().word_id("NEW").is_some());
    }

    #[test]
    fn test_link_adjacency() {
        let mut lattice = fixed_lattice(&["A"]);
        let w = lattice.resolve_word("A", 1).unwrap();
        let a = lattice.add_node(0, w);
        let b = lattice.add_node(5, w);
        let l0 = lattice.link(a, b, w, -1).unwrap();
        let l1 = lattice.link(a, b, w, -2).unwrap();
        assert_eq!(lattice.node(a).unwrap().exits(), &[l0, l1]);
        assert_eq!(lattice.node(b).unwrap().entries(), &[l0, l1]);
        assert!(lattice.node(a).unwrap().entries().is_empty());
        assert_eq!(lattice.link_at(l1).unwrap().ascr(), -2);
    }

    #[test]
    fn test_link_out_of_range() {
        let mut lattice = fixed_lattice(&[]);
        let w = lattice.resolve_word("<s>", 1).unwrap();
        let a = lattice.add_node(0, w);
        let err = lattice.link(a, 3, w, 0).unwrap_err();
        assert!(matches!(err, LatticeError::InvalidReference(_)));
        assert_eq!(lattice.num_links(), 0);
        assert!(lattice.node(3).is_none());
    }

    #[test]
    fn test_set_start_end() {
        let mut lattice = fixed_lattice(&[]);
        let w = lattice.resolve_word("<s>", 1).unwrap();
        lattice.add_node(0, w);
        assert!(lattice.set_start(0).is_ok());
        assert!(lattice.set_end(1).is_err());
        assert_eq!(lattice.start().map(Node::sf), Some(0));
        assert!(lattice.end().is_none());
    }

    #[test]
    fn test_init_node_grows_store() {
        let mut lattice = fixed_lattice(&[]);
        let w = lattice.resolve_word("<s>", 1).unwrap();
        lattice.init_node(3, 7, w).unwrap();
        assert_eq!(lattice.num_nodes(), 4);
        assert!(!lattice.node(1).unwrap().is_defined());
        assert!(lattice.node(3).unwrap().is_defined());
        assert_eq!(lattice.node_idx_by_id(7, w), Some(3));
    }

    #[test]
    fn test_link_missing_from_adjacency() {
        let mut lattice = fixed_lattice(&["A"]);
        let w = lattice.resolve_word("A", 1).unwrap();
        lattice.add_node(0, w);
        lattice.links.push(Link {
            word: w,
            ascr: 0,
            prob: None,
        });
        let err = lattice.link_endpoints().unwrap_err();
        assert!(matches!(err, LatticeError::InvalidReference(_)));
        assert!(lattice.write_htk(std::io::sink(), 100).is_err());
        assert!(lattice.write_dot(std::io::sink()).is_err());
    }

    #[test]
    fn test_init_node_index_overflow() {
        let mut lattice = fixed_lattice(&[]);
        let w = lattice.resolve_word("<s>", 1).unwrap();
        let err = lattice.init_node(usize::MAX, 0, w).unwrap_err();
        assert!(matches!(err, LatticeError::InvalidReference(_)));
        assert_eq!(lattice.num_nodes(), 0);
    }

    #[test]
    fn test_init_node_redefinition() {
        let mut lattice = fixed_lattice(&["A", "B"]);
        let a = lattice.resolve_word("A", 1).unwrap();
        let b = lattice.resolve_word("B", 1).unwrap();
        lattice.init_node(0, 0, a).unwrap();
        lattice.init_node(1, 10, a).unwrap();
        let lid = lattice.link(0, 1, a, -5).unwrap();

        lattice.init_node(1, 10, b).unwrap();
        assert_eq!(lattice.node_idx_by_id(10, a), None);
        assert!(lattice.node_by_id(10, a).is_none());
        assert_eq!(lattice.node_by_id(10, b).unwrap().lm_state(), b);
        assert_eq!(lattice.node(1).unwrap().entries(), &[lid]);
        assert_eq!(lattice.link_endpoints().unwrap(), vec![(0, 1)]);
    }

    #[test]
    fn test_init_node_redefinition_keeps_newer_mapping() {
        let mut lattice = fixed_lattice(&["A", "B"]);
        let a = lattice.resolve_word("A", 1).unwrap();
        let b = lattice.resolve_word("B", 1).unwrap();
        lattice.init_node(0, 10, a).unwrap();
        lattice.init_node(1, 10, a).unwrap();
        // Slot 0 no longer owns (10, A), so redefining it leaves slot 1 findable.
        lattice.init_node(0, 10, b).unwrap();
        assert_eq!(lattice.node_idx_by_id(10, a), Some(1));
        assert_eq!(lattice.node_idx_by_id(10, b), Some(0));
    }
}
