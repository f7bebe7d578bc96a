//! ラティスのノードとリンク
use crate::dictionary::WordId;

/// ノードの識別子
///
/// 開始フレームと言語モデル状態の組です。ラティス内で同じ識別子を持つノードは
/// 重複排除マップにより1つに正規化されます。
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Default)]
pub struct NodeId {
    /// 開始フレーム
    pub sf: u32,
    /// 言語モデル状態。現在は解決済みの単語IDです。
    pub lm_state: WordId,
}

impl NodeId {
    /// 新しい識別子を作成します。
    #[inline(always)]
    pub const fn new(sf: u32, lm_state: WordId) -> Self {
        Self { sf, lm_state }
    }
}

/// ラティス内のノード
///
/// 隣接リストはリンクのインデックスで保持されます。
/// リンクが追加されるまで領域は確保されません。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) fan: u32,
    pub(crate) entries: Vec<usize>,
    pub(crate) exits: Vec<usize>,
}

impl Node {
    #[inline(always)]
    pub(crate) fn new(sf: u32, lm_state: WordId) -> Self {
        Self {
            id: NodeId::new(sf, lm_state),
            ..Default::default()
        }
    }

    /// ノードの識別子を返します。
    #[inline(always)]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// 開始フレームを返します。
    #[inline(always)]
    pub fn sf(&self) -> u32 {
        self.id.sf
    }

    /// 言語モデル状態（単語ID）を返します。
    #[inline(always)]
    pub fn lm_state(&self) -> WordId {
        self.id.lm_state
    }

    /// 枝刈り指標のために予約されたファン数を返します。
    #[inline(always)]
    pub fn fan(&self) -> u32 {
        self.fan
    }

    /// 入ってくるリンクのインデックスを返します。
    #[inline(always)]
    pub fn entries(&self) -> &[usize] {
        &self.entries
    }

    /// 出ていくリンクのインデックスを返します。
    #[inline(always)]
    pub fn exits(&self) -> &[usize] {
        &self.exits
    }

    /// ノード行で定義済みかどうかを判定します。
    ///
    /// 大きなインデックスのノードのために確保されただけの領域では`false`です。
    #[inline(always)]
    pub fn is_defined(&self) -> bool {
        self.id.lm_state.is_valid()
    }
}

/// 2つのノード間の有向リンク
///
/// 始点と終点は保持せず、始点ノードの出リンクと終点ノードの入リンクに
/// 登録されたインデックスによって暗黙に決まります。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Link {
    pub(crate) word: WordId,
    pub(crate) ascr: i32,
    pub(crate) prob: Option<i32>,
}

impl Link {
    /// 単語IDを返します。
    #[inline(always)]
    pub fn word(&self) -> WordId {
        self.word
    }

    /// 内部対数領域の音響スコアを返します。
    #[inline(always)]
    pub fn ascr(&self) -> i32 {
        self.ascr
    }

    /// 内部対数領域の遷移確率を返します。
    #[inline(always)]
    pub fn prob(&self) -> Option<i32> {
        self.prob
    }
}
