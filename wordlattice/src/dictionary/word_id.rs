//! 単語識別子
//!
//! このモジュールは、発音辞書内の単語を一意に識別するための
//! インデックス型を提供します。

/// 単語の識別子
///
/// 発音辞書に登録された単語の通し番号です。ラティスのノードでは
/// 言語モデル状態としても使用されます。
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct WordId(u32);

impl Default for WordId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl WordId {
    /// どの単語も指さない識別子
    pub const INVALID: Self = Self(u32::MAX);

    /// 新しいインスタンスを作成します。
    #[inline(always)]
    pub(crate) const fn new(word_id: u32) -> Self {
        Self(word_id)
    }

    /// 内部の通し番号を取得します。
    #[inline(always)]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// 辞書内の位置として使用できる値を返します。
    #[inline(always)]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// 有効な単語を指しているかどうかを判定します。
    #[inline(always)]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_invalid() {
        assert_eq!(WordId::default(), WordId::INVALID);
        assert!(!WordId::default().is_valid());
        assert!(WordId::new(0).is_valid());
    }
}
