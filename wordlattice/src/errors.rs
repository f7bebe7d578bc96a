//! エラー型の定義
//!
//! このモジュールは、ラティスの構築・読み込み・書き出しで使用される
//! すべてのエラー型を定義します。

use std::error::Error;
use std::fmt::{self, Debug};

/// wordlattice専用のResult型
///
/// エラー型としてデフォルトで[`LatticeError`]を使用します。
pub type Result<T, E = LatticeError> = std::result::Result<T, E>;

/// ラティスのエラー型
///
/// SLFの解析中に発生したエラーは解析全体を中断させます。
/// 途中まで構築されたラティスの内容は保証されないため、呼び出し側で破棄してください。
#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    /// 無効な引数エラー
    ///
    /// [`InvalidArgumentError`]のエラーバリアント。
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// 無効なフォーマットエラー
    ///
    /// フィールドの書式不正、必須キーの欠落、解析できない行で発生します。
    #[error(transparent)]
    InvalidFormat(InvalidFormatError),

    /// 無効な参照エラー
    ///
    /// アークが存在しない始点・終点ノードを参照した場合に発生します。
    #[error(transparent)]
    InvalidReference(InvalidReferenceError),

    /// 単語解決エラー
    ///
    /// 辞書が固定されており、単語を解決できない場合に発生します。
    #[error(transparent)]
    WordLookup(WordLookupError),

    /// 範囲外エラー
    ///
    /// 発音バリアント番号が[1, 255]の範囲外の場合に発生します。
    #[error(transparent)]
    OutOfRange(OutOfRangeError),

    /// 浮動小数点数パースエラー
    #[error(transparent)]
    ParseFloat(std::num::ParseFloatError),

    /// 整数パースエラー
    #[error(transparent)]
    ParseInt(std::num::ParseIntError),

    /// I/Oエラー
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LatticeError {
    /// 無効な引数エラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - 引数の名前
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効なフォーマットエラーを生成します
    ///
    /// # 引数
    ///
    /// * `line` - 入力の行番号（1始まり）
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_format<S>(line: usize, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidFormat(InvalidFormatError {
            line,
            msg: msg.into(),
        })
    }

    /// 無効な参照エラーを生成します
    pub(crate) fn invalid_reference<S>(index: usize, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidReference(InvalidReferenceError {
            index,
            msg: msg.into(),
        })
    }

    /// 単語解決エラーを生成します
    pub(crate) fn word_lookup<S>(word: S, alt: u32) -> Self
    where
        S: Into<String>,
    {
        Self::WordLookup(WordLookupError {
            word: word.into(),
            alt,
        })
    }

    /// 範囲外エラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - 値の名前
    /// * `value` - 範囲外だった値
    pub(crate) fn out_of_range(arg: &'static str, value: i64) -> Self {
        Self::OutOfRange(OutOfRangeError { arg, value })
    }

    /// 解析中に発生したエラーへ行番号を付与します。
    ///
    /// 数値のパースエラーはフォーマットエラーに変換され、
    /// それ以外のエラーはそのまま返されます。
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            Self::ParseFloat(e) => Self::invalid_format(line, e.to_string()),
            Self::ParseInt(e) => Self::invalid_format(line, e.to_string()),
            Self::InvalidFormat(InvalidFormatError { line: 0, msg }) => {
                Self::invalid_format(line, msg)
            }
            e => e,
        }
    }
}

/// 引数が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// 引数の名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// 入力フォーマットが無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidFormatError {
    /// 行番号。行に結び付かない場合は0
    pub(crate) line: usize,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl InvalidFormatError {
    /// エラーが発生した行番号を返します。
    pub fn line(&self) -> usize {
        self.line
    }
}

impl fmt::Display for InvalidFormatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidFormatError: line {}: {}", self.line, self.msg)
    }
}

impl Error for InvalidFormatError {}

/// 存在しないノードが参照された場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidReferenceError {
    /// 参照されたノードのインデックス
    pub(crate) index: usize,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl InvalidReferenceError {
    /// 参照されたノードのインデックスを返します。
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for InvalidReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidReferenceError: node {}: {}", self.index, self.msg)
    }
}

impl Error for InvalidReferenceError {}

/// 単語を辞書で解決できなかった場合に使用されるエラー
#[derive(Debug)]
pub struct WordLookupError {
    pub(crate) word: String,
    pub(crate) alt: u32,
}

impl WordLookupError {
    /// 解決できなかった単語を返します。
    pub fn word(&self) -> &str {
        &self.word
    }
}

impl fmt::Display for WordLookupError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "WordLookupError: {}({}) is not in the dictionary",
            self.word, self.alt
        )
    }
}

impl Error for WordLookupError {}

/// 値が許容範囲外の場合に使用されるエラー
#[derive(Debug)]
pub struct OutOfRangeError {
    pub(crate) arg: &'static str,
    pub(crate) value: i64,
}

impl fmt::Display for OutOfRangeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "OutOfRangeError: {}: {}", self.arg, self.value)
    }
}

impl Error for OutOfRangeError {}

impl From<std::num::ParseFloatError> for LatticeError {
    fn from(error: std::num::ParseFloatError) -> Self {
        Self::ParseFloat(error)
    }
}

impl From<std::num::ParseIntError> for LatticeError {
    fn from(error: std::num::ParseIntError) -> Self {
        Self::ParseInt(error)
    }
}
