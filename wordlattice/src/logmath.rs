//! 対数領域の数値変換
//!
//! ラティスのスコアは、指定された底による整数の対数値として保持されます。
//! このモジュールは、自然対数や線形確率との相互変換を提供します。

use crate::errors::{LatticeError, Result};

/// デフォルトの対数の底
pub const DEFAULT_BASE: f64 = 1.0001;

/// 対数領域の変換器
///
/// 内部表現は `round(ln(x) / ln(base))` の整数値です。
/// 状態を持たないため、複数のラティスから [`Arc`](std::sync::Arc) で共有できます。
#[derive(Debug, Clone, PartialEq)]
pub struct LogMath {
    base: f64,
    log_of_base: f64,
    inv_log_of_base: f64,
    zero: i32,
}

impl Default for LogMath {
    fn default() -> Self {
        Self::from_base(DEFAULT_BASE)
    }
}

impl LogMath {
    /// 指定した底で新しい変換器を作成します。
    ///
    /// # 引数
    ///
    /// * `base` - 対数の底。1より大きい有限値である必要があります。
    ///
    /// # エラー
    ///
    /// `base`が1以下、または有限値でない場合に[`LatticeError`]を返します。
    pub fn new(base: f64) -> Result<Self> {
        if !base.is_finite() || base <= 1.0 {
            return Err(LatticeError::invalid_argument(
                "base",
                format!("must be a finite value greater than 1, got {base}"),
            ));
        }
        Ok(Self::from_base(base))
    }

    fn from_base(base: f64) -> Self {
        let log_of_base = base.ln();
        Self {
            base,
            log_of_base,
            inv_log_of_base: 1.0 / log_of_base,
            zero: i32::MIN >> 2,
        }
    }

    /// 対数の底を返します。
    #[inline(always)]
    pub fn base(&self) -> f64 {
        self.base
    }

    /// 確率0に相当する内部値を返します。
    #[inline(always)]
    pub fn zero(&self) -> i32 {
        self.zero
    }

    /// 線形確率を内部の対数値に変換します。
    ///
    /// 0以下の値は [`zero()`](Self::zero) になります。
    pub fn log(&self, p: f64) -> i32 {
        if p <= 0.0 {
            return self.zero;
        }
        self.ln_to_log(p.ln())
    }

    /// 内部の対数値を線形確率に変換します。
    pub fn exp(&self, logval: i32) -> f64 {
        self.log_to_ln(logval).exp()
    }

    /// 自然対数の値を内部の対数値に変換します。
    pub fn ln_to_log(&self, ln: f64) -> i32 {
        let v = (ln * self.inv_log_of_base).round();
        if v.is_nan() || v <= f64::from(self.zero) {
            self.zero
        } else if v >= f64::from(i32::MAX) {
            i32::MAX
        } else {
            v as i32
        }
    }

    /// 内部の対数値を自然対数の値に変換します。
    pub fn log_to_ln(&self, logval: i32) -> f64 {
        f64::from(logval) * self.log_of_base
    }
}
