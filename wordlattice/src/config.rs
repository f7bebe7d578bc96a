//! SLFの読み書き設定
//!
//! フレームレートと、書き出し時の数値の精度を保持します。

use crate::errors::{LatticeError, Result};

/// デフォルトのフレームレート（フレーム/秒）
pub const DEFAULT_FRAME_RATE: u32 = 100;

/// 時刻の最小の小数点以下桁数
const MIN_TIME_PRECISION: usize = 2;

/// 各フレームの時刻を書き出して読み戻したときに同じフレームになる桁数を返します。
///
/// フレームレートが2と5の積で表せる場合、`frame / frame_rate`は有限小数になるため
/// その桁数で正確に表せます。それ以外の場合は、読み込み時の丸め幅1e-6に
/// 誤差が十分収まる桁数を返します。
fn exact_time_precision(frame_rate: u32) -> usize {
    let mut rest = frame_rate;
    let mut twos = 0;
    let mut fives = 0;
    while rest % 2 == 0 {
        rest /= 2;
        twos += 1;
    }
    while rest % 5 == 0 {
        rest /= 5;
        fives += 1;
    }
    let digits = if rest == 1 {
        twos.max(fives)
    } else {
        frame_rate.ilog10() as usize + 8
    };
    digits.max(MIN_TIME_PRECISION)
}

/// SLFの読み書き設定
///
/// # 例
///
/// ```
/// use wordlattice::SlfConfig;
///
/// let config = SlfConfig::new(100)?.time_precision(3).score_precision(2);
/// assert_eq!(config.frame_rate(), 100);
/// # Ok::<(), wordlattice::errors::LatticeError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlfConfig {
    frame_rate: u32,
    time_precision: usize,
    score_precision: usize,
}

impl Default for SlfConfig {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            time_precision: exact_time_precision(DEFAULT_FRAME_RATE),
            score_precision: 4,
        }
    }
}

impl SlfConfig {
    /// フレームレートを指定して設定を作成します。
    ///
    /// 時刻の桁数は、書き出した時刻から同じフレームが復元されるように
    /// フレームレートから決まります。
    ///
    /// # エラー
    ///
    /// `frame_rate`が0の場合に[`LatticeError`]を返します。
    pub fn new(frame_rate: u32) -> Result<Self> {
        if frame_rate == 0 {
            return Err(LatticeError::invalid_argument(
                "frame_rate",
                "must be positive",
            ));
        }
        Ok(Self {
            frame_rate,
            time_precision: exact_time_precision(frame_rate),
            ..Default::default()
        })
    }

    /// 書き出す時刻`t=`の小数点以下の桁数を設定します。
    ///
    /// フレームを正確に復元するには、フレームレートに対して十分な桁数が必要です。
    pub const fn time_precision(mut self, digits: usize) -> Self {
        self.time_precision = digits;
        self
    }

    /// 書き出すスコア`a=`と確率`p=`の小数点以下の桁数を設定します。
    pub const fn score_precision(mut self, digits: usize) -> Self {
        self.score_precision = digits;
        self
    }

    /// フレームレートを返します。
    #[inline(always)]
    pub const fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    #[inline(always)]
    pub(crate) const fn time_digits(&self) -> usize {
        self.time_precision
    }

    #[inline(always)]
    pub(crate) const fn score_digits(&self) -> usize {
        self.score_precision
    }

    /// 秒をフレームに変換します。
    ///
    /// 整数から1e-6以内の値はその整数に丸められます。それ以外は切り捨てです。
    ///
    /// # エラー
    ///
    /// `seconds`が負、または有限値でない場合に[`LatticeError`]を返します。
    pub fn seconds_to_frame(&self, seconds: f64) -> Result<u32> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(LatticeError::invalid_format(
                0,
                format!("invalid time {seconds}"),
            ));
        }
        let f = seconds * f64::from(self.frame_rate);
        let r = f.round();
        let frame = if (f - r).abs() < 1e-6 { r } else { f.floor() };
        if frame > f64::from(u32::MAX) {
            return Err(LatticeError::invalid_format(
                0,
                format!("time {seconds} is too large"),
            ));
        }
        Ok(frame as u32)
    }

    /// フレームを秒に変換します。
    #[inline]
    pub fn frame_to_seconds(&self, frame: u32) -> f64 {
        f64::from(frame) / f64::from(self.frame_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_frame_rate() {
        assert!(SlfConfig::new(0).is_err());
    }

    #[test]
    fn test_seconds_to_frame() {
        let config = SlfConfig::default();
        assert_eq!(config.seconds_to_frame(0.0).unwrap(), 0);
        assert_eq!(config.seconds_to_frame(0.29).unwrap(), 29);
        assert_eq!(config.seconds_to_frame(1.234).unwrap(), 123);
        assert!(config.seconds_to_frame(-0.5).is_err());
    }

    #[test]
    fn test_time_precision_follows_frame_rate() {
        assert_eq!(SlfConfig::default().time_digits(), 2);
        assert_eq!(SlfConfig::new(100).unwrap().time_digits(), 2);
        assert_eq!(SlfConfig::new(1000).unwrap().time_digits(), 3);
        assert_eq!(SlfConfig::new(16).unwrap().time_digits(), 4);
        assert_eq!(SlfConfig::new(1).unwrap().time_digits(), 2);
        assert_eq!(SlfConfig::new(3).unwrap().time_digits(), 8);
        assert_eq!(SlfConfig::new(44100).unwrap().time_digits(), 12);
    }

    #[test]
    fn test_default_precision_recovers_frames() {
        for frame_rate in [3, 30, 100, 1000, 8000, 44100] {
            let config = SlfConfig::new(frame_rate).unwrap();
            let tp = config.time_digits();
            for frame in (0..5000).chain([158_760_000, 158_760_001]) {
                let t = format!("{:.tp$}", config.frame_to_seconds(frame));
                assert_eq!(
                    config.seconds_to_frame(t.parse().unwrap()).unwrap(),
                    frame,
                    "frame {frame} at {frame_rate} fps written as {t}"
                );
            }
        }
    }

    #[test]
    fn test_frame_round_trip() {
        let config = SlfConfig::new(16).unwrap().time_precision(4);
        for frame in 0..200 {
            let t = format!("{:.4}", config.frame_to_seconds(frame));
            assert_eq!(config.seconds_to_frame(t.parse().unwrap()).unwrap(), frame);
        }
    }
}
