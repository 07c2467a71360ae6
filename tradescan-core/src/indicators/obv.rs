//! On-Balance Volume (OBV).
//!
//! OBV[0] = 0; OBV[t] = OBV[t-1] + sign(close[t] - close[t-1]) * volume[t].
//! Unchanged closes contribute nothing. A NaN close poisons the rest of the
//! series. Lookback: 0.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct Obv;

impl Obv {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Obv {
    fn name(&self) -> &str {
        "obv"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = Vec::with_capacity(bars.len());
        let mut running = 0.0_f64;
        for (i, bar) in bars.iter().enumerate() {
            if i > 0 {
                let delta = bar.close - bars[i - 1].close;
                running += if delta.is_nan() {
                    f64::NAN
                } else if delta > 0.0 {
                    bar.volume as f64
                } else if delta < 0.0 {
                    -(bar.volume as f64)
                } else {
                    0.0
                };
            }
            result.push(running);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn obv_accumulates_signed_volume() {
        let mut bars = make_bars(&[10.0, 11.0, 11.0, 10.0, 12.0]);
        for (i, b) in bars.iter_mut().enumerate() {
            b.volume = 100 * (i as u64 + 1);
        }
        let result = Obv::new().compute(&bars);
        assert_eq!(result, vec![0.0, 200.0, 200.0, -200.0, 300.0]);
    }

    #[test]
    fn obv_empty() {
        assert!(Obv::new().compute(&[]).is_empty());
    }
}
