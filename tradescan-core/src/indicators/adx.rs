//! ADX: Average Directional Index (Wilder directional movement).
//!
//! Steps:
//! 1. Compute +DM and -DM from consecutive bars
//! 2. Sum +DM, -DM, and TR over `period` bars
//! 3. +DI = 100 * sum(+DM) / sum(TR), -DI = 100 * sum(-DM) / sum(TR)
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI), and 0 when +DI + -DI is ~0
//! 5. ADX = `period`-bar mean of DX
//!
//! Lookback: 2 * period - 1 (period for DI sums, then period - 1 for the DX mean).

use super::atr::true_range;
use super::{rolling_mean, rolling_sum, Indicator};
use crate::domain::Bar;

/// Below this the DI sum is treated as zero.
const DI_SUM_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    name: String,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            period,
            name: format!("adx_{period}"),
        }
    }
}

/// Directional index from smoothed movement totals. Degenerate sums yield 0.
fn directional_index(sum_plus_dm: f64, sum_minus_dm: f64, sum_tr: f64) -> f64 {
    if sum_tr <= 0.0 {
        return 0.0;
    }
    let plus_di = 100.0 * sum_plus_dm / sum_tr;
    let minus_di = 100.0 * sum_minus_dm / sum_tr;
    let di_sum = plus_di + minus_di;
    if di_sum.abs() < DI_SUM_EPSILON {
        0.0
    } else {
        100.0 * (plus_di - minus_di).abs() / di_sum
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        2 * self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        if n < 2 {
            return vec![f64::NAN; n];
        }

        // Step 1: +DM and -DM (only the larger positive move counts)
        let mut plus_dm = vec![f64::NAN; n];
        let mut minus_dm = vec![f64::NAN; n];
        for i in 1..n {
            let up = bars[i].high - bars[i - 1].high;
            let down = bars[i - 1].low - bars[i].low;
            if up.is_nan() || down.is_nan() {
                continue;
            }
            plus_dm[i] = if up > down && up > 0.0 { up } else { 0.0 };
            minus_dm[i] = if down > up && down > 0.0 { down } else { 0.0 };
        }

        // Step 2: sums over the window. TR[0] has no previous close, so it
        // is excluded to keep TR aligned with the DM series.
        let mut tr = true_range(bars);
        tr[0] = f64::NAN;
        let sum_tr = rolling_sum(&tr, self.period);
        let sum_plus = rolling_sum(&plus_dm, self.period);
        let sum_minus = rolling_sum(&minus_dm, self.period);

        // Step 3-4: DX
        let dx: Vec<f64> = (0..n)
            .map(|i| {
                if sum_tr[i].is_nan() || sum_plus[i].is_nan() || sum_minus[i].is_nan() {
                    f64::NAN
                } else {
                    directional_index(sum_plus[i], sum_minus[i], sum_tr[i])
                }
            })
            .collect();

        // Step 5: ADX
        rolling_mean(&dx, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars};

    #[test]
    fn adx_bounds() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
            (105.0, 110.0, 103.0, 108.0),
            (108.0, 112.0, 106.0, 110.0),
            (110.0, 111.0, 104.0, 105.0),
            (105.0, 109.0, 103.0, 107.0),
            (107.0, 113.0, 105.0, 112.0),
        ]);
        let result = Adx::new(3).compute(&bars);

        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!((0.0..=100.0).contains(&v), "ADX out of bounds at bar {i}: {v}");
            }
        }
        assert!(result[4].is_nan());
        assert!(!result[5].is_nan());
    }

    #[test]
    fn adx_pure_uptrend_is_100() {
        // Every bar shifts up by 5: +DM = 5 and -DM = 0 on every bar
        let data: Vec<_> = (0..20)
            .map(|i| {
                let base = 100.0 + i as f64 * 5.0;
                (base - 1.0, base + 3.0, base - 3.0, base + 2.0)
            })
            .collect();
        let bars = make_ohlc_bars(&data);
        let result = Adx::new(5).compute(&bars);
        assert_approx(*result.last().unwrap(), 100.0, 1e-9);
    }

    #[test]
    fn flat_market_is_zero_not_nan() {
        let data = vec![(100.0, 100.0, 100.0, 100.0); 12];
        let bars = make_ohlc_bars(&data);
        let result = Adx::new(3).compute(&bars);
        for v in result.iter().skip(5) {
            assert_eq!(*v, 0.0);
        }
    }

    #[test]
    fn directional_index_degenerate() {
        assert_eq!(directional_index(0.0, 0.0, 10.0), 0.0);
        assert_eq!(directional_index(5.0, 5.0, 0.0), 0.0);
        assert_approx(directional_index(3.0, 1.0, 10.0), 50.0, 1e-12);
    }

    #[test]
    fn adx_lookback() {
        assert_eq!(Adx::new(14).lookback(), 27);
        assert_eq!(Adx::new(7).lookback(), 13);
    }

    #[test]
    fn adx_too_few_bars() {
        let bars = make_ohlc_bars(&[(100.0, 105.0, 95.0, 102.0)]);
        let result = Adx::new(3).compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }
}
