//! Relative Strength Index (RSI).
//!
//! Simple-average variant: mean gain and mean loss over the last `period`
//! close-to-close changes.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period.
//! Edge cases: avg_loss == 0 → RSI = 100 (including a perfectly flat window);
//! avg_gain == 0 with losses → RSI = 0.

use super::{rolling_mean, Indicator};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut gains = vec![f64::NAN; n];
        let mut losses = vec![f64::NAN; n];
        for i in 1..n {
            let delta = bars[i].close - bars[i - 1].close;
            if delta.is_nan() {
                continue;
            }
            gains[i] = delta.max(0.0);
            losses[i] = (-delta).max(0.0);
        }

        let avg_gain = rolling_mean(&gains, self.period);
        let avg_loss = rolling_mean(&losses, self.period);

        avg_gain
            .iter()
            .zip(&avg_loss)
            .map(|(&g, &l)| {
                if g.is_nan() || l.is_nan() {
                    f64::NAN
                } else {
                    rsi_from_averages(g, l)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn rsi_all_gains() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let result = Rsi::new(3).compute(&bars);
        assert!(result[2].is_nan());
        assert_approx(result[3], 100.0, DEFAULT_EPSILON);
        assert_approx(result[5], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_all_losses() {
        let bars = make_bars(&[15.0, 14.0, 13.0, 12.0, 11.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 0.0, DEFAULT_EPSILON);
        assert_approx(result[4], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_flat_window_is_100() {
        let bars = make_bars(&[10.0; 6]);
        let result = Rsi::new(3).compute(&bars);
        assert_eq!(result[3], 100.0);
    }

    #[test]
    fn rsi_mixed() {
        // deltas: +2, -1, +1 → avg_gain = 1, avg_loss = 1/3 → RS = 3 → RSI = 75
        let bars = make_bars(&[10.0, 12.0, 11.0, 12.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 75.0, 1e-9);
    }

    #[test]
    fn rsi_bounds_on_wave() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + 10.0 * (i as f64 * 0.3).sin()).collect();
        let bars = make_bars(&closes);
        let result = Rsi::new(14).compute(&bars);
        for v in result.iter().skip(14) {
            assert!((0.0..=100.0).contains(v), "RSI out of bounds: {v}");
        }
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
