//! MA slope: discrete derivative of a moving average.
//!
//! Slope[t] = SMA(period)[t] - SMA(period)[t - lag]
//! Lookback: (period - 1) + lag.

use super::{Indicator, Sma};
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Slope {
    ma: Sma,
    period: usize,
    lag: usize,
    name: String,
}

impl Slope {
    pub fn new(period: usize, lag: usize) -> Self {
        assert!(lag >= 1, "slope lag must be >= 1");
        Self {
            ma: Sma::new(period),
            period,
            lag,
            name: format!("slope_{period}_{lag}"),
        }
    }

    /// MA20 over a 5-bar lag, the trend proxy used by scoring.
    pub fn default_params() -> Self {
        Self::new(20, 5)
    }
}

impl Indicator for Slope {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1 + self.lag
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let ma = self.ma.compute(bars);
        let mut result = vec![f64::NAN; ma.len()];
        for i in self.lag..ma.len() {
            // NaN on either side propagates
            result[i] = ma[i] - ma[i - self.lag];
        }
        result
    }
}
