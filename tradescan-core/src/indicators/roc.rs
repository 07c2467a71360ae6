//! Rate of Change (ROC), as a fraction.
//!
//! ROC[t] = close[t] / close[t-period] - 1
//! Lookback: period. A non-positive base close yields NaN.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    name: String,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ROC period must be >= 1");
        Self {
            period,
            name: format!("roc_{period}"),
        }
    }
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        for i in self.period..n {
            let base = bars[i - self.period].close;
            let curr = bars[i].close;
            if base > 0.0 && curr.is_finite() {
                result[i] = curr / base - 1.0;
            }
        }

        result
    }
}
