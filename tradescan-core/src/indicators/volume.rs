//! Volume moving average and volume ratio.
//!
//! VolumeMa[t] = mean(volume[t-period+1..=t]), lookback period - 1.
//! VolumeRatio[t] = volume[t] / VolumeMa[t]; NaN when the average is not positive.

use super::{rolling_mean, Indicator};
use crate::domain::Bar;

fn volumes(bars: &[Bar]) -> Vec<f64> {
    bars.iter().map(|b| b.volume as f64).collect()
}

#[derive(Debug, Clone)]
pub struct VolumeMa {
    period: usize,
    name: String,
}

impl VolumeMa {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume MA period must be >= 1");
        Self {
            period,
            name: format!("volume_ma_{period}"),
        }
    }
}

impl Indicator for VolumeMa {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_mean(&volumes(bars), self.period)
    }
}

/// Latest volume relative to its trailing average (the average includes
/// the current bar).
#[derive(Debug, Clone)]
pub struct VolumeRatio {
    ma: VolumeMa,
    name: String,
}

impl VolumeRatio {
    pub fn new(period: usize) -> Self {
        Self {
            ma: VolumeMa::new(period),
            name: format!("volume_ratio_{period}"),
        }
    }
}

impl Indicator for VolumeRatio {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.ma.lookback()
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let ma = self.ma.compute(bars);
        bars.iter()
            .zip(ma)
            .map(|(bar, avg)| if avg > 0.0 { bar.volume as f64 / avg } else { f64::NAN })
            .collect()
    }
}
