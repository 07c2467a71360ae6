//! Bar and BarSeries: the market data units the engine reads.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLCV bar for one instrument on one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open/close, low <= open/close.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// Errors raised when assembling a bar series.
#[derive(Debug, Error, PartialEq)]
pub enum BarError {
    #[error("bars for '{symbol}' must be strictly ascending by date (offending date {date})")]
    OutOfOrder { symbol: String, date: NaiveDate },

    #[error("bar for '{symbol}' on {date} fails OHLC sanity check")]
    Insane { symbol: String, date: NaiveDate },
}

/// Ordered, immutable sequence of bars for one instrument or the benchmark.
///
/// Dates are strictly ascending (unique per date). An empty series is the
/// data provider's "no data" signal. Deserialization runs the same checks
/// as [`BarSeries::new`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBarSeries")]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

#[derive(Deserialize)]
struct RawBarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl TryFrom<RawBarSeries> for BarSeries {
    type Error = BarError;

    fn try_from(raw: RawBarSeries) -> Result<Self, Self::Error> {
        BarSeries::new(raw.symbol, raw.bars)
    }
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BarError> {
        let symbol = symbol.into();
        for (i, bar) in bars.iter().enumerate() {
            if !bar.is_sane() {
                return Err(BarError::Insane {
                    symbol,
                    date: bar.date,
                });
            }
            if i > 0 && bars[i - 1].date >= bar.date {
                return Err(BarError::OutOfOrder {
                    symbol,
                    date: bar.date,
                });
            }
        }
        Ok(Self { symbol, bars })
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Position of the bar dated exactly `date`.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.binary_search_by_key(&date, |b| b.date).ok()
    }

    /// Index of the latest bar dated on or before `date`.
    pub fn index_as_of(&self, date: NaiveDate) -> Option<usize> {
        self.bars.partition_point(|b| b.date <= date).checked_sub(1)
    }

    /// All bars dated on or before `date`.
    pub fn up_to(&self, date: NaiveDate) -> &[Bar] {
        let end = self.bars.partition_point(|b| b.date <= date);
        &self.bars[..end]
    }

    /// All bars dated strictly after `date`.
    pub fn after(&self, date: NaiveDate) -> &[Bar] {
        let start = self.bars.partition_point(|b| b.date <= date);
        &self.bars[start..]
    }

    /// Copy of the series restricted to the trailing `days` calendar days,
    /// counted back from the latest bar.
    pub fn trailing_days(&self, days: usize) -> BarSeries {
        let Some(last) = self.bars.last() else {
            return self.clone();
        };
        let cutoff = last.date - chrono::Duration::days(days as i64);
        let start = self.bars.partition_point(|b| b.date < cutoff);
        Self {
            symbol: self.symbol.clone(),
            bars: self.bars[start..].to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(bar(2, 100.0).is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut b = bar(2, 100.0);
        b.high = 97.0;
        assert!(!b.is_sane());
    }

    #[test]
    fn deserialize_validates_like_new() {
        let good = BarSeries::new("2330", vec![bar(2, 100.0), bar(3, 101.0)]).unwrap();
        let json = serde_json::to_string(&good).unwrap();
        let back: BarSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(back, good);

        let mut value = serde_json::to_value(&good).unwrap();
        value["bars"].as_array_mut().unwrap().reverse();
        let err = serde_json::from_value::<BarSeries>(value).unwrap_err();
        assert!(err.to_string().contains("strictly ascending"));

        let mut value = serde_json::to_value(&good).unwrap();
        value["bars"][0]["high"] = serde_json::json!(50.0);
        let err = serde_json::from_value::<BarSeries>(value).unwrap_err();
        assert!(err.to_string().contains("sanity"));
    }

    #[test]
    fn series_rejects_out_of_order_dates() {
        let err = BarSeries::new("2330", vec![bar(3, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(matches!(err, BarError::OutOfOrder { .. }));
    }

    #[test]
    fn series_rejects_duplicate_dates() {
        let err = BarSeries::new("2330", vec![bar(2, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(matches!(err, BarError::OutOfOrder { .. }));
    }

    #[test]
    fn series_rejects_insane_bar() {
        let mut b = bar(2, 100.0);
        b.low = 150.0;
        let err = BarSeries::new("2330", vec![b]).unwrap_err();
        assert!(matches!(err, BarError::Insane { .. }));
    }

    #[test]
    fn as_of_slicing() {
        let series =
            BarSeries::new("2330", vec![bar(2, 100.0), bar(3, 101.0), bar(5, 102.0)]).unwrap();
        let d4 = NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
        assert_eq!(series.up_to(d4).len(), 2);
        assert_eq!(series.after(d4).len(), 1);
        assert_eq!(series.index_as_of(d4), Some(1));
        assert_eq!(series.index_of(d4), None);
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(series.index_as_of(d1), None);
    }

    #[test]
    fn trailing_days_window() {
        let series =
            BarSeries::new("2330", vec![bar(2, 100.0), bar(3, 101.0), bar(5, 102.0)]).unwrap();
        let recent = series.trailing_days(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent.symbol(), "2330");
        assert!(BarSeries::empty("X").trailing_days(10).is_empty());
    }
}
