//! Single-candle geometry.

use crate::domain::Bar;

/// Body and shadow measurements of one bar.
pub trait Candle {
    fn body(&self) -> f64;
    fn upper_shadow(&self) -> f64;
    fn lower_shadow(&self) -> f64;
    /// Close above open.
    fn is_bull(&self) -> bool;
    /// Close below open.
    fn is_bear(&self) -> bool;
    /// Open/close midpoint of the body.
    fn body_mid(&self) -> f64;
}

impl Candle for Bar {
    fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    fn upper_shadow(&self) -> f64 {
        self.high - self.close.max(self.open)
    }

    fn lower_shadow(&self) -> f64 {
        self.close.min(self.open) - self.low
    }

    fn is_bull(&self) -> bool {
        self.close > self.open
    }

    fn is_bear(&self) -> bool {
        self.close < self.open
    }

    fn body_mid(&self) -> f64 {
        (self.open + self.close) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;

    #[test]
    fn hammer_geometry() {
        let bar = make_ohlc_bars(&[(10.0, 10.6, 7.0, 10.5)])[0];
        assert!((bar.body() - 0.5).abs() < 1e-12);
        assert!((bar.upper_shadow() - 0.1).abs() < 1e-12);
        assert!((bar.lower_shadow() - 3.0).abs() < 1e-12);
        assert!(bar.is_bull());
        assert!(!bar.is_bear());
    }

    #[test]
    fn doji_is_neither_color() {
        let bar = make_ohlc_bars(&[(10.0, 11.0, 9.0, 10.0)])[0];
        assert!(!bar.is_bull());
        assert!(!bar.is_bear());
        assert_eq!(bar.body(), 0.0);
    }
}
