//! Candlestick pattern detection.
//!
//! Reads the last five bars plus MA5/MA20 context and emits a labelled,
//! signed strength in [-1, 1]. Rules are evaluated in a fixed order and the
//! first match wins; see [`rules::RULES`].

pub mod candle;
pub mod rules;

use serde::Serialize;

use crate::domain::Bar;
use crate::indicators::{IndicatorSeries, IndicatorSnapshot};

pub use candle::Candle;
pub use rules::{first_match, TrendContext, Window, RULES, WINDOW_BARS};

/// Every label the detector can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    MorningStar,
    EveningStar,
    BullishEngulfing,
    BearishEngulfing,
    PiercingLine,
    DarkCloudCover,
    Hammer,
    HangingMan,
    ShootingStar,
    InvertedHammer,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
    BeakCross,
    WBottom,
    AlignedBullish,
    AlignedBearish,
    ReclaimMa20,
    LoseMa20,
    Range,
    InsufficientData,
}

impl PatternKind {
    /// Signed directional strength.
    pub fn strength(self) -> f64 {
        match self {
            PatternKind::MorningStar => 0.95,
            PatternKind::EveningStar => -0.95,
            PatternKind::BullishEngulfing => 0.9,
            PatternKind::BearishEngulfing => -0.9,
            PatternKind::PiercingLine => 0.8,
            PatternKind::DarkCloudCover => -0.8,
            PatternKind::Hammer => 0.7,
            PatternKind::HangingMan => -0.6,
            PatternKind::ShootingStar => -0.7,
            PatternKind::InvertedHammer => 0.4,
            PatternKind::ThreeWhiteSoldiers => 0.8,
            PatternKind::ThreeBlackCrows => -0.8,
            PatternKind::BeakCross => 0.9,
            PatternKind::WBottom => 0.7,
            PatternKind::AlignedBullish => 0.3,
            PatternKind::AlignedBearish => -0.3,
            PatternKind::ReclaimMa20 => 0.4,
            PatternKind::LoseMa20 => -0.4,
            PatternKind::Range | PatternKind::InsufficientData => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PatternKind::MorningStar => "Morning star [bearish to bullish]",
            PatternKind::EveningStar => "Evening star [bullish to bearish]",
            PatternKind::BullishEngulfing => "Bullish engulfing [reversal up]",
            PatternKind::BearishEngulfing => "Bearish engulfing [reversal down]",
            PatternKind::PiercingLine => "Piercing line [buyers strike back]",
            PatternKind::DarkCloudCover => "Dark cloud cover [sellers press down]",
            PatternKind::Hammer => "Hammer [support at the lows]",
            PatternKind::HangingMan => "Hanging man [distribution at the highs?]",
            PatternKind::ShootingStar => "Shooting star [rejection at the highs]",
            PatternKind::InvertedHammer => "Inverted hammer [testing a rebound]",
            PatternKind::ThreeWhiteSoldiers => "Three white soldiers [uptrend continues]",
            PatternKind::ThreeBlackCrows => "Three black crows [downtrend continues]",
            PatternKind::BeakCross => "Beak cross [MA5 over MA20, trend starting]",
            PatternKind::WBottom => "W-bottom forming [basing signal]",
            PatternKind::AlignedBullish => "Bullish alignment [riding MA5]",
            PatternKind::AlignedBearish => "Bearish alignment [sliding under MA5]",
            PatternKind::ReclaimMa20 => "Reclaimed MA20 [short-term strength]",
            PatternKind::LoseMa20 => "Lost MA20 [short-term weakness]",
            PatternKind::Range => "Range-bound [no clear pattern]",
            PatternKind::InsufficientData => "Insufficient data",
        }
    }

    /// Short tag without the bracketed interpretation.
    pub fn short_label(self) -> &'static str {
        let label = self.label();
        label.split(" [").next().unwrap_or(label)
    }
}

/// Detector output for one instrument at one date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatternCall {
    pub kind: PatternKind,
    pub strength: f64,
}

impl PatternCall {
    pub fn of(kind: PatternKind) -> Self {
        Self {
            kind,
            strength: kind.strength(),
        }
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }
}

impl TrendContext {
    pub fn from_snapshot(snapshot: &IndicatorSnapshot) -> Self {
        Self {
            ma5: snapshot.ma5,
            prev_ma5: snapshot.prev_ma5,
            ma20: snapshot.ma20,
            prev_ma20: snapshot.prev_ma20,
        }
    }
}

/// Detect a pattern on the last bars of `bars`.
///
/// Fewer than five bars yields `InsufficientData` with strength 0.
pub fn detect(bars: &[Bar], ctx: &TrendContext) -> PatternCall {
    match Window::from_bars(bars) {
        Some(window) => PatternCall::of(first_match(&window, ctx)),
        None => PatternCall::of(PatternKind::InsufficientData),
    }
}

/// Detect at bar `index` using a precomputed indicator series.
pub fn detect_at(bars: &[Bar], series: &IndicatorSeries, index: usize) -> PatternCall {
    if index >= bars.len() || index >= series.len() {
        return PatternCall::of(PatternKind::InsufficientData);
    }
    let ctx = TrendContext::from_snapshot(&series.at(index, bars[index].close));
    detect(&bars[..=index], &ctx)
}
