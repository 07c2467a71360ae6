//! Ordered pattern rule cascade. The first matching rule wins.

use super::candle::Candle;
use super::PatternKind;
use crate::domain::Bar;

/// Bars the detector needs. Only the last three are inspected by rules;
/// all five feed the average body.
pub const WINDOW_BARS: usize = 5;

/// Average body used when the last five bodies are all zero.
const ZERO_BODY_FLOOR: f64 = 0.1;

/// Last three bars (t0 = most recent) and the five-bar average body.
#[derive(Debug, Clone, Copy)]
pub struct Window {
    pub t0: Bar,
    pub t1: Bar,
    pub t2: Bar,
    pub avg_body: f64,
}

impl Window {
    /// Returns `None` with fewer than five bars.
    pub fn from_bars(bars: &[Bar]) -> Option<Self> {
        if bars.len() < WINDOW_BARS {
            return None;
        }
        let tail = &bars[bars.len() - WINDOW_BARS..];
        let mut avg_body = tail.iter().map(Candle::body).sum::<f64>() / WINDOW_BARS as f64;
        if avg_body == 0.0 {
            avg_body = ZERO_BODY_FLOOR;
        }
        Some(Self {
            t0: tail[4],
            t1: tail[3],
            t2: tail[2],
            avg_body,
        })
    }
}

/// Short and medium moving averages at t0 and t1.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrendContext {
    pub ma5: Option<f64>,
    pub prev_ma5: Option<f64>,
    pub ma20: Option<f64>,
    pub prev_ma20: Option<f64>,
}

impl TrendContext {
    /// Close above MA20. False when MA20 is undefined.
    fn above_ma20(&self, close: f64) -> bool {
        self.ma20.is_some_and(|m| close > m)
    }

    fn below_ma20(&self, close: f64) -> bool {
        self.ma20.is_some_and(|m| close < m)
    }
}

pub struct Rule {
    pub kind: PatternKind,
    pub matches: fn(&Window, &TrendContext) -> bool,
}

fn morning_star(w: &Window, _: &TrendContext) -> bool {
    w.t2.is_bear()
        && w.t2.body() > w.avg_body
        && w.t1.body() < w.avg_body * 0.5
        && w.t1.close < w.t2.close
        && w.t0.is_bull()
        && w.t0.close > w.t2.body_mid()
}

fn evening_star(w: &Window, _: &TrendContext) -> bool {
    w.t2.is_bull()
        && w.t2.body() > w.avg_body
        && w.t1.body() < w.avg_body * 0.5
        && w.t1.close > w.t2.close
        && w.t0.is_bear()
        && w.t0.close < w.t2.body_mid()
}

fn bullish_engulfing(w: &Window, _: &TrendContext) -> bool {
    w.t1.is_bear() && w.t0.is_bull() && w.t0.close > w.t1.open && w.t0.open < w.t1.close
}

fn bearish_engulfing(w: &Window, _: &TrendContext) -> bool {
    w.t1.is_bull() && w.t0.is_bear() && w.t0.close < w.t1.open && w.t0.open > w.t1.close
}

fn piercing_line(w: &Window, _: &TrendContext) -> bool {
    w.t1.is_bear() && w.t0.is_bull() && w.t0.open < w.t1.low && w.t0.close > w.t1.body_mid()
}

fn dark_cloud_cover(w: &Window, _: &TrendContext) -> bool {
    w.t1.is_bull() && w.t0.is_bear() && w.t0.open > w.t1.high && w.t0.close < w.t1.body_mid()
}

fn long_lower_shadow(bar: &Bar) -> bool {
    bar.lower_shadow() > 2.0 * bar.body() && bar.upper_shadow() < bar.body() * 0.2
}

fn long_upper_shadow(bar: &Bar) -> bool {
    bar.upper_shadow() > 2.0 * bar.body() && bar.lower_shadow() < bar.body() * 0.2
}

fn hammer(w: &Window, ctx: &TrendContext) -> bool {
    long_lower_shadow(&w.t0) && ctx.below_ma20(w.t0.close)
}

fn hanging_man(w: &Window, ctx: &TrendContext) -> bool {
    long_lower_shadow(&w.t0) && ctx.above_ma20(w.t0.close)
}

fn shooting_star(w: &Window, ctx: &TrendContext) -> bool {
    long_upper_shadow(&w.t0) && ctx.above_ma20(w.t0.close)
}

fn inverted_hammer(w: &Window, ctx: &TrendContext) -> bool {
    long_upper_shadow(&w.t0) && ctx.below_ma20(w.t0.close)
}

fn three_white_soldiers(w: &Window, _: &TrendContext) -> bool {
    w.t0.is_bull()
        && w.t1.is_bull()
        && w.t2.is_bull()
        && w.t0.close > w.t1.close
        && w.t1.close > w.t2.close
}

fn three_black_crows(w: &Window, _: &TrendContext) -> bool {
    w.t0.is_bear()
        && w.t1.is_bear()
        && w.t2.is_bear()
        && w.t0.close < w.t1.close
        && w.t1.close < w.t2.close
}

/// MA5 crosses above MA20 with both averages rising.
fn beak_cross(_: &Window, ctx: &TrendContext) -> bool {
    match (ctx.ma5, ctx.prev_ma5, ctx.ma20, ctx.prev_ma20) {
        (Some(ma5), Some(prev_ma5), Some(ma20), Some(prev_ma20)) => {
            prev_ma5 <= prev_ma20 && ma5 > ma20 && ma5 > prev_ma5 && ma20 > prev_ma20
        }
        _ => false,
    }
}

fn w_bottom(w: &Window, ctx: &TrendContext) -> bool {
    w.t0.is_bull()
        && w.t1.is_bear()
        && w.t2.is_bull()
        && w.t0.low > w.t2.low
        && ctx.below_ma20(w.t0.close)
}

fn aligned_bullish(w: &Window, ctx: &TrendContext) -> bool {
    match (ctx.ma5, ctx.ma20) {
        (Some(ma5), Some(ma20)) => w.t0.close > ma5 && ma5 > ma20,
        _ => false,
    }
}

fn aligned_bearish(w: &Window, ctx: &TrendContext) -> bool {
    match (ctx.ma5, ctx.ma20) {
        (Some(ma5), Some(ma20)) => w.t0.close < ma5 && ma5 < ma20,
        _ => false,
    }
}

fn reclaim_ma20(w: &Window, ctx: &TrendContext) -> bool {
    ctx.above_ma20(w.t0.close) && ctx.prev_ma20.is_some_and(|p| w.t1.close <= p)
}

fn lose_ma20(w: &Window, ctx: &TrendContext) -> bool {
    ctx.below_ma20(w.t0.close) && ctx.prev_ma20.is_some_and(|p| w.t1.close >= p)
}

/// Reversal triads, two-bar patterns, single-bar shadows, continuation
/// triads, moving-average structure.
pub static RULES: &[Rule] = &[
    Rule { kind: PatternKind::MorningStar, matches: morning_star },
    Rule { kind: PatternKind::EveningStar, matches: evening_star },
    Rule { kind: PatternKind::BullishEngulfing, matches: bullish_engulfing },
    Rule { kind: PatternKind::BearishEngulfing, matches: bearish_engulfing },
    Rule { kind: PatternKind::PiercingLine, matches: piercing_line },
    Rule { kind: PatternKind::DarkCloudCover, matches: dark_cloud_cover },
    Rule { kind: PatternKind::Hammer, matches: hammer },
    Rule { kind: PatternKind::HangingMan, matches: hanging_man },
    Rule { kind: PatternKind::ShootingStar, matches: shooting_star },
    Rule { kind: PatternKind::InvertedHammer, matches: inverted_hammer },
    Rule { kind: PatternKind::ThreeWhiteSoldiers, matches: three_white_soldiers },
    Rule { kind: PatternKind::ThreeBlackCrows, matches: three_black_crows },
    Rule { kind: PatternKind::BeakCross, matches: beak_cross },
    Rule { kind: PatternKind::WBottom, matches: w_bottom },
    Rule { kind: PatternKind::AlignedBullish, matches: aligned_bullish },
    Rule { kind: PatternKind::AlignedBearish, matches: aligned_bearish },
    Rule { kind: PatternKind::ReclaimMa20, matches: reclaim_ma20 },
    Rule { kind: PatternKind::LoseMa20, matches: lose_ma20 },
];

/// First matching rule, or `Range` when none fires.
pub fn first_match(window: &Window, ctx: &TrendContext) -> PatternKind {
    RULES
        .iter()
        .find(|rule| (rule.matches)(window, ctx))
        .map(|rule| rule.kind)
        .unwrap_or(PatternKind::Range)
}
