//! Single-instrument diagnosis: trend, pattern, valuation, relative
//! strength, levels, gate and a plain-language advice line.

use std::fmt;

use serde::Serialize;

use super::{ATR_FALLBACK_FRACTION, RSI_FALLBACK};
use crate::data::MarketDataProvider;
use crate::domain::Symbol;
use crate::indicators::IndicatorSeries;
use crate::pattern::{detect_at, PatternCall, PatternKind};
use crate::scoring::relative_strength;
use crate::trade::levels::{atr_stop, atr_target, tighten_to_ma20};
use crate::trade::{bias_pct, EntryGate, GateDecision};

/// Bars needed for MA20, the shortest input a diagnosis cannot do without.
pub const MIN_DIAGNOSIS_BARS: usize = 20;

const STOP_ATR_MULTIPLE: f64 = 1.5;
const TARGET_ATR_MULTIPLE: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Bull,
    Bear,
    Sideways,
}

impl TrendDirection {
    pub fn classify(ma20: f64, ma60: f64, slope: f64) -> Self {
        if ma20 > ma60 && slope > 0.0 {
            TrendDirection::Bull
        } else if ma20 < ma60 && slope < 0.0 {
            TrendDirection::Bear
        } else {
            TrendDirection::Sideways
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrendDirection::Bull => "bullish",
            TrendDirection::Bear => "bearish",
            TrendDirection::Sideways => "sideways",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendQuality {
    Ranging,
    Established,
    Strong,
}

impl TrendQuality {
    pub fn from_adx(adx: f64) -> Self {
        if adx < 20.0 {
            TrendQuality::Ranging
        } else if adx > 40.0 {
            TrendQuality::Strong
        } else {
            TrendQuality::Established
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrendQuality::Ranging => "ranging",
            TrendQuality::Established => "established",
            TrendQuality::Strong => "strong",
        }
    }
}

/// Technical valuation from the distance to MA60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PriceValuation {
    Overheated,
    Rich,
    Fair,
    Cheap,
    Oversold,
}

impl PriceValuation {
    pub fn from_bias(bias_pct: f64) -> Self {
        if bias_pct > 20.0 {
            PriceValuation::Overheated
        } else if bias_pct < -15.0 {
            PriceValuation::Oversold
        } else if bias_pct > 10.0 {
            PriceValuation::Rich
        } else if bias_pct < -5.0 {
            PriceValuation::Cheap
        } else {
            PriceValuation::Fair
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceValuation::Overheated => "overheated (expensive)",
            PriceValuation::Rich => "slightly rich",
            PriceValuation::Fair => "fair",
            PriceValuation::Cheap => "slightly cheap",
            PriceValuation::Oversold => "oversold (cheap)",
        }
    }
}

/// Earnings valuation from P/E.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PeValuation {
    Undervalued,
    Fair,
    Overvalued,
}

impl PeValuation {
    /// `None` for P/E values with no verdict (15..=40) or non-finite input.
    pub fn from_pe(pe: f64) -> Option<Self> {
        if !pe.is_finite() {
            None
        } else if pe < 10.0 {
            Some(PeValuation::Undervalued)
        } else if pe > 40.0 {
            Some(PeValuation::Overvalued)
        } else if pe < 15.0 {
            Some(PeValuation::Fair)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PeValuation::Undervalued => "P/E undervalued",
            PeValuation::Fair => "P/E fair",
            PeValuation::Overvalued => "P/E overvalued",
        }
    }
}

/// Relative strength versus the benchmark, in words.
pub fn describe_rs(rs: Option<f64>) -> &'static str {
    match rs {
        None => "no data",
        Some(v) if v > 1.05 => "stronger than market",
        Some(v) if v < 0.95 => "weaker than market",
        Some(_) => "in line with market",
    }
}

/// Advice cascade outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Advice {
    BearishPatternInUptrend(PatternKind),
    ValuationOverheated,
    GateBanned,
    GateWait,
    EntryEmerging(PatternKind),
    Consolidating,
    LaggingMarket,
    HealthyMomentum,
    FollowMa20,
    BearRally(PatternKind),
    Downtrend,
    RangeBreakingUp(PatternKind),
    NoDirection,
}

impl fmt::Display for Advice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advice::BearishPatternInUptrend(p) => write!(
                f,
                "Caution: trend is up but {} printed, watch for a pullback",
                p.short_label()
            ),
            Advice::ValuationOverheated => write!(f, "Valuation overheated, do not chase"),
            Advice::GateBanned => write!(f, "Momentum overheated, no entry"),
            Advice::GateWait => write!(f, "Stretched above MA20, hold off for now"),
            Advice::EntryEmerging(p) => write!(f, "Entry emerging ({})", p.short_label()),
            Advice::Consolidating => write!(f, "Consolidating, watch more and trade less"),
            Advice::LaggingMarket => write!(f, "Lagging the market, risk of catching down"),
            Advice::HealthyMomentum => write!(f, "Healthy price and volume, look for an entry"),
            Advice::FollowMa20 => write!(f, "Trade along MA20"),
            Advice::BearRally(p) => write!(
                f,
                "Bear-market bounce ({}), short-term only for experienced traders",
                p.short_label()
            ),
            Advice::Downtrend => write!(f, "Trend is down, do not catch the falling knife"),
            Advice::RangeBreakingUp(p) => write!(
                f,
                "Range turning stronger ({}), experienced traders may probe",
                p.short_label()
            ),
            Advice::NoDirection => write!(f, "Direction unclear, stand aside"),
        }
    }
}

/// Inputs to the advice cascade.
#[derive(Debug, Clone, Copy)]
pub struct AdviceInputs {
    pub direction: TrendDirection,
    pub pattern: PatternCall,
    pub valuation: PriceValuation,
    pub gate: GateDecision,
    pub adx: f64,
    pub rs: Option<f64>,
    pub rsi: f64,
}

pub fn advise(inputs: &AdviceInputs) -> Advice {
    let strength = inputs.pattern.strength;
    let kind = inputs.pattern.kind;
    match inputs.direction {
        TrendDirection::Bull => {
            if strength <= -0.5 {
                Advice::BearishPatternInUptrend(kind)
            } else if inputs.valuation == PriceValuation::Overheated {
                Advice::ValuationOverheated
            } else if inputs.gate == GateDecision::Ban {
                Advice::GateBanned
            } else if inputs.gate == GateDecision::Wait {
                Advice::GateWait
            } else if strength > 0.0 {
                Advice::EntryEmerging(kind)
            } else if inputs.adx < 20.0 {
                Advice::Consolidating
            } else if inputs.rs.is_some_and(|rs| rs < 0.95) {
                Advice::LaggingMarket
            } else if (60.0..=75.0).contains(&inputs.rsi) {
                Advice::HealthyMomentum
            } else {
                Advice::FollowMa20
            }
        }
        TrendDirection::Bear => {
            if strength > 0.5 {
                Advice::BearRally(kind)
            } else {
                Advice::Downtrend
            }
        }
        TrendDirection::Sideways => {
            if strength > 0.5 {
                Advice::RangeBreakingUp(kind)
            } else {
                Advice::NoDirection
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnosis {
    pub symbol: Symbol,
    pub price: f64,
    pub eps: Option<f64>,
    pub direction: TrendDirection,
    pub quality: TrendQuality,
    pub adx: f64,
    pub rsi: f64,
    pub volume_ratio: f64,
    pub pattern: PatternCall,
    /// Percent distance from MA60 (MA20 when MA60 is unavailable).
    pub valuation_bias: f64,
    pub valuation: PriceValuation,
    pub pe_valuation: Option<PeValuation>,
    pub rs: Option<f64>,
    pub target: f64,
    pub stop: f64,
    pub gate: GateDecision,
    pub advice: Advice,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DiagnosisOutcome {
    Ready(Box<Diagnosis>),
    /// Provider returned no bars.
    NoData { symbol: Symbol },
    InsufficientHistory {
        symbol: Symbol,
        available: usize,
        required: usize,
    },
}

/// Diagnose one instrument as of its latest bar.
pub fn diagnose<P: MarketDataProvider>(
    provider: &P,
    symbol: &str,
    lookback_days: usize,
    gate: &EntryGate,
) -> DiagnosisOutcome {
    let series = provider.get_bars(symbol, lookback_days);
    if series.is_empty() {
        return DiagnosisOutcome::NoData {
            symbol: symbol.to_string(),
        };
    }
    let bars = series.bars();
    let indicators = IndicatorSeries::compute(bars);
    let index = bars.len() - 1;
    let price = bars[index].close;
    let snap = indicators.at(index, price);
    let Some(ma20) = snap.ma20 else {
        return DiagnosisOutcome::InsufficientHistory {
            symbol: symbol.to_string(),
            available: bars.len(),
            required: MIN_DIAGNOSIS_BARS,
        };
    };

    let ma60 = snap.ma60.unwrap_or(ma20);
    let slope = snap.slope.unwrap_or(0.0);
    let rsi = snap.rsi14.unwrap_or(RSI_FALLBACK);
    let adx = snap.adx14.unwrap_or(0.0);
    let atr = snap
        .atr14
        .filter(|a| *a > 0.0)
        .unwrap_or(price * ATR_FALLBACK_FRACTION);
    let volume_ratio = snap.volume_ratio.unwrap_or(1.0);

    let benchmark = provider.get_benchmark(lookback_days);
    let bench_return = IndicatorSeries::compute(benchmark.bars())
        .latest(benchmark.bars())
        .and_then(|s| s.return20);
    let rs = relative_strength(snap.return20, bench_return);

    let fundamentals = provider.get_fundamentals(symbol);
    let pattern = detect_at(bars, &indicators, index);
    let direction = TrendDirection::classify(ma20, ma60, slope);

    let valuation_bias = bias_pct(price, Some(ma60)).unwrap_or(0.0);
    let valuation = PriceValuation::from_bias(valuation_bias);
    let decision = gate.decide_for(price, Some(ma20), rsi);

    let stop = tighten_to_ma20(
        atr_stop(price, atr, STOP_ATR_MULTIPLE),
        Some(ma20),
        price,
        direction == TrendDirection::Bull,
    );

    let advice = advise(&AdviceInputs {
        direction,
        pattern,
        valuation,
        gate: decision,
        adx,
        rs,
        rsi,
    });

    DiagnosisOutcome::Ready(Box::new(Diagnosis {
        symbol: symbol.to_string(),
        price,
        eps: fundamentals.eps_from_price(price),
        direction,
        quality: TrendQuality::from_adx(adx),
        adx,
        rsi,
        volume_ratio,
        pattern,
        valuation_bias,
        valuation,
        pe_valuation: fundamentals.pe_ratio.and_then(PeValuation::from_pe),
        rs,
        target: atr_target(price, atr, TARGET_ATR_MULTIPLE),
        stop,
        gate: decision,
        advice,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Fundamentals, InMemoryProvider};
    use crate::domain::BarSeries;
    use crate::indicators::make_bars;

    fn provider_with(closes: &[f64]) -> InMemoryProvider {
        let bench = BarSeries::new("BENCH", make_bars(&vec![100.0; closes.len()])).unwrap();
        let inst = BarSeries::new("AAA", make_bars(closes)).unwrap();
        InMemoryProvider::new(bench)
            .with_series(inst)
            .with_fundamentals("AAA", Fundamentals::with_pe(8.0))
    }

    fn bull() -> PatternCall {
        PatternCall::of(PatternKind::Hammer)
    }

    fn inputs(direction: TrendDirection, pattern: PatternCall) -> AdviceInputs {
        AdviceInputs {
            direction,
            pattern,
            valuation: PriceValuation::Fair,
            gate: GateDecision::Pass,
            adx: 30.0,
            rs: Some(1.1),
            rsi: 50.0,
        }
    }

    #[test]
    fn no_data_and_short_history() {
        let provider = provider_with(&[10.0; 10]);
        assert!(matches!(
            diagnose(&provider, "ZZZ", 400, &EntryGate::default()),
            DiagnosisOutcome::NoData { .. }
        ));
        assert!(matches!(
            diagnose(&provider, "AAA", 400, &EntryGate::default()),
            DiagnosisOutcome::InsufficientHistory { available: 10, .. }
        ));
    }

    #[test]
    fn uptrend_diagnosis() {
        let closes: Vec<f64> = (0..90).map(|i| 100.0 + i as f64 * 0.5).collect();
        let provider = provider_with(&closes);
        let DiagnosisOutcome::Ready(d) = diagnose(&provider, "AAA", 400, &EntryGate::default())
        else {
            panic!("expected a diagnosis");
        };
        assert_eq!(d.direction, TrendDirection::Bull);
        assert_eq!(d.eps, Some(d.price / 8.0));
        assert_eq!(d.pe_valuation, Some(PeValuation::Undervalued));
        assert!(d.stop < d.price && d.price < d.target);
        assert!(d.rs.unwrap() > 1.05);
        assert_eq!(describe_rs(d.rs), "stronger than market");
    }

    #[test]
    fn advice_bull_cascade_order() {
        let mut i = inputs(TrendDirection::Bull, PatternCall::of(PatternKind::ShootingStar));
        assert!(matches!(advise(&i), Advice::BearishPatternInUptrend(_)));

        i.pattern = bull();
        i.valuation = PriceValuation::Overheated;
        i.gate = GateDecision::Ban;
        assert_eq!(advise(&i), Advice::ValuationOverheated);

        i.valuation = PriceValuation::Fair;
        assert_eq!(advise(&i), Advice::GateBanned);

        i.gate = GateDecision::Wait;
        assert_eq!(advise(&i), Advice::GateWait);

        i.gate = GateDecision::Pass;
        assert_eq!(advise(&i), Advice::EntryEmerging(PatternKind::Hammer));

        i.pattern = PatternCall::of(PatternKind::Range);
        i.adx = 15.0;
        assert_eq!(advise(&i), Advice::Consolidating);

        i.adx = 30.0;
        i.rs = Some(0.9);
        assert_eq!(advise(&i), Advice::LaggingMarket);

        i.rs = None;
        i.rsi = 70.0;
        assert_eq!(advise(&i), Advice::HealthyMomentum);

        i.rsi = 80.0;
        assert_eq!(advise(&i), Advice::FollowMa20);
    }

    #[test]
    fn advice_bear_and_sideways() {
        let strong = PatternCall::of(PatternKind::MorningStar);
        let weak = PatternCall::of(PatternKind::InvertedHammer);
        assert_eq!(
            advise(&inputs(TrendDirection::Bear, strong)),
            Advice::BearRally(PatternKind::MorningStar)
        );
        assert_eq!(advise(&inputs(TrendDirection::Bear, weak)), Advice::Downtrend);
        assert_eq!(advise(&inputs(TrendDirection::Sideways, weak)), Advice::NoDirection);
        assert!(advise(&inputs(TrendDirection::Sideways, strong))
            .to_string()
            .contains("Morning star"));
    }

    #[test]
    fn valuation_bands() {
        assert_eq!(PriceValuation::from_bias(25.0), PriceValuation::Overheated);
        assert_eq!(PriceValuation::from_bias(15.0), PriceValuation::Rich);
        assert_eq!(PriceValuation::from_bias(0.0), PriceValuation::Fair);
        assert_eq!(PriceValuation::from_bias(-10.0), PriceValuation::Cheap);
        assert_eq!(PriceValuation::from_bias(-20.0), PriceValuation::Oversold);
        assert_eq!(PeValuation::from_pe(20.0), None);
        assert_eq!(PeValuation::from_pe(12.0), Some(PeValuation::Fair));
        assert_eq!(PeValuation::from_pe(50.0), Some(PeValuation::Overvalued));
    }
}
