//! Plain-text reports for the messaging gateway.

pub mod sink;

use std::fmt::Write;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::scan::diagnosis::describe_rs;
use crate::scan::{Diagnosis, ScanOutcome};
use crate::trade::GateDecision;

pub use sink::{ArtifactRef, ChartRenderer, MessagingGateway, SinkError};

pub const REMINDERS: &[&str] = &[
    "Reminder: a high score means better odds, not a sure win.",
    "Reminder: beginners die chasing highs, veterans die bottom-fishing.",
    "Reminder: after consecutive losses, size down or stop trading.",
    "Reminder: no position is also a position.",
    "Reminder: the goal is not to be right every time, it is to survive.",
];

/// Reminder line drawn from an explicitly passed RNG.
pub fn reminder<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    REMINDERS.choose(rng).copied().unwrap_or(REMINDERS[0])
}

/// Ranked scan output, or the halt / no-candidate notice.
pub fn format_scan<R: Rng + ?Sized>(outcome: &ScanOutcome, title: &str, rng: &mut R) -> String {
    let context = outcome.context();
    let mut out = String::new();

    if let ScanOutcome::Halted { .. } = outcome {
        let _ = writeln!(out, "MARKET CIRCUIT BREAKER");
        let _ = writeln!(
            out,
            "Regime is {}: risk is extreme. Scanning is suspended; hold cash and wait for a base.",
            context.regime
        );
        return out;
    }

    if context.regime_failed_closed {
        let _ = writeln!(out, "Benchmark unavailable, trade conservatively (assuming RANGE).");
    } else {
        let _ = writeln!(out, "{}", context.profile.commentary());
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{title} (score-ranked)");
    let _ = writeln!(out, "====================");

    match outcome {
        ScanOutcome::Picks { picks, .. } => {
            for pick in picks {
                let c = &pick.candidate;
                let tag = if pick.score.is_exceptional {
                    "A+ setup".to_string()
                } else {
                    format!("style: {}", context.trade_style)
                };
                let gate_tag = if pick.gate == GateDecision::Wait {
                    " (wait for pullback)"
                } else {
                    ""
                };
                let top_pct = ((1.0 - c.rs_rank) * 100.0) as i64;
                let _ = writeln!(out, "#{} {}", pick.rank, c.symbol);
                let _ = writeln!(out, "  {tag}{gate_tag}");
                let _ = writeln!(
                    out,
                    "  Score: {} | Size: {}",
                    pick.score.total as i64,
                    pick.tier.label()
                );
                let _ = writeln!(out, "  Price {:.1} | RS top {}%", c.price, top_pct);
                let _ = writeln!(
                    out,
                    "  Target {:.1} | Stop {:.1}",
                    pick.levels.target, pick.levels.stop
                );
                let _ = writeln!(out);
            }
        }
        _ => {
            let _ = writeln!(
                out,
                "No instruments met the threshold today ({} of {} qualified).",
                context.qualified, context.universe
            );
            let _ = writeln!(out);
        }
    }
    let _ = write!(out, "{}", reminder(rng));
    out
}

pub fn format_diagnosis<R: Rng + ?Sized>(d: &Diagnosis, rng: &mut R) -> String {
    let eps = d
        .eps
        .map(|e| format!("{e:.2}"))
        .unwrap_or_else(|| "N/A".to_string());
    let valuation = match d.pe_valuation {
        Some(pe) => format!("{} | {}", d.valuation.label(), pe.label()),
        None => d.valuation.label().to_string(),
    };
    let rs = d
        .rs
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "-".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "{} diagnosis", d.symbol);
    let _ = writeln!(out, "Price: {:.1} | EPS: {eps}", d.price);
    let _ = writeln!(out, "Trend: {} | {}", d.direction.label(), d.quality.label());
    let _ = writeln!(out, "Pattern: {}", d.pattern.label());
    let _ = writeln!(out, "Value: {valuation}");
    let _ = writeln!(out, "RS: {rs} ({})", describe_rs(d.rs));
    let _ = writeln!(out, "------------------");
    let _ = writeln!(out, "Target: {:.1} | Stop: {:.1}", d.target, d.stop);
    let _ = writeln!(out, "Stop rule: exit at market below {:.1}.", d.stop);
    let _ = writeln!(out, "Advice: {}", d.advice);
    if d.gate != GateDecision::Pass {
        let _ = writeln!(out, "Entry gate: {} ({})", d.gate.as_str(), d.gate.reason());
    }
    let _ = writeln!(out);
    let _ = write!(out, "{}", reminder(rng));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Regime;
    use crate::pattern::{PatternCall, PatternKind};
    use crate::regime::RegimeProfile;
    use crate::rng::{RngHierarchy, REMINDER_SCOPE};
    use crate::scan::diagnosis::{PriceValuation, TrendQuality};
    use crate::scan::{Advice, ScanContext, TrendDirection};

    fn context(regime: Regime) -> ScanContext {
        ScanContext {
            regime,
            regime_failed_closed: false,
            profile: RegimeProfile::for_regime(regime),
            trade_style: crate::trade::trade_style(regime),
            universe: 10,
            qualified: 3,
        }
    }

    #[test]
    fn reminder_is_seeded() {
        let h = RngHierarchy::new(5);
        let a = reminder(&mut h.rng_for(REMINDER_SCOPE, 0));
        let b = reminder(&mut h.rng_for(REMINDER_SCOPE, 0));
        assert_eq!(a, b);
        assert!(REMINDERS.contains(&a));
    }

    #[test]
    fn halted_report() {
        let outcome = ScanOutcome::Halted {
            context: context(Regime::Volatile),
        };
        let text = format_scan(&outcome, "Blue chips", &mut RngHierarchy::new(1).rng_for(REMINDER_SCOPE, 0));
        assert!(text.contains("CIRCUIT BREAKER"));
        assert!(text.contains("VOLATILE"));
    }

    #[test]
    fn no_candidates_report_is_distinct() {
        let outcome = ScanOutcome::NoCandidates {
            context: context(Regime::Range),
        };
        let text = format_scan(&outcome, "Blue chips", &mut RngHierarchy::new(1).rng_for(REMINDER_SCOPE, 0));
        assert!(text.contains("No instruments met the threshold"));
        assert!(text.contains("3 of 10"));
    }

    #[test]
    fn diagnosis_report_mentions_gate() {
        let d = Diagnosis {
            symbol: "AAA".into(),
            price: 120.0,
            eps: None,
            direction: TrendDirection::Bull,
            quality: TrendQuality::Strong,
            adx: 45.0,
            rsi: 70.0,
            volume_ratio: 1.2,
            pattern: PatternCall::of(PatternKind::AlignedBullish),
            valuation_bias: 14.0,
            valuation: PriceValuation::Rich,
            pe_valuation: None,
            rs: Some(1.2),
            target: 130.0,
            stop: 110.0,
            gate: GateDecision::Wait,
            advice: Advice::GateWait,
        };
        let text = format_diagnosis(&d, &mut RngHierarchy::new(1).rng_for(REMINDER_SCOPE, 0));
        assert!(text.contains("EPS: N/A"));
        assert!(text.contains("Entry gate: WAIT"));
        assert!(text.contains("stronger than market"));
    }
}
