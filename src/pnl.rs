// ===============================
// src/pnl.rs (derived metrics from fill records)
// ===============================
//
// Simplified fill-level accounting: flat maker-rebate / taker-fee rates per
// fill, ignoring realized vs. unrealized exposure. This approximation is the
// documented contract of the dashboard, not a placeholder for mark-to-market.

use crate::domain::{AggregateMetrics, Fill, Outcome, OutcomeVolumeSplit, PnlPoint};

pub const MAKER_REBATE_RATE: f64 = 0.001;
pub const TAKER_FEE_RATE: f64 = 0.0025;

/// P&L attributed to a single fill: rebate on maker notional, fee on taker.
pub fn fill_pnl(fill: &Fill) -> f64 {
    if fill.maker {
        fill.notional() * MAKER_REBATE_RATE
    } else {
        -(fill.notional() * TAKER_FEE_RATE)
    }
}

/// Cumulative P&L series, one point per fill, in fill order.
pub fn compute_pnl_series(fills: &[Fill]) -> Vec<PnlPoint> {
    let mut cumulative = 0.0;
    fills
        .iter()
        .map(|f| {
            cumulative += fill_pnl(f);
            PnlPoint { timestamp: f.timestamp, cumulative_pnl: cumulative }
        })
        .collect()
}

/// Volume and rebate totals over ALL fills (maker and taker alike), computed
/// from scratch on every call.
pub fn compute_aggregates(fills: &[Fill]) -> AggregateMetrics {
    let total_maker_volume: f64 = fills.iter().map(Fill::notional).sum();
    AggregateMetrics {
        total_maker_volume,
        total_rebate_estimate: total_maker_volume * MAKER_REBATE_RATE,
    }
}

/// Notional volume partitioned by outcome.
pub fn compute_outcome_volume_split(fills: &[Fill]) -> OutcomeVolumeSplit {
    let mut split = OutcomeVolumeSplit::default();
    for f in fills {
        match f.outcome {
            Outcome::Yes => split.yes += f.notional(),
            Outcome::No => split.no += f.notional(),
        }
    }
    split
}
