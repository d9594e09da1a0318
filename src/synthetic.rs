// ===============================
// src/synthetic.rs (tier-3 demo snapshot generator)
// ===============================
//
// Terminal fallback: when both the live endpoint and the state file are
// unavailable, the operator still gets a plausibly-shaped dashboard. The
// fills are random but the shape is deterministic: fixed count, fixed
// 5-minute spacing ending at the resolution instant, maker-only.

use ahash::AHashMap as HashMap;
use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::domain::{
    DashboardSnapshot, ExposureLeg, Fill, MarketPosition, Origin, Outcome, Side,
};
use crate::pnl::MAKER_REBATE_RATE;

pub const DEFAULT_FILL_COUNT: usize = 25;
const FILL_SPACING: i64 = 5; // minutes
const PRICE_BAND: (f64, f64) = (0.30, 0.70); // prediction-market-ish pricing
const SIZE_BAND: (f64, f64) = (5.0, 50.0);

pub fn generate(fill_count: usize, now: DateTime<Utc>) -> DashboardSnapshot {
    let mut rng = rand::thread_rng();

    let mut fills = Vec::with_capacity(fill_count);
    for i in 0..fill_count {
        let steps_back = (fill_count - 1 - i) as i64;
        let timestamp = now - Duration::minutes(FILL_SPACING * steps_back);
        fills.push(Fill {
            order_id: format!("demo-{i:04}"),
            token_id: format!("demo-token-{}", i % 3),
            outcome: if rng.gen_bool(0.5) { Outcome::Yes } else { Outcome::No },
            side: if rng.gen_bool(0.5) { Side::Buy } else { Side::Sell },
            price: rng.gen_range(PRICE_BAND.0..PRICE_BAND.1),
            size: rng.gen_range(SIZE_BAND.0..SIZE_BAND.1),
            timestamp,
            maker: true,
        });
    }

    let total_maker_volume: f64 = fills.iter().map(Fill::notional).sum();

    DashboardSnapshot {
        fills,
        positions: demo_positions(),
        total_maker_volume,
        total_rebates_estimate: total_maker_volume * MAKER_REBATE_RATE,
        as_of: now,
        origin: Origin::Synthetic,
    }
}

/// Small fixed set of illustrative positions.
fn demo_positions() -> HashMap<String, MarketPosition> {
    let mut positions = HashMap::new();
    positions.insert(
        "demo-market-a".to_string(),
        MarketPosition {
            condition_id: "demo-market-a".to_string(),
            yes_position: ExposureLeg { quantity: 120.0, total_cost: 54.0 },
            no_position: ExposureLeg { quantity: 80.0, total_cost: 36.8 },
        },
    );
    positions.insert(
        "demo-market-b".to_string(),
        MarketPosition {
            condition_id: "demo-market-b".to_string(),
            yes_position: ExposureLeg { quantity: 40.0, total_cost: 26.0 },
            no_position: ExposureLeg { quantity: 55.0, total_cost: 19.25 },
        },
    );
    positions
}
