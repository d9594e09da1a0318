// ===============================
// src/domain.rs
// ===============================
use ahash::AHashMap as HashMap;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome { Yes, No }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side { Buy, Sell }

/// One matched trade. Immutable once received; fills are ordered by
/// `timestamp`, which is not guaranteed unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: String,
    pub token_id: String,
    pub outcome: Outcome,
    pub side: Side,
    pub price: f64,
    pub size: f64,
    #[serde(with = "ts")]
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_maker")]
    pub maker: bool,
}

fn default_maker() -> bool { true }

impl Fill {
    /// USDC value of the fill.
    pub fn notional(&self) -> f64 { self.price * self.size }
}

/// Exposure in one outcome token of a market.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExposureLeg {
    #[serde(default)]
    pub quantity: f64,
    #[serde(default)]
    pub total_cost: f64,
}

impl ExposureLeg {
    pub fn avg_cost(&self) -> f64 {
        if self.quantity > 0.0 { self.total_cost / self.quantity } else { 0.0 }
    }
}

/// Combined YES and NO exposure for a market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketPosition {
    pub condition_id: String,
    #[serde(default)]
    pub yes_position: ExposureLeg,
    #[serde(default)]
    pub no_position: ExposureLeg,
}

impl MarketPosition {
    pub fn total_cost(&self) -> f64 {
        self.yes_position.total_cost + self.no_position.total_cost
    }
}

/// Which data-source tier produced the current snapshot. Always set, and
/// surfaced to the operator so synthetic data is never mistaken for live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Origin {
    Live,
    SnapshotFile,
    #[default]
    Synthetic,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Live => "live",
            Origin::SnapshotFile => "snapshot_file",
            Origin::Synthetic => "synthetic",
        }
    }
}

/// The resolved raw payload for one refresh cycle. Fully replaces the prior
/// snapshot; `as_of` may move backwards when a fallback tier returns older
/// data, so callers must not assume monotonicity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardSnapshot {
    pub fills: Vec<Fill>,
    pub positions: HashMap<String, MarketPosition>,
    pub total_maker_volume: f64,
    pub total_rebates_estimate: f64,
    pub as_of: DateTime<Utc>,
    pub origin: Origin,
}

/// One point of the cumulative P&L series, one per fill, in fill order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PnlPoint {
    pub timestamp: DateTime<Utc>,
    pub cumulative_pnl: f64,
}

/// Derived totals, always recomputed in full from the current fills.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AggregateMetrics {
    pub total_maker_volume: f64,
    pub total_rebate_estimate: f64,
}

/// Notional volume partitioned by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OutcomeVolumeSplit {
    pub yes: f64,
    pub no: f64,
}

// ---- Wire payload (/api/stats and the state.json snapshot file) ----

/// Raw stats body as served by the bot. Every top-level field is optional:
/// absent sequences/mappings parse as empty, absent totals as zero, absent
/// `last_updated` as the resolution time (filled in by `into_snapshot`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsPayload {
    #[serde(default)]
    pub fills: Vec<Fill>,
    #[serde(default)]
    pub positions: HashMap<String, MarketPosition>,
    #[serde(default)]
    pub total_maker_volume: f64,
    #[serde(default)]
    pub total_rebates_estimate: f64,
    #[serde(default, with = "ts_opt")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl StatsPayload {
    pub fn into_snapshot(self, origin: Origin, resolved_at: DateTime<Utc>) -> DashboardSnapshot {
        DashboardSnapshot {
            fills: self.fills,
            positions: self.positions,
            total_maker_volume: self.total_maker_volume,
            total_rebates_estimate: self.total_rebates_estimate,
            as_of: self.last_updated.unwrap_or(resolved_at),
            origin,
        }
    }
}

/// Parse an ISO-8601 instant. The bot serializes with Python's
/// `datetime.utcnow().isoformat()`, which carries no offset, so naive
/// timestamps are read as UTC alongside proper RFC 3339.
pub fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

mod ts {
    use super::*;
    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse_instant(&raw).ok_or_else(|| de::Error::custom(format!("bad timestamp: {raw}")))
    }
}

mod ts_opt {
    use super::*;
    use serde::{de, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(d)? {
            None => Ok(None),
            Some(raw) => parse_instant(&raw)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("bad last_updated: {raw}"))),
        }
    }
}
