// ===============================
// src/resolver.rs (tiered data-source resolver)
// ===============================
//
// Strict sequential fallback: live stats endpoint -> on-disk state snapshot
// -> synthetic generator. `resolve()` is total; every failure is recovered
// locally by degrading one tier, and the terminal tier has no external
// dependency. The snapshot's `origin` tells the operator which tier won.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Args;
use crate::domain::{DashboardSnapshot, Origin, StatsPayload};
use crate::metrics::{RESOLVES, TIER_FAILURES};
use crate::synthetic;

/// Fallible data-source tiers, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Live,
    SnapshotFile,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Live => "live",
            Tier::SnapshotFile => "snapshot_file",
        }
    }
}

const TIER_ORDER: [Tier; 2] = [Tier::Live, Tier::SnapshotFile];

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network failure: {0}")]
    Network(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("parse failure: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("snapshot unavailable: {0}")]
    Unavailable(#[from] std::io::Error),
}

pub struct Resolver {
    http: reqwest::Client,
    stats_url: String,
    snapshot_path: PathBuf,
    synthetic_fills: usize,
}

impl Resolver {
    pub fn new(cfg: &Args) -> Self {
        // The timeout bounds both tier-1 phases (connect + body); on expiry
        // the attempt counts as a network failure and the next tier runs.
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.fetch_timeout_ms))
            .build()
            .expect("reqwest client");
        Self {
            http,
            stats_url: format!("{}/api/stats", cfg.api_base_url.trim_end_matches('/')),
            snapshot_path: PathBuf::from(&cfg.snapshot_path),
            synthetic_fills: cfg.synthetic_fills,
        }
    }

    /// Resolve one snapshot. Never fails; worst case is synthetic data.
    pub async fn resolve(&self) -> DashboardSnapshot {
        let resolved_at = Utc::now();

        for tier in TIER_ORDER {
            match self.attempt(tier, resolved_at).await {
                Ok(snap) => {
                    info!(tier = tier.as_str(), fills = snap.fills.len(), "resolved");
                    RESOLVES.with_label_values(&[snap.origin.as_str()]).inc();
                    return snap;
                }
                Err(e) => {
                    TIER_FAILURES.with_label_values(&[tier.as_str()]).inc();
                    warn!(tier = tier.as_str(), error = %e, "tier failed, degrading");
                }
            }
        }

        let snap = synthetic::generate(self.synthetic_fills, resolved_at);
        RESOLVES.with_label_values(&[snap.origin.as_str()]).inc();
        snap
    }

    async fn attempt(
        &self,
        tier: Tier,
        resolved_at: DateTime<Utc>,
    ) -> Result<DashboardSnapshot, FetchError> {
        match tier {
            Tier::Live => self.fetch_live(resolved_at).await,
            Tier::SnapshotFile => self.read_snapshot_file(resolved_at).await,
        }
    }

    async fn fetch_live(
        &self,
        resolved_at: DateTime<Utc>,
    ) -> Result<DashboardSnapshot, FetchError> {
        let rsp = self.http.get(self.stats_url.as_str()).send().await?;
        if !rsp.status().is_success() {
            return Err(FetchError::Status(rsp.status()));
        }
        let body = rsp.text().await?;
        let payload: StatsPayload = serde_json::from_str(&body)?;
        Ok(payload.into_snapshot(Origin::Live, resolved_at))
    }

    async fn read_snapshot_file(
        &self,
        resolved_at: DateTime<Utc>,
    ) -> Result<DashboardSnapshot, FetchError> {
        let raw = tokio::fs::read_to_string(&self.snapshot_path).await?;
        let payload: StatsPayload = serde_json::from_str(&raw)?;
        Ok(payload.into_snapshot(Origin::SnapshotFile, resolved_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::Window;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn test_args(api_base_url: &str, snapshot_path: &str) -> Args {
        Args {
            api_base_url: api_base_url.to_string(),
            snapshot_path: snapshot_path.to_string(),
            refresh_interval_ms: 5_000,
            fetch_timeout_ms: 1_000,
            synthetic_fills: 25,
            window: Window::H24,
            metrics_port: 0,
        }
    }

    const STATS_BODY: &str = r#"{
        "fills": [{
            "order_id": "f-1", "token_id": "tok-1", "outcome": "YES",
            "side": "BUY", "price": 0.42, "size": 12.0,
            "timestamp": "2025-06-01T10:00:00", "maker": true
        }],
        "positions": {
            "mkt-1": {
                "condition_id": "mkt-1",
                "yes_position": {"quantity": 10.0, "total_cost": 4.2},
                "no_position": {"quantity": 0.0, "total_cost": 0.0}
            }
        },
        "total_maker_volume": 5.04,
        "total_rebates_estimate": 0.00504,
        "last_updated": "2025-06-01T10:05:00"
    }"#;

    /// Serve exactly one canned HTTP response on a loopback port.
    async fn one_shot_http(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut sock, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = sock.read(&mut buf).await;
                let rsp = format!(
                    "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(rsp.as_bytes()).await;
            }
        });
        format!("http://{addr}")
    }

    fn write_temp_snapshot(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("mm_dash_{}_{}.json", name, std::process::id()));
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn live_success_wins_without_touching_later_tiers() {
        let base = one_shot_http("HTTP/1.1 200 OK", STATS_BODY).await;
        // Deliberately missing snapshot file: it must never be consulted
        let resolver = Resolver::new(&test_args(&base, "/definitely/not/here.json"));

        let snap = resolver.resolve().await;
        assert_eq!(snap.origin, Origin::Live);
        assert_eq!(snap.fills.len(), 1);
        assert_eq!(snap.fills[0].order_id, "f-1");
        assert_eq!(snap.positions.len(), 1);
    }

    #[tokio::test]
    async fn non_success_status_falls_back_to_snapshot_file() {
        let base = one_shot_http("HTTP/1.1 500 Internal Server Error", "{}").await;
        let path = write_temp_snapshot("status_fallback", STATS_BODY);
        let resolver = Resolver::new(&test_args(&base, path.to_str().unwrap()));

        let snap = resolver.resolve().await;
        assert_eq!(snap.origin, Origin::SnapshotFile);
        assert_eq!(snap.fills.len(), 1);
        assert!((snap.total_maker_volume - 5.04).abs() < 1e-12);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn unreachable_endpoint_falls_back_to_snapshot_file() {
        // Empty base => relative URL, fails before any network I/O
        let path = write_temp_snapshot("net_fallback", STATS_BODY);
        let resolver = Resolver::new(&test_args("", path.to_str().unwrap()));

        let snap = resolver.resolve().await;
        assert_eq!(snap.origin, Origin::SnapshotFile);
        assert_eq!(snap.fills[0].token_id, "tok-1");
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn both_tiers_failing_terminates_at_synthetic() {
        let before = Utc::now();
        let resolver = Resolver::new(&test_args("", "/definitely/not/here.json"));

        let snap = resolver.resolve().await;
        assert_eq!(snap.origin, Origin::Synthetic);
        assert_eq!(snap.fills.len(), 25);
        // Spacing: strictly increasing, 5-minute steps, ending at call time
        for pair in snap.fills.windows(2) {
            assert_eq!(
                pair[1].timestamp - pair[0].timestamp,
                chrono::Duration::minutes(5)
            );
        }
        let last = snap.fills.last().unwrap().timestamp;
        assert!(last >= before && last <= Utc::now());
    }

    #[tokio::test]
    async fn corrupt_snapshot_file_counts_as_parse_failure() {
        let path = write_temp_snapshot("corrupt", "{ not json");
        let resolver = Resolver::new(&test_args("", path.to_str().unwrap()));

        let snap = resolver.resolve().await;
        assert_eq!(snap.origin, Origin::Synthetic);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn live_payload_with_missing_fields_defaults_empty() {
        let base = one_shot_http("HTTP/1.1 200 OK", "{}").await;
        let resolver = Resolver::new(&test_args(&base, "/nope.json"));

        let before = Utc::now();
        let snap = resolver.resolve().await;
        assert_eq!(snap.origin, Origin::Live);
        assert!(snap.fills.is_empty());
        assert!(snap.positions.is_empty());
        assert_eq!(snap.total_maker_volume, 0.0);
        assert!(snap.as_of >= before, "absent last_updated defaults to resolution time");
    }
}
