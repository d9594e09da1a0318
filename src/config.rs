// ===============================
// src/config.rs
// ===============================
use std::env;

use dotenvy::dotenv;

use crate::window::Window;

/// Runtime configuration, read once at startup.
///
/// ENV:
///   API_BASE_URL        base URL of the bot's stats API (default "")
///   SNAPSHOT_PATH       on-disk state snapshot fallback (default "../state.json")
///   REFRESH_INTERVAL_MS periodic resolution interval (default 5000)
///   FETCH_TIMEOUT_MS    per-attempt network bound (default 3000)
///   SYNTHETIC_FILLS     fill count for the synthetic tier (default 25)
///   WINDOW              1h | 24h | 7d (default 24h)
///   METRICS_PORT        Prometheus port (default 9898)
#[derive(Clone, Debug)]
pub struct Args {
    pub api_base_url: String,
    pub snapshot_path: String,
    pub refresh_interval_ms: u64,
    pub fetch_timeout_ms: u64,
    pub synthetic_fills: usize,
    pub window: Window,
    pub metrics_port: u16,
}

pub fn load() -> Args {
    // Make sure .env is read so local overrides apply
    let _ = dotenv();

    let api_base_url = env::var("API_BASE_URL").unwrap_or_default();
    let snapshot_path =
        env::var("SNAPSHOT_PATH").unwrap_or_else(|_| "../state.json".to_string());

    let refresh_interval_ms = env::var("REFRESH_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5_000);
    let fetch_timeout_ms = env::var("FETCH_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3_000);
    let synthetic_fills = env::var("SYNTHETIC_FILLS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(25);

    let window = env::var("WINDOW")
        .ok()
        .and_then(|s| Window::parse_one(&s))
        .unwrap_or(Window::H24);

    let metrics_port = env::var("METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9898);

    Args {
        api_base_url,
        snapshot_path,
        refresh_interval_ms,
        fetch_timeout_ms,
        synthetic_fills,
        window,
        metrics_port,
    }
}
