// ===============================
// src/window.rs (trailing time-window filter)
// ===============================
use chrono::{DateTime, Duration, Utc};

use crate::domain::PnlPoint;

/// Trailing time range used to scope the P&L series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    H1,
    H24,
    D7,
}

impl Window {
    pub fn parse_one(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1h" => Some(Window::H1),
            "24h" | "1d" => Some(Window::H24),
            "7d" | "1w" => Some(Window::D7),
            _ => None,
        }
    }

    pub fn millis(&self) -> i64 {
        match self {
            Window::H1 => 3_600_000,
            Window::H24 => 86_400_000,
            Window::D7 => 604_800_000,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::milliseconds(self.millis())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Window::H1 => "1h",
            Window::H24 => "24h",
            Window::D7 => "7d",
        }
    }
}

/// Keep points with `now - timestamp < window`. If nothing survives, return
/// the entire series unchanged: a dashboard with no recent activity should
/// still show its historical shape rather than a blank chart. `now` is an
/// explicit parameter so the function stays pure.
pub fn filter_window(series: &[PnlPoint], window: Window, now: DateTime<Utc>) -> Vec<PnlPoint> {
    let bound = window.duration();
    let recent: Vec<PnlPoint> = series
        .iter()
        .copied()
        .filter(|p| now - p.timestamp < bound)
        .collect();
    if recent.is_empty() {
        series.to_vec()
    } else {
        recent
    }
}
