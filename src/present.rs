// ===============================
// src/present.rs (presentation adapter boundary)
// ===============================
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tracing::info;

use crate::domain::{AggregateMetrics, DashboardSnapshot, OutcomeVolumeSplit, PnlPoint};
use crate::pnl;
use crate::window::{filter_window, Window};

/// Everything a renderer needs for one cycle, as plain data. Published once
/// per resolution cycle and fully replaced by the next; consumers get a
/// read-only reference and must never mutate it.
#[derive(Debug, Clone, Default)]
pub struct DashboardView {
    pub snapshot: Arc<DashboardSnapshot>,
    pub pnl_series: Vec<PnlPoint>,
    pub aggregates: AggregateMetrics,
    pub outcome_split: OutcomeVolumeSplit,
}

impl DashboardView {
    /// Derive all metrics from one snapshot, so a view never mixes fills from
    /// one cycle with positions from another.
    pub fn from_snapshot(snapshot: DashboardSnapshot) -> Self {
        let pnl_series = pnl::compute_pnl_series(&snapshot.fills);
        let aggregates = pnl::compute_aggregates(&snapshot.fills);
        let outcome_split = pnl::compute_outcome_volume_split(&snapshot.fills);
        Self { snapshot: Arc::new(snapshot), pnl_series, aggregates, outcome_split }
    }

    pub fn last_pnl(&self) -> f64 {
        self.pnl_series.last().map(|p| p.cumulative_pnl).unwrap_or(0.0)
    }
}

/// Rendering target. The only layer allowed to know about a presentation
/// technology; everything upstream hands over plain view data.
pub trait Render {
    fn render(&mut self, view: &DashboardView, window: Window, windowed: &[PnlPoint]);
}

/// Renders the view as one structured log line per cycle.
pub struct LogRenderer;

impl Render for LogRenderer {
    fn render(&mut self, view: &DashboardView, window: Window, windowed: &[PnlPoint]) {
        let snap = &view.snapshot;
        info!(
            origin = snap.origin.as_str(),
            as_of = %snap.as_of,
            fills = snap.fills.len(),
            positions = snap.positions.len(),
            maker_volume = view.aggregates.total_maker_volume,
            rebate_est = view.aggregates.total_rebate_estimate,
            pnl = view.last_pnl(),
            yes_volume = view.outcome_split.yes,
            no_volume = view.outcome_split.no,
            window = window.as_str(),
            window_points = windowed.len(),
            "dashboard"
        );
    }
}

/// Consume published views and render each one scoped to the selected
/// window. Exits when the publishing side goes away.
pub async fn run<R: Render + Send>(
    mut view_rx: watch::Receiver<DashboardView>,
    window: Window,
    mut renderer: R,
) {
    while view_rx.changed().await.is_ok() {
        let view = view_rx.borrow_and_update().clone();
        let windowed = filter_window(&view.pnl_series, window, Utc::now());
        renderer.render(&view, window, &windowed);
    }
}
