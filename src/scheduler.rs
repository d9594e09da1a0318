// ===============================
// src/scheduler.rs (refresh driver)
// ===============================
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::metrics;
use crate::present::DashboardView;
use crate::resolver::Resolver;

/// Handle for requesting an immediate refresh.
///
/// Queue-and-coalesce policy: the trigger channel holds at most one pending
/// request. A trigger while a cycle is in flight queues exactly one follow-up
/// cycle; further triggers before it runs are no-ops.
#[derive(Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    pub fn trigger(&self) {
        if self.tx.try_send(()).is_err() {
            debug!("refresh already pending, coalesced");
        }
    }
}

pub fn refresh_channel() -> (RefreshHandle, mpsc::Receiver<()>) {
    let (tx, rx) = mpsc::channel(1);
    (RefreshHandle { tx }, rx)
}

/// Run resolve -> recompute -> publish on a fixed interval and on manual
/// triggers. The cycle is awaited inline in the loop, so at most one is ever
/// in flight; ticks that land mid-cycle are delayed rather than stacked.
/// Exits (dropping the timer) when shutdown is signalled.
pub async fn run(
    resolver: Resolver,
    interval_ms: u64,
    mut refresh_rx: mpsc::Receiver<()>,
    view_tx: watch::Sender<DashboardView>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut tick = interval(Duration::from_millis(interval_ms));
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            Some(()) = refresh_rx.recv() => {
                debug!("manual refresh trigger");
            }
            changed = shutdown_rx.changed() => {
                // A dropped shutdown sender also stops the timer
                if changed.is_err() || *shutdown_rx.borrow() {
                    info!("scheduler stopped");
                    return;
                }
                continue;
            }
        }

        let snapshot = resolver.resolve().await;
        let view = DashboardView::from_snapshot(snapshot);
        metrics::publish_view(&view);
        // Full replacement of the current view; consumers hold the old one
        // until they observe the swap
        let _ = view_tx.send(view);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Args;
    use std::sync::Arc;
    use crate::domain::Origin;
    use crate::window::Window;
    use tokio::time::timeout;

    fn offline_resolver() -> Resolver {
        // Both fallible tiers fail instantly, so every cycle is synthetic
        Resolver::new(&Args {
            api_base_url: String::new(),
            snapshot_path: "/definitely/not/here.json".into(),
            refresh_interval_ms: 60_000,
            fetch_timeout_ms: 200,
            synthetic_fills: 5,
            window: Window::H24,
            metrics_port: 0,
        })
    }

    #[test]
    fn triggers_coalesce_into_one_pending_cycle() {
        let (handle, mut rx) = refresh_channel();
        handle.trigger();
        handle.trigger();
        handle.trigger();

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err(), "extra triggers were coalesced");
    }

    #[tokio::test]
    async fn publishes_on_start_trigger_and_stops_on_shutdown() {
        let (handle, refresh_rx) = refresh_channel();
        let (view_tx, mut view_rx) = watch::channel(DashboardView::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(run(
            offline_resolver(),
            60_000, // large enough that only the immediate first tick fires
            refresh_rx,
            view_tx,
            shutdown_rx,
        ));

        // First interval tick fires immediately
        timeout(Duration::from_secs(5), view_rx.changed()).await.unwrap().unwrap();
        let first = view_rx.borrow_and_update().clone();
        assert_eq!(first.snapshot.origin, Origin::Synthetic);
        assert_eq!(first.snapshot.fills.len(), 5);

        // Manual trigger produces a fresh cycle
        handle.trigger();
        timeout(Duration::from_secs(5), view_rx.changed()).await.unwrap().unwrap();
        let second = view_rx.borrow_and_update().clone();
        assert!(!Arc::ptr_eq(&first.snapshot, &second.snapshot), "fully replaced");

        // Explicit stop lifecycle
        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }
}
