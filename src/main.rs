// ===============================
// src/main.rs
// ===============================
/*
=============================================================================
Project : mm_dash_rust — live telemetry core for a market-making bot

Summary : Resolves fill/position snapshots through a tiered fallback chain
          (live stats API -> on-disk state file -> synthetic demo data),
          derives cumulative P&L and volume/rebate metrics, scopes them to a
          trailing window, publishes immutable per-cycle views to renderers,
          and exposes Prometheus metrics.
=============================================================================
*/
mod domain;
mod config;
mod metrics;
mod window;
mod pnl;
mod synthetic;
mod resolver;
mod scheduler;
mod present;

use tokio::signal;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() {
    // ---- Logging ----
    tracing_subscriber::fmt().with_env_filter("info").init();

    // ---- Load config ----
    let args = config::load();

    // ---- Metrics ----
    metrics::init();
    tokio::spawn(metrics::serve_metrics(args.metrics_port));

    info!(
        api_base_url = %args.api_base_url,
        snapshot_path = %args.snapshot_path,
        refresh_interval_ms = args.refresh_interval_ms,
        fetch_timeout_ms = args.fetch_timeout_ms,
        window = args.window.as_str(),
        "startup config"
    );
    metrics::CONFIG_WINDOW
        .with_label_values(&[args.window.as_str()])
        .set(1);
    metrics::CONFIG_REFRESH_INTERVAL_MS.set(args.refresh_interval_ms as i64);

    // ---- Wiring ----
    let resolver = resolver::Resolver::new(&args);
    let (refresh_handle, refresh_rx) = scheduler::refresh_channel();
    let (view_tx, view_rx) = watch::channel(present::DashboardView::default());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ---- Scheduler (resolve -> recompute -> publish) ----
    let scheduler_task = tokio::spawn(scheduler::run(
        resolver,
        args.refresh_interval_ms,
        refresh_rx,
        view_tx,
        shutdown_rx,
    ));

    // ---- Presentation ----
    tokio::spawn(present::run(
        view_rx.clone(),
        args.window,
        present::LogRenderer,
    ));

    // ---- Manual refresh via SIGHUP ----
    spawn_refresh_on_sighup(refresh_handle);

    // ---- Heartbeat until ctrl-c ----
    let hb_rx = view_rx;
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_secs(15)) => {
                let view = hb_rx.borrow();
                info!(
                    origin = view.snapshot.origin.as_str(),
                    fills = view.snapshot.fills.len(),
                    pnl = view.last_pnl(),
                    "heartbeat"
                );
            }
        }
    }

    // Explicit stop so the refresh timer does not outlive the process logic
    info!("shutting down");
    let _ = shutdown_tx.send(true);
    let _ = scheduler_task.await;
}

#[cfg(unix)]
fn spawn_refresh_on_sighup(handle: scheduler::RefreshHandle) {
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};
        let mut hup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(?e, "SIGHUP handler unavailable");
                return;
            }
        };
        while hup.recv().await.is_some() {
            info!("SIGHUP: manual refresh");
            handle.trigger();
        }
    });
}

#[cfg(not(unix))]
fn spawn_refresh_on_sighup(_handle: scheduler::RefreshHandle) {}
