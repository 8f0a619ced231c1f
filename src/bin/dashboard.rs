//! Headless dashboard client.
//!
//! Boots the application context, restores any persisted session, loads
//! the dashboard counters and logs every notification raised on the way.
//!
//! # Environment Variables
//!
//! - `RFM_API_BASE_URL` — backend API root (default: `http://localhost:8000/api`)
//! - `RFM_STORAGE_DIR` — where the session token is persisted
//! - `RFM_LOCATION_PATH` — page to boot on (default: `/`)
//! - `RUST_LOG` — tracing filter (default: `info,rfm_insights=debug`)
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin dashboard
//! ```

use std::sync::Arc;
use std::time::Duration;

use rfm_insights::config::DashboardConfig;
use rfm_insights::context::AppContext;
use rfm_insights::notifications::{Notification, TracingSurface, EXIT_GRACE};
use rfm_insights::pages::check_authentication;
use rfm_insights::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let config = DashboardConfig::from_env()?;
    tracing::info!(api = %config.api_base_url, "starting RFM Insights dashboard client");

    let ctx = AppContext::bootstrap(config, Arc::new(TracingSurface))?;
    ctx.store.settled().await;

    let state = ctx.store.get_state();
    match &state.user {
        Some(user) => tracing::info!(user = %user.name, page = %state.current_page, "session restored"),
        None => tracing::info!(page = %state.current_page, "no active session"),
    }
    if let Some(redirect) = check_authentication(&state) {
        tracing::info!(to = redirect.path(), "page guard would redirect");
    }

    match ctx.dashboard().load().await {
        Ok(history) => {
            let stats = ctx.store.get_state().dashboard_stats;
            for (name, value) in stats.iter() {
                tracing::info!(counter = name, value, "dashboard stat");
            }
            for analysis in &history {
                tracing::info!(
                    file = analysis.filename.as_deref().unwrap_or("-"),
                    records = analysis.record_count,
                    "recent analysis"
                );
            }
        }
        Err(e) => tracing::warn!(error = %e, "dashboard unavailable"),
    }

    // Let raised notifications run their course before exiting.
    let wait = exit_wait(
        &ctx.store.get_state().notifications,
        ctx.config.notification_duration,
    );
    if !wait.is_zero() {
        tokio::time::sleep(wait).await;
    }

    ctx.teardown();
    Ok(())
}

/// Time until every notification in `pending` is gone from the surface.
///
/// Store-raised errors live for the configured default rather than their
/// kind's, so that default bounds the wait as well.
fn exit_wait(pending: &[Notification], configured_default: Duration) -> Duration {
    if pending.is_empty() {
        return Duration::ZERO;
    }
    let longest = pending
        .iter()
        .map(|n| n.kind.default_duration())
        .chain(std::iter::once(configured_default))
        .max()
        .unwrap_or(configured_default);
    longest + EXIT_GRACE
}
