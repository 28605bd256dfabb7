// alertdash: run the live dashboard engine against an alert backend
// and log state transitions and accepted alerts until interrupted.

use alertdash_engine::view::recent_rows;
use alertdash_engine::{logging, Config, ConnectionStatus, Dashboard, ViewState};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    logging::init_logging();
    let config = Config::from_env();
    info!(api = %config.api_base_url, "starting alertdash engine");

    let mut dashboard = match Dashboard::start(config).await {
        Ok(d) => d,
        Err(err) => {
            error!(error = %err, "failed to mount dashboard");
            std::process::exit(1);
        }
    };

    match dashboard.view_state() {
        ViewState::Error(message) => warn!(%message, "snapshot unavailable; live-only counts"),
        ViewState::Ready(state) => info!(
            types = state.type_counts.len(),
            "snapshot seeded"
        ),
        ViewState::Loading => {}
    }

    let mut updates = dashboard.subscribe();
    let mut last_status = ConnectionStatus::Connecting;
    let mut logged_alerts: u64 = 0;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                if state.connection_status != last_status {
                    info!(status = state.connection_status.as_str(), "connection status");
                    last_status = state.connection_status;
                }
                let total: u64 = state.type_counts.values().sum();
                if total > logged_alerts {
                    logged_alerts = total;
                    if let Some(row) = recent_rows(&state, 1).into_iter().next() {
                        info!(
                            alert_type = %row.alert_type,
                            priority = row.priority,
                            endpoints = %row.endpoints,
                            "{}", row.message
                        );
                    }
                }
            }
        }
    }

    dashboard.close().await;
}
