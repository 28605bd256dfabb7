//! Dashboard orchestrator: wires the snapshot loader, the connection
//! manager, and the aggregation store together with the ordering the
//! views depend on.
//!
//! The snapshot seed runs to completion before the live subscription
//! is attached, so a late-arriving snapshot can never overwrite a live
//! event. Events are applied to the store strictly in arrival order by
//! a single task; nothing outside the store mutates counts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alertdash_core::FetchError;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::connection::{ConnectionManager, RECONNECT_DELAY};
use crate::snapshot::{AlertFilter, SnapshotLoader};
use crate::store::{AggregationStore, DashboardState};
use crate::view::{self, AlertDetail, ViewState};

/// What selecting a list entry yields: a populated detail view plus
/// the prefill signal for the assistant input.
#[derive(Debug, Clone)]
pub struct AlertSelection {
    pub detail: AlertDetail,
    pub prefill: String,
}

/// A mounted dashboard: live store plus the connection feeding it.
pub struct Dashboard {
    store: Arc<Mutex<AggregationStore>>,
    manager: ConnectionManager,
    mount_error: Option<String>,
    closed: Arc<AtomicBool>,
    apply_task: Option<JoinHandle<()>>,
}

impl Dashboard {
    /// Mount the dashboard: seed the aggregate snapshot and the alert
    /// history, then attach the live connection.
    ///
    /// A failed seed fetch does not abort the mount: the push channel
    /// still opens and accumulates live events, but the view state
    /// reports the error instead of rendering charts from an unknown
    /// baseline.
    pub async fn start(config: Config) -> Result<Self, FetchError> {
        Self::start_with(config, RECONNECT_DELAY).await
    }

    /// As [`start`](Self::start) with an explicit reconnect delay.
    pub async fn start_with(config: Config, reconnect_delay: Duration) -> Result<Self, FetchError> {
        let loader = SnapshotLoader::new(&config)?;
        let mut store = AggregationStore::new();

        // Both seeds complete before any live event is accepted.
        let mut mount_error = match loader.fetch_snapshot().await {
            Ok(snapshot) => {
                store.seed(snapshot);
                None
            }
            Err(err) => {
                warn!(error = %err, "snapshot fetch failed; live-only counts");
                Some(err.to_string())
            }
        };

        // Historical alerts populate the recent list; their counts are
        // already folded into the snapshot buckets above.
        match loader.fetch_alerts(&AlertFilter::default()).await {
            Ok(alerts) => store.seed_alerts(alerts),
            Err(err) => {
                warn!(error = %err, "alert history fetch failed; list starts empty");
                mount_error.get_or_insert(err.to_string());
            }
        }

        let manager = ConnectionManager::new(config.ws_url()).with_reconnect_delay(reconnect_delay);
        let mut events = manager.open();

        let store = Arc::new(Mutex::new(store));
        let closed = Arc::new(AtomicBool::new(false));
        let apply_task = {
            let store = Arc::clone(&store);
            let closed = Arc::clone(&closed);
            tokio::spawn(async move {
                while let Some(event) = events.recv().await {
                    store.lock().apply(event);
                }
                // Stream ended. On orderly teardown the state must not
                // move; otherwise the manager died with no retry coming.
                if !closed.load(Ordering::SeqCst) {
                    store.lock().mark_failed();
                }
            })
        };

        info!(api = %config.api_base_url, ws = %config.ws_url(), "dashboard mounted");
        Ok(Self {
            store,
            manager,
            mount_error,
            closed,
            apply_task: Some(apply_task),
        })
    }

    /// Subscribe to state changes; each accepted mutation publishes an
    /// immutable snapshot.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.store.lock().subscribe()
    }

    pub fn state(&self) -> DashboardState {
        self.store.lock().state()
    }

    /// Current view state. `Loading` is the caller's state while
    /// `start` itself is outstanding; once mounted the dashboard is
    /// either errored or ready.
    pub fn view_state(&self) -> ViewState {
        match &self.mount_error {
            Some(message) => ViewState::Error(message.clone()),
            None => ViewState::Ready(self.state()),
        }
    }

    /// Select the n-th entry of the recent list (0 = newest).
    pub fn select(&self, index: usize) -> Option<AlertSelection> {
        let state = self.state();
        let record = state.recent_alerts.get(index)?;
        Some(AlertSelection {
            detail: view::detail(record),
            prefill: view::prefill_question(record),
        })
    }

    /// Unmount: close the socket, cancel reconnect timers, and wait
    /// for the apply task to drain. No state mutation happens after
    /// this returns.
    pub async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.manager.close();
        if let Some(task) = self.apply_task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for Dashboard {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.manager.close();
    }
}
