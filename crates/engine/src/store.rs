//! Aggregation store: the single owner of derived dashboard state.
//!
//! Counts are mutated only here, and only by successfully parsed alert
//! events, which makes the store idempotent with respect to connection
//! churn: reconnecting never re-applies old counts. The snapshot seed
//! replaces counts wholesale; it never merges.

use std::collections::{BTreeMap, HashMap};

use alertdash_core::{Alert, AlertRecord, EnrichedAlert, PriorityBucket, SnapshotData};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::connection::{ConnectionEvent, ConnectionStatus};

/// Retained alert history. Display needs only the first handful;
/// keeping more supports scroll-back without a re-fetch.
pub const MAX_RECENT: usize = 50;

/// The store's owned projection of everything the dashboard renders.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// Most-recent first, capped at [`MAX_RECENT`].
    pub recent_alerts: Vec<AlertRecord>,
    pub type_counts: HashMap<String, u64>,
    /// Keyed by priority bucket 1..=3.
    pub priority_counts: BTreeMap<u8, u64>,
    pub protocol_counts: HashMap<String, u64>,
    pub connection_status: ConnectionStatus,
    /// Whether a snapshot seed has completed for this store.
    pub seeded: bool,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            recent_alerts: Vec::new(),
            type_counts: HashMap::new(),
            priority_counts: BTreeMap::new(),
            protocol_counts: HashMap::new(),
            connection_status: ConnectionStatus::Connecting,
            seeded: false,
        }
    }
}

/// Owner of [`DashboardState`]. All mutation flows through `seed`,
/// `apply`, and `mark_failed`; everything else gets read-only
/// subscription views.
pub struct AggregationStore {
    state: DashboardState,
    tx: watch::Sender<DashboardState>,
}

impl AggregationStore {
    pub fn new() -> Self {
        let state = DashboardState::default();
        let (tx, _rx) = watch::channel(state.clone());
        Self { state, tx }
    }

    /// Subscribe to state changes. Every accepted mutation publishes a
    /// fresh immutable snapshot synchronously.
    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.tx.subscribe()
    }

    /// Current state snapshot.
    pub fn state(&self) -> DashboardState {
        self.state.clone()
    }

    /// Seed counters from an aggregate snapshot.
    ///
    /// The snapshot is authoritative for "counts as of now": existing
    /// counts are replaced, not merged. Calling `seed` again replaces
    /// again; it never accumulates. The recent-alerts list is left
    /// alone (the snapshot endpoint carries no individual alerts).
    pub fn seed(&mut self, snapshot: SnapshotData) {
        self.state.type_counts.clear();
        self.state.priority_counts.clear();
        self.state.protocol_counts.clear();

        if let Some(group) = &snapshot.alert_types {
            for bucket in &group.buckets {
                self.state
                    .type_counts
                    .insert(bucket.key.clone(), bucket.doc_count);
            }
        }
        if let Some(group) = &snapshot.priority_distribution {
            for bucket in &group.buckets {
                match bucket.key.parse::<u8>() {
                    Ok(raw) => {
                        let slot = PriorityBucket::from_raw(raw).as_u8();
                        *self.state.priority_counts.entry(slot).or_insert(0) += bucket.doc_count;
                    }
                    Err(_) => {
                        warn!(key = %bucket.key, "skipping non-numeric priority bucket");
                    }
                }
            }
        }
        if let Some(group) = &snapshot.protocols {
            for bucket in &group.buckets {
                self.state
                    .protocol_counts
                    .insert(bucket.key.clone(), bucket.doc_count);
            }
        }

        self.state.seeded = true;
        debug!(
            types = self.state.type_counts.len(),
            priorities = self.state.priority_counts.len(),
            "store seeded from snapshot"
        );
        self.publish();
    }

    /// Seed the recent-alerts list from the alert-history endpoint.
    ///
    /// History replaces the list (most-recent first, as the endpoint
    /// sorts it) and never touches counters: those alerts are already
    /// part of the aggregate snapshot's buckets, and counting them
    /// here would double them.
    pub fn seed_alerts(&mut self, alerts: Vec<Alert>) {
        self.state.recent_alerts = alerts.into_iter().map(AlertRecord::from).collect();
        self.state.recent_alerts.truncate(MAX_RECENT);
        debug!(
            count = self.state.recent_alerts.len(),
            "recent list seeded from history"
        );
        self.publish();
    }

    /// Apply one connection event.
    ///
    /// Alert events mutate the list and counters; connection lifecycle
    /// events touch only `connection_status`. Both notify subscribers.
    pub fn apply(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::AlertReceived(enriched) => {
                // The connection boundary already filters unparseable
                // frames; re-check the structural invariants anyway.
                if let Err(reason) = enriched.validate_basic() {
                    warn!(%reason, "rejecting invalid alert event");
                    return;
                }
                self.accept_alert(enriched);
            }
            ConnectionEvent::Connected => {
                self.state.connection_status = self.state.connection_status.on_connected();
            }
            ConnectionEvent::Disconnected { reason } => {
                debug!(%reason, "push channel dropped");
                self.state.connection_status = self.state.connection_status.on_disconnected();
            }
            ConnectionEvent::Error { reason } => {
                // Non-fatal; status is unchanged but subscribers still
                // hear about it through the notification below.
                warn!(%reason, "push channel error");
            }
        }
        self.publish();
    }

    /// The connection manager died without a teardown request.
    pub fn mark_failed(&mut self) {
        self.state.connection_status = self.state.connection_status.on_fatal();
        self.publish();
    }

    fn accept_alert(&mut self, enriched: EnrichedAlert) {
        let alert = &enriched.alert;
        *self
            .state
            .type_counts
            .entry(alert.alert_type.clone())
            .or_insert(0) += 1;
        let bucket = PriorityBucket::from_raw(alert.priority).as_u8();
        *self.state.priority_counts.entry(bucket).or_insert(0) += 1;
        *self
            .state
            .protocol_counts
            .entry(alert.protocol.clone())
            .or_insert(0) += 1;

        self.state.recent_alerts.insert(0, AlertRecord::Enriched(enriched));
        self.state.recent_alerts.truncate(MAX_RECENT);
    }

    fn publish(&self) {
        // send_replace never fails, even with no live subscribers.
        self.tx.send_replace(self.state.clone());
    }
}

impl Default for AggregationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alertdash_core::{AggregateBucket, Alert, BucketGroup};
    use chrono::Utc;

    fn enriched(alert_type: &str, priority: u8) -> EnrichedAlert {
        EnrichedAlert {
            alert: Alert {
                timestamp: Utc::now(),
                alert_type: alert_type.to_string(),
                priority,
                protocol: "TCP".to_string(),
                source_ip: "10.0.0.1".to_string(),
                source_port: 4444,
                destination_ip: "10.0.0.2".to_string(),
                destination_port: 80,
                message: format!("{alert_type} observed"),
                classification: None,
                signature_id: None,
                raw_alert: None,
            },
            analysis: "test analysis".to_string(),
            recommendations: vec!["isolate host".to_string()],
            confidence_score: 0.9,
            related_alerts: None,
        }
    }

    fn scan_snapshot(count: u64) -> SnapshotData {
        SnapshotData {
            alert_types: Some(BucketGroup {
                buckets: vec![AggregateBucket {
                    key: "scan".to_string(),
                    doc_count: count,
                }],
            }),
            priority_distribution: Some(BucketGroup {
                buckets: vec![AggregateBucket {
                    key: "2".to_string(),
                    doc_count: count,
                }],
            }),
            protocols: None,
        }
    }

    #[test]
    fn seed_then_live_event_adds_to_seeded_count() {
        let mut store = AggregationStore::new();
        store.seed(scan_snapshot(3));
        store.apply(ConnectionEvent::AlertReceived(enriched("scan", 2)));

        let state = store.state();
        assert_eq!(state.type_counts["scan"], 4);
        assert_eq!(state.priority_counts[&2], 4);
        assert_eq!(state.recent_alerts.len(), 1);
    }

    #[test]
    fn reseeding_replaces_rather_than_accumulates() {
        let mut store = AggregationStore::new();
        store.seed(scan_snapshot(3));
        store.apply(ConnectionEvent::AlertReceived(enriched("scan", 2)));
        store.seed(scan_snapshot(3));

        assert_eq!(store.state().type_counts["scan"], 3);
        // The live alert itself stays on the list; only counts reset.
        assert_eq!(store.state().recent_alerts.len(), 1);
    }

    #[test]
    fn connection_churn_never_touches_counts() {
        let mut store = AggregationStore::new();
        store.seed(scan_snapshot(3));
        store.apply(ConnectionEvent::Connected);
        store.apply(ConnectionEvent::Disconnected {
            reason: "socket reset".into(),
        });
        store.apply(ConnectionEvent::Connected);
        store.apply(ConnectionEvent::Error {
            reason: "malformed frame".into(),
        });

        let state = store.state();
        assert_eq!(state.type_counts["scan"], 3);
        assert_eq!(state.connection_status, ConnectionStatus::Open);
        assert!(state.recent_alerts.is_empty());
    }

    #[test]
    fn counts_survive_reconnects_between_events() {
        let mut store = AggregationStore::new();
        store.apply(ConnectionEvent::Connected);
        for _ in 0..2 {
            store.apply(ConnectionEvent::AlertReceived(enriched("exploit", 1)));
            store.apply(ConnectionEvent::Disconnected {
                reason: "drop".into(),
            });
            store.apply(ConnectionEvent::Connected);
        }
        store.apply(ConnectionEvent::AlertReceived(enriched("exploit", 1)));

        assert_eq!(store.state().type_counts["exploit"], 3);
        assert_eq!(store.state().priority_counts[&1], 3);
    }

    #[test]
    fn invalid_alert_event_is_rejected_defensively() {
        let mut store = AggregationStore::new();
        store.apply(ConnectionEvent::AlertReceived(enriched("", 1)));
        store.apply(ConnectionEvent::AlertReceived(enriched("scan", 0)));

        let state = store.state();
        assert!(state.type_counts.is_empty());
        assert!(state.recent_alerts.is_empty());
    }

    #[test]
    fn recent_list_is_bounded_and_most_recent_first() {
        let mut store = AggregationStore::new();
        for i in 0..(MAX_RECENT + 10) {
            let mut e = enriched("scan", 2);
            e.alert.message = format!("alert {i}");
            store.apply(ConnectionEvent::AlertReceived(e));
        }

        let state = store.state();
        assert_eq!(state.recent_alerts.len(), MAX_RECENT);
        assert_eq!(
            state.recent_alerts[0].alert().message,
            format!("alert {}", MAX_RECENT + 9)
        );
        assert_eq!(state.type_counts["scan"], (MAX_RECENT + 10) as u64);
    }

    #[test]
    fn alert_history_seeds_the_list_without_touching_counts() {
        let mut store = AggregationStore::new();
        store.seed(scan_snapshot(3));

        let history: Vec<_> = (0..2).map(|i| {
            let mut e = enriched("scan", 2);
            e.alert.message = format!("historical {i}");
            e.alert
        }).collect();
        store.seed_alerts(history);

        let state = store.state();
        assert_eq!(state.recent_alerts.len(), 2);
        assert_eq!(state.recent_alerts[0].alert().message, "historical 0");
        assert!(state.recent_alerts[0].enriched().is_none());
        // History is already inside the snapshot buckets.
        assert_eq!(state.type_counts["scan"], 3);
        assert_eq!(state.priority_counts[&2], 3);

        // A live event lands on top of the seeded history.
        store.apply(ConnectionEvent::AlertReceived(enriched("scan", 2)));
        let state = store.state();
        assert_eq!(state.recent_alerts.len(), 3);
        assert!(state.recent_alerts[0].enriched().is_some());
        assert_eq!(state.type_counts["scan"], 4);
    }

    #[test]
    fn alert_history_seed_is_bounded() {
        let mut store = AggregationStore::new();
        let history: Vec<_> = (0..(MAX_RECENT + 20))
            .map(|_| enriched("scan", 2).alert)
            .collect();
        store.seed_alerts(history);
        assert_eq!(store.state().recent_alerts.len(), MAX_RECENT);
    }

    #[test]
    fn high_raw_priorities_fold_into_p3() {
        let mut store = AggregationStore::new();
        store.apply(ConnectionEvent::AlertReceived(enriched("noise", 5)));
        assert_eq!(store.state().priority_counts[&3], 1);
    }

    #[test]
    fn subscribers_see_each_published_snapshot() {
        let mut store = AggregationStore::new();
        let rx = store.subscribe();
        store.apply(ConnectionEvent::AlertReceived(enriched("scan", 2)));

        let seen = rx.borrow();
        assert_eq!(seen.type_counts["scan"], 1);
    }

    #[test]
    fn mark_failed_transitions_status_only() {
        let mut store = AggregationStore::new();
        store.seed(scan_snapshot(1));
        store.mark_failed();
        let state = store.state();
        assert_eq!(state.connection_status, ConnectionStatus::Failed);
        assert_eq!(state.type_counts["scan"], 1);
    }
}
