//! Dashboard view-model: renderable projections of store state.
//!
//! Three views hang off the same [`DashboardState`]: a
//! priority-over-time series, an alert-type distribution, and a
//! bounded recent-alerts list. Loading and error are first-class
//! states; a failed snapshot renders its message, never a chart full
//! of zeros.

use alertdash_core::{AlertRecord, PriorityBucket};
use chrono::{DateTime, Local, Utc};

use crate::store::DashboardState;

/// What the dashboard should show right now.
#[derive(Debug, Clone)]
pub enum ViewState {
    /// The mount fetches are still outstanding. [`Dashboard::start`]
    /// resolves them before it returns, so this is the caller's state
    /// while awaiting `start`; a mounted dashboard's `view_state` only
    /// ever returns `Error` or `Ready`.
    ///
    /// [`Dashboard::start`]: crate::dashboard::Dashboard::start
    Loading,
    /// Snapshot fetch failed; show the message instead of stale or
    /// zero data.
    Error(String),
    Ready(DashboardState),
}

impl ViewState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ViewState::Ready(_))
    }
}

/// One point on the priority-over-time chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityPoint {
    pub timestamp: DateTime<Utc>,
    pub priority: u8,
}

/// Priority-over-time line series, oldest point first.
#[derive(Debug, Clone)]
pub struct PrioritySeries {
    pub points: Vec<PriorityPoint>,
    /// Lower number = higher severity, so the axis renders reversed
    /// (priority 1 at the top).
    pub y_reversed: bool,
}

/// One row of the recent-alerts list.
#[derive(Debug, Clone)]
pub struct AlertRow {
    pub message: String,
    pub alert_type: String,
    pub priority: u8,
    /// `"src:port -> dst:port (PROTO)"`.
    pub endpoints: String,
    /// Receipt time rendered in the operator's local zone.
    pub local_time: String,
}

/// Detail-modal contents for a selected alert. Analysis fields are
/// absent for historical alerts that arrived without enrichment.
#[derive(Debug, Clone)]
pub struct AlertDetail {
    pub alert_type: String,
    pub priority: u8,
    pub source: String,
    pub destination: String,
    pub protocol: String,
    pub message: String,
    pub analysis: Option<String>,
    pub recommendations: Vec<String>,
    /// Confidence rendered as a 0-100% bar, when known.
    pub confidence_percent: Option<u8>,
}

/// Priority-over-time series: one point per alert in receipt order.
pub fn priority_series(state: &DashboardState) -> PrioritySeries {
    let points = state
        .recent_alerts
        .iter()
        .rev() // stored most-recent first; chart wants oldest first
        .map(|r| PriorityPoint {
            timestamp: r.alert().timestamp,
            priority: r.alert().priority,
        })
        .collect();
    PrioritySeries {
        points,
        y_reversed: true,
    }
}

/// Alert-type distribution, descending count then label.
pub fn type_distribution(state: &DashboardState) -> Vec<(String, u64)> {
    let mut pairs: Vec<(String, u64)> = state
        .type_counts
        .iter()
        .map(|(k, v)| (k.clone(), *v))
        .collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    pairs
}

/// Counts for the P1..P3 histogram, in bucket order. Buckets with no
/// alerts render as zero only once the snapshot has seeded the store.
pub fn priority_histogram(state: &DashboardState) -> [(u8, u64); 3] {
    let mut bars = [(0u8, 0u64); 3];
    for (i, bucket) in PriorityBucket::ALL.iter().enumerate() {
        let key = bucket.as_u8();
        bars[i] = (key, state.priority_counts.get(&key).copied().unwrap_or(0));
    }
    bars
}

/// Bounded recent-alerts list rows, most-recent first.
pub fn recent_rows(state: &DashboardState, limit: usize) -> Vec<AlertRow> {
    state
        .recent_alerts
        .iter()
        .take(limit)
        .map(|r| {
            let alert = r.alert();
            AlertRow {
                message: alert.message.clone(),
                alert_type: alert.alert_type.clone(),
                priority: alert.priority,
                endpoints: format!("{} ({})", alert.endpoints(), alert.protocol),
                local_time: alert
                    .timestamp
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            }
        })
        .collect()
}

/// Detail view for a selected alert.
pub fn detail(record: &AlertRecord) -> AlertDetail {
    let alert = record.alert();
    let enrichment = record.enriched();
    AlertDetail {
        alert_type: alert.alert_type.clone(),
        priority: alert.priority,
        source: format!("{}:{}", alert.source_ip, alert.source_port),
        destination: format!("{}:{}", alert.destination_ip, alert.destination_port),
        protocol: alert.protocol.clone(),
        message: alert.message.clone(),
        analysis: enrichment.map(|e| e.analysis.clone()),
        recommendations: enrichment
            .map(|e| e.recommendations.clone())
            .unwrap_or_default(),
        confidence_percent: enrichment.map(|e| e.confidence_percent()),
    }
}

/// Prefill signal for the assistant input when an alert is selected.
pub fn prefill_question(record: &AlertRecord) -> String {
    format!("Explain this alert: {}", record.alert().message)
}
