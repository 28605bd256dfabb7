use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single sensor detection event, as delivered by the alert source.
///
/// Alerts are immutable after receipt. The source guarantees neither
/// uniqueness nor an identity key, so consumers must treat a stream of
/// alerts as a multiset ordered by arrival.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    #[serde(with = "ts")]
    pub timestamp: DateTime<Utc>,
    pub alert_type: String,
    /// 1 = highest severity. Values above 3 are legal on the wire and
    /// clamp into the P3 bucket for histogram purposes.
    pub priority: u8,
    pub protocol: String,
    pub source_ip: String,
    pub source_port: u16,
    pub destination_ip: String,
    pub destination_port: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_alert: Option<String>,
}

impl Alert {
    /// Validate fields the aggregation layer depends on.
    ///
    /// The connection boundary already drops frames that fail to parse;
    /// this re-checks the structural invariants a parsed alert must
    /// still satisfy before it may touch any counter.
    pub fn validate_basic(&self) -> Result<(), String> {
        if self.alert_type.trim().is_empty() {
            return Err("alert_type is empty".into());
        }
        if self.priority == 0 {
            return Err("priority must be >= 1".into());
        }
        Ok(())
    }

    /// `"src:port -> dst:port"` endpoint summary for list rows.
    pub fn endpoints(&self) -> String {
        format!(
            "{}:{} -> {}:{}",
            self.source_ip, self.source_port, self.destination_ip, self.destination_port
        )
    }
}

/// An alert plus the backend analysis computed for it.
///
/// This is the wire shape of every push-channel message: the raw alert
/// nested under `alert`, analysis fields at the top level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedAlert {
    pub alert: Alert,
    pub analysis: String,
    pub recommendations: Vec<String>,
    /// Confidence in [0, 1]; rendered as a 0-100% bar in detail views.
    pub confidence_score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_alerts: Option<Vec<String>>,
}

impl EnrichedAlert {
    pub fn validate_basic(&self) -> Result<(), String> {
        self.alert.validate_basic()?;
        if !(0.0..=1.0).contains(&self.confidence_score) {
            return Err(format!(
                "confidence_score {} outside [0, 1]",
                self.confidence_score
            ));
        }
        Ok(())
    }

    /// Confidence as a whole percentage, clamped to 0..=100.
    pub fn confidence_percent(&self) -> u8 {
        (self.confidence_score.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

/// One entry of the alert feed.
///
/// Live push messages always carry analysis; historical alerts from
/// the list endpoint arrive flat, with no analysis attached. Both
/// share a place on the recent-alerts list.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertRecord {
    Plain(Alert),
    Enriched(EnrichedAlert),
}

impl AlertRecord {
    pub fn alert(&self) -> &Alert {
        match self {
            AlertRecord::Plain(alert) => alert,
            AlertRecord::Enriched(enriched) => &enriched.alert,
        }
    }

    /// The analysis payload, when this entry has one.
    pub fn enriched(&self) -> Option<&EnrichedAlert> {
        match self {
            AlertRecord::Plain(_) => None,
            AlertRecord::Enriched(enriched) => Some(enriched),
        }
    }

    pub fn validate_basic(&self) -> Result<(), String> {
        match self {
            AlertRecord::Plain(alert) => alert.validate_basic(),
            AlertRecord::Enriched(enriched) => enriched.validate_basic(),
        }
    }
}

impl From<Alert> for AlertRecord {
    fn from(alert: Alert) -> Self {
        AlertRecord::Plain(alert)
    }
}

impl From<EnrichedAlert> for AlertRecord {
    fn from(enriched: EnrichedAlert) -> Self {
        AlertRecord::Enriched(enriched)
    }
}

/// Timestamp (de)serialization tolerant of the source's naive ISO-8601.
///
/// The sensor emits timestamps like `2024-03-20T10:00:00` with no
/// offset; RFC 3339 forms with an offset also appear. Naive times are
/// taken as UTC.
mod ts {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(de)?;
        if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(serde::de::Error::custom)
    }
}
