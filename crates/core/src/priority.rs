use serde::{Deserialize, Serialize};

/// Priority histogram buckets. Sensors emit small positive integers
/// with 1 as the most severe; the dashboard histograms P1 through P3
/// and folds anything lower-severity into P3.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PriorityBucket {
    P1,
    P2,
    P3,
}

impl PriorityBucket {
    pub const ALL: [PriorityBucket; 3] = [PriorityBucket::P1, PriorityBucket::P2, PriorityBucket::P3];

    /// Bucket for a raw wire priority. Zero is invalid upstream and is
    /// never expected here; treat it as most-severe rather than panic.
    pub fn from_raw(priority: u8) -> Self {
        match priority {
            0 | 1 => PriorityBucket::P1,
            2 => PriorityBucket::P2,
            _ => PriorityBucket::P3,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            PriorityBucket::P1 => 1,
            PriorityBucket::P2 => 2,
            PriorityBucket::P3 => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriorityBucket::P1 => "Priority 1",
            PriorityBucket::P2 => "Priority 2",
            PriorityBucket::P3 => "Priority 3",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_priorities_clamp_into_three_buckets() {
        assert_eq!(PriorityBucket::from_raw(1), PriorityBucket::P1);
        assert_eq!(PriorityBucket::from_raw(2), PriorityBucket::P2);
        assert_eq!(PriorityBucket::from_raw(3), PriorityBucket::P3);
        assert_eq!(PriorityBucket::from_raw(7), PriorityBucket::P3);
    }

    #[test]
    fn buckets_order_most_severe_first() {
        assert!(PriorityBucket::P1 < PriorityBucket::P3);
        assert_eq!(PriorityBucket::ALL[0].label(), "Priority 1");
    }
}
