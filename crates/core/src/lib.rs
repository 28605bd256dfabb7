pub mod alert;
pub mod error;
pub mod priority;
pub mod stats;

pub use alert::{Alert, AlertRecord, EnrichedAlert};
pub use error::{AssistantError, FetchError};
pub use priority::PriorityBucket;
pub use stats::{AggregateBucket, BucketGroup, SnapshotData};
