pub mod assistant;
pub mod charts;
pub mod config;
pub mod connection;
pub mod dashboard;
pub mod logging;
pub mod snapshot;
pub mod store;
pub mod view;

pub use assistant::AssistantRelay;
pub use config::Config;
pub use connection::{ConnectionEvent, ConnectionManager, ConnectionStatus};
pub use dashboard::{AlertSelection, Dashboard};
pub use snapshot::{AlertFilter, SnapshotLoader};
pub use store::{AggregationStore, DashboardState};
pub use view::ViewState;
