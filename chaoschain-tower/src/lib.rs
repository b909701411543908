pub mod error;
pub mod history;
pub mod metrics;
pub mod orchestrator;

pub use error::{TowerError, TowerResult};
pub use history::{Alert, TowerHistory};
pub use metrics::TowerMetrics;
pub use orchestrator::{Collaborators, ControlTower, CycleReport, LocationFailure};
