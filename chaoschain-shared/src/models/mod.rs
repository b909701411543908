pub mod category;
pub mod risk;
pub mod actions;
pub mod events;

pub use category::Category;
pub use risk::{RiskAssessment, RiskKind, RiskLevel};
pub use actions::{Action, MonitoringResult};
