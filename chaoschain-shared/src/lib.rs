pub mod models;

pub use models::{
    Action, Category, MonitoringResult, RiskAssessment, RiskKind, RiskLevel,
};
