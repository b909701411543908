use crate::models::risk::{RiskAssessment, RiskKind};
use serde::{Deserialize, Serialize};

/// Outcome of planning against one risk assessment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Replenishment order placed against the ledger
    Order { category: String, quantity: u64 },
    /// Mitigation record for a non-demand risk
    Mitigation {
        kind: RiskKind,
        target: String,
        description: String,
    },
}

impl Action {
    pub fn mitigation(kind: RiskKind, target: &str) -> Self {
        Action::Mitigation {
            kind,
            target: target.to_string(),
            description: format!("Mitigation for {}", kind),
        }
    }

    pub fn is_order(&self) -> bool {
        matches!(self, Action::Order { .. })
    }
}

/// Per-location snapshot of one monitoring pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringResult {
    pub location: String,
    pub risks: Vec<RiskAssessment>,
    pub actions: Vec<Action>,
}
