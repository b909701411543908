use serde::{Deserialize, Serialize};
use std::fmt;

/// Source of a risk signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskKind {
    Demand,
    Weather,
    Logistics,
    Supplier,
}

impl RiskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskKind::Demand => "demand",
            RiskKind::Weather => "weather",
            RiskKind::Logistics => "logistics",
            RiskKind::Supplier => "supplier",
        }
    }
}

impl fmt::Display for RiskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered severity tiers. Discriminants match the integer levels 1..=4.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum RiskLevel {
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl RiskLevel {
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// A scored risk for one category or location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub kind: RiskKind,
    pub level: RiskLevel,
    /// Category name for demand risks, location otherwise
    pub target: String,
    pub score: f64,
    /// Mean forecast demand, only set for demand risks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<f64>,
}

impl RiskAssessment {
    pub fn demand(category: &str, level: RiskLevel, score: f64, forecast: f64) -> Self {
        Self {
            kind: RiskKind::Demand,
            level,
            target: category.to_string(),
            score,
            forecast: Some(forecast),
        }
    }

    pub fn signal(kind: RiskKind, target: &str, level: RiskLevel, score: f64) -> Self {
        Self {
            kind,
            level,
            target: target.to_string(),
            score,
            forecast: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::High >= RiskLevel::Medium);
        assert_eq!(RiskLevel::Critical.value(), 4);
    }

    #[test]
    fn test_assessment_serialization() {
        let risk = RiskAssessment::demand("food", RiskLevel::High, 0.7, 812.5);
        let json = serde_json::to_value(&risk).unwrap();
        assert_eq!(json["kind"], "demand");
        assert_eq!(json["level"], "HIGH");
        assert_eq!(json["forecast"], 812.5);

        let weather = RiskAssessment::signal(RiskKind::Weather, "Asia", RiskLevel::Low, 0.1);
        let json = serde_json::to_value(&weather).unwrap();
        assert!(json.get("forecast").is_none());
    }
}
