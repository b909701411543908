use crate::Category;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type SignalResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Coarse status token reported by route and supplier feeds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Ok,
    Degraded,
    Disrupted,
    /// Fetch failed; treated as neutral
    Unknown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeatherSeverity {
    Low,
    Moderate,
    Severe,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialSignal {
    /// Multiplicative demand influence, 1.0 is neutral
    pub factor: f64,
}

impl Default for SocialSignal {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSignal {
    pub severity: WeatherSeverity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteSignal {
    pub status: SignalStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierSignal {
    pub status: SignalStatus,
}

#[async_trait]
pub trait SocialMonitor: Send + Sync {
    /// Per-category demand influence derived from social chatter
    async fn analyze(&self, categories: &[Category]) -> SignalResult<HashMap<Category, SocialSignal>>;
}

#[async_trait]
pub trait WeatherFeed: Send + Sync {
    async fn forecast(&self) -> SignalResult<WeatherSignal>;
}

#[async_trait]
pub trait LogisticsFeed: Send + Sync {
    async fn route_status(&self, location: &str) -> SignalResult<RouteSignal>;
}

#[async_trait]
pub trait SupplierFeed: Send + Sync {
    async fn assess(&self, location: &str) -> SignalResult<SupplierSignal>;
}

/// All signals gathered for one location in one cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub social: HashMap<Category, SocialSignal>,
    pub weather: WeatherSignal,
    pub route: RouteSignal,
    pub supplier: SupplierSignal,
}

impl SignalSnapshot {
    /// Demand factor for a category; neutral when the monitor had nothing for it
    pub fn social_factor(&self, category: &Category) -> f64 {
        self.social.get(category).map(|s| s.factor).unwrap_or(1.0)
    }
}
