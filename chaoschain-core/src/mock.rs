//! Static collaborators used until real feeds are wired in.

use crate::signals::{
    LogisticsFeed, RouteSignal, SignalResult, SignalStatus, SocialMonitor, SocialSignal,
    SupplierFeed, SupplierSignal, WeatherFeed, WeatherSeverity, WeatherSignal,
};
use crate::Category;
use async_trait::async_trait;
use std::collections::HashMap;

pub struct MockWeatherFeed;

#[async_trait]
impl WeatherFeed for MockWeatherFeed {
    async fn forecast(&self) -> SignalResult<WeatherSignal> {
        Ok(WeatherSignal { severity: WeatherSeverity::Low })
    }
}

/// Returns the same factor for every category
pub struct MockSocialMonitor {
    pub factor: f64,
}

impl Default for MockSocialMonitor {
    fn default() -> Self {
        Self { factor: 1.0 }
    }
}

#[async_trait]
impl SocialMonitor for MockSocialMonitor {
    async fn analyze(&self, categories: &[Category]) -> SignalResult<HashMap<Category, SocialSignal>> {
        Ok(categories
            .iter()
            .map(|c| (c.clone(), SocialSignal { factor: self.factor }))
            .collect())
    }
}

pub struct MockLogisticsFeed;

#[async_trait]
impl LogisticsFeed for MockLogisticsFeed {
    async fn route_status(&self, _location: &str) -> SignalResult<RouteSignal> {
        Ok(RouteSignal { status: SignalStatus::Ok })
    }
}

pub struct MockSupplierFeed;

#[async_trait]
impl SupplierFeed for MockSupplierFeed {
    async fn assess(&self, _location: &str) -> SignalResult<SupplierSignal> {
        Ok(SupplierSignal { status: SignalStatus::Ok })
    }
}
