use chaoschain_core::app_config::HistoryConfig;
use chaoschain_shared::{Category, RiskAssessment, RiskLevel};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

type SeriesKey = (String, Category);

/// High-severity assessment kept for reporting
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub location: String,
    pub assessment: RiskAssessment,
    pub raised_at: DateTime<Utc>,
}

#[derive(Default)]
struct HistoryState {
    inventory: HashMap<SeriesKey, VecDeque<u64>>,
    risks: HashMap<SeriesKey, VecDeque<f64>>,
    alerts: VecDeque<Alert>,
}

/// Bounded per-(location, category) inventory and risk series shared by
/// all location workers
pub struct TowerHistory {
    state: Mutex<HistoryState>,
    max_entries: usize,
    alert_capacity: usize,
}

impl TowerHistory {
    pub fn new(config: &HistoryConfig) -> Self {
        Self {
            state: Mutex::new(HistoryState::default()),
            max_entries: config.max_entries.max(1),
            alert_capacity: config.alert_capacity,
        }
    }

    /// Append one inventory level and one score per category
    pub fn record(&self, location: &str, entries: &[(Category, u64, f64)]) {
        let mut state = self.state.lock();
        for (category, inventory, score) in entries {
            let key = (location.to_string(), category.clone());
            push_bounded(state.inventory.entry(key.clone()).or_default(), *inventory, self.max_entries);
            push_bounded(state.risks.entry(key).or_default(), *score, self.max_entries);
        }
    }

    /// Keep every assessment at HIGH or above, dropping the oldest past capacity
    pub fn raise_alerts(&self, location: &str, risks: &[RiskAssessment]) -> usize {
        if self.alert_capacity == 0 {
            return 0;
        }
        let now = Utc::now();
        let mut state = self.state.lock();
        let mut raised = 0;
        for risk in risks.iter().filter(|r| r.level >= RiskLevel::High) {
            let alert = Alert {
                location: location.to_string(),
                assessment: risk.clone(),
                raised_at: now,
            };
            push_bounded(&mut state.alerts, alert, self.alert_capacity);
            raised += 1;
        }
        raised
    }

    pub fn risk_series(&self, location: &str, category: &Category) -> Vec<f64> {
        let key = (location.to_string(), category.clone());
        self.state
            .lock()
            .risks
            .get(&key)
            .map(|series| series.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn inventory_series(&self, location: &str, category: &Category) -> Vec<u64> {
        let key = (location.to_string(), category.clone());
        self.state
            .lock()
            .inventory
            .get(&key)
            .map(|series| series.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.state.lock().alerts.iter().cloned().collect()
    }
}

fn push_bounded<T>(series: &mut VecDeque<T>, value: T, cap: usize) {
    if series.len() >= cap {
        series.pop_front();
    }
    series.push_back(value);
}
