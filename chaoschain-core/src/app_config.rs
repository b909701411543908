use crate::{Category, CoreError, CoreResult};
use serde::Deserialize;
use std::env;

/// Upper bound on a replenishment lead time, in cycles
pub const MAX_LEAD_TIME_CYCLES: u32 = 10_000;
/// Upper bound on one cycle's wall-clock length (one day)
pub const MAX_CYCLE_DURATION_MS: u64 = 86_400_000;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TowerConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub anomaly: AnomalyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimulationConfig {
    pub categories: Vec<String>,
    pub locations: Vec<String>,
    #[serde(default = "default_cycles")]
    pub cycles: u64,
    /// Wall-clock length of one replenishment cycle
    #[serde(default = "default_cycle_duration_ms")]
    pub cycle_duration_ms: u64,
    /// Fixed seed for reproducible runs; entropy when absent
    pub seed: Option<u64>,
    #[serde(default = "default_initial_on_hand")]
    pub initial_on_hand: u64,
    #[serde(default = "default_min_lead_time")]
    pub min_lead_time: u32,
    #[serde(default = "default_max_lead_time")]
    pub max_lead_time: u32,
}

fn default_cycles() -> u64 { 3 }
fn default_cycle_duration_ms() -> u64 { 300 }
fn default_initial_on_hand() -> u64 { 1200 }
fn default_min_lead_time() -> u32 { 1 }
fn default_max_lead_time() -> u32 { 3 }

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            categories: ["electronics", "clothing", "food", "pharmaceuticals", "automotive"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            locations: ["Asia", "Europe", "Americas"]
                .iter()
                .map(|l| l.to_string())
                .collect(),
            cycles: default_cycles(),
            cycle_duration_ms: default_cycle_duration_ms(),
            seed: None,
            initial_on_hand: default_initial_on_hand(),
            min_lead_time: default_min_lead_time(),
            max_lead_time: default_max_lead_time(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ForecastConfig {
    #[serde(default = "default_samples")]
    pub monte_carlo_samples: usize,
    /// Number of emitted states kept for the volatility estimate
    #[serde(default = "default_volatility_window")]
    pub volatility_window: usize,
    #[serde(default = "default_noise_std")]
    pub noise_std: f64,
}

fn default_samples() -> usize { 200 }
fn default_volatility_window() -> usize { 1000 }
fn default_noise_std() -> f64 { 0.01 }

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            monte_carlo_samples: default_samples(),
            volatility_window: default_volatility_window(),
            noise_std: default_noise_std(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlannerConfig {
    #[serde(default = "default_safety_factor")]
    pub safety_factor: f64,
    #[serde(default = "default_fallback_safety_stock")]
    pub fallback_safety_stock: f64,
}

fn default_safety_factor() -> f64 { 1.3 }
fn default_fallback_safety_stock() -> f64 { 500.0 }

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            safety_factor: default_safety_factor(),
            fallback_safety_stock: default_fallback_safety_stock(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    /// Cap per (location, category) series
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_alert_capacity")]
    pub alert_capacity: usize,
}

fn default_max_entries() -> usize { 500 }
fn default_alert_capacity() -> usize { 1000 }

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            alert_capacity: default_alert_capacity(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnomalyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 { 3.0 }

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: default_threshold(),
        }
    }
}

impl TowerConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        tracing::debug!(run_mode = %run_mode, "Loading tower configuration");

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `CHAOSCHAIN_SIMULATION__SEED=7`
            .add_source(config::Environment::with_prefix("CHAOSCHAIN").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.simulation.categories.iter().map(|c| Category::new(c.as_str())).collect()
    }

    /// Reject settings the control loop cannot run with
    pub fn validate(&self) -> CoreResult<()> {
        let sim = &self.simulation;
        if sim.categories.is_empty() {
            return Err(CoreError::ConfigError("at least one category is required".into()));
        }
        if sim.locations.is_empty() {
            return Err(CoreError::ConfigError("at least one location is required".into()));
        }
        if sim.min_lead_time == 0 || sim.min_lead_time > sim.max_lead_time {
            return Err(CoreError::ConfigError(format!(
                "lead time range {}..={} is invalid",
                sim.min_lead_time, sim.max_lead_time
            )));
        }
        if sim.max_lead_time > MAX_LEAD_TIME_CYCLES {
            return Err(CoreError::ConfigError(format!(
                "max_lead_time must be at most {} cycles, got {}",
                MAX_LEAD_TIME_CYCLES, sim.max_lead_time
            )));
        }
        if sim.cycle_duration_ms > MAX_CYCLE_DURATION_MS {
            return Err(CoreError::ConfigError(format!(
                "cycle_duration_ms must be at most {}, got {}",
                MAX_CYCLE_DURATION_MS, sim.cycle_duration_ms
            )));
        }
        if self.forecast.monte_carlo_samples < 30 {
            return Err(CoreError::ConfigError(format!(
                "monte_carlo_samples must be at least 30, got {}",
                self.forecast.monte_carlo_samples
            )));
        }
        if self.history.max_entries == 0 {
            return Err(CoreError::ConfigError("history.max_entries must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TowerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.categories().len(), 5);
        assert_eq!(config.simulation.locations.len(), 3);
        assert_eq!(config.forecast.monte_carlo_samples, 200);
    }

    #[test]
    fn test_rejects_small_sample_count() {
        let mut config = TowerConfig::default();
        config.forecast.monte_carlo_samples = 10;
        assert!(matches!(config.validate(), Err(CoreError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_inverted_lead_times() {
        let mut config = TowerConfig::default();
        config.simulation.min_lead_time = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_unbounded_lead_time_and_cycle_length() {
        let mut config = TowerConfig::default();
        config.simulation.max_lead_time = u32::MAX;
        assert!(matches!(config.validate(), Err(CoreError::ConfigError(_))));

        let mut config = TowerConfig::default();
        config.simulation.max_lead_time = MAX_LEAD_TIME_CYCLES;
        assert!(config.validate().is_ok());

        config.simulation.cycle_duration_ms = u64::MAX;
        assert!(matches!(config.validate(), Err(CoreError::ConfigError(_))));
    }
}
