use crate::demand::{population_std, DemandModel};
use chaoschain_core::app_config::ForecastConfig;
use chaoschain_shared::{Category, RiskAssessment, RiskLevel};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Below this the normal-approximation interval is meaningless
pub const MIN_SAMPLES: usize = 30;

const Z_95: f64 = 1.96;
const JITTER_LOW: f64 = 0.8;
const JITTER_HIGH: f64 = 1.2;
const HIGH_RISK_THRESHOLD: f64 = 0.6;

/// Monte Carlo estimate of demand for one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandForecast {
    pub mean: f64,
    pub std: f64,
    /// 95% normal-approximation interval
    pub confidence_interval: (f64, f64),
    pub samples: Vec<f64>,
}

/// Demand model plus its own jitter stream; both advance under one lock
struct CategoryModel {
    demand: DemandModel,
    jitter: StdRng,
}

impl CategoryModel {
    fn simulate(&mut self, external_factor: f64, n_samples: usize) -> DemandForecast {
        let samples: Vec<f64> = (0..n_samples)
            .map(|_| {
                let base = self.demand.next_sample();
                base * external_factor * self.jitter.gen_range(JITTER_LOW..JITTER_HIGH)
            })
            .collect();

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let std = population_std(samples.iter().copied());

        DemandForecast {
            mean,
            std,
            confidence_interval: (mean - Z_95 * std, mean + Z_95 * std),
            samples,
        }
    }
}

/// Scores stockout risk per category from chaotic demand simulations.
///
/// Categories are global, so several location workers hit the same model
/// concurrently; each model sits behind its own mutex.
pub struct RiskEngine {
    models: HashMap<Category, Mutex<CategoryModel>>,
    samples: usize,
}

impl RiskEngine {
    pub fn new(categories: &[Category], config: &ForecastConfig, seed: Option<u64>) -> Result<Self, ForecastError> {
        if config.monte_carlo_samples < MIN_SAMPLES {
            return Err(ForecastError::InsufficientSamples {
                requested: config.monte_carlo_samples,
                minimum: MIN_SAMPLES,
            });
        }

        let mut master = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut models = HashMap::with_capacity(categories.len());
        for category in categories {
            let demand = DemandModel::seeded(master.gen(), config.noise_std, config.volatility_window)
                .map_err(|e| ForecastError::InvalidNoise(e.to_string()))?;
            tracing::debug!(category = %category, r = demand.r(), x0 = demand.state(), "Demand model initialised");

            let jitter = StdRng::seed_from_u64(master.gen());
            models.insert(category.clone(), Mutex::new(CategoryModel { demand, jitter }));
        }

        Ok(Self {
            models,
            samples: config.monte_carlo_samples,
        })
    }

    /// Draw `n_samples` demand values scaled by `external_factor` and a
    /// uniform 0.8..1.2 jitter.
    pub fn simulate_demand(
        &self,
        category: &str,
        external_factor: f64,
        n_samples: usize,
    ) -> Result<DemandForecast, ForecastError> {
        check_samples(n_samples)?;
        let mut model = self.model(category)?.lock();
        Ok(model.simulate(external_factor, n_samples))
    }

    pub fn volatility(&self, category: &str) -> Result<f64, ForecastError> {
        Ok(self.model(category)?.lock().demand.volatility())
    }

    /// Simulate, read volatility and score under a single lock so no other
    /// worker's draws land in between.
    pub fn assess_demand(
        &self,
        category: &str,
        available: u64,
        external_factor: f64,
    ) -> Result<RiskAssessment, ForecastError> {
        let (forecast, volatility) = {
            let mut model = self.model(category)?.lock();
            let forecast = model.simulate(external_factor, self.samples);
            let volatility = model.demand.volatility();
            (forecast, volatility)
        };

        let score = Self::score_risk(available as f64, forecast.mean, forecast.std, volatility);
        let level = Self::level_for(score);

        tracing::debug!(
            category = %category,
            available,
            forecast_mean = forecast.mean,
            forecast_std = forecast.std,
            volatility,
            score,
            "Demand risk assessed"
        );

        Ok(RiskAssessment::demand(category, level, score, forecast.mean))
    }

    /// Combined stockout risk in `[0, 1]`.
    ///
    /// 60% buffer adequacy (days of supply against an 8-day knee), 30%
    /// short-term service risk, 10% demand volatility.
    pub fn score_risk(available: f64, forecast_mean: f64, forecast_std: f64, volatility: f64) -> f64 {
        if forecast_mean <= 0.0 {
            return 0.0;
        }

        let days_of_supply = available / forecast_mean;
        let volatility_impact = volatility * 2.0;

        let service_risk = if forecast_std > 0.0 {
            let z = -(available - forecast_mean) / forecast_std;
            1.0 - (1.0 / (1.0 + (-z).exp()))
        } else {
            0.5
        };

        let base_risk = 1.0 / (1.0 + (0.3 * (days_of_supply - 8.0)).exp());
        let combined = base_risk * 0.6 + service_risk * 0.3 + volatility_impact * 0.1;
        combined.min(1.0)
    }

    /// Demand path only distinguishes MEDIUM and HIGH
    pub fn level_for(score: f64) -> RiskLevel {
        if score > HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        }
    }

    fn model(&self, category: &str) -> Result<&Mutex<CategoryModel>, ForecastError> {
        self.models
            .get(category)
            .ok_or_else(|| ForecastError::UnknownCategory(category.to_string()))
    }
}

fn check_samples(n_samples: usize) -> Result<(), ForecastError> {
    if n_samples < MIN_SAMPLES {
        return Err(ForecastError::InsufficientSamples {
            requested: n_samples,
            minimum: MIN_SAMPLES,
        });
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Insufficient Monte Carlo samples: requested {requested}, minimum {minimum}")]
    InsufficientSamples {
        requested: usize,
        minimum: usize,
    },

    #[error("Invalid demand noise: {0}")]
    InvalidNoise(String),
}
