pub mod demand;
pub mod engine;
pub mod plugins;

pub use demand::DemandModel;
pub use engine::{DemandForecast, ForecastError, RiskEngine};
pub use plugins::{
    AnomalyDetector, NearestNeighbourOptimizer, ParameterOptimizer, PluginError, ZScoreAnomalyDetector,
};
