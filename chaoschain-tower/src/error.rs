use chaoschain_core::CoreError;
use chaoschain_forecast::ForecastError;
use chaoschain_inventory::LedgerError;

#[derive(Debug, thiserror::Error)]
pub enum TowerError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Location {location} worker failed: {reason}")]
    Worker { location: String, reason: String },
}

pub type TowerResult<T> = Result<T, TowerError>;
