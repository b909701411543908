pub mod app_config;
pub mod signals;
pub mod mock;

pub use chaoschain_shared::Category;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
