use thiserror::Error;
use warrant_config::ConfigError;

/// Errors from assembling an [`AccessCore`](crate::AccessCore).
#[derive(Debug, Error)]
pub enum WarrantError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] warrant_types::Error),
}

pub type Result<T> = std::result::Result<T, WarrantError>;
