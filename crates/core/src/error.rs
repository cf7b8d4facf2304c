use thiserror::Error;

pub type AdserveResult<T> = Result<T, AdserveError>;

#[derive(Error, Debug)]
pub enum AdserveError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Campaign store error: {0}")]
    CampaignStore(String),

    #[error("Event store error: {0}")]
    EventStore(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
