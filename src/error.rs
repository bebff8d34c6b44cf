//! Error types for the strike governor

use crate::chain::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing signing credential: {0}")]
    MissingCredential(String),

    #[error("Missing executor contract address: {0}")]
    MissingContract(String),

    #[error("Operating address {0} collides with the fixed recipient")]
    RecipientCollision(alloy::primitives::Address),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Startup preconditions that keep the governor from entering its run loop
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Error::MissingCredential(_) | Error::MissingContract(_) | Error::RecipientCollision(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
