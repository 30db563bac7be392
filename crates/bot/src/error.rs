use feedback_database::DatabaseError;
use feedback_telegram::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("delivery failed: {0}")]
    Delivery(#[from] GatewayError),
    #[error("cannot parse {0}")]
    Parse(String),
    #[error("persistence failed: {0}")]
    Persistence(#[from] DatabaseError),
}

impl BotError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}

pub type BotResult<T> = Result<T, BotError>;
