use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("missing telegram bot token")]
    MissingToken,
    #[error("telegram http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telegram api rejected {method}: {description}")]
    Api {
        method: String,
        code: Option<i64>,
        description: String,
    },
    #[error("invalid telegram response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Bot API answers 401/404 for a token it does not know.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Api { code: Some(401 | 404), .. })
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;
