use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response has no bitcoin quote in '{0}'")]
    MissingQuote(String),
}

pub type Result<T> = std::result::Result<T, PriceError>;
