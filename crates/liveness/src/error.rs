use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error("liveness service returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("liveness service returned {status} without a usable Retry-After header ({value:?})")]
    RetryAfter { status: u16, value: Option<String> },

    #[error("liveness check for {url} failed after {attempts} attempts")]
    AttemptsExhausted { url: String, attempts: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
