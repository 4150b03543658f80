use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KiteError {
    #[error("missing environment variable {0} (copy the api_key_... value from your KitePass page)")]
    MissingEnv(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("KITE_PAYLOAD_JSON is not valid JSON: {0}")]
    Payload(#[source] serde_json::Error),

    #[error("Kite API returned {status} (body: {body})")]
    Api { status: StatusCode, body: String },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to decode Kite API response: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, KiteError>;
