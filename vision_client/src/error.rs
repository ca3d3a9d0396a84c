use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("An API key is required to call {0}")]
    MissingApiKey(String),
    #[error("Failed to build http client: {0}")]
    ClientBuild(reqwest::Error),
    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Authentication rejected by {endpoint} ({status})")]
    Unauthorized { endpoint: String, status: StatusCode },
    #[error("Rate limited by {endpoint}")]
    RateLimited { endpoint: String },
    #[error("{endpoint} responded with {status}: {body}")]
    Service {
        endpoint: String,
        status: StatusCode,
        body: String,
    },
    #[error("Malformed response from {endpoint}: {source}")]
    MalformedResponse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}
