//! Errors raised while fetching race data.
use thiserror::Error;

/// Everything that can go wrong during a single fetch.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured endpoint could not be turned into an HTTP(S) URL.
    #[error("The URL is invalid: {url}")]
    InvalidUrl { url: String },

    /// The server could not be reached, or answered with something other than 200.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// The server answered 200 but the body was not the expected envelope.
    #[error("Failed to decode the data.")]
    Decoding(#[source] serde_json::Error),
}

impl ApiError {
    /// Whether trying again later could plausibly succeed.
    ///
    /// A bad endpoint is a configuration bug and never heals by itself. A
    /// decoding failure is treated as retryable since the upstream feed may
    /// correct itself on the next publish.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::InvalidUrl { .. } => false,
            ApiError::Network(_) | ApiError::Decoding(_) => true,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Network(NetworkError::Timeout(_)))
    }
}

/// Transport-level causes wrapped by [`ApiError::Network`].
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("The request timed out.")]
    Timeout(#[source] reqwest::Error),

    #[error("Could not connect to the server.")]
    Connect(#[source] reqwest::Error),

    #[error("Server returned an error: {0}.")]
    Status(u16),

    #[error("{0}")]
    Transport(#[source] reqwest::Error),
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            NetworkError::Timeout(err)
        } else if err.is_connect() {
            NetworkError::Connect(err)
        } else {
            NetworkError::Transport(err)
        }
    }
}
