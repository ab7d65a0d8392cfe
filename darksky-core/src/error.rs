use std::time::Duration;

use crate::client::transport::TransportError;

/// Everything that can go wrong while fetching a forecast.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    /// The request could not be sent or the body could not be read.
    #[error("Failed to reach the forecast API: {0}")]
    Transport(#[from] TransportError),

    /// The body was read but is not a forecast document.
    #[error("Failed to parse forecast JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// The upstream answered with a non-success status.
    #[error("Forecast request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Forecast request was cancelled")]
    Cancelled,

    #[error("Forecast request did not complete within {0:?}")]
    DeadlineElapsed(Duration),

    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ForecastError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ForecastError::Transport(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, ForecastError::Decode(_))
    }
}
