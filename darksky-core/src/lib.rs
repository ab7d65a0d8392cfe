//! Client library for the Dark Sky forecast API.
//!
//! This crate defines:
//! - The forecast data model, mirroring the upstream JSON
//! - A fetcher that performs one GET per lookup and decodes the body
//! - Configuration & credentials handling for binaries built on top
//!
//! ```no_run
//! # async fn run() -> Result<(), darksky_core::ForecastError> {
//! let forecast = darksky_core::get("abcdef0123456789abcdef0123456789", 37.8267, -122.4233).await?;
//! println!("{}", forecast.timezone);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod model;

pub use client::{
    DEFAULT_BASE_URL, ForecastClient, ForecastClientBuilder, get,
    transport::{HttpTransport, Transport, TransportError, TransportResponse},
};
pub use config::Config;
pub use error::ForecastError;
pub use model::{Alert, DataBlock, DataPoint, Forecast, ICONS, Icon, PRECIP_TYPES, PrecipType};

pub use tokio_util::sync::CancellationToken;
