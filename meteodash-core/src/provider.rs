use crate::{
    Config,
    error::WeatherError,
    model::{AirQuality, Forecast, Place, TemperatureUnit},
    provider::openmeteo::OpenMeteoProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openmeteo;

/// Minimum trimmed length of a city search query.
pub const MIN_SEARCH_LEN: usize = 2;

/// Maximum number of city search results.
pub const MAX_SEARCH_RESULTS: usize = 5;

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Up to [`MAX_SEARCH_RESULTS`] places matching `query`. Queries shorter
    /// than [`MIN_SEARCH_LEN`] return an empty list.
    async fn search_cities(&self, query: &str) -> Result<Vec<Place>, WeatherError>;

    /// Name the place at a coordinate pair. Never fails: an unknown place is
    /// named `"Unknown"`.
    async fn locate(&self, lat: f64, lon: f64) -> Place;

    async fn forecast(
        &self,
        lat: f64,
        lon: f64,
        unit: TemperatureUnit,
    ) -> Result<Forecast, WeatherError>;

    async fn air_quality(&self, lat: f64, lon: f64) -> Result<Option<AirQuality>, WeatherError>;
}

/// Construct the provider described by `config`.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>, WeatherError> {
    let provider = OpenMeteoProvider::new(
        config.endpoints.clone(),
        config.request_timeout(),
        config.retry,
    )?;
    Ok(Box::new(provider))
}
