//! Core library for the `meteodash` terminal weather dashboard.
//!
//! This crate defines:
//! - WMO weather code classification and the 5-day forecast aggregation
//! - The Open-Meteo provider (forecast, geocoding, air quality)
//! - Configuration, the report cache and display formatting helpers
//!
//! It is used by `meteodash-cli`, but can also be reused by other binaries or services.

pub mod aggregate;
pub mod cache;
pub mod condition;
pub mod config;
pub mod error;
pub mod format;
pub mod model;
pub mod provider;
pub mod retry;
pub mod service;

pub use aggregate::{FORECAST_HORIZON_DAYS, RepresentativeHour, aggregate_days, current_conditions};
pub use cache::{QueryKey, ReportCache};
pub use condition::{WeatherCondition, classify};
pub use config::{Config, Endpoints};
pub use error::WeatherError;
pub use model::{
    AirQuality, CurrentConditions, DailyEntry, DaySummary, Forecast, HourlySample, LocationQuery,
    Place, TemperatureUnit, WeatherReport,
};
pub use provider::{WeatherProvider, provider_from_config};
pub use service::Dashboard;
