use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::condition::WeatherCondition;

/// Temperature unit requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
        }
    }

    pub const fn all() -> &'static [TemperatureUnit] {
        &[TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit]
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }

    /// Convert a reading in this unit to Celsius.
    pub fn to_celsius(self, temp: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => temp,
            TemperatureUnit::Fahrenheit => (temp - 32.0) * 5.0 / 9.0,
        }
    }
}

impl std::fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "celsius" | "c" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" => Ok(TemperatureUnit::Fahrenheit),
            _ => Err(anyhow::anyhow!(
                "Unknown temperature unit '{value}'. Supported units: celsius, fahrenheit."
            )),
        }
    }
}

/// What the user asked to see: a city by name, a coordinate pair, or a
/// place already picked from search results.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coords { lat: f64, lon: f64 },
    Place(Place),
}

/// A resolved place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub country: String,
    pub country_code: Option<String>,
    pub admin1: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Place {
    /// `"Paris, France"`, or `"Paris, Île-de-France, France"` with `admin1`.
    pub fn label(&self) -> String {
        match &self.admin1 {
            Some(region) if !region.is_empty() && region != &self.name => {
                format!("{}, {}, {}", self.name, region, self.country)
            }
            _ => format!("{}, {}", self.name, self.country),
        }
    }
}

/// One hourly forecast sample, in the location's local wall-clock time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub relative_humidity: u8,
    pub apparent_temperature: f64,
}

/// One entry of the provider's daily series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    pub date: NaiveDate,
    pub min_temp: f64,
    pub max_temp: f64,
    pub weather_code: i32,
    pub max_wind_speed: f64,
}

/// The `current_weather` block of a forecast response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub weather_code: i32,
    pub is_day: bool,
}

/// Everything the forecast endpoint returns that the dashboard uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub timezone: String,
    pub current: Option<CurrentWeather>,
    pub hourly: Vec<HourlySample>,
    pub daily: Vec<DailyEntry>,
}

/// Aggregated forecast card for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub display_date: String,
    pub min_temp: f64,
    pub max_temp: f64,
    pub weather_code: i32,
    pub icon: String,
    pub description: String,
    pub humidity: u8,
    pub wind_speed: f64,
    pub representative_timestamp: Option<NaiveDateTime>,
}

/// Current conditions card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub observed_at: NaiveDateTime,
    pub temperature: f64,
    pub feels_like: f64,
    pub min_temp: f64,
    pub max_temp: f64,
    pub humidity: u8,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub condition: WeatherCondition,
    pub icon: String,
}

/// Air quality on the 1 (good) ..= 5 (very poor) scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirQuality {
    pub index: u8,
    pub european_aqi: Option<u16>,
}

impl AirQuality {
    /// Bucket a European AQI reading into the 1..=5 index.
    pub fn from_european_aqi(aqi: f64) -> Self {
        let index = match aqi {
            v if v <= 20.0 => 1,
            v if v <= 40.0 => 2,
            v if v <= 60.0 => 3,
            v if v <= 80.0 => 4,
            _ => 5,
        };
        Self { index, european_aqi: Some(aqi.max(0.0).round() as u16) }
    }
}

/// Everything the dashboard renders for one location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub place: Place,
    pub unit: TemperatureUnit,
    pub current: Option<CurrentConditions>,
    pub days: Vec<DaySummary>,
    pub air_quality: Option<AirQuality>,
    pub fetched_at: DateTime<Utc>,
}
