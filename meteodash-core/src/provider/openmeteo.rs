use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    config::Endpoints,
    error::WeatherError,
    model::{
        AirQuality, CurrentWeather, DailyEntry, Forecast, HourlySample, Place, TemperatureUnit,
    },
    retry::{RetryConfig, with_retry},
};

use super::{MAX_SEARCH_RESULTS, MIN_SEARCH_LEN, WeatherProvider};

const USER_AGENT: &str = concat!("meteodash/", env!("CARGO_PKG_VERSION"));

const HOURLY_FIELDS: &str = "temperature_2m,relativehumidity_2m,apparent_temperature,\
                             precipitation_probability,weathercode,windspeed_10m";
const DAILY_FIELDS: &str = "weathercode,temperature_2m_max,temperature_2m_min,\
                            apparent_temperature_max,apparent_temperature_min,sunrise,sunset,\
                            uv_index_max,precipitation_probability_max,windspeed_10m_max";

/// Open-Meteo forecast, geocoding and air-quality APIs (no API key required).
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    endpoints: Endpoints,
    retry: RetryConfig,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new(
        endpoints: Endpoints,
        timeout: Duration,
        retry: RetryConfig,
    ) -> Result<Self, WeatherError> {
        let http = Client::builder().timeout(timeout).user_agent(USER_AGENT).build()?;
        Ok(Self { endpoints, retry, http })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, WeatherError> {
        tracing::debug!(url, "GET");

        let res = with_retry(self.retry, || self.http.get(url).query(query).send()).await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::status(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn search_cities(&self, query: &str) -> Result<Vec<Place>, WeatherError> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Ok(Vec::new());
        }

        let url = format!("{}/search", self.endpoints.geocoding);
        let parsed: OmGeoResponse = self
            .get_json(
                &url,
                &[
                    ("name", query.to_string()),
                    ("count", MAX_SEARCH_RESULTS.to_string()),
                    ("language", "en".to_string()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;

        Ok(parsed
            .results
            .unwrap_or_default()
            .into_iter()
            .take(MAX_SEARCH_RESULTS)
            .map(Place::from)
            .collect())
    }

    async fn locate(&self, lat: f64, lon: f64) -> Place {
        let url = format!("{}/reverse", self.endpoints.reverse_geocoding);
        let query = [
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("format", "json".to_string()),
            ("zoom", "10".to_string()),
        ];

        let address = match self.get_json::<NominatimResponse>(&url, &query).await {
            Ok(parsed) => parsed.address,
            Err(e) => {
                tracing::warn!(error = %e, "reverse geocoding failed");
                None
            }
        };

        address.map_or_else(
            || unknown_place(lat, lon),
            |addr| addr.into_place(lat, lon),
        )
    }

    async fn forecast(
        &self,
        lat: f64,
        lon: f64,
        unit: TemperatureUnit,
    ) -> Result<Forecast, WeatherError> {
        let url = format!("{}/forecast", self.endpoints.forecast);
        let parsed: OmForecastResponse = self
            .get_json(
                &url,
                &[
                    ("latitude", lat.to_string()),
                    ("longitude", lon.to_string()),
                    ("hourly", HOURLY_FIELDS.to_string()),
                    ("daily", DAILY_FIELDS.to_string()),
                    ("current_weather", "true".to_string()),
                    ("timezone", "auto".to_string()),
                    ("windspeed_unit", "ms".to_string()),
                    ("temperature_unit", unit.as_str().to_string()),
                ],
            )
            .await?;

        Ok(parsed.into())
    }

    async fn air_quality(&self, lat: f64, lon: f64) -> Result<Option<AirQuality>, WeatherError> {
        let url = format!("{}/air-quality", self.endpoints.air_quality);
        let parsed: OmAirQualityResponse = self
            .get_json(
                &url,
                &[
                    ("latitude", lat.to_string()),
                    ("longitude", lon.to_string()),
                    ("current", "european_aqi".to_string()),
                ],
            )
            .await?;

        Ok(parsed
            .current
            .and_then(|c| c.european_aqi)
            .map(AirQuality::from_european_aqi))
    }
}

fn unknown_place(lat: f64, lon: f64) -> Place {
    Place {
        name: "Unknown".to_string(),
        country: "Unknown".to_string(),
        country_code: None,
        admin1: None,
        latitude: lat,
        longitude: lon,
    }
}

/// Open-Meteo sends local wall-clock times without seconds (`2024-03-01T12:00`).
fn parse_local_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_local_time(s).map(|t| t.date()))
}

fn humidity_pct(value: Option<f64>) -> u8 {
    value.map(|v| v.clamp(0.0, 100.0).round() as u8).unwrap_or(0)
}

#[derive(Debug, Deserialize)]
struct OmGeoResponse {
    results: Option<Vec<OmGeoResult>>,
}

#[derive(Debug, Deserialize)]
struct OmGeoResult {
    name: String,
    latitude: f64,
    longitude: f64,
    country: Option<String>,
    country_code: Option<String>,
    admin1: Option<String>,
}

impl From<OmGeoResult> for Place {
    fn from(r: OmGeoResult) -> Self {
        Place {
            name: r.name,
            country: r.country.unwrap_or_else(|| "Unknown".to_string()),
            country_code: r.country_code,
            admin1: r.admin1,
            latitude: r.latitude,
            longitude: r.longitude,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

impl NominatimAddress {
    fn into_place(self, lat: f64, lon: f64) -> Place {
        let name = self
            .city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .or(self.county)
            .or_else(|| self.state.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        Place {
            name,
            country: self.country.unwrap_or_else(|| "Unknown".to_string()),
            country_code: self.country_code.map(|c| c.to_uppercase()),
            admin1: self.state,
            latitude: lat,
            longitude: lon,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    #[serde(default)]
    timezone: String,
    current_weather: Option<OmCurrentWeather>,
    hourly: Option<OmHourly>,
    daily: Option<OmDaily>,
}

#[derive(Debug, Deserialize)]
struct OmCurrentWeather {
    time: String,
    temperature: f64,
    windspeed: f64,
    winddirection: f64,
    weathercode: f64,
    #[serde(default)]
    is_day: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    relativehumidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    apparent_temperature: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    #[serde(default)]
    time: Vec<String>,
    #[serde(default)]
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    weathercode: Vec<Option<f64>>,
    #[serde(default)]
    windspeed_10m_max: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmAirQualityResponse {
    current: Option<OmAirQualityCurrent>,
}

#[derive(Debug, Deserialize)]
struct OmAirQualityCurrent {
    european_aqi: Option<f64>,
}

impl OmHourly {
    /// Index-aligned arrays zipped to their shortest common length. Samples
    /// without a parseable time or a temperature are dropped.
    fn into_samples(self) -> Vec<HourlySample> {
        let total = self.time.len();
        let samples: Vec<HourlySample> = self
            .time
            .iter()
            .zip(self.temperature_2m)
            .zip(self.relativehumidity_2m)
            .zip(self.apparent_temperature)
            .filter_map(|(((time, temp), humidity), apparent)| {
                let timestamp = parse_local_time(time)?;
                let temperature = temp?;
                Some(HourlySample {
                    timestamp,
                    temperature,
                    relative_humidity: humidity_pct(humidity),
                    apparent_temperature: apparent.unwrap_or(temperature),
                })
            })
            .collect();

        if samples.len() != total {
            tracing::debug!(total, kept = samples.len(), "dropped incomplete hourly samples");
        }
        samples
    }
}

impl OmDaily {
    fn into_entries(self) -> Vec<DailyEntry> {
        let total = self.time.len();
        let entries: Vec<DailyEntry> = self
            .time
            .iter()
            .zip(self.temperature_2m_min)
            .zip(self.temperature_2m_max)
            .zip(self.weathercode)
            .zip(self.windspeed_10m_max)
            .filter_map(|((((time, min), max), code), wind)| {
                Some(DailyEntry {
                    date: parse_date(time)?,
                    min_temp: min?,
                    max_temp: max?,
                    weather_code: code.map(|c| c as i32).unwrap_or(-1),
                    max_wind_speed: wind.unwrap_or(0.0),
                })
            })
            .collect();

        if entries.len() != total {
            tracing::debug!(total, kept = entries.len(), "dropped incomplete daily entries");
        }
        entries
    }
}

impl From<OmForecastResponse> for Forecast {
    fn from(r: OmForecastResponse) -> Self {
        let current = r.current_weather.and_then(|c| {
            Some(CurrentWeather {
                time: parse_local_time(&c.time)?,
                temperature: c.temperature,
                wind_speed: c.windspeed,
                wind_direction: c.winddirection,
                weather_code: c.weathercode as i32,
                is_day: c.is_day.unwrap_or(1) != 0,
            })
        });

        Forecast {
            timezone: r.timezone,
            current,
            hourly: r.hourly.map(OmHourly::into_samples).unwrap_or_default(),
            daily: r.daily.map(OmDaily::into_entries).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, retry: RetryConfig) -> OpenMeteoProvider {
        OpenMeteoProvider::new(Endpoints::single(&server.uri()), Duration::from_secs(5), retry)
            .unwrap()
    }

    fn forecast_body() -> serde_json::Value {
        json!({
            "timezone": "Europe/London",
            "current_weather": {
                "time": "2024-03-01T12:30",
                "temperature": 9.4,
                "windspeed": 4.2,
                "winddirection": 250.0,
                "weathercode": 61,
                "is_day": 1
            },
            "hourly": {
                "time": ["2024-03-01T11:00", "2024-03-01T12:00", "2024-03-02T00:00"],
                "temperature_2m": [9.0, 9.5, 6.0],
                "relativehumidity_2m": [80, 76, 90],
                "apparent_temperature": [7.1, 7.4, null]
            },
            "daily": {
                "time": ["2024-03-01", "2024-03-02"],
                "temperature_2m_min": [4.0, 3.5],
                "temperature_2m_max": [10.2, 11.0],
                "weathercode": [61, 3],
                "windspeed_10m_max": [6.1, 5.0]
            }
        })
    }

    #[test]
    fn parses_open_meteo_times() {
        let t = parse_local_time("2024-03-01T12:00").unwrap();
        assert_eq!(t, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(12, 0, 0).unwrap());
        assert!(parse_local_time("2024-03-01T12:00:30").is_some());
        assert!(parse_local_time("yesterday").is_none());

        assert_eq!(parse_date("2024-03-01"), NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(parse_date("2024-03-01T00:00"), NaiveDate::from_ymd_opt(2024, 3, 1));
    }

    #[test]
    fn misaligned_series_keep_common_prefix() {
        let daily = OmDaily {
            time: vec!["2024-03-01".into(), "2024-03-02".into(), "2024-03-03".into()],
            temperature_2m_min: vec![Some(1.0), Some(2.0)],
            temperature_2m_max: vec![Some(5.0), None, Some(7.0)],
            weathercode: vec![None, Some(3.0), Some(3.0)],
            windspeed_10m_max: vec![Some(1.0), Some(1.0), Some(1.0)],
        };

        let entries = daily.into_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].weather_code, -1);
    }

    #[tokio::test]
    async fn forecast_maps_series() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("latitude", "51.5"))
            .and(query_param("longitude", "-0.12"))
            .and(query_param("temperature_unit", "fahrenheit"))
            .and(query_param("windspeed_unit", "ms"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
            .expect(1)
            .mount(&server)
            .await;

        let forecast = provider(&server, RetryConfig::none())
            .forecast(51.5, -0.12, TemperatureUnit::Fahrenheit)
            .await
            .unwrap();

        assert_eq!(forecast.timezone, "Europe/London");
        assert_eq!(forecast.hourly.len(), 3);
        assert_eq!(forecast.hourly[1].relative_humidity, 76);
        assert_eq!(forecast.hourly[2].apparent_temperature, 6.0);
        assert_eq!(forecast.daily.len(), 2);
        assert_eq!(forecast.daily[0].weather_code, 61);

        let current = forecast.current.unwrap();
        assert_eq!(current.weather_code, 61);
        assert!(current.is_day);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad latitude"))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider(&server, RetryConfig::default())
            .forecast(100.0, 0.0, TemperatureUnit::Celsius)
            .await
            .unwrap_err();

        match err {
            WeatherError::Status { status, body } => {
                assert_eq!(status.as_u16(), 400);
                assert_eq!(body, "bad latitude");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/air-quality"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/air-quality"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"current": {"european_aqi": 35}})),
            )
            .mount(&server)
            .await;

        let retry = RetryConfig { max_retries: 2, initial_delay_ms: 1, max_delay_ms: 5 };
        let aq = provider(&server, retry).air_quality(51.5, -0.12).await.unwrap();

        assert_eq!(aq.map(|a| a.index), Some(2));
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = provider(&server, RetryConfig::none())
            .forecast(0.0, 0.0, TemperatureUnit::Celsius)
            .await
            .unwrap_err();
        assert!(matches!(err, WeatherError::Parse(_)));
    }

    #[tokio::test]
    async fn short_queries_do_not_hit_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(500)).expect(0).mount(&server).await;

        let places = provider(&server, RetryConfig::none()).search_cities(" a ").await.unwrap();
        assert!(places.is_empty());
    }

    #[tokio::test]
    async fn search_returns_at_most_five_places() {
        let server = MockServer::start().await;
        let results: Vec<_> = (0..7)
            .map(|i| {
                json!({
                    "name": format!("Springfield {i}"),
                    "latitude": 39.0,
                    "longitude": -89.0,
                    "country": "United States",
                    "country_code": "US",
                    "admin1": "Illinois"
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("name", "Springfield"))
            .and(query_param("count", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
            .mount(&server)
            .await;

        let places = provider(&server, RetryConfig::none()).search_cities("Springfield").await.unwrap();
        assert_eq!(places.len(), 5);
        assert_eq!(places[0].label(), "Springfield 0, Illinois, United States");
    }

    #[tokio::test]
    async fn search_without_results_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "generationtime_ms": 0.1 })))
            .mount(&server)
            .await;

        let places = provider(&server, RetryConfig::none()).search_cities("Atlantis").await.unwrap();
        assert!(places.is_empty());
    }

    #[tokio::test]
    async fn locate_names_place_from_reverse_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "address": { "town": "Hebden Bridge", "state": "England", "country": "United Kingdom", "country_code": "gb" }
            })))
            .mount(&server)
            .await;

        let place = provider(&server, RetryConfig::none()).locate(53.74, -2.01).await;
        assert_eq!(place.name, "Hebden Bridge");
        assert_eq!(place.country_code.as_deref(), Some("GB"));
        assert_eq!(place.latitude, 53.74);
    }

    #[tokio::test]
    async fn locate_degrades_to_unknown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/reverse"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let place = provider(&server, RetryConfig::none()).locate(0.0, 0.0).await;
        assert_eq!(place.name, "Unknown");
        assert_eq!(place.country, "Unknown");
    }
}
