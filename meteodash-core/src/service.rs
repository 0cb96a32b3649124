//! Ties provider, aggregation and cache together into one dashboard query.

use chrono::Utc;

use crate::{
    aggregate::{aggregate_days, current_conditions},
    cache::{QueryKey, ReportCache},
    error::WeatherError,
    model::{LocationQuery, Place, TemperatureUnit, WeatherReport},
    provider::WeatherProvider,
};

/// Split `"Paris, FR"` into the search name and an optional country hint.
fn split_city_query(query: &str) -> (&str, Option<&str>) {
    match query.split_once(',') {
        Some((name, hint)) => {
            let hint = hint.trim();
            (name.trim(), (!hint.is_empty()).then_some(hint))
        }
        None => (query.trim(), None),
    }
}

/// Pick the first place whose country code or country name matches `hint`,
/// falling back to the first place.
fn pick_place(places: Vec<Place>, hint: Option<&str>) -> Option<Place> {
    if let Some(hint) = hint {
        let matches = |p: &Place| {
            p.country_code.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(hint))
                || p.country.eq_ignore_ascii_case(hint)
                || p.admin1.as_deref().is_some_and(|a| a.eq_ignore_ascii_case(hint))
        };
        if let Some(pos) = places.iter().position(matches) {
            return places.into_iter().nth(pos);
        }
    }
    places.into_iter().next()
}

#[derive(Debug)]
pub struct Dashboard {
    provider: Box<dyn WeatherProvider>,
    unit: TemperatureUnit,
    cache: Option<ReportCache>,
}

impl Dashboard {
    pub fn new(provider: Box<dyn WeatherProvider>, unit: TemperatureUnit) -> Self {
        Self { provider, unit, cache: None }
    }

    pub fn with_cache(mut self, cache: ReportCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn provider(&self) -> &dyn WeatherProvider {
        self.provider.as_ref()
    }

    /// Resolve a query to a place.
    pub async fn resolve(&self, query: &LocationQuery) -> Result<Place, WeatherError> {
        match query {
            LocationQuery::City(city) => {
                let (name, hint) = split_city_query(city);
                let places = self.provider.search_cities(name).await?;
                pick_place(places, hint).ok_or_else(|| WeatherError::CityNotFound(city.clone()))
            }
            LocationQuery::Coords { lat, lon } => Ok(self.provider.locate(*lat, *lon).await),
            LocationQuery::Place(place) => Ok(place.clone()),
        }
    }

    /// Build the report for `query`, serving a fresh cached copy unless
    /// `refresh` is set.
    pub async fn report(
        &mut self,
        query: &LocationQuery,
        refresh: bool,
    ) -> Result<WeatherReport, WeatherError> {
        let key = QueryKey::new(query, self.unit);

        if !refresh {
            if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(&key)) {
                tracing::debug!(key = key.as_str(), "serving report from cache");
                return Ok(hit.clone());
            }
        }

        let report = self.fetch(query).await?;

        if let Some(cache) = self.cache.as_mut() {
            cache.insert(&key, report.clone());
            if let Err(e) = cache.persist() {
                tracing::warn!(error = %e, "failed to persist report cache");
            }
        }

        Ok(report)
    }

    async fn fetch(&self, query: &LocationQuery) -> Result<WeatherReport, WeatherError> {
        let place = self.resolve(query).await?;
        tracing::info!(place = %place.label(), "fetching weather");

        let (forecast, air_quality) = tokio::join!(
            self.provider.forecast(place.latitude, place.longitude, self.unit),
            self.provider.air_quality(place.latitude, place.longitude),
        );
        let forecast = forecast?;

        let air_quality = air_quality.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "air quality unavailable");
            None
        });

        let current = forecast
            .current
            .as_ref()
            .map(|c| current_conditions(c, &forecast.hourly, &forecast.daily));

        Ok(WeatherReport {
            place,
            unit: self.unit,
            current,
            days: aggregate_days(&forecast.hourly, &forecast.daily),
            air_quality,
            fetched_at: Utc::now(),
        })
    }
}
