//! Turn raw hourly/daily series into dashboard cards.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Timelike};

use crate::{
    condition::{WeatherCondition, classify},
    format::format_display_date,
    model::{CurrentConditions, CurrentWeather, DailyEntry, DaySummary, HourlySample},
};

/// Number of days shown in the forecast strip.
pub const FORECAST_HORIZON_DAYS: usize = 5;

/// The hourly sample chosen to stand in for a day's humidity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RepresentativeHour<'a> {
    /// Sample taken at exactly 12:00 local time.
    Noon(&'a HourlySample),
    /// No noon sample; first sample of that date.
    FirstOfDay(&'a HourlySample),
    /// No hourly sample for that date at all.
    Missing,
}

impl<'a> RepresentativeHour<'a> {
    pub fn find(hourly: &'a [HourlySample], date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0);

        if let Some(sample) = hourly.iter().find(|s| Some(s.timestamp) == noon) {
            return Self::Noon(sample);
        }

        match hourly.iter().find(|s| s.timestamp.date() == date) {
            Some(sample) => Self::FirstOfDay(sample),
            None => Self::Missing,
        }
    }

    pub fn sample(&self) -> Option<&'a HourlySample> {
        match *self {
            Self::Noon(sample) | Self::FirstOfDay(sample) => Some(sample),
            Self::Missing => None,
        }
    }

    pub fn humidity(&self) -> u8 {
        self.sample().map(|s| s.relative_humidity).unwrap_or(0)
    }
}

/// Build one summary card from a daily entry and the hourly series.
pub fn summarize_day(entry: &DailyEntry, hourly: &[HourlySample]) -> DaySummary {
    let representative = RepresentativeHour::find(hourly, entry.date);
    if representative == RepresentativeHour::Missing {
        tracing::debug!(date = %entry.date, "no hourly sample for day, humidity defaults to 0");
    }

    let (description, icon) = classify(entry.weather_code);

    DaySummary {
        date: entry.date,
        display_date: format_display_date(entry.date),
        min_temp: entry.min_temp,
        max_temp: entry.max_temp,
        weather_code: entry.weather_code,
        icon,
        description: description.to_string(),
        humidity: representative.humidity(),
        wind_speed: entry.max_wind_speed,
        representative_timestamp: representative.sample().map(|s| s.timestamp),
    }
}

/// Aggregate the daily series into at most [`FORECAST_HORIZON_DAYS`] cards,
/// ascending by date, one per distinct date (first occurrence wins).
pub fn aggregate_days(hourly: &[HourlySample], daily: &[DailyEntry]) -> Vec<DaySummary> {
    let mut by_date: BTreeMap<NaiveDate, &DailyEntry> = BTreeMap::new();
    for entry in daily {
        by_date.entry(entry.date).or_insert(entry);
    }

    by_date
        .values()
        .take(FORECAST_HORIZON_DAYS)
        .map(|entry| summarize_day(entry, hourly))
        .collect()
}

/// Build the current conditions card.
///
/// Humidity and feels-like come from the hourly sample of the current hour;
/// min/max from today's daily entry.
pub fn current_conditions(
    current: &CurrentWeather,
    hourly: &[HourlySample],
    daily: &[DailyEntry],
) -> CurrentConditions {
    let hour_start = current
        .time
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(current.time);

    let sample = hourly.iter().find(|s| s.timestamp == hour_start);
    if sample.is_none() {
        tracing::debug!(time = %current.time, "no hourly sample for current hour");
    }

    let today = daily.iter().find(|d| d.date == current.time.date());
    let condition = WeatherCondition::from_wmo_code(current.weather_code);

    CurrentConditions {
        observed_at: current.time,
        temperature: current.temperature,
        feels_like: sample.map(|s| s.apparent_temperature).unwrap_or(current.temperature),
        min_temp: today.map(|d| d.min_temp).unwrap_or(current.temperature),
        max_temp: today.map(|d| d.max_temp).unwrap_or(current.temperature),
        humidity: sample.map(|s| s.relative_humidity).unwrap_or(0),
        wind_speed: current.wind_speed,
        wind_direction: current.wind_direction,
        condition,
        icon: condition.icon_code(current.is_day),
    }
}
