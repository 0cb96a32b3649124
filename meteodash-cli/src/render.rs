//! Plain-text rendering of the dashboard cards.

use std::fmt::Write as _;

use meteodash_core::{
    AirQuality, CurrentConditions, DaySummary, Place, TemperatureUnit, WeatherReport,
    format::{TemperatureBand, aqi_label, capitalize_words, compass, format_temp, format_wind_kmh},
};

pub fn render_report(report: &WeatherReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "{}", report.place.label());
    let _ = writeln!(out, "{}", "=".repeat(report.place.label().chars().count()));

    if let Some(current) = &report.current {
        render_current(&mut out, current, report.unit);
    }

    if let Some(aq) = &report.air_quality {
        render_air_quality(&mut out, aq);
    }

    render_forecast(&mut out, &report.days);
    out
}

fn render_current(out: &mut String, current: &CurrentConditions, unit: TemperatureUnit) {
    let band = TemperatureBand::from_celsius(unit.to_celsius(current.temperature));

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  {}{}  feels like {}   {} [{}] ({band:?})",
        current.temperature.round() as i64,
        unit.symbol(),
        format_temp(current.feels_like),
        capitalize_words(current.condition.description()),
        current.icon,
    );
    let _ = writeln!(
        out,
        "  Min / Max    {} / {}",
        format_temp(current.min_temp),
        format_temp(current.max_temp)
    );
    let _ = writeln!(out, "  Humidity     {}%", current.humidity);
    let _ = writeln!(
        out,
        "  Wind         {} {}",
        format_wind_kmh(current.wind_speed),
        compass(current.wind_direction)
    );
}

fn render_air_quality(out: &mut String, aq: &AirQuality) {
    let filled = usize::from(aq.index.min(5));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "  Air quality  {} ({})  [{}{}]",
        aqi_label(aq.index),
        aq.index,
        "#".repeat(filled * 2),
        ".".repeat((5 - filled) * 2),
    );
}

fn render_forecast(out: &mut String, days: &[DaySummary]) {
    if days.is_empty() {
        return;
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "  {}-Day Forecast", days.len());
    for day in days {
        let _ = writeln!(
            out,
            "  {:<12} {:<24} {:>5} / {:<5} {:>4}%  {}",
            day.display_date,
            format!("{} [{}]", day.description, day.icon),
            format_temp(day.min_temp),
            format_temp(day.max_temp),
            day.humidity,
            format_wind_kmh(day.wind_speed),
        );
    }
}

/// One line per search result.
pub fn render_places(places: &[Place]) -> String {
    let mut out = String::new();
    for (i, place) in places.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} ({:.2}, {:.2})",
            i + 1,
            place.label(),
            place.latitude,
            place.longitude
        );
    }
    out
}
