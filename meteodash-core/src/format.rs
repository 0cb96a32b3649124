//! Display formatting for dashboard cards.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const AQI_LABELS: [&str; 5] = ["Good", "Fair", "Moderate", "Poor", "Very Poor"];

const COMPASS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// `21.6` -> `"22°"`.
pub fn format_temp(temp: f64) -> String {
    format!("{}°", temp.round() as i64)
}

/// Wind speed given in m/s, rendered in km/h with one decimal.
pub fn format_wind_kmh(speed_mps: f64) -> String {
    format!("{:.1} km/h", speed_mps * 3.6)
}

/// `"light rain"` -> `"Light Rain"`.
pub fn capitalize_words(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `2024-01-01` -> `"Mon, Jan 1"`.
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%a, %b %-d").to_string()
}

/// Nearest 16-point compass direction for a bearing in degrees.
pub fn compass(degrees: f64) -> &'static str {
    let normalized = degrees.rem_euclid(360.0);
    let idx = (normalized / 22.5 + 0.5) as usize % COMPASS.len();
    COMPASS[idx]
}

/// Label for an air-quality index on the 1..=5 scale.
pub fn aqi_label(index: u8) -> &'static str {
    index
        .checked_sub(1)
        .and_then(|i| AQI_LABELS.get(usize::from(i)))
        .copied()
        .unwrap_or("Unknown")
}

/// Coarse temperature bucket used to tint the current conditions card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureBand {
    Freezing,
    Cold,
    Cool,
    Mild,
    Warm,
    Hot,
}

impl TemperatureBand {
    pub fn from_celsius(temp: f64) -> Self {
        match temp {
            t if t <= 0.0 => Self::Freezing,
            t if t <= 10.0 => Self::Cold,
            t if t <= 20.0 => Self::Cool,
            t if t <= 25.0 => Self::Mild,
            t if t <= 30.0 => Self::Warm,
            _ => Self::Hot,
        }
    }
}
