//! WMO weather code classification.
//!
//! Open-Meteo reports sky and precipitation state as a WMO code
//! (https://open-meteo.com/en/docs#weathervariables). This module maps a code
//! to a description and an OpenWeatherMap-style icon code.

use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from WMO codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    ClearSky,
    MainlyClear,
    PartlyCloudy,
    Overcast,
    Fog,
    Drizzle,
    FreezingDrizzle,
    Rain,
    FreezingRain,
    Snow,
    RainShowers,
    SnowShowers,
    Thunderstorm,
    ThunderstormWithHail,
    #[default]
    Unknown,
}

impl WeatherCondition {
    /// Classify a WMO code. Codes outside the table map to `Unknown`.
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::ClearSky,
            1 => Self::MainlyClear,
            2 => Self::PartlyCloudy,
            3 => Self::Overcast,
            45..=48 => Self::Fog,
            51..=55 => Self::Drizzle,
            56..=57 => Self::FreezingDrizzle,
            61..=65 => Self::Rain,
            66..=67 => Self::FreezingRain,
            71..=77 => Self::Snow,
            80..=82 => Self::RainShowers,
            85..=86 => Self::SnowShowers,
            95 => Self::Thunderstorm,
            96..=99 => Self::ThunderstormWithHail,
            _ => Self::Unknown,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ClearSky => "Clear sky",
            Self::MainlyClear => "Mainly clear",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Overcast => "Overcast",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::FreezingDrizzle => "Freezing drizzle",
            Self::Rain => "Rain",
            Self::FreezingRain => "Freezing rain",
            Self::Snow => "Snow",
            Self::RainShowers => "Rain showers",
            Self::SnowShowers => "Snow showers",
            Self::Thunderstorm => "Thunderstorm",
            Self::ThunderstormWithHail => "Thunderstorm with hail",
            Self::Unknown => "Unknown",
        }
    }

    /// Icon family without the day/night suffix, e.g. `"10"`.
    ///
    /// Unknown codes share the partly-cloudy icon.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::ClearSky => "01",
            Self::MainlyClear => "02",
            Self::PartlyCloudy | Self::Unknown => "03",
            Self::Overcast => "04",
            Self::Drizzle | Self::FreezingDrizzle | Self::RainShowers => "09",
            Self::Rain => "10",
            Self::Thunderstorm | Self::ThunderstormWithHail => "11",
            Self::FreezingRain | Self::Snow | Self::SnowShowers => "13",
            Self::Fog => "50",
        }
    }

    /// Full icon code with the day (`d`) or night (`n`) suffix.
    pub fn icon_code(&self, is_day: bool) -> String {
        format!("{}{}", self.icon(), if is_day { 'd' } else { 'n' })
    }
}

impl std::fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Shorthand for `(description, day icon code)` of a WMO code.
pub fn classify(code: i32) -> (&'static str, String) {
    let condition = WeatherCondition::from_wmo_code(code);
    (condition.description(), condition.icon_code(true))
}
