use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf, time::Duration};

use crate::{model::TemperatureUnit, retry::RetryConfig};

/// City shown when nothing else is configured or requested.
pub const FALLBACK_CITY: &str = "London";

/// Base URLs of the Open-Meteo services and the reverse geocoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub forecast: String,
    pub geocoding: String,
    pub air_quality: String,
    pub reverse_geocoding: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            forecast: "https://api.open-meteo.com/v1".to_string(),
            geocoding: "https://geocoding-api.open-meteo.com/v1".to_string(),
            air_quality: "https://air-quality-api.open-meteo.com/v1".to_string(),
            reverse_geocoding: "https://nominatim.openstreetmap.org".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every service at one base URL (mock servers, proxies).
    pub fn single(base: &str) -> Self {
        let base = base.trim_end_matches('/').to_string();
        Self {
            forecast: base.clone(),
            geocoding: base.clone(),
            air_quality: base.clone(),
            reverse_geocoding: base,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_city = "Lisbon, PT"
/// temperature_unit = "celsius"
/// cache_ttl_secs = 600
///
/// [endpoints]
/// forecast = "https://api.open-meteo.com/v1"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub default_city: Option<String>,
    pub temperature_unit: TemperatureUnit,
    pub cache_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub endpoints: Endpoints,
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_city: None,
            temperature_unit: TemperatureUnit::default(),
            cache_ttl_secs: 600,
            request_timeout_secs: 10,
            endpoints: Endpoints::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Configured default city, or [`FALLBACK_CITY`].
    pub fn default_city(&self) -> &str {
        self.default_city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(FALLBACK_CITY)
    }

    pub fn set_default_city(&mut self, city: &str) {
        let city = city.trim();
        self.default_city = (!city.is_empty()).then(|| city.to_string());
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Load config from the platform location, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load config from an explicit path, or defaults if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform location.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "meteodash", "meteodash")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the query cache file.
    pub fn cache_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.cache_dir().join("reports.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_city_falls_back_to_london() {
        let mut cfg = Config::default();
        assert_eq!(cfg.default_city(), "London");

        cfg.default_city = Some("   ".into());
        assert_eq!(cfg.default_city(), "London");
    }

    #[test]
    fn set_default_city_trims_and_clears() {
        let mut cfg = Config::default();

        cfg.set_default_city("  Oslo, NO ");
        assert_eq!(cfg.default_city(), "Oslo, NO");

        cfg.set_default_city("");
        assert_eq!(cfg.default_city, None);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_default_city("Reykjavik");
        cfg.temperature_unit = TemperatureUnit::Fahrenheit;
        cfg.cache_ttl_secs = 30;
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "temperature_unit = \"fahrenheit\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.temperature_unit, TemperatureUnit::Fahrenheit);
        assert_eq!(cfg.cache_ttl_secs, 600);
        assert_eq!(cfg.endpoints, Endpoints::default());
    }

    #[test]
    fn invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "cache_ttl_secs = \"soon\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn single_endpoint_strips_trailing_slash() {
        let endpoints = Endpoints::single("http://127.0.0.1:9999/");
        assert_eq!(endpoints.forecast, "http://127.0.0.1:9999");
        assert_eq!(endpoints.air_quality, "http://127.0.0.1:9999");
    }
}
