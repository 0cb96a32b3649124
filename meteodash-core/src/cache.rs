//! On-disk cache of finished reports, keyed by query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    error::WeatherError,
    model::{LocationQuery, TemperatureUnit, WeatherReport},
};

/// Cache key for one dashboard query.
///
/// City names are normalized (trimmed, lowercase, single spaces) and
/// coordinates rounded to two decimals (~1 km), so near-identical queries
/// share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    pub fn new(query: &LocationQuery, unit: TemperatureUnit) -> Self {
        let location = match query {
            LocationQuery::City(name) => {
                let normalized = name.split_whitespace().collect::<Vec<_>>().join(" ");
                format!("city:{}", normalized.to_lowercase())
            }
            LocationQuery::Coords { lat, lon } => format!("coords:{lat:.2},{lon:.2}"),
            LocationQuery::Place(place) => {
                format!("place:{:.2},{:.2}", place.latitude, place.longitude)
            }
        };
        Self(format!("{location}|{unit}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    stored_at: DateTime<Utc>,
    report: WeatherReport,
}

#[derive(Debug)]
pub struct ReportCache {
    path: PathBuf,
    ttl: Duration,
    entries: BTreeMap<String, CacheEntry>,
}

impl ReportCache {
    /// Open the cache file at `path`, dropping expired entries.
    ///
    /// A missing or unreadable file yields an empty cache.
    pub fn open(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        let path = path.into();
        let entries = match Self::read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable cache");
                BTreeMap::new()
            }
        };

        let mut cache = Self { path, ttl, entries };
        cache.evict_expired(Utc::now());
        cache
    }

    fn read_entries(path: &Path) -> Result<BTreeMap<String, CacheEntry>, WeatherError> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(path)
            .map_err(|e| WeatherError::Cache(format!("{}: {e}", path.display())))?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn evict_expired(&mut self, now: DateTime<Utc>) {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries.retain(|_, e| is_fresh(e.stored_at, now, ttl));

        let evicted = before - self.entries.len();
        if evicted > 0 {
            tracing::debug!(evicted, "evicted stale cache entries");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fresh report for `key`, if any.
    pub fn get(&self, key: &QueryKey) -> Option<&WeatherReport> {
        self.get_at(key, Utc::now())
    }

    fn get_at(&self, key: &QueryKey, now: DateTime<Utc>) -> Option<&WeatherReport> {
        self.entries
            .get(key.as_str())
            .filter(|e| is_fresh(e.stored_at, now, self.ttl))
            .map(|e| &e.report)
    }

    pub fn insert(&mut self, key: &QueryKey, report: WeatherReport) {
        self.insert_at(key, report, Utc::now());
    }

    fn insert_at(&mut self, key: &QueryKey, report: WeatherReport, now: DateTime<Utc>) {
        self.evict_expired(now);
        self.entries.insert(key.as_str().to_string(), CacheEntry { stored_at: now, report });
    }

    /// Write the cache back to disk, creating parent directories as needed.
    pub fn persist(&self) -> Result<(), WeatherError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| WeatherError::Cache(format!("{}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string(&self.entries)?;

        // A partial write must never replace a good cache file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| WeatherError::Cache(format!("{}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| WeatherError::Cache(format!("{}: {e}", self.path.display())))
    }
}

/// Entries stamped in the future (clock skew) count as fresh.
fn is_fresh(stored_at: DateTime<Utc>, now: DateTime<Utc>, ttl: Duration) -> bool {
    now.signed_duration_since(stored_at).to_std().map_or(true, |age| age < ttl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Place;
    use chrono::Duration as ChronoDuration;

    fn report(name: &str) -> WeatherReport {
        WeatherReport {
            place: Place {
                name: name.to_string(),
                country: "Norway".to_string(),
                country_code: Some("NO".to_string()),
                admin1: None,
                latitude: 59.91,
                longitude: 10.75,
            },
            unit: TemperatureUnit::Celsius,
            current: None,
            days: Vec::new(),
            air_quality: None,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn keys_normalize_city_names_and_round_coords() {
        let unit = TemperatureUnit::Celsius;
        assert_eq!(
            QueryKey::new(&LocationQuery::City("  New   York ".into()), unit),
            QueryKey::new(&LocationQuery::City("new york".into()), unit),
        );
        assert_eq!(
            QueryKey::new(&LocationQuery::Coords { lat: 51.5071, lon: -0.1278 }, unit).as_str(),
            "coords:51.51,-0.13|celsius"
        );
        assert_eq!(
            QueryKey::new(&LocationQuery::Place(report("Paris").place), unit).as_str(),
            "place:59.91,10.75|celsius"
        );
        assert_ne!(
            QueryKey::new(&LocationQuery::City("Oslo".into()), TemperatureUnit::Celsius),
            QueryKey::new(&LocationQuery::City("Oslo".into()), TemperatureUnit::Fahrenheit),
        );
    }

    #[test]
    fn fresh_entries_are_returned_and_stale_ones_are_not() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ReportCache::open(dir.path().join("c.json"), Duration::from_secs(60));
        let key = QueryKey::new(&LocationQuery::City("Oslo".into()), TemperatureUnit::Celsius);
        let t0 = Utc::now();

        cache.insert_at(&key, report("Oslo"), t0);
        assert_eq!(cache.get_at(&key, t0 + ChronoDuration::seconds(59)).unwrap().place.name, "Oslo");
        assert!(cache.get_at(&key, t0 + ChronoDuration::seconds(60)).is_none());
    }

    #[test]
    fn insert_evicts_expired_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = ReportCache::open(dir.path().join("c.json"), Duration::from_secs(60));
        let oslo = QueryKey::new(&LocationQuery::City("Oslo".into()), TemperatureUnit::Celsius);
        let bergen = QueryKey::new(&LocationQuery::City("Bergen".into()), TemperatureUnit::Celsius);
        let t0 = Utc::now();

        cache.insert_at(&oslo, report("Oslo"), t0);
        cache.insert_at(&bergen, report("Bergen"), t0 + ChronoDuration::minutes(5));

        assert_eq!(cache.len(), 1);
        assert!(cache.get_at(&oslo, t0 + ChronoDuration::minutes(5)).is_none());
    }

    #[test]
    fn persisted_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("c.json");
        let key = QueryKey::new(&LocationQuery::City("Oslo".into()), TemperatureUnit::Celsius);

        let mut cache = ReportCache::open(&path, Duration::from_secs(600));
        cache.insert(&key, report("Oslo"));
        cache.persist().unwrap();

        let reopened = ReportCache::open(&path, Duration::from_secs(600));
        assert_eq!(reopened.get(&key).unwrap().place.name, "Oslo");
    }

    #[test]
    fn persist_replaces_file_without_leaving_temp_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        fs::write(&path, "{ definitely not json").unwrap();
        let key = QueryKey::new(&LocationQuery::City("Oslo".into()), TemperatureUnit::Celsius);

        let mut cache = ReportCache::open(&path, Duration::from_secs(600));
        cache.insert(&key, report("Oslo"));
        cache.persist().unwrap();

        assert!(!dir.path().join("c.json.tmp").exists());
        let reopened = ReportCache::open(&path, Duration::from_secs(600));
        assert_eq!(reopened.get(&key).unwrap().place.name, "Oslo");
    }

    #[test]
    fn zero_ttl_never_serves() {
        let dir = tempfile::tempdir().unwrap();
        let key = QueryKey::new(&LocationQuery::City("Oslo".into()), TemperatureUnit::Celsius);

        let mut cache = ReportCache::open(dir.path().join("c.json"), Duration::ZERO);
        cache.insert(&key, report("Oslo"));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c.json");
        fs::write(&path, "{ definitely not json").unwrap();

        let cache = ReportCache::open(&path, Duration::from_secs(600));
        assert!(cache.is_empty());
    }
}
