use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Select, Text};
use meteodash_core::{
    Config, Dashboard, LocationQuery, Place, ReportCache, TemperatureUnit, WeatherError,
    provider_from_config,
};

use crate::render::{render_places, render_report};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "meteodash", version, about = "Current conditions, air quality and a 5-day forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search for a city by name.
    Search {
        /// At least two characters of a city name.
        query: String,

        /// Choose one of the matches interactively and show its weather.
        #[arg(long)]
        pick: bool,
    },

    /// Show the dashboard for a city or a coordinate pair.
    Show {
        /// City name, optionally followed by a country, e.g. "Paris, FR".
        /// Defaults to the configured city.
        city: Option<String>,

        /// Latitude, used instead of a city name.
        #[arg(long, requires = "lon", conflicts_with = "city", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude, used instead of a city name.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Temperature unit for this run: celsius or fahrenheit.
        #[arg(long)]
        units: Option<String>,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,

        /// Ignore cached reports.
        #[arg(long)]
        refresh: bool,
    },

    /// Interactively set the default city, unit and cache lifetime.
    Configure,
}

/// Wrapper so places can be listed in an `inquire` prompt.
struct PlaceChoice(Place);

impl std::fmt::Display for PlaceChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.label())
    }
}

/// Message shown on the terminal for a failed lookup.
fn describe(e: &WeatherError) -> String {
    format!("{}\n({e})", e.user_message())
}

fn location_query(
    city: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    cfg: &Config,
) -> LocationQuery {
    match (lat, lon, city) {
        (Some(lat), Some(lon), _) => LocationQuery::Coords { lat, lon },
        (_, _, Some(city)) if !city.trim().is_empty() => LocationQuery::City(city),
        _ => LocationQuery::City(cfg.default_city().to_string()),
    }
}

fn dashboard(cfg: &Config, unit: TemperatureUnit) -> anyhow::Result<Dashboard> {
    let provider = provider_from_config(cfg).context("Failed to create weather provider")?;
    let mut dash = Dashboard::new(provider, unit);

    if cfg.cache_ttl_secs > 0 {
        let path = Config::cache_file_path()?;
        dash = dash.with_cache(ReportCache::open(path, cfg.cache_ttl()));
    }

    Ok(dash)
}

async fn show(
    dash: &mut Dashboard,
    query: &LocationQuery,
    json: bool,
    refresh: bool,
) -> anyhow::Result<()> {
    let report = match dash.report(query, refresh).await {
        Ok(report) => report,
        Err(e) => bail!(describe(&e)),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }
    Ok(())
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut cfg = Config::load()?;

        match self.command {
            Command::Search { query, pick } => {
                let mut dash = dashboard(&cfg, cfg.temperature_unit)?;
                let places = dash
                    .provider()
                    .search_cities(&query)
                    .await
                    .map_err(|e| anyhow::anyhow!(describe(&e)))?;

                if places.is_empty() {
                    println!("No cities found for '{}'.", query.trim());
                    return Ok(());
                }

                if !pick {
                    print!("{}", render_places(&places));
                    return Ok(());
                }

                let choices: Vec<PlaceChoice> = places.into_iter().map(PlaceChoice).collect();
                let PlaceChoice(place) = Select::new("Pick a city:", choices).prompt()?;
                println!("Weather updated for {}", place.label());

                let query = LocationQuery::Place(place);
                show(&mut dash, &query, false, false).await?;
            }

            Command::Show { city, lat, lon, units, json, refresh } => {
                let unit = match units {
                    Some(u) => TemperatureUnit::try_from(u.as_str())?,
                    None => cfg.temperature_unit,
                };
                let query = location_query(city, lat, lon, &cfg);
                let mut dash = dashboard(&cfg, unit)?;
                show(&mut dash, &query, json, refresh).await?;
            }

            Command::Configure => {
                let city = Text::new("Default city:").with_default(cfg.default_city()).prompt()?;
                cfg.set_default_city(&city);

                let units = TemperatureUnit::all().to_vec();
                let start = units.iter().position(|u| *u == cfg.temperature_unit).unwrap_or(0);
                cfg.temperature_unit =
                    Select::new("Temperature unit:", units).with_starting_cursor(start).prompt()?;

                cfg.cache_ttl_secs = CustomType::<u64>::new("Cache lifetime in seconds (0 disables):")
                    .with_default(cfg.cache_ttl_secs)
                    .with_error_message("Please enter a whole number of seconds")
                    .prompt()?;

                let path = cfg.save()?;
                println!("Configuration saved to {}", path.display());
            }
        }

        Ok(())
    }
}
