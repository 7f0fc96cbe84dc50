use std::str::FromStr;
use std::time::Duration;

use crate::utils::error::{Error, Result};

pub const DEFAULT_OVERPASS_API_URL: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_NOMINATIM_API_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_ELEVATION_API_URL: &str = "https://api.open-elevation.com/api/v1/lookup";

/// Runtime settings for the providers and the classification pipeline.
///
/// Every value has a default; [`Config::from_env`] overrides them from the
/// process environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub overpass_api_url: String,
    pub nominatim_api_url: String,
    pub elevation_api_url: String,
    pub api_timeout: Duration,
    pub max_retries: u32,
    pub max_features: usize,
    pub max_elevation_points: usize,
    pub enable_cache: bool,
    pub cache_ttl: Duration,
    /// Capacity of the raw query-result cache.
    pub query_cache_size: usize,
    pub building_height_factor: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overpass_api_url: DEFAULT_OVERPASS_API_URL.to_string(),
            nominatim_api_url: DEFAULT_NOMINATIM_API_URL.to_string(),
            elevation_api_url: DEFAULT_ELEVATION_API_URL.to_string(),
            api_timeout: Duration::from_secs(30),
            max_retries: 3,
            max_features: 1000,
            max_elevation_points: 100,
            enable_cache: true,
            cache_ttl: Duration::from_secs(3600),
            query_cache_size: 100,
            building_height_factor: 1.0,
        }
    }
}

impl Config {
    /// Reads the configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, falling back to
    /// the defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let config = Config {
            overpass_api_url: lookup("OVERPASS_API_URL").unwrap_or(defaults.overpass_api_url),
            nominatim_api_url: lookup("NOMINATIM_API_URL").unwrap_or(defaults.nominatim_api_url),
            elevation_api_url: lookup("ELEVATION_API_URL").unwrap_or(defaults.elevation_api_url),
            api_timeout: parse_value::<u64, _>(&lookup, "API_TIMEOUT")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.api_timeout),
            max_retries: parse_value(&lookup, "MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            max_features: parse_value(&lookup, "MAX_FEATURES")?.unwrap_or(defaults.max_features),
            max_elevation_points: parse_value(&lookup, "MAX_ELEVATION_POINTS")?
                .unwrap_or(defaults.max_elevation_points),
            enable_cache: match lookup("ENABLE_CACHE") {
                Some(value) => value.trim().eq_ignore_ascii_case("true"),
                None => defaults.enable_cache,
            },
            cache_ttl: parse_value::<u64, _>(&lookup, "CACHE_TTL")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            query_cache_size: parse_value(&lookup, "QUERY_CACHE_SIZE")?
                .unwrap_or(defaults.query_cache_size),
            building_height_factor: parse_value(&lookup, "DEFAULT_BUILDING_HEIGHT_FACTOR")?
                .unwrap_or(defaults.building_height_factor),
        };
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(invalid("MAX_RETRIES", self.max_retries));
        }
        if self.max_elevation_points == 0 {
            return Err(invalid("MAX_ELEVATION_POINTS", self.max_elevation_points));
        }
        if self.query_cache_size == 0 {
            return Err(invalid("QUERY_CACHE_SIZE", self.query_cache_size));
        }
        if !self.building_height_factor.is_finite() || self.building_height_factor <= 0.0 {
            return Err(invalid(
                "DEFAULT_BUILDING_HEIGHT_FACTOR",
                self.building_height_factor,
            ));
        }
        Ok(())
    }
}

fn parse_value<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(key, &raw)),
    }
}

pub(crate) fn invalid(key: &str, value: impl ToString) -> Error {
    Error::InvalidConfig {
        key: key.to_string(),
        value: value.to_string(),
    }
}
