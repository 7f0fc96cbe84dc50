use std::collections::BTreeMap;

use log::{debug, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::cache::{Cache, CachePolicy};
use crate::utils::config::Config;
use crate::utils::error::{Error, Result};
use crate::utils::http::{RetryPolicy, build_client, check_status};

/// Forward geocoding hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeResult {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

/// Reverse geocoding hit with the structured address parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReverseGeocodeResult {
    pub display_name: String,
    pub address: BTreeMap<String, String>,
    pub lat: f64,
    pub lon: f64,
}

pub trait Geocoder {
    fn geocode(&mut self, place: &str) -> Option<GeocodeResult>;

    fn reverse_geocode(&mut self, lat: f64, lon: f64) -> Option<ReverseGeocodeResult>;
}

// Nominatim reports coordinates as strings.
#[derive(Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    address: BTreeMap<String, Value>,
}

impl Place {
    fn position(&self) -> Result<(f64, f64)> {
        let parse = |raw: &str| {
            raw.trim()
                .parse::<f64>()
                .map_err(|_| Error::InvalidResponse(format!("bad coordinate {:?}", raw)))
        };
        Ok((parse(&self.lat)?, parse(&self.lon)?))
    }
}

/// Nominatim search and reverse lookups with a per-input cache.
pub struct NominatimGeocoder {
    client: Client,
    search_url: String,
    reverse_url: String,
    retry: RetryPolicy,
    places: Option<Cache<String, GeocodeResult>>,
    addresses: Option<Cache<String, ReverseGeocodeResult>>,
}

impl NominatimGeocoder {
    /// `search_url` is the search endpoint; the reverse endpoint is its
    /// sibling `reverse`.
    pub fn new(
        search_url: impl Into<String>,
        client: Client,
        retry: RetryPolicy,
        cache: Option<CachePolicy>,
    ) -> Self {
        let search_url = search_url.into();
        let reverse_url = reverse_endpoint(&search_url);
        Self {
            client,
            search_url,
            reverse_url,
            retry,
            places: cache.map(Cache::new),
            addresses: cache.map(Cache::new),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = config
            .enable_cache
            .then(|| CachePolicy::unbounded().with_ttl(config.cache_ttl));
        Ok(Self::new(
            config.nominatim_api_url.clone(),
            build_client(config.api_timeout)?,
            RetryPolicy::new(config.max_retries),
            cache,
        ))
    }

    fn search(&self, place: &str) -> Result<Option<GeocodeResult>> {
        let places: Vec<Place> = self.retry.run("geocode", || {
            let response = self
                .client
                .get(&self.search_url)
                .query(&[("q", place), ("format", "json"), ("limit", "1")])
                .send()?;
            Ok(check_status(response)?.json()?)
        })?;
        let Some(first) = places.into_iter().next() else {
            return Ok(None);
        };
        let (lat, lon) = first.position()?;
        Ok(Some(GeocodeResult {
            lat,
            lon,
            display_name: first.display_name,
        }))
    }

    fn reverse(&self, lat: f64, lon: f64) -> Result<ReverseGeocodeResult> {
        let (lat_param, lon_param) = (lat.to_string(), lon.to_string());
        let place: Place = self.retry.run("reverse geocode", || {
            let response = self
                .client
                .get(&self.reverse_url)
                .query(&[
                    ("lat", lat_param.as_str()),
                    ("lon", lon_param.as_str()),
                    ("format", "json"),
                ])
                .send()?;
            Ok(check_status(response)?.json()?)
        })?;
        let (lat, lon) = place.position()?;
        let address = place
            .address
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(text) => (key, text),
                other => (key, other.to_string()),
            })
            .collect();
        Ok(ReverseGeocodeResult {
            display_name: place.display_name,
            address,
            lat,
            lon,
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&mut self, place: &str) -> Option<GeocodeResult> {
        let key = normalize_place(place);
        if key.is_empty() {
            return None;
        }
        if let Some(hit) = self.places.as_mut().and_then(|cache| cache.get(&key)) {
            debug!("Using cached location for {:?}", key);
            return Some(hit);
        }
        match self.search(place) {
            Ok(Some(result)) => {
                if let Some(cache) = self.places.as_mut() {
                    cache.insert(key, result.clone());
                }
                Some(result)
            }
            Ok(None) => {
                warn!("No location found for {:?}", place);
                None
            }
            Err(err) => {
                warn!("Geocoding {:?} failed: {}", place, err);
                None
            }
        }
    }

    fn reverse_geocode(&mut self, lat: f64, lon: f64) -> Option<ReverseGeocodeResult> {
        let key = format!("{},{}", lat, lon);
        if let Some(hit) = self.addresses.as_mut().and_then(|cache| cache.get(&key)) {
            return Some(hit);
        }
        match self.reverse(lat, lon) {
            Ok(result) => {
                if let Some(cache) = self.addresses.as_mut() {
                    cache.insert(key, result.clone());
                }
                Some(result)
            }
            Err(err) => {
                warn!("Reverse geocoding ({}, {}) failed: {}", lat, lon, err);
                None
            }
        }
    }
}

/// Cache key for a free-text place: trimmed, lowercase, single spaces.
fn normalize_place(place: &str) -> String {
    place
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn reverse_endpoint(search_url: &str) -> String {
    match search_url.trim_end_matches('/').rsplit_once('/') {
        Some((base, "search")) => format!("{}/reverse", base),
        _ => format!("{}/reverse", search_url.trim_end_matches('/')),
    }
}
