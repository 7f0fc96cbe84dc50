use log::{debug, warn};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::color::scale::linspace;
use crate::geometry::measure::planar_distance;
use crate::geometry::{BoundingBox, Coordinate};
use crate::utils::cache::{Cache, CachePolicy};
use crate::utils::config::Config;
use crate::utils::error::{Error, Result};
use crate::utils::http::{RetryPolicy, build_client, check_status};

pub const DEFAULT_PROFILE_POINTS: usize = 50;
pub const DEFAULT_GRID_RESOLUTION: usize = 20;

/// Backend answering batched elevation lookups.
///
/// The answer has one slot per requested coordinate, in order; `None` marks a
/// coordinate the backend had no value for.
pub trait ElevationProvider {
    fn fetch_elevations(&mut self, coords: &[Coordinate]) -> Result<Vec<Option<f64>>>;
}

/// Infallible elevation lookup as consumed by the classifier.
pub trait ElevationLookup {
    fn get_elevations(&mut self, coords: &[Coordinate]) -> Vec<f64>;
}

impl<T: ElevationLookup + ?Sized> ElevationLookup for Box<T> {
    fn get_elevations(&mut self, coords: &[Coordinate]) -> Vec<f64> {
        (**self).get_elevations(coords)
    }
}

/// Lookup for callers without an elevation backend: sea level everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatTerrain;

impl ElevationLookup for FlatTerrain {
    fn get_elevations(&mut self, coords: &[Coordinate]) -> Vec<f64> {
        vec![0.0; coords.len()]
    }
}

/// Open-elevation style HTTP backend.
pub struct HttpElevationProvider {
    client: Client,
    url: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct LookupRequest {
    locations: Vec<Location>,
}

#[derive(Serialize)]
struct Location {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct LookupResponse {
    results: Vec<LookupResult>,
}

#[derive(Deserialize)]
struct LookupResult {
    #[serde(default)]
    elevation: Option<f64>,
}

impl HttpElevationProvider {
    pub fn new(url: impl Into<String>, client: Client, retry: RetryPolicy) -> Self {
        Self {
            client,
            url: url.into(),
            retry,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.elevation_api_url.clone(),
            build_client(config.api_timeout)?,
            RetryPolicy::new(config.max_retries),
        ))
    }

    fn request(&self, body: &LookupRequest) -> Result<Vec<Option<f64>>> {
        let response = self.client.post(&self.url).json(body).send()?;
        let parsed: LookupResponse = check_status(response)?.json()?;
        Ok(parsed
            .results
            .into_iter()
            .map(|result| result.elevation)
            .collect())
    }
}

impl ElevationProvider for HttpElevationProvider {
    fn fetch_elevations(&mut self, coords: &[Coordinate]) -> Result<Vec<Option<f64>>> {
        if !coords.iter().all(Coordinate::is_finite) {
            return Err(Error::InvalidCoordinates);
        }
        let body = LookupRequest {
            locations: coords
                .iter()
                .map(|c| Location {
                    latitude: c.lat,
                    longitude: c.lon,
                })
                .collect(),
        };
        let elevations = self.retry.run("elevation lookup", || self.request(&body))?;
        if elevations.len() > coords.len() {
            return Err(Error::InvalidResponse(format!(
                "{} elevations for {} locations",
                elevations.len(),
                coords.len()
            )));
        }
        Ok(elevations)
    }
}

/// Elevation samples along a straight segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TerrainProfile {
    pub coordinates: Vec<Coordinate>,
    pub elevations: Vec<f64>,
    /// Cumulative metres from the start, one per sample.
    pub distances: Vec<f64>,
    pub total_distance: f64,
    pub min_elevation: f64,
    pub max_elevation: f64,
    pub elevation_gain: f64,
    pub elevation_loss: f64,
}

/// Elevation samples over a bounding box, `grid[row][col]` with rows running
/// south to north and columns west to east.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElevationGrid {
    pub grid: Vec<Vec<f64>>,
    pub lons: Vec<f64>,
    pub lats: Vec<f64>,
    pub min_elevation: f64,
    pub max_elevation: f64,
}

/// Cached, size-limited front for an [`ElevationProvider`].
///
/// Lookups never fail: provider errors degrade to 0 m for every coordinate
/// that was not already cached.
pub struct ElevationService<P> {
    provider: P,
    cache: Option<Cache<String, f64>>,
    max_points: usize,
}

impl ElevationService<HttpElevationProvider> {
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = HttpElevationProvider::from_config(config)?;
        let policy = config
            .enable_cache
            .then(|| CachePolicy::unbounded().with_ttl(config.cache_ttl));
        Ok(Self::new(provider, policy, config.max_elevation_points))
    }
}

impl<P: ElevationProvider> ElevationService<P> {
    /// `cache` of `None` disables caching.
    pub fn new(provider: P, cache: Option<CachePolicy>, max_points: usize) -> Self {
        Self {
            provider,
            cache: cache.map(Cache::new),
            max_points: max_points.max(1),
        }
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    pub fn cache_hit_rate(&self) -> f64 {
        self.cache.as_ref().map_or(0.0, Cache::hit_rate)
    }

    pub fn clear_cache(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Elevations in metres for `coords`. Requests above the point limit are
    /// downsampled first, so the answer then has `max_points` entries.
    pub fn get_elevations(&mut self, coords: &[Coordinate]) -> Vec<f64> {
        if coords.is_empty() {
            return Vec::new();
        }
        let sampled = downsample(coords, self.max_points);
        if sampled.len() < coords.len() {
            debug!(
                "Downsampled elevation request from {} to {} points",
                coords.len(),
                sampled.len()
            );
        }

        let mut elevations = vec![0.0; sampled.len()];
        let mut missing = Vec::new();
        for (slot, coord) in sampled.iter().enumerate() {
            match self.cache.as_mut().and_then(|cache| cache.get(&cache_key(coord))) {
                Some(elevation) => elevations[slot] = elevation,
                None => missing.push(slot),
            }
        }
        if missing.is_empty() {
            return elevations;
        }

        let request: Vec<Coordinate> = missing.iter().map(|&slot| sampled[slot]).collect();
        match self.provider.fetch_elevations(&request) {
            Ok(fetched) => {
                for (i, &slot) in missing.iter().enumerate() {
                    let elevation = fetched
                        .get(i)
                        .copied()
                        .flatten()
                        .filter(|e| e.is_finite())
                        .unwrap_or(0.0);
                    elevations[slot] = elevation;
                    if let Some(cache) = self.cache.as_mut() {
                        cache.insert(cache_key(&sampled[slot]), elevation);
                    }
                }
            }
            Err(err) => {
                warn!(
                    "Elevation lookup for {} points failed, using 0 m: {}",
                    request.len(),
                    err
                );
            }
        }
        elevations
    }

    /// Samples `num_points` evenly spaced points from `start` to `end`
    /// inclusive.
    pub fn terrain_profile(
        &mut self,
        start: Coordinate,
        end: Coordinate,
        num_points: usize,
    ) -> TerrainProfile {
        let lons = linspace(start.lon, end.lon, num_points);
        let lats = linspace(start.lat, end.lat, num_points);
        let coordinates: Vec<Coordinate> = lons
            .into_iter()
            .zip(lats)
            .map(|(lon, lat)| Coordinate::new(lon, lat))
            .collect();
        let elevations = self.chunked_elevations(&coordinates);

        let mut distances = Vec::with_capacity(coordinates.len());
        let mut total = 0.0;
        for (i, coord) in coordinates.iter().enumerate() {
            if i > 0 {
                total += planar_distance(&coordinates[i - 1], coord);
            }
            distances.push(total);
        }

        let (mut gain, mut loss) = (0.0, 0.0);
        for pair in elevations.windows(2) {
            let delta = pair[1] - pair[0];
            if delta > 0.0 {
                gain += delta;
            } else {
                loss -= delta;
            }
        }
        let (min_elevation, max_elevation) = extent(&elevations);

        TerrainProfile {
            coordinates,
            elevations,
            distances,
            total_distance: total,
            min_elevation,
            max_elevation,
            elevation_gain: gain,
            elevation_loss: loss,
        }
    }

    /// Samples a `resolution` x `resolution` grid spanning `bounds`.
    pub fn area_grid(&mut self, bounds: &BoundingBox, resolution: usize) -> ElevationGrid {
        let lons = linspace(bounds.min_lon(), bounds.max_lon(), resolution);
        let lats = linspace(bounds.min_lat(), bounds.max_lat(), resolution);
        let points: Vec<Coordinate> = lats
            .iter()
            .flat_map(|&lat| lons.iter().map(move |&lon| Coordinate::new(lon, lat)))
            .collect();
        let flat = self.chunked_elevations(&points);
        let grid: Vec<Vec<f64>> = if lons.is_empty() {
            Vec::new()
        } else {
            flat.chunks(lons.len()).map(<[f64]>::to_vec).collect()
        };
        let (min_elevation, max_elevation) = extent(&flat);

        ElevationGrid {
            grid,
            lons,
            lats,
            min_elevation,
            max_elevation,
        }
    }

    /// Looks up every coordinate, splitting the request at the point limit
    /// instead of downsampling.
    fn chunked_elevations(&mut self, coords: &[Coordinate]) -> Vec<f64> {
        let mut elevations = Vec::with_capacity(coords.len());
        for chunk in coords.chunks(self.max_points) {
            elevations.extend(self.get_elevations(chunk));
        }
        elevations
    }
}

impl<P: ElevationProvider> ElevationLookup for ElevationService<P> {
    fn get_elevations(&mut self, coords: &[Coordinate]) -> Vec<f64> {
        ElevationService::get_elevations(self, coords)
    }
}

fn cache_key(coord: &Coordinate) -> String {
    format!("{:.5},{:.5}", coord.lon, coord.lat)
}

/// Picks `max` coordinates at evenly spread indices, keeping both ends.
fn downsample(coords: &[Coordinate], max: usize) -> Vec<Coordinate> {
    let n = coords.len();
    if n <= max {
        return coords.to_vec();
    }
    if max == 1 {
        return vec![coords[0]];
    }
    (0..max).map(|i| coords[i * (n - 1) / (max - 1)]).collect()
}

fn extent(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}
