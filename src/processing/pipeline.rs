use log::info;

use crate::collection::GeoDataCollection;
use crate::processing::classify::{ClassificationStats, FeatureClassifier};
use crate::services::elevation::{ElevationLookup, ElevationService, HttpElevationProvider};
use crate::services::overpass::{OverpassClient, RawDataSource};
use crate::utils::config::Config;
use crate::utils::error::Result;

/// Query in, classified collection out.
pub struct GeoPipeline<S, E> {
    source: S,
    elevation: E,
    classifier: FeatureClassifier,
}

impl GeoPipeline<OverpassClient, ElevationService<HttpElevationProvider>> {
    /// Pipeline against the configured Overpass and elevation endpoints.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            OverpassClient::from_config(config)?,
            ElevationService::from_config(config)?,
            FeatureClassifier::from_config(config)?,
        ))
    }
}

impl<S: RawDataSource, E: ElevationLookup> GeoPipeline<S, E> {
    pub fn new(source: S, elevation: E, classifier: FeatureClassifier) -> Self {
        Self {
            source,
            elevation,
            classifier,
        }
    }

    pub fn classifier(&self) -> &FeatureClassifier {
        &self.classifier
    }

    pub fn elevation(&mut self) -> &mut E {
        &mut self.elevation
    }

    pub fn run(&mut self, query: &str) -> Option<GeoDataCollection> {
        self.run_with_stats(query).map(|(collection, _)| collection)
    }

    /// `None` when the source has nothing for `query` or the response has
    /// no elements.
    pub fn run_with_stats(
        &mut self,
        query: &str,
    ) -> Option<(GeoDataCollection, ClassificationStats)> {
        let raw = self.source.fetch(query)?;
        let result = self
            .classifier
            .classify_with_stats(&raw, &mut self.elevation)?;
        info!(
            "Query produced {} features, {} elements skipped",
            result.1.features(),
            result.1.skipped()
        );
        Some(result)
    }
}
