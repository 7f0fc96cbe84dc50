use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::info;
use serde_json::Value;

use geoviz3d::processing::{FeatureClassifier, GeoPipeline, summarize};
use geoviz3d::services::{
    ElevationLookup, ElevationService, FlatTerrain, Geocoder, NominatimGeocoder, OverpassClient,
    RawDataSource,
};
use geoviz3d::utils::config::Config;

/// Classifies OpenStreetMap query results into buildings, roads, points and
/// areas and prints a summary.
#[derive(Parser, Debug)]
#[command(name = "geoviz3d", version)]
struct Args {
    /// Saved Overpass JSON response to classify.
    #[arg(conflicts_with = "query")]
    input: Option<PathBuf>,

    /// Overpass QL query to run against the configured endpoint.
    #[arg(long)]
    query: Option<String>,

    /// Resolve a place name and print its position instead of classifying.
    #[arg(long, conflicts_with_all = ["input", "query"])]
    geocode: Option<String>,

    /// Write the classified features as GeoJSON to this path.
    #[arg(long)]
    geojson: Option<PathBuf>,

    /// Skip the terrain elevation lookup.
    #[arg(long, default_value_t = false)]
    no_elevation: bool,

    /// Print classification counters after the summary.
    #[arg(long, default_value_t = false)]
    stats: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();
    let config = Config::from_env()?;

    if let Some(place) = args.geocode.as_deref() {
        let mut geocoder = NominatimGeocoder::from_config(&config)?;
        match geocoder.geocode(place) {
            Some(hit) => println!("{:.6}, {:.6}  {}", hit.lat, hit.lon, hit.display_name),
            None => println!("No location found for {:?}", place),
        }
        return Ok(());
    }

    let query = match (&args.input, &args.query) {
        (Some(path), _) => path.display().to_string(),
        (None, Some(query)) => query.clone(),
        (None, None) => return Err("pass a response file or --query".into()),
    };

    let mut pipeline = match (&args.input, args.no_elevation) {
        (None, false) => {
            let mut pipeline = GeoPipeline::from_config(&config)?;
            return report(&mut pipeline, &query, &args);
        }
        (Some(path), no_elevation) => {
            info!("Reading response from {}", path.display());
            let raw: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
            let source: Box<dyn RawDataSource> = Box::new(SavedResponse(Some(raw)));
            GeoPipeline::new(
                source,
                elevation_lookup(&config, no_elevation)?,
                FeatureClassifier::from_config(&config)?,
            )
        }
        (None, true) => {
            let source: Box<dyn RawDataSource> = Box::new(OverpassClient::from_config(&config)?);
            GeoPipeline::new(
                source,
                elevation_lookup(&config, true)?,
                FeatureClassifier::from_config(&config)?,
            )
        }
    };
    report(&mut pipeline, &query, &args)
}

/// A response read from disk, handed out once.
struct SavedResponse(Option<Value>);

impl RawDataSource for SavedResponse {
    fn fetch(&mut self, _query: &str) -> Option<Value> {
        self.0.take()
    }
}

fn elevation_lookup(
    config: &Config,
    no_elevation: bool,
) -> Result<Box<dyn ElevationLookup>, Box<dyn Error>> {
    if no_elevation {
        return Ok(Box::new(FlatTerrain));
    }
    Ok(Box::new(ElevationService::from_config(config)?))
}

fn report<S: RawDataSource, E: ElevationLookup>(
    pipeline: &mut GeoPipeline<S, E>,
    query: &str,
    args: &Args,
) -> Result<(), Box<dyn Error>> {
    let Some((collection, stats)) = pipeline.run_with_stats(query) else {
        println!("{}", summarize(None));
        return Ok(());
    };

    println!("{}", summarize(Some(&collection)));
    if args.stats {
        println!("{:#?}", stats);
    }
    if let Some(path) = args.geojson.as_ref() {
        fs::write(path, collection.to_geojson().to_string())?;
        info!("Wrote {} features to {}", collection.len(), path.display());
    }
    Ok(())
}
