pub mod elevation;
pub mod geocoding;
pub mod overpass;

pub use elevation::{
    ElevationGrid, ElevationLookup, ElevationProvider, ElevationService, FlatTerrain,
    HttpElevationProvider, TerrainProfile,
};
pub use geocoding::{GeocodeResult, Geocoder, NominatimGeocoder, ReverseGeocodeResult};
pub use overpass::{OverpassClient, OverpassHttp, QueryExecutor, RawDataSource};
