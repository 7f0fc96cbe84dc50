pub mod hillshade;
pub mod palettes;
pub mod scale;

pub use palettes::Palette;
pub use scale::{ColorScale, Legend, Rgb, Rgba, elevation_to_color, heatmap_colors};
