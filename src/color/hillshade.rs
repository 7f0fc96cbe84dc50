//! Hillshading of regular elevation grids.

use log::warn;

/// Sun direction used when the caller has no preference.
pub const DEFAULT_AZIMUTH: f64 = 315.0;
pub const DEFAULT_ALTITUDE: f64 = 45.0;

/// Shade intensity (0-255) for each cell of `grid`.
///
/// `grid` is row-major; a ragged grid yields an empty result. Gradients use
/// central differences in the interior and one-sided differences at the
/// edges, so a 1xN or Nx1 grid has zero slope across its short axis.
/// `azimuth` and `altitude` are in degrees.
pub fn hillshade(grid: &[Vec<f64>], cell_size: f64, azimuth: f64, altitude: f64) -> Vec<Vec<u8>> {
    let rows = grid.len();
    if rows == 0 {
        return Vec::new();
    }
    let cols = grid[0].len();
    if let Some(bad) = grid.iter().position(|row| row.len() != cols) {
        warn!(
            "Ragged elevation grid: row {} has {} cells, expected {}",
            bad,
            grid[bad].len(),
            cols
        );
        return Vec::new();
    }
    let azimuth = azimuth.to_radians();
    let altitude = altitude.to_radians();

    let mut shaded = Vec::with_capacity(rows);
    for r in 0..rows {
        let mut row = Vec::with_capacity(cols);
        for c in 0..cols {
            let dx = gradient(rows, cell_size, |i| grid[i][c], r);
            let dy = gradient(cols, cell_size, |j| grid[r][j], c);

            let slope = (dx * dx + dy * dy).sqrt().atan();
            let aspect = (-dx).atan2(dy);
            let shade = altitude.sin() * slope.sin()
                + altitude.cos() * slope.cos() * (azimuth - aspect).cos();
            row.push((255.0 * (shade + 1.0) / 2.0) as u8);
        }
        shaded.push(row);
    }
    shaded
}

fn gradient(len: usize, spacing: f64, at: impl Fn(usize) -> f64, i: usize) -> f64 {
    if len < 2 {
        return 0.0;
    }
    if i == 0 {
        (at(1) - at(0)) / spacing
    } else if i == len - 1 {
        (at(i) - at(i - 1)) / spacing
    } else {
        (at(i + 1) - at(i - 1)) / (2.0 * spacing)
    }
}
