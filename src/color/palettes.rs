use std::fmt;
use std::str::FromStr;

use crate::color::scale::Rgb;
use crate::utils::error::Error;

const BLUE_WHITE_RED: [Rgb; 9] = [
    [65, 105, 225],  // royal blue
    [100, 149, 237], // cornflower blue
    [135, 206, 250], // light sky blue
    [176, 224, 230], // powder blue
    [255, 255, 255], // white
    [255, 228, 196], // bisque
    [255, 165, 0],   // orange
    [255, 69, 0],    // red-orange
    [255, 0, 0],     // red
];

const TERRAIN: [Rgb; 9] = [
    [0, 121, 107],   // deep green
    [0, 151, 131],   // middle green
    [0, 188, 163],   // light green
    [238, 231, 176], // sand
    [203, 166, 129], // light brown
    [166, 133, 93],  // medium brown
    [127, 98, 58],   // dark brown
    [102, 78, 46],   // darker brown
    [255, 255, 255], // snow
];

const VIRIDIS: [Rgb; 8] = [
    [68, 1, 84],
    [70, 50, 126],
    [54, 92, 141],
    [39, 127, 142],
    [31, 161, 135],
    [74, 193, 109],
    [159, 218, 57],
    [253, 231, 37],
];

const PLASMA: [Rgb; 9] = [
    [13, 8, 135],
    [75, 3, 161],
    [125, 3, 168],
    [168, 34, 150],
    [203, 70, 121],
    [229, 107, 93],
    [248, 148, 65],
    [253, 195, 40],
    [240, 249, 33],
];

const BLUES: [Rgb; 9] = [
    [247, 251, 255],
    [222, 235, 247],
    [198, 219, 239],
    [158, 202, 225],
    [107, 174, 214],
    [66, 146, 198],
    [33, 113, 181],
    [8, 81, 156],
    [8, 48, 107],
];

const GREENS: [Rgb; 9] = [
    [247, 252, 245],
    [229, 245, 224],
    [199, 233, 192],
    [161, 217, 155],
    [116, 196, 118],
    [65, 171, 93],
    [35, 139, 69],
    [0, 109, 44],
    [0, 68, 27],
];

const REDS: [Rgb; 9] = [
    [255, 245, 240],
    [254, 224, 210],
    [252, 187, 161],
    [252, 146, 114],
    [251, 106, 74],
    [239, 59, 44],
    [203, 24, 29],
    [165, 15, 21],
    [103, 0, 13],
];

/// Built-in anchor color sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Palette {
    /// Diverging scale used when no palette is requested.
    #[default]
    BlueWhiteRed,
    /// Elevation colors from deep green through sand and brown to snow.
    Terrain,
    Viridis,
    Plasma,
    Blues,
    Greens,
    Reds,
}

impl Palette {
    pub const ALL: [Palette; 7] = [
        Palette::BlueWhiteRed,
        Palette::Terrain,
        Palette::Viridis,
        Palette::Plasma,
        Palette::Blues,
        Palette::Greens,
        Palette::Reds,
    ];

    pub fn anchors(&self) -> &'static [Rgb] {
        match self {
            Palette::BlueWhiteRed => &BLUE_WHITE_RED,
            Palette::Terrain => &TERRAIN,
            Palette::Viridis => &VIRIDIS,
            Palette::Plasma => &PLASMA,
            Palette::Blues => &BLUES,
            Palette::Greens => &GREENS,
            Palette::Reds => &REDS,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Palette::BlueWhiteRed => "blue_white_red",
            Palette::Terrain => "terrain",
            Palette::Viridis => "viridis",
            Palette::Plasma => "plasma",
            Palette::Blues => "blues",
            Palette::Greens => "greens",
            Palette::Reds => "reds",
        }
    }

    /// Heatmap lookup: unknown names fall back to viridis.
    pub fn from_name_or_viridis(name: &str) -> Palette {
        name.parse().unwrap_or(Palette::Viridis)
    }
}

impl FromStr for Palette {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Palette::ALL
            .into_iter()
            .find(|palette| palette.name() == wanted)
            .ok_or_else(|| Error::UnknownPalette(s.to_string()))
    }
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
