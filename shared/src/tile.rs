use std::fmt;
use std::str::FromStr;

/// Map tile address as used by the tile server (`/tiles/{x}/{y}.png`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.x, self.y)
    }
}

impl FromStr for TileCoord {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("tile coordinate {s:?} is not in X/Y form"))?;
        let x = x
            .parse::<u32>()
            .map_err(|e| format!("tile coordinate {s:?} has invalid x: {e}"))?;
        let y = y
            .parse::<u32>()
            .map_err(|e| format!("tile coordinate {s:?} has invalid y: {e}"))?;
        Ok(Self { x, y })
    }
}

/// Rectangle in tile-pixel space. Only pixels inside it count toward progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        let (px, py) = (u64::from(px), u64::from(py));
        let (x, y) = (u64::from(self.x), u64::from(self.y));
        px >= x && px < x + u64::from(self.width) && py >= y && py < y + u64::from(self.height)
    }
}

/// Fill the `{x}` and `{y}` placeholders of a tile URL template.
pub fn tile_url(template: &str, coord: TileCoord) -> String {
    template
        .replace("{x}", &coord.x.to_string())
        .replace("{y}", &coord.y.to_string())
}

/// Parse a list of `X/Y` strings, failing on the first malformed entry.
pub fn parse_tile_list(raw: &[&str]) -> Result<Vec<TileCoord>, String> {
    raw.iter().map(|entry| entry.parse()).collect()
}
