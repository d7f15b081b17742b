//! Weather overlay tiles for the map screen.

use std::f64::consts::PI;

use crate::model::Coordinates;

pub const DEFAULT_TILE_URL: &str = "https://tile.openweathermap.org/map";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapLayer {
    Clouds,
    Precipitation,
    Temperature,
    Wind,
    Pressure,
}

impl MapLayer {
    /// Layer id used in the tile path.
    pub fn as_str(&self) -> &'static str {
        match self {
            MapLayer::Clouds => "clouds_new",
            MapLayer::Precipitation => "precipitation_new",
            MapLayer::Temperature => "temp_new",
            MapLayer::Wind => "wind_new",
            MapLayer::Pressure => "pressure_new",
        }
    }

    pub const fn all() -> &'static [MapLayer] {
        &[
            MapLayer::Clouds,
            MapLayer::Precipitation,
            MapLayer::Temperature,
            MapLayer::Wind,
            MapLayer::Pressure,
        ]
    }
}

impl std::fmt::Display for MapLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MapLayer {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "clouds" | "clouds_new" => Ok(MapLayer::Clouds),
            "precipitation" | "precipitation_new" => Ok(MapLayer::Precipitation),
            "temperature" | "temp" | "temp_new" => Ok(MapLayer::Temperature),
            "wind" | "wind_new" => Ok(MapLayer::Wind),
            "pressure" | "pressure_new" => Ok(MapLayer::Pressure),
            _ => Err(anyhow::anyhow!(
                "Unknown map layer '{value}'. Supported layers: clouds, precipitation, temperature, wind, pressure."
            )),
        }
    }
}

/// Slippy-map tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl Tile {
    /// Web-Mercator tile containing `at` at `zoom`.
    pub fn containing(at: Coordinates, zoom: u8) -> Self {
        let n = f64::from(1u32 << zoom.min(24));
        let lat = at.latitude.clamp(-85.051_128, 85.051_128).to_radians();

        let x = ((at.longitude + 180.0) / 360.0 * n).floor();
        let y = ((1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * n).floor();

        let max = n - 1.0;
        Self { zoom: zoom.min(24), x: x.clamp(0.0, max) as u32, y: y.clamp(0.0, max) as u32 }
    }
}

pub fn tile_url(base_url: &str, layer: MapLayer, tile: Tile, api_key: &str) -> String {
    format!(
        "{}/{}/{}/{}/{}.png?appid={}",
        base_url.trim_end_matches('/'),
        layer,
        tile.zoom,
        tile.x,
        tile.y,
        api_key
    )
}
