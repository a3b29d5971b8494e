//! Tile size, preview scale and export style.
//!
//! Settings are read from an optional YAML file. A missing or broken file is
//! not an error; the defaults are used instead.

use serde::Deserialize;
use std::path::Path;

use crate::{
    error::TileResult,
    export::ExportFormat,
    grid::TileSize,
};

pub const TILE_WIDTH_DEFAULT: u32 = 16;
pub const TILE_HEIGHT_DEFAULT: u32 = 16;
pub const PIXEL_SCALE_DEFAULT: u32 = 2;

/// Name of the config file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "tile-select.yaml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tile_width: u32,
    pub tile_height: u32,
    /// How many screen pixels each image pixel is drawn with
    pub pixel_scale: u32,
    pub export: ExportFormat,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            tile_width: TILE_WIDTH_DEFAULT,
            tile_height: TILE_HEIGHT_DEFAULT,
            pixel_scale: PIXEL_SCALE_DEFAULT,
            export: ExportFormat::default(),
        };
    }
}

impl Config {
    pub fn tile_size(&self) -> TileResult<TileSize> {
        return TileSize::new(self.tile_width, self.tile_height);
    }

    /// Parses YAML, rejecting a zero tile size
    pub fn from_yaml(contents: &str) -> TileResult<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.tile_size()?;
        return Ok(config.with_min_scale());
    }

    fn with_min_scale(mut self) -> Self {
        self.pixel_scale = self.pixel_scale.max(1);
        self
    }
}

/// Loads the config at `path`, falling back to defaults if it is missing or invalid
pub fn load_config(path: &Path) -> Config {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match Config::from_yaml(&contents) {
            Ok(config) => {
                log::info!("load_config: Successfully loaded config from {:?}", path);
                config
            }
            Err(e) => {
                log::warn!("load_config: Failed to parse config: {}, using defaults", e);
                Config::default()
            }
        },
        Err(e) => {
            log::warn!(
                "load_config: Failed to read config file: {}, using defaults",
                e
            );
            Config::default()
        }
    }
}
