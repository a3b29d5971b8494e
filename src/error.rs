use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while loading, selecting or exporting tiles.
///
/// None of these are fatal; a session stays usable after any of them.
#[derive(Error, Debug)]
pub enum TileError {
    /// The image file could not be opened or decoded
    #[error("could not load image {path:?}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Export was attempted with nothing selected
    #[error("select at least one tile before exporting")]
    EmptySelection,

    /// The export file could not be written
    #[error("could not write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("tile size must be non-zero, got {width}x{height}")]
    InvalidTileSize { width: u32, height: u32 },

    /// The config file is not valid YAML or has fields of the wrong type
    #[error("invalid config: {0}")]
    Config(#[from] serde_yaml::Error),
}

pub type TileResult<T> = Result<T, TileError>;
