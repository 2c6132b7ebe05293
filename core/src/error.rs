use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("board needs at least one row and one column, got {rows}x{cols}")]
    InvalidGrid { rows: u32, cols: u32 },
    #[error("board of {rows}x{cols} exceeds the limit of {max} pieces")]
    GridTooLarge { rows: u32, cols: u32, max: u64 },
    #[error("scatter band_rows {band_rows} exceeds the limit of {max}")]
    TooManyBandRows { band_rows: u32, max: u32 },
    #[error("cell size must be finite and positive, got {0}")]
    InvalidCellSize(f64),
    #[error("snap threshold must be finite and non-negative, got {0}")]
    InvalidSnapThreshold(f64),
    #[error("outline size must be finite and positive, got {0}")]
    InvalidOutlineSize(f64),
    #[error("invalid shape settings: {0}")]
    InvalidShape(&'static str),
    #[error("invalid scatter settings: {0}")]
    InvalidScatter(&'static str),
    #[error("config parse failed: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to read config at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("seed 0 is reserved for flat sides")]
    ReservedSeed,
    #[error("edge length must be finite and positive, got {0}")]
    InvalidLength(f64),
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
