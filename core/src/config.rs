use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::edge::ShapeSettings;
use crate::error::ConfigError;
use crate::layout::{ScatterSettings, SCATTER_BAND_ROWS_MAX};
use crate::outline::OUTLINE_SIZE_DEFAULT;

pub const ROWS_DEFAULT: u32 = 3;
pub const COLS_DEFAULT: u32 = 4;
pub const CELL_SIZE_DEFAULT: f64 = 100.0;
pub const SNAP_THRESHOLD_DEFAULT: f64 = 20.0;
/// Keeps the border lattice, `(rows + 1) * (cols + 1)`, well inside `u32` indexing.
pub const PIECE_COUNT_MAX: u64 = 1 << 20;

/// Parameters of one board build. Re-issued on level change, restart or resize.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildRequest {
    pub rows: u32,
    pub cols: u32,
    pub cell_size: f64,
    pub snap_threshold: f64,
    /// Pins the lattice and scatter randomness; `None` draws a fresh seed.
    pub seed: Option<u64>,
    /// Edge length of the canonical outline frame.
    pub outline_size: f64,
    pub shape: ShapeSettings,
    pub scatter: ScatterSettings,
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self {
            rows: ROWS_DEFAULT,
            cols: COLS_DEFAULT,
            cell_size: CELL_SIZE_DEFAULT,
            snap_threshold: SNAP_THRESHOLD_DEFAULT,
            seed: None,
            outline_size: OUTLINE_SIZE_DEFAULT,
            shape: ShapeSettings::default(),
            scatter: ScatterSettings::default(),
        }
    }
}

impl BuildRequest {
    pub fn new(rows: u32, cols: u32, cell_size: f64, snap_threshold: f64) -> Self {
        Self {
            rows,
            cols,
            cell_size,
            snap_threshold,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn piece_count(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ConfigError::InvalidGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if self.rows as u64 * self.cols as u64 > PIECE_COUNT_MAX {
            return Err(ConfigError::GridTooLarge {
                rows: self.rows,
                cols: self.cols,
                max: PIECE_COUNT_MAX,
            });
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        if !self.snap_threshold.is_finite() || self.snap_threshold < 0.0 {
            return Err(ConfigError::InvalidSnapThreshold(self.snap_threshold));
        }
        if !self.outline_size.is_finite() || self.outline_size <= 0.0 {
            return Err(ConfigError::InvalidOutlineSize(self.outline_size));
        }
        validate_shape(&self.shape)?;
        if self.scatter.band_rows > SCATTER_BAND_ROWS_MAX {
            return Err(ConfigError::TooManyBandRows {
                band_rows: self.scatter.band_rows,
                max: SCATTER_BAND_ROWS_MAX,
            });
        }
        if !self.scatter.gap_ratio.is_finite() || self.scatter.gap_ratio < 0.0 {
            return Err(ConfigError::InvalidScatter("gap_ratio must be non-negative"));
        }
        Ok(())
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let request: BuildRequest = toml::from_str(contents)?;
        request.validate()?;
        Ok(request)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}

fn validate_shape(shape: &ShapeSettings) -> Result<(), ConfigError> {
    let ratios = [
        shape.neck_ratio,
        shape.head_ratio,
        shape.height_ratio,
        shape.jitter_ratio,
    ];
    if ratios.iter().any(|value| !value.is_finite() || *value < 0.0) {
        return Err(ConfigError::InvalidShape("ratios must be finite and non-negative"));
    }
    if shape.neck_ratio <= 0.0 || shape.head_ratio <= 0.0 || shape.height_ratio <= 0.0 {
        return Err(ConfigError::InvalidShape("neck, head and height must be positive"));
    }
    if shape.head_ratio + shape.jitter_ratio >= 0.5 {
        return Err(ConfigError::InvalidShape("head must fit within half the edge"));
    }
    if !shape.skew_limit.is_finite() || shape.skew_limit < 0.0 {
        return Err(ConfigError::InvalidShape("skew_limit must be non-negative"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rows_or_cols_rejected() {
        for (rows, cols) in [(0, 3), (3, 0), (0, 0)] {
            let err = BuildRequest::new(rows, cols, 100.0, 20.0)
                .validate()
                .expect_err("invalid grid");
            assert!(matches!(err, ConfigError::InvalidGrid { .. }));
        }
    }

    #[test]
    fn oversized_grid_rejected_before_planning() {
        for (rows, cols) in [(1, u32::MAX), (u32::MAX, 1), (1025, 1024)] {
            let err = BuildRequest::new(rows, cols, 100.0, 20.0)
                .validate()
                .expect_err("grid too large");
            assert!(matches!(err, ConfigError::GridTooLarge { .. }), "{rows}x{cols}");
        }
        assert!(BuildRequest::new(1024, 1024, 100.0, 20.0).validate().is_ok());
    }

    #[test]
    fn band_rows_are_capped() {
        let err = BuildRequest::from_toml_str("[scatter]\nband_rows = 100000")
            .expect_err("too many bands");
        assert!(matches!(
            err,
            ConfigError::TooManyBandRows {
                band_rows: 100000,
                ..
            }
        ));
        let mut request = BuildRequest::default();
        request.scatter.band_rows = SCATTER_BAND_ROWS_MAX;
        assert!(request.validate().is_ok());
    }

    #[test]
    fn degenerate_cell_size_rejected() {
        for size in [0.0, -1.0, f64::INFINITY, f64::NAN] {
            let err = BuildRequest::new(2, 2, size, 20.0)
                .validate()
                .expect_err("invalid cell size");
            assert!(matches!(err, ConfigError::InvalidCellSize(_)));
        }
        let err = BuildRequest::new(2, 2, 100.0, -1.0)
            .validate()
            .expect_err("invalid threshold");
        assert!(matches!(err, ConfigError::InvalidSnapThreshold(_)));
    }

    #[test]
    fn toml_overrides_defaults() {
        let request = BuildRequest::from_toml_str(
            r#"
            rows = 5
            cols = 7
            cell_size = 64.0
            seed = 99

            [shape]
            skew_limit = 0.5

            [scatter]
            band_rows = 3
            "#,
        )
        .expect("parse");
        assert_eq!(request.rows, 5);
        assert_eq!(request.cols, 7);
        assert_eq!(request.cell_size, 64.0);
        assert_eq!(request.snap_threshold, SNAP_THRESHOLD_DEFAULT);
        assert_eq!(request.seed, Some(99));
        assert_eq!(request.shape.skew_limit, 0.5);
        assert_eq!(request.shape.neck_ratio, ShapeSettings::default().neck_ratio);
        assert_eq!(request.scatter.band_rows, 3);
    }

    #[test]
    fn toml_is_validated() {
        let err = BuildRequest::from_toml_str("rows = 0").expect_err("rejected");
        assert!(matches!(err, ConfigError::InvalidGrid { rows: 0, .. }));
        let err = BuildRequest::from_toml_str("rows = \"three\"").expect_err("rejected");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = std::env::temp_dir().join("jigsnap-missing-config.toml");
        let err = BuildRequest::load(&path).expect_err("missing");
        assert!(err.to_string().contains("jigsnap-missing-config.toml"));
    }
}
