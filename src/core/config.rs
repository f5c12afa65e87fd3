//! Map build configuration
//!
//! [`MapConfig`] says what to build and is fixed once assembled;
//! [`BuildOptions`] says how to run the build.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::region::RegionSpec;
use crate::core::source::{ImageFormat, SourceConfig};

/// Progress callback, called with (tiles done, tiles total)
pub type ProgressCallback = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// Overwrite behavior for existing output files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteBehavior {
    /// Ask on the terminal (default)
    #[default]
    Prompt,
    /// Overwrite without asking
    Force,
    /// Fail if the file exists
    NeverOverwrite,
}

/// Everything that determines the produced map
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Calibration file to write
    pub map_path: PathBuf,

    /// Mosaic image to write
    pub image_path: PathBuf,

    pub region: RegionSpec,

    pub source: SourceConfig,

    /// Text written to the `COPYRIGHT` field
    pub copyright: String,

    /// Calibration template, the built-in one when `None`
    pub template: Option<PathBuf>,
}

impl MapConfig {
    /// Config for `map_path` with the image placed next to it
    pub fn new(map_path: impl Into<PathBuf>, region: RegionSpec, source: SourceConfig) -> Self {
        let map_path = map_path.into();
        let image_path = default_image_path(&map_path, source.format);
        Self {
            map_path,
            image_path,
            region,
            source,
            copyright: crate::core::calibration::DEFAULT_COPYRIGHT.to_string(),
            template: None,
        }
    }

    pub fn with_image_path(mut self, image_path: impl Into<PathBuf>) -> Self {
        self.image_path = image_path.into();
        self
    }

    pub fn with_copyright(mut self, copyright: impl Into<String>) -> Self {
        self.copyright = copyright.into();
        self
    }

    pub fn with_template(mut self, template: Option<PathBuf>) -> Self {
        self.template = template;
        self
    }
}

/// Image path derived from the map path: same stem, format extension
pub fn default_image_path(map_path: &Path, format: ImageFormat) -> PathBuf {
    map_path.with_extension(format.extension())
}

/// Run-time options for [`build_map`](crate::build_map)
#[derive(Clone)]
pub struct BuildOptions {
    /// Fetch tiles; when off the image is a blank canvas
    pub download: bool,

    /// Upper bound on concurrent tile requests
    pub max_connections: usize,

    pub overwrite: OverwriteBehavior,

    pub progress: Option<ProgressCallback>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            download: true,
            max_connections: 8,
            overwrite: OverwriteBehavior::default(),
            progress: None,
        }
    }
}

impl std::fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOptions")
            .field("download", &self.download)
            .field("max_connections", &self.max_connections)
            .field("overwrite", &self.overwrite)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
