//! Run configuration.
//!
//! A [`FarmConfig`] describes one watermark run: where the images come from, which
//! mask to apply, where the results go and how many workers share the batch. It can
//! be built in code, or loaded from a YAML or JSON file and then adjusted.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound on the worker count, sized for the expected batch.
pub const DEFAULT_MAX_WORKERS: usize = 44;

/// Smallest worker count accepted by [`FarmConfig::validate`].
pub const MIN_WORKERS: usize = 2;

/// JPEG quality used for masked outputs unless configured otherwise.
pub const DEFAULT_JPEG_QUALITY: u8 = 100;

/// Fixed pixel dimensions every processed image and the mask must share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(1024, 768)
    }
}

impl fmt::Display for Canvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Configuration for a single watermark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarmConfig {
    /// Directory holding the images to mask.
    pub input_dir: PathBuf,
    /// Stencil image; red == 255 keeps the source pixel, anything else blacks it out.
    pub mask_path: PathBuf,
    /// Destination directory, created if absent.
    pub output_dir: PathBuf,
    /// Number of farm workers (P).
    pub workers: usize,
    /// Upper bound for `workers`.
    pub max_workers: usize,
    /// Expected size of the mask and of every image.
    pub canvas: Canvas,
    /// Images of a worker's static chunk processed concurrently. 1 = sequential.
    pub chunk_fan_out: usize,
    /// JPEG encoder quality (1-100).
    pub jpeg_quality: u8,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            mask_path: PathBuf::new(),
            output_dir: PathBuf::new(),
            workers: MIN_WORKERS,
            max_workers: DEFAULT_MAX_WORKERS,
            canvas: Canvas::default(),
            chunk_fan_out: 1,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl FarmConfig {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        mask_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        workers: usize,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            mask_path: mask_path.into(),
            output_dir: output_dir.into(),
            workers,
            ..Default::default()
        }
    }

    /// Loads a configuration from a `.yaml`/`.yml` or `.json` file.
    /// Fields missing from the file keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let format = common::SerdeFormat::from_path(path).map_err(|source| Error::ConfigFormat {
            path: path.to_path_buf(),
            source,
        })?;
        let text = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        common::deserialize(&text, format).map_err(|source| Error::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_canvas(mut self, canvas: Canvas) -> Self {
        self.canvas = canvas;
        self
    }

    pub fn with_chunk_fan_out(mut self, chunk_fan_out: usize) -> Self {
        self.chunk_fan_out = chunk_fan_out;
        self
    }

    pub fn with_jpeg_quality(mut self, jpeg_quality: u8) -> Self {
        self.jpeg_quality = jpeg_quality;
        self
    }

    /// Checks every precondition that must hold before any image is touched.
    pub fn validate(&self) -> Result<()> {
        if self.max_workers < MIN_WORKERS {
            return Err(Error::InvalidConfig(format!(
                "max_workers must be at least {MIN_WORKERS}, got {}",
                self.max_workers
            )));
        }
        if !(MIN_WORKERS..=self.max_workers).contains(&self.workers) {
            return Err(Error::InvalidConfig(format!(
                "workers must be in {MIN_WORKERS}..={}, got {}",
                self.max_workers, self.workers
            )));
        }
        if self.chunk_fan_out == 0 {
            return Err(Error::InvalidConfig(
                "chunk_fan_out must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::InvalidConfig(format!(
                "jpeg_quality must be in 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if self.canvas.pixel_count() == 0 {
            return Err(Error::InvalidConfig(format!(
                "canvas must not be empty, got {}",
                self.canvas
            )));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(
                "output_dir must be set".to_string(),
            ));
        }
        if !self.input_dir.is_dir() {
            return Err(Error::MissingInput {
                path: self.input_dir.clone(),
                expected: "directory",
            });
        }
        if !self.mask_path.is_file() {
            return Err(Error::MissingInput {
                path: self.mask_path.clone(),
                expected: "file",
            });
        }
        Ok(())
    }
}
