//! Error types for watermark runs.

use std::io;
use std::path::PathBuf;

use common::file_format::FileExtensionError;
use common::SerdeFormatError;
use thiserror::Error;

use crate::config::Canvas;

/// Errors that can occur while configuring or running a watermark farm.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Input path '{path}' does not exist or is not a {expected}")]
    MissingInput { path: PathBuf, expected: &'static str },

    #[error("Failed to read config file '{path}': {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported config file '{path}': {source}")]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: FileExtensionError,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: SerdeFormatError,
    },

    #[error("Failed to list input directory '{path}': {source}")]
    ListInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to create output directory '{path}': {source}")]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode image '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to encode image '{path}': {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Image path '{path}' has no file name")]
    NoFileName { path: PathBuf },

    #[error("Mask is {actual}, expected canvas {expected}")]
    MaskSize { expected: Canvas, actual: Canvas },

    #[error("Worker pool failure: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, Error>;
