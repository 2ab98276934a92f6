//! Image decoding and JPEG encoding.
//!
//! [`ImageCodec`] is the boundary between the farm and the file formats it reads and
//! writes. Everything the farm touches is 8-bit RGB; alpha and high bit depths are
//! dropped on decode.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageReader, ImageResult, RgbImage};

use crate::config::DEFAULT_JPEG_QUALITY;
use crate::error::{Error, Result};

/// Loads images into RGB pixel grids and writes them back out as JPEG.
///
/// Implementations are shared by every worker thread.
pub trait ImageCodec: Send + Sync {
    fn decode(&self, path: &Path) -> Result<RgbImage>;

    fn encode_jpeg(&self, image: &RgbImage, path: &Path) -> Result<()>;
}

/// [`ImageCodec`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegCodec {
    quality: u8,
}

impl JpegCodec {
    /// `quality` is clamped to the encoder's 1..=100 range.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }
}

impl Default for JpegCodec {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

impl ImageCodec for JpegCodec {
    fn decode(&self, path: &Path) -> Result<RgbImage> {
        // Outputs keep their source's name whatever the encoding, so sniff the content.
        let decode = || -> ImageResult<RgbImage> {
            let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
            Ok(image.into_rgb8())
        };

        decode().map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })
    }

    fn encode_jpeg(&self, image: &RgbImage, path: &Path) -> Result<()> {
        let encode = || -> ImageResult<()> {
            let mut writer = BufWriter::new(File::create(path)?);
            image.write_with_encoder(JpegEncoder::new_with_quality(&mut writer, self.quality))?;
            writer.flush()?;
            Ok(())
        };

        encode().map_err(|source| Error::Encode {
            path: path.to_path_buf(),
            source,
        })
    }
}
