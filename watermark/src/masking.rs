//! Per-image masking routine.

use std::path::{Path, PathBuf};

use crate::codec::ImageCodec;
use crate::error::{Error, Result};
use crate::mask::Mask;

/// What happened to a single catalog image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Masked and written to the contained path.
    Saved(PathBuf),
    /// Left alone because its size differs from the mask's canvas.
    Skipped { width: u32, height: u32 },
}

/// Runs `op`, and if it fails runs it exactly once more.
/// The second result is returned as is.
pub fn retry_once<T, F>(mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    op().or_else(|err| {
        tracing::warn!("{err}; retrying once");
        op()
    })
}

/// Destination for `source`: its base name inside `output_dir`.
pub fn output_path(output_dir: &Path, source: &Path) -> Result<PathBuf> {
    let name = source.file_name().ok_or_else(|| Error::NoFileName {
        path: source.to_path_buf(),
    })?;
    Ok(output_dir.join(name))
}

/// Decodes `source`, stencils it with `mask` and writes it as JPEG into `output_dir`.
///
/// Images whose size differs from the mask are skipped without touching the output
/// directory. A failed encode is retried once; a second failure is returned.
pub fn mask_image(
    codec: &dyn ImageCodec,
    mask: &Mask,
    source: &Path,
    output_dir: &Path,
) -> Result<Outcome> {
    let mut image = codec.decode(source)?;

    let (width, height) = image.dimensions();
    if !mask.canvas().matches(width, height) {
        return Ok(Outcome::Skipped { width, height });
    }

    mask.apply(&mut image);

    let destination = output_path(output_dir, source)?;
    retry_once(|| codec.encode_jpeg(&image, &destination))?;

    Ok(Outcome::Saved(destination))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use image::{Rgb, RgbImage};
    use parking_lot::Mutex;

    /// Keeps encoded images in memory; fails the first `failures` encodes.
    #[derive(Default)]
    struct MemoryCodec {
        inputs: HashMap<PathBuf, RgbImage>,
        outputs: Mutex<HashMap<PathBuf, RgbImage>>,
        failures: AtomicUsize,
        encode_calls: AtomicUsize,
    }

    impl MemoryCodec {
        fn with_input(mut self, path: &str, image: RgbImage) -> Self {
            self.inputs.insert(PathBuf::from(path), image);
            self
        }

        fn failing(self, failures: usize) -> Self {
            self.failures.store(failures, Ordering::SeqCst);
            self
        }

        fn output(&self, path: &str) -> Option<RgbImage> {
            self.outputs.lock().get(Path::new(path)).cloned()
        }
    }

    impl ImageCodec for MemoryCodec {
        fn decode(&self, path: &Path) -> Result<RgbImage> {
            self.inputs.get(path).cloned().ok_or_else(|| Error::Decode {
                path: path.to_path_buf(),
                source: image::ImageError::IoError(io::Error::from(io::ErrorKind::NotFound)),
            })
        }

        fn encode_jpeg(&self, image: &RgbImage, path: &Path) -> Result<()> {
            self.encode_calls.fetch_add(1, Ordering::SeqCst);
            let pending = self.failures.load(Ordering::SeqCst);
            if pending > 0 {
                self.failures.store(pending - 1, Ordering::SeqCst);
                return Err(Error::Encode {
                    path: path.to_path_buf(),
                    source: image::ImageError::IoError(io::Error::other("device busy")),
                });
            }
            self.outputs.lock().insert(path.to_path_buf(), image.clone());
            Ok(())
        }
    }

    fn half_mask() -> Mask {
        // Top row opaque (red 200), bottom row transparent.
        Mask::from_image(&RgbImage::from_fn(4, 2, |_, y| {
            if y == 0 {
                Rgb([200, 200, 200])
            } else {
                Rgb([255, 17, 17])
            }
        }))
    }

    #[test]
    fn test_masks_and_saves_under_base_name() {
        let source = RgbImage::from_pixel(4, 2, Rgb([50, 100, 150]));
        let codec = MemoryCodec::default().with_input("/in/photos/a.jpg", source);

        let outcome =
            mask_image(&codec, &half_mask(), Path::new("/in/photos/a.jpg"), Path::new("/out"))
                .unwrap();

        assert_eq!(outcome, Outcome::Saved(PathBuf::from("/out/a.jpg")));
        let saved = codec.output("/out/a.jpg").unwrap();
        for x in 0..4 {
            assert_eq!(saved.get_pixel(x, 0), &Rgb([0, 0, 0]));
            assert_eq!(saved.get_pixel(x, 1), &Rgb([50, 100, 150]));
        }
    }

    #[test]
    fn test_wrong_size_is_skipped_without_output() {
        let codec = MemoryCodec::default().with_input("/in/big.jpg", RgbImage::new(5, 2));

        let outcome =
            mask_image(&codec, &half_mask(), Path::new("/in/big.jpg"), Path::new("/out")).unwrap();

        assert_eq!(
            outcome,
            Outcome::Skipped {
                width: 5,
                height: 2
            }
        );
        assert_eq!(codec.encode_calls.load(Ordering::SeqCst), 0);
        assert!(codec.output("/out/big.jpg").is_none());
    }

    #[test]
    fn test_masking_masked_output_again_changes_nothing() {
        let source = RgbImage::from_fn(4, 2, |x, y| Rgb([x as u8 * 40, y as u8 * 90, 7]));
        let codec = MemoryCodec::default().with_input("/in/a.jpg", source);
        mask_image(&codec, &half_mask(), Path::new("/in/a.jpg"), Path::new("/out")).unwrap();
        let first = codec.output("/out/a.jpg").unwrap();

        let codec = MemoryCodec::default().with_input("/out/a.jpg", first.clone());
        mask_image(&codec, &half_mask(), Path::new("/out/a.jpg"), Path::new("/again")).unwrap();

        assert_eq!(codec.output("/again/a.jpg").unwrap(), first);
    }

    #[test]
    fn test_single_encode_failure_is_retried() {
        let codec = MemoryCodec::default()
            .with_input("/in/a.jpg", RgbImage::new(4, 2))
            .failing(1);

        let outcome = mask_image(&codec, &half_mask(), Path::new("/in/a.jpg"), Path::new("/out"));

        assert!(matches!(outcome, Ok(Outcome::Saved(_))));
        assert_eq!(codec.encode_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_second_encode_failure_propagates() {
        let codec = MemoryCodec::default()
            .with_input("/in/a.jpg", RgbImage::new(4, 2))
            .failing(2);

        let outcome = mask_image(&codec, &half_mask(), Path::new("/in/a.jpg"), Path::new("/out"));

        assert!(matches!(outcome, Err(Error::Encode { .. })));
        assert_eq!(codec.encode_calls.load(Ordering::SeqCst), 2);
        assert!(codec.output("/out/a.jpg").is_none());
    }

    #[test]
    fn test_decode_failure_propagates() {
        let codec = MemoryCodec::default();
        let outcome = mask_image(&codec, &half_mask(), Path::new("/in/x.jpg"), Path::new("/out"));
        assert!(matches!(outcome, Err(Error::Decode { .. })));
    }

    #[test]
    fn test_retry_once_calls_at_most_twice() {
        let mut calls = 0;
        let result: Result<()> = retry_once(|| {
            calls += 1;
            Err(Error::Runtime("nope".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 2);

        let mut calls = 0;
        let result = retry_once(|| {
            calls += 1;
            Ok(calls)
        });
        assert_eq!(result.unwrap(), 1);
    }

    #[test]
    fn test_output_path_requires_file_name() {
        assert_eq!(
            output_path(Path::new("/out"), Path::new("/in/a/b.jpg")).unwrap(),
            PathBuf::from("/out/b.jpg")
        );
        assert!(matches!(
            output_path(Path::new("/out"), Path::new("/")),
            Err(Error::NoFileName { .. })
        ));
    }
}
