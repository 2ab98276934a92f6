use std::path::Path;

use image::RgbImage;

use crate::codec::ImageCodec;
use crate::config::Canvas;
use crate::error::Result;

/// Red value marking a mask pixel that leaves the target untouched.
pub const TRANSPARENT: u8 = 255;

/// Binary stencil applied to every image of a run.
///
/// Wherever the mask's red channel differs from [`TRANSPARENT`], the target pixel is
/// overwritten with black. The mask is immutable once built and is read concurrently
/// by all workers.
#[derive(Debug, Clone)]
pub struct Mask {
    canvas: Canvas,
    // Row-major pixel offsets to black out, computed once at load.
    opaque: Vec<usize>,
}

impl Mask {
    pub fn from_image(image: &RgbImage) -> Self {
        let canvas = Canvas::new(image.width(), image.height());
        let opaque = image
            .pixels()
            .enumerate()
            .filter(|(_, px)| px[0] != TRANSPARENT)
            .map(|(offset, _)| offset)
            .collect();

        Self { canvas, opaque }
    }

    pub fn load(codec: &dyn ImageCodec, path: &Path) -> Result<Self> {
        let image = codec.decode(path)?;
        Ok(Self::from_image(&image))
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn is_transparent(&self, x: u32, y: u32) -> bool {
        let offset = y as usize * self.canvas.width as usize + x as usize;
        self.opaque.binary_search(&offset).is_err()
    }

    /// Number of pixels the mask blacks out.
    pub fn coverage(&self) -> usize {
        self.opaque.len()
    }

    /// Blacks out every target pixel under an opaque mask pixel.
    ///
    /// # Panics
    ///
    /// Panics if `image` is not exactly the mask's size; callers check first.
    pub fn apply(&self, image: &mut RgbImage) {
        assert!(
            self.canvas.matches(image.width(), image.height()),
            "image {}x{} does not match mask {}",
            image.width(),
            image.height(),
            self.canvas
        );

        let raw: &mut [u8] = image;
        for &offset in &self.opaque {
            raw[offset * 3..offset * 3 + 3].fill(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn stencil() -> RgbImage {
        // Left column opaque at various non-255 reds, the rest transparent.
        RgbImage::from_fn(4, 3, |x, y| match (x, y) {
            (0, 0) => Rgb([0, 255, 255]),
            (0, 1) => Rgb([200, 0, 0]),
            (0, 2) => Rgb([254, 254, 254]),
            (1, 1) => Rgb([255, 0, 0]),
            _ => Rgb([255, 255, 255]),
        })
    }

    #[test]
    fn test_only_red_channel_decides() {
        let mask = Mask::from_image(&stencil());

        assert_eq!(mask.canvas(), Canvas::new(4, 3));
        assert_eq!(mask.coverage(), 3);
        assert!(!mask.is_transparent(0, 0));
        assert!(!mask.is_transparent(0, 1));
        assert!(!mask.is_transparent(0, 2));
        assert!(mask.is_transparent(1, 1));
        assert!(mask.is_transparent(3, 2));
    }

    #[test]
    fn test_apply_blacks_out_opaque_pixels_only() {
        let mask = Mask::from_image(&stencil());
        let source = RgbImage::from_fn(4, 3, |x, y| Rgb([10 + x as u8, 20 + y as u8, 30]));
        let mut target = source.clone();

        mask.apply(&mut target);

        for (x, y, px) in target.enumerate_pixels() {
            if mask.is_transparent(x, y) {
                assert_eq!(px, source.get_pixel(x, y), "pixel ({x}, {y}) changed");
            } else {
                assert_eq!(px, &Rgb([0, 0, 0]), "pixel ({x}, {y}) not blacked out");
            }
        }
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mask = Mask::from_image(&stencil());
        let mut once = RgbImage::from_pixel(4, 3, Rgb([90, 180, 45]));
        mask.apply(&mut once);
        let mut twice = once.clone();

        mask.apply(&mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_all_white_mask_changes_nothing() {
        let mask = Mask::from_image(&RgbImage::from_pixel(5, 5, Rgb([255, 0, 0])));
        let source = RgbImage::from_pixel(5, 5, Rgb([1, 2, 3]));
        let mut target = source.clone();

        mask.apply(&mut target);

        assert_eq!(mask.coverage(), 0);
        assert_eq!(target, source);
    }

    #[test]
    #[should_panic(expected = "does not match mask")]
    fn test_apply_rejects_wrong_size() {
        let mask = Mask::from_image(&stencil());
        mask.apply(&mut RgbImage::new(3, 4));
    }
}
