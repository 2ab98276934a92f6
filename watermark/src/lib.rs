//! Watermark - stencil masking of image batches on a fixed worker farm.
//!
//! A run takes a directory of same-size images and a mask. Every image is decoded,
//! each pixel whose mask counterpart has a red value other than 255 is blacked out,
//! and the result is written as JPEG under the image's own file name.
//!
//! Work is split among `P` workers: each gets one equal, contiguous chunk of the
//! catalog, and the `N % P` trailing images are claimed one at a time from a shared
//! pool by whichever worker runs out of work first.
//!
//! ```rust,ignore
//! use watermark::{Farm, FarmConfig};
//!
//! let config = FarmConfig::new("photos", "mask.png", "masked", 4);
//! let report = Farm::from_config(&config)?.run()?;
//! println!("{report}");
//! ```

mod catalog;
pub mod codec;
pub mod config;
mod error;
pub mod farm;
mod mask;
pub mod masking;
pub mod partition;
pub mod remainder;

pub use catalog::Catalog;
pub use codec::{ImageCodec, JpegCodec};
pub use config::{Canvas, FarmConfig};
pub use error::{Error, Result};
pub use farm::{Farm, FarmBuilder, RunContext, RunReport};
pub use mask::{Mask, TRANSPARENT};
pub use masking::{mask_image, retry_once, Outcome};
pub use partition::{Chunk, Partition};
pub use remainder::RemainderPool;
