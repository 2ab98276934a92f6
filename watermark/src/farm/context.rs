use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::catalog::Catalog;
use crate::codec::ImageCodec;
use crate::error::{Error, Result};
use crate::mask::Mask;
use crate::masking::{mask_image, Outcome};
use crate::remainder::RemainderPool;

/// State shared by every worker of one run.
///
/// Catalog, mask and codec are read-only. The remainder pool and the counters are
/// the only mutable pieces; all of it is dropped when the run ends.
pub struct RunContext {
    catalog: Catalog,
    mask: Mask,
    codec: Arc<dyn ImageCodec>,
    output_dir: PathBuf,
    pool: RemainderPool,
    processed: AtomicUsize,
    skipped: AtomicUsize,
    aborted: AtomicBool,
    failure: Mutex<Option<Error>>,
}

impl RunContext {
    pub(crate) fn new(
        catalog: Catalog,
        mask: Mask,
        codec: Arc<dyn ImageCodec>,
        output_dir: PathBuf,
        pool: RemainderPool,
    ) -> Self {
        Self {
            catalog,
            mask,
            codec,
            output_dir,
            pool,
            processed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            aborted: AtomicBool::new(false),
            failure: Mutex::new(None),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Masks the catalog image at `index` and updates the counters.
    pub fn process(&self, index: usize) -> Result<()> {
        let source = self.catalog.get(index).ok_or_else(|| {
            Error::Runtime(format!(
                "index {index} outside catalog of {} images",
                self.catalog.len()
            ))
        })?;

        match mask_image(self.codec.as_ref(), &self.mask, source, &self.output_dir)? {
            Outcome::Saved(destination) => {
                self.processed.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(index, "{} -> {}", source.display(), destination.display());
            }
            Outcome::Skipped { width, height } => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    "{} not processed: {width}x{height} does not match canvas {}",
                    source.display(),
                    self.mask.canvas()
                );
            }
        }
        Ok(())
    }

    /// Takes the next index from the remainder pool.
    pub fn claim(&self) -> Option<usize> {
        self.pool.claim()
    }

    pub fn remaining(&self) -> usize {
        self.pool.remaining()
    }

    /// Images masked and saved so far.
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    /// Images left alone because of a size mismatch.
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    /// Records a fatal error and tells every worker to stop before its next image.
    /// Only the first error is kept.
    pub fn abort(&self, err: Error) {
        let mut failure = self.failure.lock();
        if failure.is_none() {
            tracing::error!("{err}");
            *failure = Some(err);
        } else {
            tracing::debug!("Further failure after abort: {err}");
        }
        self.aborted.store(true, Ordering::Release);
    }

    pub(crate) fn take_failure(&self) -> Option<Error> {
        self.failure.lock().take()
    }
}
