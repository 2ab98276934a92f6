//! The worker farm.
//!
//! A [`Farm`] owns a [`RunContext`] and a fixed [`Partition`]. [`Farm::run`] starts one
//! OS thread per chunk; each [`Worker`] masks its chunk, then drains the shared
//! remainder pool. The run ends when every worker has returned.

mod context;
mod report;
mod worker;


use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Instant;

pub use context::RunContext;
pub use report::RunReport;
pub use worker::{Worker, WorkerStats};

use crate::catalog::Catalog;
use crate::codec::{ImageCodec, JpegCodec};
use crate::config::{Canvas, FarmConfig};
use crate::error::{Error, Result};
use crate::mask::Mask;
use crate::partition::Partition;

/// Assembles a [`Farm`] from its parts.
#[derive(Default)]
pub struct FarmBuilder {
    catalog: Option<Catalog>,
    mask: Option<Mask>,
    codec: Option<Arc<dyn ImageCodec>>,
    output_dir: Option<PathBuf>,
    canvas: Option<Canvas>,
    workers: usize,
    chunk_fan_out: usize,
}

impl FarmBuilder {
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Defaults to [`JpegCodec::default`].
    pub fn codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(output_dir.into());
        self
    }

    /// Expected canvas; the mask must match it. Defaults to the mask's own size.
    pub fn canvas(mut self, canvas: Canvas) -> Self {
        self.canvas = Some(canvas);
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Images of a chunk processed concurrently inside one worker. Defaults to 1.
    pub fn chunk_fan_out(mut self, chunk_fan_out: usize) -> Self {
        self.chunk_fan_out = chunk_fan_out;
        self
    }

    pub fn build(self) -> Result<Farm> {
        let catalog = self
            .catalog
            .ok_or_else(|| Error::InvalidConfig("farm needs a catalog".to_string()))?;
        let mask = self
            .mask
            .ok_or_else(|| Error::InvalidConfig("farm needs a mask".to_string()))?;
        let output_dir = self
            .output_dir
            .ok_or_else(|| Error::InvalidConfig("farm needs an output directory".to_string()))?;

        if self.workers == 0 {
            return Err(Error::InvalidConfig(
                "farm needs at least one worker".to_string(),
            ));
        }

        if let Some(expected) = self.canvas {
            if mask.canvas() != expected {
                return Err(Error::MaskSize {
                    expected,
                    actual: mask.canvas(),
                });
            }
        }

        let codec: Arc<dyn ImageCodec> = match self.codec {
            Some(codec) => codec,
            None => Arc::new(JpegCodec::default()),
        };
        let partition = Partition::new(catalog.len(), self.workers);
        let pool = partition.remainder_pool();

        Ok(Farm {
            ctx: RunContext::new(catalog, mask, codec, output_dir, pool),
            partition,
            chunk_fan_out: self.chunk_fan_out.max(1),
        })
    }
}

/// A fully prepared run: catalog, mask, partition and shared state.
pub struct Farm {
    ctx: RunContext,
    partition: Partition,
    chunk_fan_out: usize,
}

impl Farm {
    pub fn builder() -> FarmBuilder {
        FarmBuilder::default()
    }

    /// Validates `config`, discovers the catalog and loads the mask.
    pub fn from_config(config: &FarmConfig) -> Result<Self> {
        config.validate()?;

        let codec = Arc::new(JpegCodec::new(config.jpeg_quality));
        let catalog = Catalog::discover(&config.input_dir)?;
        let mask = Mask::load(codec.as_ref(), &config.mask_path)?;

        tracing::info!(
            "Found {} images in {}",
            catalog.len(),
            config.input_dir.display()
        );

        Self::builder()
            .catalog(catalog)
            .mask(mask)
            .codec(codec)
            .output_dir(&config.output_dir)
            .canvas(config.canvas)
            .workers(config.workers)
            .chunk_fan_out(config.chunk_fan_out)
            .build()
    }

    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Runs every worker to completion.
    ///
    /// The first fatal error stops all workers before their next image and is
    /// returned. Files already written stay in place.
    pub fn run(self) -> Result<RunReport> {
        let started = Instant::now();
        let Farm {
            ctx,
            partition,
            chunk_fan_out,
        } = self;

        std::fs::create_dir_all(ctx.output_dir()).map_err(|source| Error::CreateOutputDir {
            path: ctx.output_dir().to_path_buf(),
            source,
        })?;

        let workers = partition.workers();
        tracing::info!(
            "Starting {workers} workers: {} images, chunks of {}, {} in remainder pool, mask covers {} px",
            partition.total(),
            partition.workload(),
            partition.remainder(),
            ctx.mask().coverage()
        );

        let stats = run_workers(&ctx, partition, chunk_fan_out);

        if let Some(err) = ctx.take_failure() {
            return Err(err);
        }

        let report = RunReport {
            workers,
            elapsed: started.elapsed(),
            processed: ctx.processed(),
            skipped: ctx.skipped(),
            static_images: stats.iter().map(|s| s.static_images).sum(),
            dynamic_images: stats.iter().map(|s| s.dynamic_images).sum(),
        };

        tracing::info!(
            "Run finished in {:.3} s: {} processed, {} skipped",
            report.elapsed.as_secs_f64(),
            report.processed,
            report.skipped
        );

        Ok(report)
    }
}

/// Spawns one named thread per chunk and joins them all.
/// Failures are recorded on `ctx`; only stats of clean workers are returned.
fn run_workers(ctx: &RunContext, partition: Partition, chunk_fan_out: usize) -> Vec<WorkerStats> {
    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(partition.workers());

        for (id, chunk) in partition.into_iter().enumerate() {
            let worker = Worker::new(id, chunk, chunk_fan_out);
            let spawned = thread::Builder::new()
                .name(format!("watermark-worker-{id}"))
                .spawn_scoped(scope, move || match worker.run(ctx) {
                    Ok(stats) => Some(stats),
                    Err(err) => {
                        ctx.abort(err);
                        None
                    }
                });

            match spawned {
                Ok(handle) => handles.push((id, handle)),
                Err(err) => {
                    ctx.abort(Error::Runtime(format!(
                        "failed to spawn worker {id}: {err}"
                    )));
                    break;
                }
            }
        }

        let mut stats = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            match handle.join() {
                Ok(Some(worker_stats)) => stats.push(worker_stats),
                Ok(None) => {}
                Err(_) => ctx.abort(Error::Runtime(format!("worker {id} panicked"))),
            }
        }
        stats
    })
}
