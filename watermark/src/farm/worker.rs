use common::parallel::try_par_for_each_limited;

use crate::error::Result;
use crate::farm::context::RunContext;
use crate::partition::Chunk;

/// Per-worker tally, summed into the run report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub static_images: usize,
    pub dynamic_images: usize,
}

/// One farm worker: its static chunk first, then the remainder pool until drained.
#[derive(Debug, Clone)]
pub struct Worker {
    id: usize,
    chunk: Chunk,
    fan_out: usize,
}

impl Worker {
    pub fn new(id: usize, chunk: Chunk, fan_out: usize) -> Self {
        Self {
            id,
            chunk,
            fan_out: fan_out.max(1),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn chunk(&self) -> Chunk {
        self.chunk
    }

    /// Runs both phases. Returns early, without error, once the run is aborted.
    pub fn run(&self, ctx: &RunContext) -> Result<WorkerStats> {
        let static_images = self.run_chunk(ctx)?;
        let dynamic_images = self.run_remainder(ctx)?;

        tracing::debug!(
            worker = self.id,
            static_images,
            dynamic_images,
            "Worker finished"
        );

        Ok(WorkerStats {
            static_images,
            dynamic_images,
        })
    }

    fn run_chunk(&self, ctx: &RunContext) -> Result<usize> {
        if self.chunk.is_empty() {
            return Ok(0);
        }

        tracing::debug!(
            worker = self.id,
            "Processing chunk [{}, {})",
            self.chunk.start,
            self.chunk.end
        );

        let indices: Vec<usize> = self.chunk.indices().collect();
        try_par_for_each_limited(&indices, self.fan_out, |&index| {
            if ctx.is_aborted() {
                return Ok(());
            }
            ctx.process(index)
        })?;

        Ok(self.chunk.len())
    }

    fn run_remainder(&self, ctx: &RunContext) -> Result<usize> {
        let mut claimed = 0;
        while !ctx.is_aborted() {
            let Some(index) = ctx.claim() else {
                break;
            };
            tracing::debug!(worker = self.id, index, "Claimed from remainder pool");
            ctx.process(index)?;
            claimed += 1;
        }
        Ok(claimed)
    }
}
