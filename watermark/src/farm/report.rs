use std::fmt;
use std::time::Duration;

/// End-of-run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub workers: usize,
    pub elapsed: Duration,
    /// Images masked and written.
    pub processed: usize,
    /// Images skipped for having the wrong size.
    pub skipped: usize,
    /// Images handled through static chunks.
    pub static_images: usize,
    /// Images claimed from the remainder pool.
    pub dynamic_images: usize,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parallelism degree: {}", self.workers)?;
        writeln!(f, "Completion time: {:.3} s", self.elapsed.as_secs_f64())?;
        write!(f, "Processed images: {}", self.processed)?;
        if self.skipped > 0 {
            write!(f, " ({} skipped)", self.skipped)?;
        }
        Ok(())
    }
}
