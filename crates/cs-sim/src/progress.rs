//! Progress reporting for long runs.

/// Snapshot emitted after each exchange step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimProgress {
    pub tick: u64,
    pub total_ticks: u64,
    pub time: f64,
    pub stop_time: f64,
}

impl SimProgress {
    pub fn fraction_complete(&self) -> f64 {
        if self.total_ticks == 0 {
            return 1.0;
        }
        self.tick as f64 / self.total_ticks as f64
    }

    pub fn is_final(&self) -> bool {
        self.tick >= self.total_ticks
    }
}
