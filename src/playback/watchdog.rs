//! Stall detection for stuck playback
//!
//! A playback engine can wedge in a state where it believes it is playing but
//! the reported position stops advancing. The watchdog counts the run of
//! consecutive identical position samples; once the run reaches the
//! configured threshold the track is declared frozen and the owner must
//! perform a corrective skip, begin playback, then `reset()` — in that order,
//! so a stale reading taken during the transition cannot cause a double skip.
//!
//! Position sampling is coarse and an engine may legitimately report the same
//! millisecond value across two rapid samples; the threshold absorbs that
//! noise while still catching a genuinely stuck decoder within a few
//! sampling intervals.

/// Length of the identical-sample run that declares a track frozen
pub const DEFAULT_STALL_THRESHOLD: u32 = 5;

/// Consecutive-stale-sample counter over playback position reports
#[derive(Debug)]
pub struct StallWatchdog {
    last_sample: Option<i64>,
    stale_count: u32,
    threshold: u32,
}

impl StallWatchdog {
    pub fn new(threshold: u32) -> Self {
        Self {
            last_sample: None,
            stale_count: 0,
            threshold,
        }
    }

    /// Feed one position sample (whole milliseconds). Returns `true` once
    /// `threshold` consecutive samples have reported the same position. A
    /// differing sample starts a fresh run.
    pub fn check(&mut self, sample_ms: i64) -> bool {
        match self.last_sample {
            Some(last) if sample_ms == last => self.stale_count += 1,
            _ => self.stale_count = 1,
        }
        self.last_sample = Some(sample_ms);
        self.stale_count >= self.threshold
    }

    /// Forget the current run. Called after every successful
    /// skip/previous/restart and after a triggered recovery.
    pub fn reset(&mut self) {
        self.last_sample = None;
        self.stale_count = 0;
    }

    pub fn stale_count(&self) -> u32 {
        self.stale_count
    }
}

impl Default for StallWatchdog {
    fn default() -> Self {
        Self::new(DEFAULT_STALL_THRESHOLD)
    }
}
