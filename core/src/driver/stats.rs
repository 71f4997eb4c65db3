//! Submission outcome tracking

use std::time::{Duration, Instant};

/// What happened to one batch of create calls
#[derive(Debug, Default, Clone)]
pub struct SubmissionStats {
    /// Create calls attempted
    pub attempted: usize,

    /// Create calls that returned successfully
    pub succeeded: usize,

    /// Create calls that failed
    pub failed: usize,

    /// Identity and reason for each failed create
    pub failures: Vec<(String, String)>,

    /// Batch start time
    pub started_at: Option<Instant>,

    /// Batch end time
    pub ended_at: Option<Instant>,
}

impl SubmissionStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the batch start time
    pub fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Record the batch end time
    pub fn stop(&mut self) {
        self.ended_at = Some(Instant::now());
    }

    /// Record a successful create
    pub fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    /// Record a failed create
    pub fn record_failure(&mut self, identity: impl Into<String>, reason: impl Into<String>) {
        self.attempted += 1;
        self.failed += 1;
        self.failures.push((identity.into(), reason.into()));
    }

    /// Fraction of attempts that succeeded (0.0 - 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.attempted as f64
        }
    }

    /// Time the batch took, or has taken so far
    pub fn elapsed(&self) -> Option<Duration> {
        self.started_at.map(|start| {
            self.ended_at
                .map(|end| end.duration_since(start))
                .unwrap_or_else(|| start.elapsed())
        })
    }

    /// Attempts per second over the batch
    pub fn creates_per_second(&self) -> f64 {
        self.elapsed()
            .map(|d| {
                let secs = d.as_secs_f64();
                if secs > 0.0 {
                    self.attempted as f64 / secs
                } else {
                    0.0
                }
            })
            .unwrap_or(0.0)
    }
}
