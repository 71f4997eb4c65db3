//! Descriptive statistics over observed durations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Count, extremes, mean and sample standard deviation of a set of
/// durations, all in seconds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DurationStats {
    /// Number of values
    pub count: usize,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Sample standard deviation (n-1 divisor)
    pub std_dev: f64,
}

impl DurationStats {
    /// Compute statistics over a collection of durations
    ///
    /// An empty input yields all-zero stats.
    pub fn from_durations<'a, I>(durations: I) -> Self
    where
        I: IntoIterator<Item = &'a Duration>,
    {
        Self::from_seconds(durations.into_iter().map(Duration::as_secs_f64))
    }

    /// Compute statistics over values already expressed in seconds
    pub fn from_seconds<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        // Sorted so the float accumulation does not depend on map iteration order.
        let mut sorted: Vec<f64> = values.into_iter().collect();
        sorted.sort_by(f64::total_cmp);

        let mut stats = StreamingStats::new();
        for value in sorted {
            stats.update(value);
        }
        stats.finish()
    }
}

impl fmt::Display for DurationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Count: {}, Min: {:.4}, Max: {:.4}, Mean: {:.4}, StdDev: {:.4}",
            self.count, self.min, self.max, self.mean, self.std_dev
        )
    }
}

/// Welford accumulator
#[derive(Debug, Clone, Default)]
pub struct StreamingStats {
    count: usize,
    min: f64,
    max: f64,
    mean: f64,
    m2: f64,
}

impl StreamingStats {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one value
    pub fn update(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }

        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Number of values seen
    pub fn count(&self) -> usize {
        self.count
    }

    /// Running mean, zero when empty
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation, zero for fewer than two values
    pub fn sample_std_dev(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2.max(0.0) / (self.count - 1) as f64).sqrt()
    }

    /// Freeze into a `DurationStats`
    pub fn finish(&self) -> DurationStats {
        if self.count == 0 {
            return DurationStats::default();
        }

        DurationStats {
            count: self.count,
            min: self.min,
            max: self.max,
            // Rounding in the incremental mean must not escape [min, max].
            mean: self.mean.clamp(self.min, self.max),
            std_dev: self.sample_std_dev(),
        }
    }
}
