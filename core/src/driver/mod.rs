//! Bounded-concurrency workload submission
//!
//! The driver fans create calls out over tokio tasks, with a semaphore
//! capping how many are in flight. Each call that succeeds stamps a
//! creation time into the scenario's `ProgressTracker` the moment it
//! returns; a call that fails is logged and left out of creation
//! bookkeeping, so the unit later shows up as never completed.
//!
//! `submit_all` returns once every submission has been attempted. It never
//! waits for workloads to be placed or run; that is the watchers' job.
//!
//! # Example
//!
//! ```ignore
//! use fezzik_core::driver::SubmissionDriverBuilder;
//!
//! let driver = SubmissionDriverBuilder::new()
//!     .client(client)
//!     .tracker(Arc::clone(&tracker))
//!     .concurrency(tasks.len())
//!     .build()?;
//!
//! let stats = driver.submit_all(tasks).await;
//! println!("created {} of {}", stats.succeeded, stats.attempted);
//! ```

mod builder;
mod executor;
mod stats;
mod throttle;

pub use builder::SubmissionDriverBuilder;
pub use executor::SubmissionDriver;
pub use stats::SubmissionStats;
pub use throttle::SubmissionThrottle;
