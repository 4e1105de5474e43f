//! Poll scheduling
//!
//! Drives the poller at a base interval with optional random jitter, one
//! cycle at a time, and stops on shutdown or when slots are found.
//!
//! # Modules
//!
//! - [`schedule`] - Jittered delay computation
//! - [`runner`] - The polling loop and the [`CycleRunner`] seam
//! - [`error`] - Scheduler construction errors
//!
//! # Example
//!
//! ```ignore
//! use slotwatch::scheduler::{JitterSchedule, Scheduler};
//! use std::sync::Arc;
//! use tokio::sync::watch;
//!
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! let scheduler = Scheduler::new(Arc::new(poller), JitterSchedule::from_secs(60, 10)?)
//!     .with_stop_on_found(true);
//!
//! let summary = scheduler.run(shutdown_rx).await;
//! println!("{} cycles", summary.stats.cycles);
//! ```

pub mod error;
pub mod runner;
pub mod schedule;

pub use error::{SchedulerError, SchedulerResult};
pub use runner::{CycleRunner, RunSummary, Scheduler, StopReason};
pub use schedule::JitterSchedule;
