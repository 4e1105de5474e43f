//! End-to-end integration tests
//!
//! - Poll, re-login and notify against one mock booking site
//! - Scheduler driving the real poller until slots are found

pub mod pipeline_test;
