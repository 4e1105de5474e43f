//! slotwatch - session-aware appointment slot watcher
//!
//! Polls a booking site's availability endpoint on a jittered schedule,
//! keeps the authenticated session alive by logging in again when it is
//! rejected, normalizes the several response shapes the endpoint produces,
//! and notifies Slack or a webhook when slots open up.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration from environment variables or TOML
//! - [`session`] - The single live credential set
//! - [`auth`] - Automated login producing fresh credentials
//! - [`poller`] - One availability cycle, including the re-login branch
//! - [`parser`] - Response normalization into a canonical slot list
//! - [`scheduler`] - Jittered polling loop with shutdown
//! - [`notifications`] - Slack and webhook delivery
//! - [`resolver`] - Exam and location lookup by name
//! - [`models`] - Core data structures and types
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use slotwatch::config::Config;
//! use slotwatch::notifications::NotificationService;
//! use slotwatch::poller::{HttpAvailabilityClient, Poller};
//! use slotwatch::session::SessionStore;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     config.validate()?;
//!
//!     let client = HttpAvailabilityClient::new(&config.api.url, config.request_timeout())?;
//!     let session = Arc::new(SessionStore::new(config.credentials()));
//!     let poller = Poller::new(
//!         Arc::new(client),
//!         session,
//!         config.query_template()?,
//!         Arc::new(NotificationService::new()),
//!     );
//!
//!     let report = poller.check().await;
//!     println!("{}", report.outcome);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod notifications;
pub mod parser;
pub mod poller;
pub mod resolver;
pub mod scheduler;
pub mod session;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::auth::{Authenticator, EasydoctAuthenticator, LoginCredentials};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, SlotwatchErrorTrait};
    pub use crate::models::{
        AvailabilityResult, CredentialSet, CycleOutcome, CycleReport, CycleStats, SlotDescriptor,
    };
    pub use crate::notifications::{Notifier, NotificationService};
    pub use crate::poller::{AvailabilityClient, HttpAvailabilityClient, Poller};
    pub use crate::scheduler::{CycleRunner, JitterSchedule, Scheduler};
    pub use crate::session::SessionStore;
}

// Direct re-exports for convenience
pub use models::{AvailabilityResult, CredentialSet, CycleOutcome, SlotDescriptor};
