mod bootstrap;
pub mod check;
pub mod resolve;
pub mod watch;

// Re-export command functions for convenience
pub use check::check;
pub use resolve::{resolve, ResolveParams};
pub use watch::watch;
