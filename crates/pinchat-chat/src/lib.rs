//! Chat session coordination on top of the `pinchat-db` stores.
//!
//! - [`session`]: caller-owned per-session state (scope, cursor, pending
//!   reply/edit, notification counters)
//! - [`policy`]: pure display and authorization rules over fetched pages
//! - [`coordinator`]: the per-interaction operations

pub mod coordinator;
pub mod policy;
pub mod session;

pub use coordinator::{Coordinator, Draft, Settings};
pub use session::{ChatSession, NotificationTracker};
