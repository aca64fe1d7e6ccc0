//! Lifting of expired temporary moderation actions.
//!
//! The [`scheduler::RevocationScheduler`] periodically loads expired
//! temporary actions from an [`history::ActionHistory`], lets
//! [`decision::decide`] arbitrate them against later actions, and lifts the
//! approved ones through a [`platform::Platform`].

pub mod decision;
pub mod discord;
pub mod history;
pub mod platform;
pub mod registry;
pub mod scheduler;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use decision::{ApprovedRevocation, RevocationGroupKey, Verdict, decide};
pub use discord::SerenityPlatform;
pub use history::ActionHistory;
pub use platform::{GuildRef, Platform, PlatformError, UserRef};
pub use registry::RevocationRegistry;
pub use scheduler::{RevocationOutcome, RevocationScheduler, SchedulerHandle};
pub use strategy::{FailureClass, REVOCATION_REASON, RevocableAction};
