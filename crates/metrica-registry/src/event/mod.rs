//! Notification channel shared by series and registry.

pub mod publisher;

pub use publisher::{Listener, Publisher, SubscriptionId};
