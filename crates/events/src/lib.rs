//! Event multicast mechanics for the purchase facade.
//!
//! This crate provides the **subscriber-list pattern**: ordered callback
//! sets with add/remove/clear, plus a dispatch hook that marshals event
//! delivery onto a caller-chosen execution context. The purchase manager
//! uses one [`SubscriberSet`] per lifecycle event; hosts with a
//! UI-owning thread pump a [`QueuedDispatcher`] from that thread so
//! subscribers never have to synchronize themselves.

pub mod dispatch;
pub mod subscribers;

pub use dispatch::{EventDispatcher, InlineDispatcher, QueuedDispatcher, Thunk};
pub use subscribers::{SubscriberId, SubscriberSet};
