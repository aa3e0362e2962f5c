//! Storage backends for the broadcast queue.
//!
//! The queue protocol only needs a handful of primitives from its backing store:
//! inserting a pending message, reading the pending messages of a channel in creation
//! order, atomically updating the status of a single message, and reading the active
//! recipients of a channel. These are expressed as the [`QueueStore`] and
//! [`RecipientDirectory`] traits so the protocol can run against SQLite in production
//! and against an in-memory store in tests.

use std::{future::Future, pin::Pin};

use crate::{
    channel::Channel,
    error::Error,
    message::{MessageStatus, QueuedMessage},
    recipient::RecipientContact,
};

pub mod memory;
pub mod sqlite;

/// Future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, Error>> + 'a>>;

/// Durable table of outbound messages, one per channel.
///
/// Implementations must make [`QueueStore::update_status`] atomic for a single row;
/// callers never wrap store calls in multi-statement transactions.
pub trait QueueStore: Send + Sync + 'static {
    /// Inserts a new message in `Pending` status and returns the stored row.
    ///
    /// The store assigns the ID and the creation time.
    fn insert_pending<'a>(
        &'a self,
        channel: Channel,
        body: String,
        triggered_by: String,
    ) -> StoreFuture<'a, QueuedMessage>;

    /// Returns every `Pending` message of `channel`, oldest first.
    ///
    /// Messages with equal creation times are ordered by ID.
    fn select_pending<'a>(&'a self, channel: Channel) -> StoreFuture<'a, Vec<QueuedMessage>>;

    /// Sets the status of message `id` and returns the updated rows.
    ///
    /// No check is made on the previous status. An unknown ID updates nothing and
    /// yields an empty list. Moving to `Sent` records `sent_at` the first time only.
    fn update_status<'a>(
        &'a self,
        channel: Channel,
        id: i64,
        status: MessageStatus,
    ) -> StoreFuture<'a, Vec<QueuedMessage>>;

    /// Returns up to `limit` messages of `channel`, newest first, optionally only those
    /// in `status`.
    fn select_recent<'a>(
        &'a self,
        channel: Channel,
        status: Option<MessageStatus>,
        limit: u32,
    ) -> StoreFuture<'a, Vec<QueuedMessage>>;
}

/// Read-only view of the emergency contacts.
pub trait RecipientDirectory: Send + Sync + 'static {
    /// Returns the active recipients that have a contact address for `channel`.
    fn select_active_recipients<'a>(
        &'a self,
        channel: Channel,
    ) -> StoreFuture<'a, Vec<RecipientContact>>;
}
