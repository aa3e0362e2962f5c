//! Queued alert messages and their delivery status.
//!
//! # Message Lifecycle
//!
//! 1. Messages are created in `Pending` status by an operator submission
//! 2. After the device has transmitted a message it acknowledges it, moving it to `Sent`
//! 3. `Failed` is reserved for messages that are given up on
//!
//! Only `Pending` messages are offered to a polling device. A message that has left
//! `Pending` is never offered again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Delivery status of a queued message.
///
/// `Pending` -> `Sent`   (acknowledged by the device)
/// `Pending` -> `Failed` (given up on)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Waiting to be picked up by the device
    Pending,
    /// Transmitted and acknowledged by the device
    Sent,
    /// Will not be delivered
    Failed,
}

/// A row of a channel's queue table.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    /// Store-assigned identifier, unique within the channel
    pub id: i64,
    /// Alert text, immutable after creation
    pub body: String,
    pub status: MessageStatus,
    /// Operator that submitted the message
    pub triggered_by: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set the first time the message is acknowledged
    pub sent_at: Option<DateTime<Utc>>,
}

impl QueuedMessage {
    pub fn is_pending(&self) -> bool {
        self.status == MessageStatus::Pending
    }
}

/// The part of a message a polling device receives.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PendingMessage {
    pub id: i64,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<QueuedMessage> for PendingMessage {
    fn from(message: QueuedMessage) -> Self {
        Self {
            id: message.id,
            body: message.body,
            created_at: message.created_at,
        }
    }
}
