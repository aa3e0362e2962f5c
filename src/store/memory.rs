//! In-memory implementation of the queue store and recipient directory.
//!
//! Rows live in concurrent hash maps; single-row updates go through the map's atomic
//! update so concurrent acknowledgments of the same message behave like the SQLite
//! store. Primarily used for testing and local development.

use std::{
    future::ready,
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Mutex,
    },
};

use chrono::Utc;

use crate::{
    channel::Channel,
    error::Error,
    message::{MessageStatus, QueuedMessage},
    recipient::{Recipient, RecipientContact},
};

use super::{QueueStore, RecipientDirectory, StoreFuture};

#[derive(Default)]
struct Tables {
    messages: papaya::HashMap<(Channel, i64), QueuedMessage>,
    sms_sequence: AtomicI64,
    email_sequence: AtomicI64,

    recipients: papaya::HashMap<i64, Recipient>,
    recipient_sequence: AtomicI64,

    fault: Mutex<Option<String>>,
}

#[derive(Clone, Default)]
/// Thread-safe in-memory store.
///
/// Clones share the same tables.
pub struct MemoryStore {
    tables: Arc<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent store call fail with `message` until [`MemoryStore::recover`].
    pub fn fail_with(&self, message: impl Into<String>) {
        if let Ok(mut fault) = self.tables.fault.lock() {
            *fault = Some(message.into());
        }
    }

    pub fn recover(&self) {
        if let Ok(mut fault) = self.tables.fault.lock() {
            *fault = None;
        }
    }

    /// Adds an active recipient and returns its ID.
    pub fn add_recipient(
        &self,
        name: impl Into<String>,
        phone: Option<&str>,
        email: Option<&str>,
    ) -> i64 {
        let id = self.tables.recipient_sequence.fetch_add(1, Ordering::SeqCst) + 1;

        self.tables.recipients.pin().insert(
            id,
            Recipient {
                id,
                name: name.into(),
                phone: phone.map(str::to_owned),
                email: email.map(str::to_owned),
                is_active: true,
            },
        );

        id
    }

    /// Activates or deactivates a recipient. Returns false if the recipient does not exist.
    pub fn set_recipient_active(&self, id: i64, is_active: bool) -> bool {
        let recipients = self.tables.recipients.pin();

        recipients
            .update(id, |r| Recipient {
                is_active,
                ..r.clone()
            })
            .is_some()
    }

    fn check(&self) -> Result<(), Error> {
        match self.tables.fault.lock() {
            Ok(fault) => match fault.as_ref() {
                Some(message) => Err(Error::unavailable(message.clone())),
                None => Ok(()),
            },
            Err(_) => Err(Error::unavailable("memory store lock poisoned")),
        }
    }

    fn sequence(&self, channel: Channel) -> &AtomicI64 {
        match channel {
            Channel::Sms => &self.tables.sms_sequence,
            Channel::Email => &self.tables.email_sequence,
        }
    }

    fn insert(
        &self,
        channel: Channel,
        body: String,
        triggered_by: String,
    ) -> Result<QueuedMessage, Error> {
        self.check()?;

        let id = self.sequence(channel).fetch_add(1, Ordering::SeqCst) + 1;

        let message = QueuedMessage {
            id,
            body,
            status: MessageStatus::Pending,
            triggered_by: Some(triggered_by),
            created_at: Utc::now(),
            sent_at: None,
        };

        self.tables
            .messages
            .pin()
            .insert((channel, id), message.clone());

        Ok(message)
    }

    fn collect(
        &self,
        channel: Channel,
        filter: impl Fn(&QueuedMessage) -> bool,
    ) -> Vec<QueuedMessage> {
        self.tables
            .messages
            .pin()
            .iter()
            .filter(|&(&(c, _), m)| c == channel && filter(m))
            .map(|(_, m)| m.clone())
            .collect()
    }

    fn pending(&self, channel: Channel) -> Result<Vec<QueuedMessage>, Error> {
        self.check()?;

        let mut messages = self.collect(channel, QueuedMessage::is_pending);
        messages.sort_by_key(|m| (m.created_at, m.id));

        Ok(messages)
    }

    fn set_status(
        &self,
        channel: Channel,
        id: i64,
        status: MessageStatus,
    ) -> Result<Vec<QueuedMessage>, Error> {
        self.check()?;

        let now = Utc::now();
        let messages = self.tables.messages.pin();

        let updated = messages
            .update((channel, id), |m| {
                let mut m = m.clone();
                m.status = status;
                if status == MessageStatus::Sent && m.sent_at.is_none() {
                    m.sent_at = Some(now);
                }
                m
            })
            .cloned();

        Ok(updated.into_iter().collect())
    }

    fn recent(
        &self,
        channel: Channel,
        status: Option<MessageStatus>,
        limit: u32,
    ) -> Result<Vec<QueuedMessage>, Error> {
        self.check()?;

        let mut messages = self.collect(channel, |m| status.map_or(true, |s| m.status == s));
        messages.sort_by_key(|m| std::cmp::Reverse((m.created_at, m.id)));
        messages.truncate(limit as usize);

        Ok(messages)
    }

    fn active_recipients(&self, channel: Channel) -> Result<Vec<RecipientContact>, Error> {
        self.check()?;

        let mut active: Vec<_> = self
            .tables
            .recipients
            .pin()
            .iter()
            .filter(|(_, r)| r.is_active)
            .filter_map(|(id, r)| {
                r.contact(channel).map(|contact| {
                    (
                        *id,
                        RecipientContact {
                            contact: contact.to_owned(),
                            name: r.name.clone(),
                        },
                    )
                })
            })
            .collect();
        active.sort_by_key(|(id, _)| *id);

        Ok(active.into_iter().map(|(_, r)| r).collect())
    }
}

impl QueueStore for MemoryStore {
    fn insert_pending<'a>(
        &'a self,
        channel: Channel,
        body: String,
        triggered_by: String,
    ) -> StoreFuture<'a, QueuedMessage> {
        Box::pin(ready(self.insert(channel, body, triggered_by)))
    }

    fn select_pending<'a>(&'a self, channel: Channel) -> StoreFuture<'a, Vec<QueuedMessage>> {
        Box::pin(ready(self.pending(channel)))
    }

    fn update_status<'a>(
        &'a self,
        channel: Channel,
        id: i64,
        status: MessageStatus,
    ) -> StoreFuture<'a, Vec<QueuedMessage>> {
        Box::pin(ready(self.set_status(channel, id, status)))
    }

    fn select_recent<'a>(
        &'a self,
        channel: Channel,
        status: Option<MessageStatus>,
        limit: u32,
    ) -> StoreFuture<'a, Vec<QueuedMessage>> {
        Box::pin(ready(self.recent(channel, status, limit)))
    }
}

impl RecipientDirectory for MemoryStore {
    fn select_active_recipients<'a>(
        &'a self,
        channel: Channel,
    ) -> StoreFuture<'a, Vec<RecipientContact>> {
        Box::pin(ready(self.active_recipients(channel)))
    }
}
