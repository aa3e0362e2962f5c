use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    channel::Channel,
    config::Config,
    error::Error,
    message::{MessageStatus, PendingMessage, QueuedMessage},
    store::{sqlite::SqliteStore, QueueStore, RecipientDirectory},
};

/// Upper bound on the number of rows a history request may ask for.
pub const MAX_HISTORY_LIMIT: u32 = 500;

/// What a polling device receives for one channel.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PollResponse {
    /// Pending messages, oldest first
    pub messages: Vec<PendingMessage>,
    /// Contact addresses of the active recipients
    pub recipients: Vec<String>,
}

/// The broadcast queue protocol, shared by every channel.
///
/// Holds no state of its own besides the store handles; all consistency comes from the
/// store's single-row atomicity.
pub struct Service {
    queue: Arc<dyn QueueStore>,
    recipients: Arc<dyn RecipientDirectory>,
    config: Config,
}

impl Service {
    pub fn new(
        queue: Arc<dyn QueueStore>,
        recipients: Arc<dyn RecipientDirectory>,
        config: Config,
    ) -> Self {
        Self {
            queue,
            recipients,
            config,
        }
    }

    /// Opens the SQLite store described by `config` and serves both the queue and the
    /// recipient directory from it.
    pub async fn connect_with(config: Config) -> eyre::Result<Self> {
        let store = Arc::new(SqliteStore::connect_with(&config).await?);

        Ok(Self::new(store.clone(), store, config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Queues an operator message for `channel` in `pending` status.
    ///
    /// The body is trimmed; a blank body is rejected before the store is touched.
    /// Identical bodies are not deduplicated.
    #[tracing::instrument(skip(self, body, triggered_by))]
    pub async fn submit(
        &self,
        channel: Channel,
        body: impl AsRef<str>,
        triggered_by: impl Into<String>,
    ) -> Result<QueuedMessage, Error> {
        let body = body.as_ref().trim();
        if body.is_empty() {
            return Err(Error::invalid_parameter("message body must not be empty"));
        }

        let message = self
            .queue
            .insert_pending(channel, body.to_owned(), triggered_by.into())
            .await
            .inspect_err(|e| error!(error = %e, "Failed to queue message"))?;

        info!(id = message.id, "Queued message");

        Ok(message)
    }

    /// Returns all pending messages of `channel` and its active recipients.
    ///
    /// Nothing is leased: a message stays in every poll result until it is acknowledged.
    #[tracing::instrument(skip(self))]
    pub async fn poll(&self, channel: Channel) -> Result<PollResponse, Error> {
        debug!("Device polling for pending messages");

        let (messages, recipients) = tokio::try_join!(
            self.queue.select_pending(channel),
            self.recipients.select_active_recipients(channel),
        )
        .inspect_err(|e| error!(error = %e, "Failed to read pending messages"))?;

        info!(
            messages = messages.len(),
            recipients = recipients.len(),
            "Found pending messages"
        );

        Ok(PollResponse {
            messages: messages.into_iter().map(PendingMessage::from).collect(),
            recipients: recipients.into_iter().map(|r| r.contact).collect(),
        })
    }

    /// Marks message `id` of `channel` as sent.
    ///
    /// Acknowledging an already sent message is accepted and leaves it sent. An unknown
    /// ID is not an error; the returned list is simply empty.
    #[tracing::instrument(skip(self))]
    pub async fn acknowledge(&self, channel: Channel, id: i64) -> Result<Vec<QueuedMessage>, Error> {
        let updated = self
            .queue
            .update_status(channel, id, MessageStatus::Sent)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to update message status"))?;

        if updated.is_empty() {
            debug!("Acknowledged message does not exist");
        } else {
            info!("Message marked as sent");
        }

        Ok(updated)
    }

    /// Recent messages of `channel`, newest first.
    ///
    /// `limit` defaults to the configured history limit and is capped at
    /// [`MAX_HISTORY_LIMIT`].
    #[tracing::instrument(skip(self))]
    pub async fn history(
        &self,
        channel: Channel,
        status: Option<MessageStatus>,
        limit: Option<u32>,
    ) -> Result<Vec<QueuedMessage>, Error> {
        let limit = limit
            .unwrap_or(self.config.history_limit)
            .min(MAX_HISTORY_LIMIT);

        self.queue.select_recent(channel, status, limit).await
    }
}
