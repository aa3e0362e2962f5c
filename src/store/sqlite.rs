//! SQLite-backed queue store.
//!
//! Each channel has its own queue table (see [`Channel::table`]); recipients live in the
//! shared `emergency_contacts` table. Every operation is a single statement, so the
//! per-row atomicity of SQLite is all the protocol relies on.

use chrono::Utc;
use sqlx::{
    sqlite::{
        SqliteAutoVacuum, SqliteConnectOptions, SqliteJournalMode, SqliteLockingMode,
        SqlitePoolOptions,
    },
    SqlitePool,
};
use tokio_stream::StreamExt;

use crate::{
    channel::Channel,
    config::Config,
    error::Error,
    message::{MessageStatus, QueuedMessage},
    recipient::RecipientContact,
};

use super::{QueueStore, RecipientDirectory, StoreFuture};

const MESSAGE_COLUMNS: &str = "id, body, status, triggered_by, created_at, sent_at";

#[derive(Clone)]
pub struct SqliteStore {
    db: SqlitePool,
}

impl SqliteStore {
    /// Opens (or creates) the database described by `config` and applies migrations.
    pub async fn connect_with(config: &Config) -> eyre::Result<Self> {
        let opts = if config.in_memory() {
            SqliteConnectOptions::new().in_memory(true)
        } else {
            SqliteConnectOptions::new()
                .filename(config.db_path())
                .create_if_missing(true)
        }
        .journal_mode(SqliteJournalMode::Wal)
        .locking_mode(SqliteLockingMode::Normal)
        .optimize_on_close(true, None)
        .auto_vacuum(SqliteAutoVacuum::Full);

        // Every connection to `:memory:` opens its own database, so keep exactly one alive.
        let pool_opts = if config.in_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections)
        };

        let pool = pool_opts.connect_with(opts).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!(path = config.db_path(), "Opened queue database");

        Ok(Self { db: pool })
    }

    pub fn db(&self) -> &SqlitePool {
        &self.db
    }
}

impl SqliteStore {
    async fn insert(
        &self,
        channel: Channel,
        body: String,
        triggered_by: String,
    ) -> Result<QueuedMessage, Error> {
        let sql = format!(
            "INSERT INTO {} (body, status, triggered_by, created_at) VALUES ($1, $2, $3, $4) RETURNING {MESSAGE_COLUMNS}",
            channel.table()
        );

        Ok(sqlx::query_as(&sql)
            .bind(body)
            .bind(MessageStatus::Pending)
            .bind(triggered_by)
            .bind(Utc::now())
            .fetch_one(&self.db)
            .await?)
    }

    async fn pending(&self, channel: Channel) -> Result<Vec<QueuedMessage>, Error> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM {} WHERE status = $1 ORDER BY created_at ASC, id ASC",
            channel.table()
        );

        Ok(sqlx::query_as(&sql)
            .bind(MessageStatus::Pending)
            .fetch_all(&self.db)
            .await?)
    }

    async fn set_status(
        &self,
        channel: Channel,
        id: i64,
        status: MessageStatus,
    ) -> Result<Vec<QueuedMessage>, Error> {
        let sql = format!(
            "
            UPDATE {}
            SET
                status = $1,
                sent_at = CASE WHEN $1 = 'sent' THEN COALESCE(sent_at, $2) ELSE sent_at END
            WHERE id = $3
            RETURNING {MESSAGE_COLUMNS}
            ",
            channel.table()
        );

        Ok(sqlx::query_as(&sql)
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .fetch_all(&self.db)
            .await?)
    }

    async fn recent(
        &self,
        channel: Channel,
        status: Option<MessageStatus>,
        limit: u32,
    ) -> Result<Vec<QueuedMessage>, Error> {
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM {} WHERE ($1 IS NULL OR status = $1) ORDER BY created_at DESC, id DESC LIMIT $2",
            channel.table()
        );

        Ok(sqlx::query_as(&sql)
            .bind(status)
            .bind(i64::from(limit))
            .fetch_all(&self.db)
            .await?)
    }

    async fn active_recipients(&self, channel: Channel) -> Result<Vec<RecipientContact>, Error> {
        let column = channel.contact_field().column();
        let sql = format!(
            "
            SELECT {column} AS contact, name FROM emergency_contacts
            WHERE is_active = 1 AND {column} IS NOT NULL AND TRIM({column}) <> ''
            ORDER BY id
            "
        );

        let mut stream = sqlx::query_as::<_, RecipientContact>(&sql).fetch(&self.db);

        let mut recipients = Vec::new();

        while let Some(res) = stream.next().await.transpose()? {
            recipients.push(res);
        }

        Ok(recipients)
    }
}

impl QueueStore for SqliteStore {
    fn insert_pending<'a>(
        &'a self,
        channel: Channel,
        body: String,
        triggered_by: String,
    ) -> StoreFuture<'a, QueuedMessage> {
        Box::pin(self.insert(channel, body, triggered_by))
    }

    fn select_pending<'a>(&'a self, channel: Channel) -> StoreFuture<'a, Vec<QueuedMessage>> {
        Box::pin(self.pending(channel))
    }

    fn update_status<'a>(
        &'a self,
        channel: Channel,
        id: i64,
        status: MessageStatus,
    ) -> StoreFuture<'a, Vec<QueuedMessage>> {
        Box::pin(self.set_status(channel, id, status))
    }

    fn select_recent<'a>(
        &'a self,
        channel: Channel,
        status: Option<MessageStatus>,
        limit: u32,
    ) -> StoreFuture<'a, Vec<QueuedMessage>> {
        Box::pin(self.recent(channel, status, limit))
    }
}

impl RecipientDirectory for SqliteStore {
    fn select_active_recipients<'a>(
        &'a self,
        channel: Channel,
    ) -> StoreFuture<'a, Vec<RecipientContact>> {
        Box::pin(self.active_recipients(channel))
    }
}
