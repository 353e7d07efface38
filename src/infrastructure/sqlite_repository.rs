// SQLite feed repository - one long-lived connection, single writer
use crate::application::feed_repository::FeedRepository;
use crate::domain::feed::{FeedEvent, InsertedFeedRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OpenFlags};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

const MEMORY_URL: &str = ":memory:";

#[derive(Clone)]
pub struct SqliteFeedRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteFeedRepository {
    /// Opens (or creates) the database at `url` and ensures the feed table
    /// exists. `:memory:` opens a private in-memory database.
    pub fn open(url: &str) -> Result<Self> {
        let conn = if url == MEMORY_URL {
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?
        } else {
            let path = Path::new(url);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
            )
            .with_context(|| format!("Failed to open SQLite database {}", url))?
        };

        Self::init_schema(&conn)?;
        info!(url, "Feed repository ready");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS CATDC_DATA_FEED (
                ID INTEGER PRIMARY KEY AUTOINCREMENT,
                PART_ID INTEGER NOT NULL,
                TYPE_ID INTEGER NOT NULL,
                SOURCE_ID INTEGER NOT NULL,
                FEED_ID INTEGER NOT NULL,
                READING REAL NOT NULL,
                TIMESTAMP TEXT NOT NULL,
                STATE TEXT NOT NULL
            );
            "#,
        )
        .context("Failed to initialise feed schema")?;
        Ok(())
    }

    /// Number of stored feed rows
    pub async fn count(&self) -> Result<i64> {
        self.with_connection(|conn| {
            conn.query_row("SELECT COUNT(*) FROM CATDC_DATA_FEED", [], |row| row.get(0))
                .context("Failed to count feed rows")
        })
        .await
    }

    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .context("SQLite task panicked")?
    }
}

#[async_trait]
impl FeedRepository for SqliteFeedRepository {
    async fn insert(&self, event: &FeedEvent) -> Result<InsertedFeedRecord> {
        let event = event.clone();
        self.with_connection(move |conn| {
            conn.query_row(
                "INSERT INTO CATDC_DATA_FEED
                    (PART_ID, TYPE_ID, SOURCE_ID, FEED_ID, READING, TIMESTAMP, STATE)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING ID, PART_ID, TYPE_ID, SOURCE_ID, FEED_ID, READING, TIMESTAMP, STATE",
                params![
                    event.part_id,
                    event.type_id,
                    event.source_id,
                    event.feed_id,
                    event.reading,
                    event.timestamp,
                    event.state,
                ],
                |row| {
                    Ok(InsertedFeedRecord {
                        id: row.get(0)?,
                        event: FeedEvent {
                            part_id: row.get(1)?,
                            type_id: row.get(2)?,
                            source_id: row.get(3)?,
                            feed_id: row.get(4)?,
                            reading: row.get(5)?,
                            timestamp: row.get(6)?,
                            state: row.get(7)?,
                        },
                    })
                },
            )
            .context("Failed to insert feed record")
        })
        .await
    }

    async fn truncate(&self) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM CATDC_DATA_FEED", [])
                .context("Failed to truncate feed table")?;
            Ok(())
        })
        .await
    }
}
