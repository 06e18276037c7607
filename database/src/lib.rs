
use chrono::Utc;
use feedscribe_core::{CoreError, DatabaseError, PostRecord, StoreConfig};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

/// Document store the pipeline reads known ids from and writes records to.
#[allow(async_fn_in_trait)]
pub trait DocumentStore {
    async fn find_existing_ids(&self) -> Result<HashSet<String>, CoreError>;

    /// Fails with `DatabaseError::ConstraintViolation` when the post id is
    /// already stored.
    async fn insert_one(&self, record: &PostRecord) -> Result<(), CoreError>;
}

/// A store session over one SQLite collection. Open it with [`connect`],
/// pass it by reference, and [`close`] it when the run is over.
///
/// [`connect`]: Database::connect
/// [`close`]: Database::close
pub struct Database {
    config: StoreConfig,
    pool: Option<SqlitePool>,
}

impl Database {
    pub fn new(config: StoreConfig) -> Self {
        Self { config, pool: None }
    }

    pub async fn connect(&mut self) -> Result<(), CoreError> {
        let options = SqliteConnectOptions::from_str(&self.config.database_url)
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: format!("invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        if let Some(parent) = database_file(&self.config.database_url)
            .as_deref()
            .and_then(Path::parent)
        {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(self.config.max_connections.max(1))
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed {
                reason: e.to_string(),
            })?;

        info!(
            "Connected to store {} (collection '{}')",
            self.config.database_url, self.config.collection
        );
        self.pool = Some(pool);
        Ok(())
    }

    /// Creates the collection table if it does not exist yet.
    pub async fn run_migrations(&self) -> Result<(), CoreError> {
        let collection = self.collection();
        let statement = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                post_id TEXT PRIMARY KEY NOT NULL,
                document TEXT NOT NULL,
                inserted_at TEXT NOT NULL
            )",
            collection
        );

        sqlx::query(&statement)
            .execute(self.pool()?)
            .await
            .map_err(|e| {
                debug!("Migration error: {}", e);
                DatabaseError::MigrationFailed {
                    migration: format!("create collection {}", collection),
                }
            })?;
        Ok(())
    }

    pub async fn close(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.close().await;
            info!("Closed store {}", self.config.database_url);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.pool.as_ref().is_some_and(|pool| !pool.is_closed())
    }

    /// Every stored record, oldest first.
    pub async fn get_documents(&self) -> Result<Vec<PostRecord>, CoreError> {
        let rows: Vec<(String, String)> = sqlx::query_as(&format!(
            "SELECT post_id, document FROM {} ORDER BY rowid",
            self.collection()
        ))
        .fetch_all(self.pool()?)
        .await
        .map_err(DatabaseError::from)?;

        rows.into_iter()
            .map(|(post_id, document)| {
                serde_json::from_str(&document)
                    .map_err(|_| DatabaseError::CorruptDocument { post_id }.into())
            })
            .collect()
    }

    pub async fn count(&self) -> Result<u64, CoreError> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.collection()))
            .fetch_one(self.pool()?)
            .await
            .map_err(DatabaseError::from)?;
        Ok(count.max(0) as u64)
    }

    fn collection(&self) -> &str {
        &self.config.collection
    }

    fn pool(&self) -> Result<&SqlitePool, CoreError> {
        self.pool
            .as_ref()
            .filter(|pool| !pool.is_closed())
            .ok_or_else(|| {
                DatabaseError::ConnectionFailed {
                    reason: "store session is not open".to_string(),
                }
                .into()
            })
    }
}

impl DocumentStore for Database {
    async fn find_existing_ids(&self) -> Result<HashSet<String>, CoreError> {
        let ids: Vec<String> =
            sqlx::query_scalar(&format!("SELECT post_id FROM {}", self.collection()))
                .fetch_all(self.pool()?)
                .await
                .map_err(DatabaseError::from)?;
        Ok(ids.into_iter().collect())
    }

    async fn insert_one(&self, record: &PostRecord) -> Result<(), CoreError> {
        let document = serde_json::to_string(record)?;
        let statement = format!(
            "INSERT INTO {} (post_id, document, inserted_at) VALUES (?, ?, ?)",
            self.collection()
        );

        sqlx::query(&statement)
            .bind(record.post_id.as_str())
            .bind(document)
            .bind(Utc::now().to_rfc3339())
            .execute(self.pool()?)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_error) if db_error.is_unique_violation() => {
                    DatabaseError::ConstraintViolation {
                        constraint: format!("{}.post_id", self.collection()),
                    }
                }
                other => DatabaseError::Sql(other),
            })?;

        debug!("Stored post {}", record.post_id);
        Ok(())
    }
}

/// On-disk path of a `sqlite:` URL, or `None` for in-memory databases.
fn database_file(database_url: &str) -> Option<PathBuf> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}
