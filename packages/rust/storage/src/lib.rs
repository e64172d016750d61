//! libSQL record store for registered remote JavaScript files.
//!
//! The [`Storage`] struct wraps a local libSQL database holding the `js_files`
//! table. All operations are point operations; per-row atomicity is provided
//! by single-statement writes, and no cross-row transaction is required by
//! the registry logic layered on top.

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use uuid::Uuid;

use scriptwatch_shared::{FileId, FileRecord, Result, ScriptwatchError};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ScriptwatchError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| ScriptwatchError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| ScriptwatchError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    ScriptwatchError::Storage(format!(
                        "migration v{} failed: {e}",
                        migration.version
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // File record operations
    // -----------------------------------------------------------------------

    /// Insert a new file record.
    pub async fn insert_file(&self, record: &FileRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO js_files (id, url, host, content, priority, company_id, last_fetched, last_updated)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id.to_string(),
                    record.url.as_str(),
                    record.host.as_str(),
                    record.content.as_deref(),
                    i64::from(record.priority),
                    record.company_id.to_string(),
                    record.last_fetched.map(|t| t.to_rfc3339()),
                    record.last_updated.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| ScriptwatchError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a file record by ID.
    pub async fn get_file(&self, id: &FileId) -> Result<Option<FileRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, url, host, content, priority, company_id, last_fetched, last_updated
                 FROM js_files WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(|e| ScriptwatchError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_file_record(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(ScriptwatchError::Storage(e.to_string())),
        }
    }

    /// Set `content` and `last_fetched` together in a single statement.
    pub async fn update_content(
        &self,
        id: &FileId,
        content: &str,
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn
            .execute(
                "UPDATE js_files SET content = ?1, last_fetched = ?2 WHERE id = ?3",
                params![content, fetched_at.to_rfc3339(), id.to_string()],
            )
            .await
            .map_err(|e| ScriptwatchError::Storage(e.to_string()))?;
        Ok(())
    }

    /// List all file records owned by a tenant.
    pub async fn list_by_company(&self, company_id: &Uuid) -> Result<Vec<FileRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, url, host, content, priority, company_id, last_fetched, last_updated
                 FROM js_files WHERE company_id = ?1 ORDER BY id",
                params![company_id.to_string()],
            )
            .await
            .map_err(|e| ScriptwatchError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_file_record(&row)?);
        }
        Ok(results)
    }

    /// List every file record.
    pub async fn list_all(&self) -> Result<Vec<FileRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, url, host, content, priority, company_id, last_fetched, last_updated
                 FROM js_files ORDER BY id",
                params![],
            )
            .await
            .map_err(|e| ScriptwatchError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_file_record(&row)?);
        }
        Ok(results)
    }
}

/// Convert a database row to a [`FileRecord`].
fn row_to_file_record(row: &libsql::Row) -> Result<FileRecord> {
    let id: String = row
        .get(0)
        .map_err(|e| ScriptwatchError::Storage(e.to_string()))?;
    let company_id: String = row
        .get(5)
        .map_err(|e| ScriptwatchError::Storage(e.to_string()))?;

    Ok(FileRecord {
        id: id
            .parse::<FileId>()
            .map_err(|e| ScriptwatchError::Storage(format!("invalid id: {e}")))?,
        url: row
            .get::<String>(1)
            .map_err(|e| ScriptwatchError::Storage(e.to_string()))?,
        host: row
            .get::<String>(2)
            .map_err(|e| ScriptwatchError::Storage(e.to_string()))?,
        content: row.get::<String>(3).ok(),
        priority: {
            let p: i64 = row
                .get(4)
                .map_err(|e| ScriptwatchError::Storage(e.to_string()))?;
            p as u8
        },
        company_id: Uuid::parse_str(&company_id)
            .map_err(|e| ScriptwatchError::Storage(format!("invalid company_id: {e}")))?,
        last_fetched: row
            .get::<String>(6)
            .ok()
            .map(|s| parse_timestamp(&s))
            .transpose()?,
        last_updated: {
            let s: String = row
                .get(7)
                .map_err(|e| ScriptwatchError::Storage(e.to_string()))?;
            parse_timestamp(&s)?
        },
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ScriptwatchError::Storage(format!("invalid date: {e}")))
}
