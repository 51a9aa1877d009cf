mod test_index;

use std::ops::Deref;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use common::naming::Handle;

#[derive(Clone, Debug)]
pub struct Database(SqlitePool);

impl Database {
    pub async fn connect(database_url: &url::Url) -> Result<Self, DatabaseSetupError> {
        if database_url.scheme() != "sqlite" {
            return Err(DatabaseSetupError::UnknownDbType(
                database_url.scheme().to_string(),
            ));
        }

        let options = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(DatabaseSetupError::Unavailable)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        // an in-memory database lives and dies with its one connection
        let max_connections = if database_url.as_str().contains(":memory:") {
            1
        } else {
            5
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(DatabaseSetupError::Unavailable)?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(DatabaseSetupError::MigrationFailed)?;

        Ok(Database(pool))
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self(pool)
    }

    /// Soft-delete a record: the row stays for audit, lookups stop seeing it
    pub async fn deactivate(&self, handle: &Handle) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tests
            SET is_active = 0, updated_at = ?
            WHERE name_handle = ? AND is_active = 1
            "#,
        )
        .bind(time::OffsetDateTime::now_utc())
        .bind(handle.to_string())
        .execute(&self.0)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

impl Deref for Database {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseSetupError {
    #[error("error occurred while attempting database migration: {0}")]
    MigrationFailed(sqlx::migrate::MigrateError),

    #[error("unable to perform initial connection and check of the database: {0}")]
    Unavailable(sqlx::Error),

    #[error("requested database type was not recognized: {0}")]
    UnknownDbType(String),
}
