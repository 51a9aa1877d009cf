use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use time::OffsetDateTime;

use common::content::ContentHash;
use common::crypto::Secret;
use common::index::{IndexError, NewTestRecord, TestIndex, TestRecord};
use common::naming::Handle;

use crate::database::Database;

fn record_from_row(row: &SqliteRow) -> Result<TestRecord, IndexError> {
    let secret = Secret::parse(row.get::<String, _>("secret").as_str())
        .map_err(|e| IndexError::Provider(anyhow::anyhow!("corrupt secret column: {}", e)))?;
    Ok(TestRecord {
        name_handle: row
            .get::<Option<String>, _>("name_handle")
            .map(Handle::from),
        content_hash: ContentHash::from(row.get::<String, _>("content_hash")),
        secret,
        is_owner: row.get::<i64, _>("is_owner") != 0,
        is_active: row.get::<i64, _>("is_active") != 0,
        created_at: row.get::<OffsetDateTime, _>("created_at"),
        updated_at: row.get::<OffsetDateTime, _>("updated_at"),
    })
}

fn map_unique_violation(e: sqlx::Error, handle: &Handle) -> IndexError {
    match &e {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            IndexError::DuplicateHandle(handle.clone())
        }
        _ => IndexError::Provider(e.into()),
    }
}

#[async_trait]
impl TestIndex for Database {
    async fn insert(&self, record: NewTestRecord) -> Result<(), IndexError> {
        let now = OffsetDateTime::now_utc();
        let handle = record.name_handle.clone();
        sqlx::query(
            r#"
            INSERT INTO tests (name_handle, content_hash, secret, is_owner, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(handle.as_ref().map(|h| h.to_string()))
        .bind(record.content_hash.to_string())
        .bind(record.secret.to_string())
        .bind(record.is_owner)
        .bind(now)
        .bind(now)
        .execute(&**self)
        .await
        .map_err(|e| match handle {
            Some(ref h) => map_unique_violation(e, h),
            None => IndexError::Provider(e.into()),
        })?;
        Ok(())
    }

    async fn find_all(&self, active_only: bool) -> Result<Vec<TestRecord>, IndexError> {
        let rows = sqlx::query(
            r#"
            SELECT name_handle, content_hash, secret, is_owner, is_active, created_at, updated_at
            FROM tests
            WHERE is_active = 1 OR ? = 0
            ORDER BY updated_at DESC
            "#,
        )
        .bind(active_only)
        .fetch_all(&**self)
        .await
        .map_err(|e| IndexError::Provider(e.into()))?;

        rows.iter().map(record_from_row).collect()
    }

    async fn find_by_handle(&self, handle: &Handle) -> Result<TestRecord, IndexError> {
        let row = sqlx::query(
            r#"
            SELECT name_handle, content_hash, secret, is_owner, is_active, created_at, updated_at
            FROM tests
            WHERE name_handle = ? AND is_active = 1
            "#,
        )
        .bind(handle.to_string())
        .fetch_optional(&**self)
        .await
        .map_err(|e| IndexError::Provider(e.into()))?;

        match row {
            Some(row) => record_from_row(&row),
            None => Err(IndexError::NotFound(handle.to_string())),
        }
    }

    async fn update_content_hash(
        &self,
        handle: &Handle,
        hash: &ContentHash,
    ) -> Result<(), IndexError> {
        let result = sqlx::query(
            r#"
            UPDATE tests
            SET content_hash = ?, updated_at = ?
            WHERE name_handle = ? AND is_active = 1
            "#,
        )
        .bind(hash.to_string())
        .bind(OffsetDateTime::now_utc())
        .bind(handle.to_string())
        .execute(&**self)
        .await
        .map_err(|e| IndexError::Provider(e.into()))?;

        if result.rows_affected() == 0 {
            return Err(IndexError::NotFound(handle.to_string()));
        }
        Ok(())
    }

    async fn mark_published(&self, hash: &ContentHash, handle: &Handle) -> Result<(), IndexError> {
        let result = sqlx::query(
            r#"
            UPDATE tests
            SET name_handle = ?, updated_at = ?
            WHERE content_hash = ? AND name_handle IS NULL AND is_active = 1
            "#,
        )
        .bind(handle.to_string())
        .bind(OffsetDateTime::now_utc())
        .bind(hash.to_string())
        .execute(&**self)
        .await
        .map_err(|e| map_unique_violation(e, handle))?;

        if result.rows_affected() == 0 {
            return Err(IndexError::NotFound(format!(
                "no unshared record holds hash {}",
                hash
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::index::RecordStatus;

    async fn in_memory() -> Database {
        let url = url::Url::parse("sqlite::memory:").unwrap();
        Database::connect(&url).await.unwrap()
    }

    fn stored(hash: &str) -> NewTestRecord {
        NewTestRecord::stored(ContentHash::from(hash), Secret::generate())
    }

    #[tokio::test]
    async fn test_insert_and_find_all() {
        let db = in_memory().await;
        db.insert(stored("QmOne")).await.unwrap();
        db.insert(stored("QmTwo")).await.unwrap();

        let all = db.find_all(true).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| r.status() == RecordStatus::Stored));
        assert!(all[0].updated_at >= all[1].updated_at);
    }

    #[tokio::test]
    async fn test_mark_published_and_find_by_handle() {
        let db = in_memory().await;
        db.insert(stored("QmOne")).await.unwrap();

        let handle = Handle::from("k51handle");
        db.mark_published(&ContentHash::from("QmOne"), &handle)
            .await
            .unwrap();

        let record = db.find_by_handle(&handle).await.unwrap();
        assert_eq!(record.status(), RecordStatus::Published);
        assert_eq!(record.content_hash, ContentHash::from("QmOne"));
    }

    #[tokio::test]
    async fn test_duplicate_handle_rejected() {
        let db = in_memory().await;
        let handle = Handle::from("k51handle");
        db.insert(NewTestRecord::imported(
            handle.clone(),
            ContentHash::from("QmOne"),
            Secret::generate(),
        ))
        .await
        .unwrap();

        let result = db
            .insert(NewTestRecord::imported(
                handle.clone(),
                ContentHash::from("QmTwo"),
                Secret::generate(),
            ))
            .await;
        assert!(matches!(result, Err(IndexError::DuplicateHandle(h)) if h == handle));

        db.insert(stored("QmThree")).await.unwrap();
        let result = db
            .mark_published(&ContentHash::from("QmThree"), &handle)
            .await;
        assert!(matches!(result, Err(IndexError::DuplicateHandle(_))));
    }

    #[tokio::test]
    async fn test_update_content_hash() {
        let db = in_memory().await;
        db.insert(stored("QmOne")).await.unwrap();
        let handle = Handle::from("k51handle");
        db.mark_published(&ContentHash::from("QmOne"), &handle)
            .await
            .unwrap();

        db.update_content_hash(&handle, &ContentHash::from("QmNext"))
            .await
            .unwrap();
        let record = db.find_by_handle(&handle).await.unwrap();
        assert_eq!(record.content_hash, ContentHash::from("QmNext"));

        let result = db
            .update_content_hash(&Handle::from("k51missing"), &ContentHash::from("QmNext"))
            .await;
        assert!(matches!(result, Err(IndexError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_deactivate_hides_record() {
        let db = in_memory().await;
        db.insert(stored("QmOne")).await.unwrap();
        let handle = Handle::from("k51handle");
        db.mark_published(&ContentHash::from("QmOne"), &handle)
            .await
            .unwrap();

        assert!(db.deactivate(&handle).await.unwrap());
        assert!(matches!(
            db.find_by_handle(&handle).await,
            Err(IndexError::NotFound(_))
        ));
        assert!(db.find_all(true).await.unwrap().is_empty());
        assert_eq!(db.find_all(false).await.unwrap().len(), 1);
        // already inactive
        assert!(!db.deactivate(&handle).await.unwrap());
    }
}
