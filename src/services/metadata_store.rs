//! src/services/metadata_store.rs
//!
//! SQLite access for the `photo_metadata` table. One row is inserted per
//! upload; rows are never updated or deleted.

use crate::models::photo::{NewPhotoMetadata, PhotoMetadata};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Clone, Debug)]
pub struct MetadataStore {
    /// Shared SQLite connection pool.
    pub db: Arc<SqlitePool>,
}

impl MetadataStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Insert a row for a freshly uploaded photo and return it as stored.
    pub async fn insert(&self, record: NewPhotoMetadata) -> Result<PhotoMetadata, sqlx::Error> {
        let image = record.image;
        sqlx::query_as::<_, PhotoMetadata>(
            r#"
            INSERT INTO photo_metadata (
                key, author, format, content_type, width, height, color,
                make, model, iso, date_time, size_bytes, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id, key, author, format, content_type, width, height, color,
                      make, model, iso, date_time, size_bytes, created_at
            "#,
        )
        .bind(&record.key)
        .bind(&record.author)
        .bind(&image.format)
        .bind(&image.content_type)
        .bind(i64::from(image.width))
        .bind(i64::from(image.height))
        .bind(&image.color)
        .bind(&image.make)
        .bind(&image.model)
        .bind(image.iso.map(i64::from))
        .bind(&image.date_time)
        .bind(i64::try_from(image.size_bytes).unwrap_or(i64::MAX))
        .bind(Utc::now())
        .fetch_one(&*self.db)
        .await
    }

    /// Every stored key, oldest upload first. Duplicated keys appear once
    /// per row.
    pub async fn list_keys(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>("SELECT key FROM photo_metadata ORDER BY id ASC")
            .fetch_all(&*self.db)
            .await
    }

    /// Readiness check: the database answers and `photo_metadata` exists.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'photo_metadata'",
        )
        .fetch_one(&*self.db)
        .await?;
        if tables != 1 {
            return Err(sqlx::Error::Protocol(
                "table `photo_metadata` is missing; run with --migrate".into(),
            ));
        }
        Ok(())
    }
}

/// Apply the embedded schema, one statement at a time. Every statement is
/// `IF NOT EXISTS`, so reruns are harmless.
pub async fn run_migrations(db: &SqlitePool) -> Result<usize> {
    let statements = SCHEMA
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::info!("Running {} migration statements...", statements.len());

    for stmt in &statements {
        tracing::debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(db).await?;
    }

    Ok(statements.len())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::image_metadata::ImageMetadata;
    use sqlx::sqlite::SqlitePoolOptions;

    /// In-memory database with the schema applied. A single connection keeps
    /// every query on the same in-memory database.
    pub(crate) async fn memory_store() -> MetadataStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        MetadataStore::new(Arc::new(pool))
    }

    fn record(key: &str, author: &str) -> NewPhotoMetadata {
        NewPhotoMetadata {
            key: key.into(),
            author: author.into(),
            image: ImageMetadata {
                format: "jpeg".into(),
                content_type: "image/jpeg".into(),
                width: 640,
                height: 480,
                color: "rgb8".into(),
                make: Some("Canon".into()),
                model: None,
                iso: Some(200),
                date_time: Some("2023:01:02 03:04:05".into()),
                size_bytes: 1234,
            },
        }
    }

    #[tokio::test]
    async fn insert_returns_stored_row() {
        let store = memory_store().await;
        let row = store.insert(record("beach.jpg", "ada")).await.unwrap();

        assert_eq!(row.key, "beach.jpg");
        assert_eq!(row.author, "ada");
        assert_eq!((row.width, row.height), (640, 480));
        assert_eq!(row.make.as_deref(), Some("Canon"));
        assert_eq!(row.model, None);
        assert_eq!(row.iso, Some(200));
        assert_eq!(row.size_bytes, 1234);
    }

    #[tokio::test]
    async fn list_keys_in_insertion_order() {
        let store = memory_store().await;
        for key in ["b.png", "a.png", "c.png"] {
            store.insert(record(key, "ada")).await.unwrap();
        }

        assert_eq!(store.list_keys().await.unwrap(), vec!["b.png", "a.png", "c.png"]);
    }

    #[tokio::test]
    async fn duplicate_keys_get_separate_rows() {
        let store = memory_store().await;
        let first = store.insert(record("same.png", "ada")).await.unwrap();
        let second = store.insert(record("same.png", "grace")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.list_keys().await.unwrap(), vec!["same.png", "same.png"]);
    }

    #[tokio::test]
    async fn ping_fails_before_migrations() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = MetadataStore::new(Arc::new(pool));

        let err = store.ping().await.unwrap_err();
        assert!(err.to_string().contains("--migrate"), "{err}");

        run_migrations(&store.db).await.unwrap();
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn migrations_are_rerunnable() {
        let store = memory_store().await;
        assert_eq!(run_migrations(&store.db).await.unwrap(), 2);
        store.ping().await.unwrap();
    }
}
