//! Cache metadata repository: singleton row under the 'cache-info' key.
//! The envelope is the sole gate for cache validity.

use sqlx::SqlitePool;

use crate::db::models::CacheMetadataRow;
use crate::models::CacheMetadata;

const METADATA_KEY: &str = "cache-info";

/// Read the cache envelope, if any
pub async fn get(pool: &SqlitePool) -> Result<Option<CacheMetadata>, sqlx::Error> {
    let row = sqlx::query_as::<_, CacheMetadataRow>(
        r#"
        SELECT version, last_updated, data_source, ttl_ms
        FROM cache_metadata
        WHERE key = ?
        "#,
    )
    .bind(METADATA_KEY)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Into::into))
}

/// Write the cache envelope (one per successful fetch)
pub async fn save(pool: &SqlitePool, metadata: &CacheMetadata) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO cache_metadata (key, version, last_updated, data_source, ttl_ms)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (key) DO UPDATE SET
            version = excluded.version,
            last_updated = excluded.last_updated,
            data_source = excluded.data_source,
            ttl_ms = excluded.ttl_ms
        "#,
    )
    .bind(METADATA_KEY)
    .bind(metadata.version as i64)
    .bind(metadata.last_updated)
    .bind(&metadata.data_source)
    .bind(metadata.ttl)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete the cache envelope
pub async fn clear(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cache_metadata").execute(pool).await?;

    Ok(result.rows_affected())
}
