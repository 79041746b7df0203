//! Recently-played repository
//!
//! Playback history, one row per channel (latest play wins). Pruned by the
//! maintenance task to a bounded number of entries.

use sqlx::SqlitePool;

use crate::db::models::RecentlyPlayedRow;

/// Record a play (upserts the channel's entry)
pub async fn record(
    pool: &SqlitePool,
    channel_id: &str,
    stream_url: &str,
    played_at: i64,
    duration_secs: Option<i64>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO recently_played (channel_id, stream_url, played_at, duration_secs)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (channel_id) DO UPDATE SET
            stream_url = excluded.stream_url,
            played_at = excluded.played_at,
            duration_secs = excluded.duration_secs
        "#,
    )
    .bind(channel_id)
    .bind(stream_url)
    .bind(played_at)
    .bind(duration_secs)
    .execute(pool)
    .await?;

    Ok(())
}

/// Most recent plays first
pub async fn get_recent(
    pool: &SqlitePool,
    limit: i64,
) -> Result<Vec<RecentlyPlayedRow>, sqlx::Error> {
    sqlx::query_as::<_, RecentlyPlayedRow>(
        r#"
        SELECT channel_id, stream_url, played_at, duration_secs
        FROM recently_played
        ORDER BY played_at DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Keep only the most recent N entries. Returns the number deleted.
pub async fn prune(pool: &SqlitePool, keep_count: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM recently_played
        WHERE channel_id NOT IN (
            SELECT channel_id FROM recently_played
            ORDER BY played_at DESC
            LIMIT ?
        )
        "#,
    )
    .bind(keep_count)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Count history entries
pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recently_played")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

/// Delete all history
pub async fn clear(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM recently_played").execute(pool).await?;

    Ok(result.rows_affected())
}
