//! Favorites repository
//!
//! User-curated channel list, one row per channel. Never invalidated by the
//! cache TTL/version gate; only an explicit clear wipes it.

use sqlx::SqlitePool;

use crate::db::models::FavoriteRow;

/// Add a favorite (re-adding refreshes the timestamp)
pub async fn add(pool: &SqlitePool, channel_id: &str, added_at: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO favorites (channel_id, added_at)
        VALUES (?, ?)
        ON CONFLICT (channel_id) DO UPDATE SET added_at = excluded.added_at
        "#,
    )
    .bind(channel_id)
    .bind(added_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a favorite. Returns the number of rows removed.
pub async fn remove(pool: &SqlitePool, channel_id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM favorites WHERE channel_id = ?")
        .bind(channel_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// All favorites in add-time order
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<FavoriteRow>, sqlx::Error> {
    sqlx::query_as::<_, FavoriteRow>(
        "SELECT channel_id, added_at FROM favorites ORDER BY added_at",
    )
    .fetch_all(pool)
    .await
}

/// Whether a channel is favorited
pub async fn is_favorite(pool: &SqlitePool, channel_id: &str) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM favorites WHERE channel_id = ?")
        .bind(channel_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

/// Count favorites
pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM favorites")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

/// Delete all favorites
pub async fn clear(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM favorites").execute(pool).await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::test_pool;

    #[tokio::test]
    async fn test_add_remove_round_trip() {
        let pool = test_pool().await;

        add(&pool, "BBC1", 1_000).await.unwrap();
        add(&pool, "CNN.us", 2_000).await.unwrap();

        assert!(is_favorite(&pool, "BBC1").await.unwrap());
        assert!(!is_favorite(&pool, "Unknown").await.unwrap());

        let all = get_all(&pool).await.unwrap();
        assert_eq!(all.len(), 2);
        // Add-time order
        assert_eq!(all[0].channel_id, "BBC1");
        assert_eq!(all[1].channel_id, "CNN.us");

        assert_eq!(remove(&pool, "BBC1").await.unwrap(), 1);
        assert!(!is_favorite(&pool, "BBC1").await.unwrap());
    }

    #[tokio::test]
    async fn test_one_row_per_channel() {
        let pool = test_pool().await;

        add(&pool, "BBC1", 1_000).await.unwrap();
        add(&pool, "BBC1", 5_000).await.unwrap();

        let all = get_all(&pool).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].added_at, 5_000);
    }
}
