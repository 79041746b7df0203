//! Stream repository: one row per channel id, holding that channel's full
//! stream list as JSON. Writes replace the list wholesale (keyed
//! re-aggregation, not append).

use std::collections::HashMap;

use sqlx::SqlitePool;

use crate::db::models::StreamSetRow;
use crate::models::Stream;

/// Replace the stream list for a single channel
pub async fn replace_for_channel(
    pool: &SqlitePool,
    channel_id: &str,
    streams: &[Stream],
) -> Result<(), sqlx::Error> {
    let payload = serde_json::to_string(streams).unwrap_or_else(|_| "[]".to_string());

    sqlx::query(
        r#"
        INSERT INTO channel_streams (channel_id, streams)
        VALUES (?, ?)
        ON CONFLICT (channel_id) DO UPDATE SET streams = excluded.streams
        "#,
    )
    .bind(channel_id)
    .bind(payload)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace stream lists for many channels inside a single transaction.
/// Lists for channel ids absent from the map are left untouched.
pub async fn replace_many(
    pool: &SqlitePool,
    streams_by_channel: &HashMap<String, Vec<Stream>>,
) -> Result<usize, sqlx::Error> {
    let mut tx = pool.begin().await?;

    for (channel_id, streams) in streams_by_channel {
        let payload = serde_json::to_string(streams).unwrap_or_else(|_| "[]".to_string());

        sqlx::query(
            r#"
            INSERT INTO channel_streams (channel_id, streams)
            VALUES (?, ?)
            ON CONFLICT (channel_id) DO UPDATE SET streams = excluded.streams
            "#,
        )
        .bind(channel_id)
        .bind(payload)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(streams_by_channel.len())
}

/// Read the stream list for a channel
pub async fn get_for_channel(
    pool: &SqlitePool,
    channel_id: &str,
) -> Result<Option<Vec<Stream>>, sqlx::Error> {
    let row = sqlx::query_as::<_, StreamSetRow>(
        "SELECT channel_id, streams FROM channel_streams WHERE channel_id = ?",
    )
    .bind(channel_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into_streams()))
}

/// Read every cached stream, flattened across channels
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<Stream>, sqlx::Error> {
    let rows =
        sqlx::query_as::<_, StreamSetRow>("SELECT channel_id, streams FROM channel_streams")
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().flat_map(|r| r.into_streams()).collect())
}

/// Count stream-list rows (one per channel with streams)
pub async fn count_rows(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM channel_streams")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

/// Delete all cached stream lists
pub async fn clear(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM channel_streams").execute(pool).await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::test_pool;

    fn stream(channel: &str, url: &str) -> Stream {
        Stream {
            channel: Some(channel.to_string()),
            url: url.to_string(),
            feed: None,
            title: None,
            quality: None,
            referrer: None,
            user_agent: None,
            status: None,
        }
    }

    #[tokio::test]
    async fn test_replace_keeps_source_order() {
        let pool = test_pool().await;

        let streams = vec![stream("X", "http://a/1.m3u8"), stream("X", "http://a/2.m3u8")];
        replace_for_channel(&pool, "X", &streams).await.unwrap();

        let loaded = get_for_channel(&pool, "X").await.unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].url, "http://a/1.m3u8");
        assert_eq!(loaded[1].url, "http://a/2.m3u8");
    }

    #[tokio::test]
    async fn test_replace_is_wholesale_not_append() {
        let pool = test_pool().await;

        replace_for_channel(&pool, "X", &[stream("X", "http://a/1.m3u8")])
            .await
            .unwrap();
        replace_for_channel(&pool, "X", &[stream("X", "http://a/3.m3u8")])
            .await
            .unwrap();

        let loaded = get_for_channel(&pool, "X").await.unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].url, "http://a/3.m3u8");
    }

    #[tokio::test]
    async fn test_replace_many_leaves_absent_channels_untouched() {
        let pool = test_pool().await;

        replace_for_channel(&pool, "X", &[stream("X", "http://a/1.m3u8")])
            .await
            .unwrap();

        let mut update = HashMap::new();
        update.insert("Y".to_string(), vec![stream("Y", "http://b/1.m3u8")]);
        replace_many(&pool, &update).await.unwrap();

        assert!(get_for_channel(&pool, "X").await.unwrap().is_some());
        assert_eq!(count_rows(&pool).await.unwrap(), 2);
        assert_eq!(get_all(&pool).await.unwrap().len(), 2);
    }
}
