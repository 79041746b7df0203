//! Channel repository: the channels object store, keyed by channel id

use sqlx::SqlitePool;

use crate::db::models::{to_json_list, ChannelRow};
use crate::models::Channel;

/// Upsert a batch of channels inside a single transaction.
/// Returns the number of rows written.
pub async fn upsert_many(pool: &SqlitePool, channels: &[Channel]) -> Result<usize, sqlx::Error> {
    let mut tx = pool.begin().await?;

    for channel in channels {
        sqlx::query(
            r#"
            INSERT INTO channels (id, name, network, country, languages, categories,
                                  is_nsfw, launched, closed, website, logo)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                network = excluded.network,
                country = excluded.country,
                languages = excluded.languages,
                categories = excluded.categories,
                is_nsfw = excluded.is_nsfw,
                launched = excluded.launched,
                closed = excluded.closed,
                website = excluded.website,
                logo = excluded.logo
            "#,
        )
        .bind(&channel.id)
        .bind(&channel.name)
        .bind(&channel.network)
        .bind(&channel.country)
        .bind(to_json_list(&channel.languages))
        .bind(to_json_list(&channel.categories))
        .bind(channel.is_nsfw)
        .bind(&channel.launched)
        .bind(&channel.closed)
        .bind(&channel.website)
        .bind(&channel.logo)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(channels.len())
}

/// Read all cached channels
pub async fn get_all(pool: &SqlitePool) -> Result<Vec<ChannelRow>, sqlx::Error> {
    sqlx::query_as::<_, ChannelRow>(
        r#"
        SELECT id, name, network, country, languages, categories,
               is_nsfw, launched, closed, website, logo
        FROM channels
        "#,
    )
    .fetch_all(pool)
    .await
}

/// Read a single channel by id
pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<ChannelRow>, sqlx::Error> {
    sqlx::query_as::<_, ChannelRow>(
        r#"
        SELECT id, name, network, country, languages, categories,
               is_nsfw, launched, closed, website, logo
        FROM channels
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Count cached channels
pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM channels")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

/// Delete all cached channels
pub async fn clear(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM channels").execute(pool).await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::test_pool;

    fn channel(id: &str, name: &str) -> Channel {
        Channel {
            id: id.to_string(),
            name: name.to_string(),
            network: None,
            country: "US".to_string(),
            languages: vec!["eng".to_string()],
            categories: vec!["news".to_string()],
            is_nsfw: false,
            launched: None,
            closed: None,
            website: None,
            logo: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_twice_is_idempotent() {
        let pool = test_pool().await;
        let channels = vec![channel("A.us", "Alpha"), channel("B.us", "Beta")];

        upsert_many(&pool, &channels).await.unwrap();
        upsert_many(&pool, &channels).await.unwrap();

        let rows = get_all(&pool).await.unwrap();
        assert_eq!(rows.len(), 2);

        let mut ids: Vec<String> = rows.into_iter().map(|r| r.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["A.us", "B.us"]);
    }

    #[tokio::test]
    async fn test_upsert_updates_existing_row() {
        let pool = test_pool().await;

        upsert_many(&pool, &[channel("A.us", "Alpha")]).await.unwrap();

        let mut updated = channel("A.us", "Alpha HD");
        updated.logo = Some("http://logos/a.png".to_string());
        upsert_many(&pool, &[updated]).await.unwrap();

        let row = get_by_id(&pool, "A.us").await.unwrap().unwrap();
        assert_eq!(row.name, "Alpha HD");
        assert_eq!(row.logo.as_deref(), Some("http://logos/a.png"));
        assert_eq!(count(&pool).await.unwrap(), 1);
    }
}
