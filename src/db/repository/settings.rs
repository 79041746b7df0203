//! Settings repository: singleton JSON row under the 'app-settings' key

use sqlx::SqlitePool;
use tracing::warn;

use crate::models::AppSettings;

const SETTINGS_KEY: &str = "app-settings";

/// Load settings, falling back to defaults when absent or unreadable
pub async fn get(pool: &SqlitePool) -> Result<AppSettings, sqlx::Error> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
        .bind(SETTINGS_KEY)
        .fetch_optional(pool)
        .await?;

    let settings = match row {
        Some((value,)) => serde_json::from_str(&value).unwrap_or_else(|e| {
            warn!("Stored settings unreadable, using defaults: {}", e);
            AppSettings::default()
        }),
        None => AppSettings::default(),
    };

    Ok(settings)
}

/// Persist the full settings value
pub async fn save(pool: &SqlitePool, settings: &AppSettings) -> Result<(), sqlx::Error> {
    let value = serde_json::to_string(settings).unwrap_or_else(|_| "{}".to_string());

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT (key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(SETTINGS_KEY)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete all settings rows
pub async fn clear(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM settings").execute(pool).await?;

    Ok(result.rows_affected())
}
