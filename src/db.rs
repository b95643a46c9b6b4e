use anyhow::Context;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tracing::{error, info};

use crate::config::AppConfig;

pub async fn connect(config: &AppConfig) -> anyhow::Result<SqlitePool> {
    let db = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;
    Ok(db)
}

/// Creates the `users` table when it does not exist yet. Safe to run on every start.
pub async fn ensure_schema(db: &SqlitePool) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT,
            password TEXT,
            firstName TEXT,
            lastName TEXT,
            email TEXT,
            contactNumber TEXT,
            address TEXT,
            profilePicture TEXT
        )
        "#,
    )
    .execute(db)
    .await;

    match result {
        Ok(_) => {
            info!("users table ready");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "create users table failed");
            Err(e)
        }
    }
}
