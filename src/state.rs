use crate::config::AppConfig;
use crate::db;
use crate::session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub session: Session,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = db::connect(&config).await?;

        let store =
            Arc::new(FileSessionStore::new(&config.session_path)) as Arc<dyn SessionStore>;

        Ok(Self {
            db,
            config,
            session: Session::new(store),
        })
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            db,
            config,
            session: Session::new(store),
        }
    }

    /// In-memory database and session cache. Nothing touches disk.
    pub async fn fake() -> anyhow::Result<Self> {
        // one connection: every sqlite::memory: connection is its own database
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            session_path: "session.json".into(),
            max_connections: 1,
        });

        let store = Arc::new(MemorySessionStore::new()) as Arc<dyn SessionStore>;
        Ok(Self::from_parts(db, config, store))
    }

    pub async fn close(&self) {
        self.db.close().await;
    }
}
