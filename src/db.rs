use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use crate::config::DbConfig;
use crate::repo::RepoError;

/// The one session to Postgres shared by every repository operation.
///
/// Opened once before serving traffic and closed on shutdown. Statements
/// always bind their parameters positionally; nothing is spliced into SQL text.
#[derive(Clone)]
pub struct Gateway {
    pool: PgPool,
}

impl Gateway {
    pub async fn connect(cfg: &DbConfig) -> anyhow::Result<Self> {
        let url = cfg.require_url()?;
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .connect(url)
            .await?;
        info!(max_connections = cfg.max_connections, "Connected to Postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Schema migrations applied");
        Ok(())
    }

    /// Drop both tables (comments first, they reference reports) and recreate them.
    pub async fn rebuild(&self) -> anyhow::Result<()> {
        warn!("Dropping and recreating tables");
        for stmt in [
            "DROP TABLE IF EXISTS comments",
            "DROP TABLE IF EXISTS reports",
            "DROP TABLE IF EXISTS _sqlx_migrations",
        ] {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        self.migrate().await
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Postgres session closed");
    }
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "gateway failure");
        RepoError::Gateway(e.to_string())
    }
}
