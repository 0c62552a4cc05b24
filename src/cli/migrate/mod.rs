//! Migrate command - applies schema migrations against PostgreSQL

use tracing::info;

use crate::infrastructure::storage::{PostgresMigrator, connect_pool, run_migrations};

pub async fn run() -> anyhow::Result<()> {
    let (config, load_error) = super::load_config();
    super::init(&config, load_error);

    let pool = connect_pool(&config.storage.postgres()).await?;
    let applied = run_migrations(&pool).await?;
    let version = PostgresMigrator::new(pool.clone()).current_version().await?;

    info!(applied, version = ?version, "Migrations complete");
    pool.close().await;

    Ok(())
}
