use crate::cli::{connect, utils, OutputFormat};
use crate::config;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config::config();
    let pool = connect(config).await?;

    DatabaseManager::run_migrations(&pool).await?;
    utils::output_success(&output_format, "Migrations applied", None)
}
