use icf_config::IcfConfig;

use crate::context::open_service;

/// Handle `icflog migrate`. Opening the database applies pending migrations.
pub async fn handle(config: &IcfConfig) -> anyhow::Result<()> {
    open_service(&config.database).await?;
    let target = if config.database.is_remote() {
        config.database.url.as_str()
    } else {
        config.database.path.as_str()
    };
    tracing::info!(database = target, "migrations applied");
    Ok(())
}
