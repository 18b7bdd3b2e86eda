use anyhow::Context;
use icf_config::IcfConfig;

use crate::cli::{OutputFormat, SetRoleArgs};
use crate::context::open_service;
use crate::output::output;

/// Handle `icflog set-role`. The profile must already exist.
pub async fn handle(
    args: &SetRoleArgs,
    config: &IcfConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let service = open_service(&config.database).await?;
    let profile = service
        .set_role(&args.user, args.role)
        .await
        .with_context(|| format!("failed to set role for '{}'", args.user))?;
    tracing::info!(user_id = %profile.user_id, role = %profile.role, "role updated");
    output(&profile, format)
}
