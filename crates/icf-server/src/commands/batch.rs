//! One-shot notification runs for an external scheduler (cron, systemd
//! timer) that prefers a process over an HTTP call.

use anyhow::Context;
use chrono::Utc;
use icf_config::IcfConfig;

use crate::cli::OutputFormat;
use crate::context::AppContext;
use crate::output::output;

/// Handle `icflog check-and-send`.
pub async fn check_and_send(config: IcfConfig, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = AppContext::init(config).await?;
    let report = ctx
        .notifier
        .check_and_send(Utc::now())
        .await
        .context("reminder run failed")?;
    output(&report, format)
}

/// Handle `icflog send-scheduled`.
pub async fn send_scheduled(config: IcfConfig, format: OutputFormat) -> anyhow::Result<()> {
    let ctx = AppContext::init(config).await?;
    let report = ctx
        .notifier
        .process_scheduled(Utc::now())
        .await
        .context("scheduled email run failed")?;
    output(&report, format)
}
