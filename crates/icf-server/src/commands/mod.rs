mod batch;
mod migrate;
mod serve;
mod set_role;

use icf_config::IcfConfig;

use crate::cli::{Commands, OutputFormat};

/// Dispatch a parsed command to its handler.
pub async fn dispatch(
    command: Commands,
    config: IcfConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match command {
        Commands::Serve(args) => serve::handle(&args, config).await,
        Commands::CheckAndSend => batch::check_and_send(config, format).await,
        Commands::SendScheduled => batch::send_scheduled(config, format).await,
        Commands::Migrate => migrate::handle(&config).await,
        Commands::SetRole(args) => set_role::handle(&args, &config, format).await,
    }
}
