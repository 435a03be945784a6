use crate::app::controller::AppController;
use crate::cli::{Cli, Commands};
use crate::config::load_config;
use crate::error::Result;

/// Entry point used by `main`: resolve the configuration and dispatch the command.
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), &cli.overrides())?;
    log::info!(
        "Using server {} and download directory {}",
        config.server.base_url,
        config.download_dir.display()
    );

    let mut controller = AppController::new(config)?;
    match cli.selected_command() {
        Commands::Interactive => controller.run_interactive().await,
        Commands::Status => controller.print_status().await,
        Commands::Login => controller.login().await,
        Commands::Logout => controller.logout().await,
        Commands::Export => controller.export().await,
        Commands::Inspect { file } => controller.inspect(file.as_deref()),
    }
}
