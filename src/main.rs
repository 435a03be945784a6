use anyhow::Result;
use clap::Parser;

use playlist_export::app;
use playlist_export::cli::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    app::run(cli).await?;
    Ok(())
}
