use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use crate::{
    relay::{CycleOutcome, Relay},
    settings::{credentials, RelayArgs, Settings},
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Relays homework review status changes to a telegram chat"
)]
pub struct Command {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub credentials: credentials::Credentials,

    #[command(flatten)]
    pub options: RelayArgs,
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum Commands {
    /// Poll until interrupted (default)
    Run,
    /// Run a single poll cycle and exit
    Once,
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Command::parse();

    let settings = match Settings::resolve(cli.credentials, cli.options) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("{}, stopping", e);
            return Err(e.into());
        }
    };
    tracing::debug!("resolved settings: {:?}", settings);

    let mut relay = Relay::from_settings(&settings)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let cancellation_token = CancellationToken::new();
            let shutdown = cancellation_token.clone();

            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        tracing::info!("received interrupt, shutting down");
                        shutdown.cancel();
                    }
                    Err(e) => tracing::error!("failed to listen for interrupt: {}", e),
                }
            });

            relay.run(cancellation_token).await;
        }
        Commands::Once => match relay.cycle().await {
            CycleOutcome::Failed { message, delivered } => {
                anyhow::bail!("cycle failed (reported: {delivered}): {message}")
            }
            outcome => tracing::info!("cycle finished: {:?}", outcome),
        },
    }

    Ok(())
}
