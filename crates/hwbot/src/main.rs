mod cli;
mod logging;
mod relay;
mod settings;
mod verdict;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::initialize_logging()?;
    logging::initialize_panic_handler();

    tracing::debug!("starting hwbot");

    cli::run().await?;

    Ok(())
}
