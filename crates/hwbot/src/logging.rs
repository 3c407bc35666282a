use tracing_error::ErrorLayer;
use tracing_subscriber::{
    filter::EnvFilter, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, Layer,
};

const DEFAULT_DIRECTIVES: &str = "hwbot=debug,hwbot_provider=debug,hwbot_notifier=debug";

fn directives() -> String {
    std::env::var("RUST_LOG")
        .or_else(|_| std::env::var("HWBOT_LOG_LEVEL"))
        .unwrap_or_else(|_| DEFAULT_DIRECTIVES.into())
}

pub fn initialize_logging() -> anyhow::Result<()> {
    let stdout_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_filter(EnvFilter::try_new(directives())?);

    tracing_subscriber::registry()
        .with(stdout_subscriber)
        .with(ErrorLayer::default())
        .try_init()?;

    Ok(())
}

pub fn initialize_panic_handler() {
    std::panic::set_hook(Box::new(move |panic_info| {
        #[cfg(not(debug_assertions))]
        {
            use human_panic::{handle_dump, print_msg, Metadata};
            let meta = Metadata {
                version: env!("CARGO_PKG_VERSION").into(),
                name: env!("CARGO_PKG_NAME").into(),
                authors: env!("CARGO_PKG_AUTHORS").replace(':', ", ").into(),
                homepage: env!("CARGO_PKG_HOMEPAGE").into(),
            };

            let file_path = handle_dump(&meta, panic_info);
            if let Err(e) = print_msg(file_path, &meta) {
                eprintln!("human-panic: printing error message to console failed: {e}");
            }
        }

        let msg = format!("{}", panic_info);
        tracing::error!("Error: {}", msg);
    }));
}
