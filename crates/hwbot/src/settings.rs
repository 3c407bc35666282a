use std::time::Duration;

use hwbot_config::MissingConfigurationError;
use hwbot_config_derive::AppConfig;
use hwbot_notifier::telegram::DEFAULT_API;
use hwbot_provider::practicum::DEFAULT_ENDPOINT;

#[derive(AppConfig, Clone)]
pub struct Credentials {
    pub practicum_token: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("practicum_token", &"***")
            .field("telegram_token", &"***")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct RelayArgs {
    /// Homework statuses endpoint
    #[arg(long, env = "HWBOT_ENDPOINT", default_value = DEFAULT_ENDPOINT, global = true)]
    pub endpoint: String,

    /// Telegram bot api base url
    #[arg(long, env = "HWBOT_TELEGRAM_API", default_value = DEFAULT_API, global = true)]
    pub telegram_api: String,

    /// Seconds to sleep between polls
    #[arg(
        long,
        env = "HWBOT_RETRY_PERIOD",
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    pub retry_period: u64,

    /// Seconds before an outbound request is abandoned
    #[arg(
        long,
        env = "HWBOT_REQUEST_TIMEOUT",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    pub request_timeout: u64,

    /// Unix timestamp to start polling from, defaults to now
    #[arg(long, env = "HWBOT_FROM_DATE", global = true)]
    pub from_date: Option<i64>,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub credentials: Credentials,
    pub endpoint: String,
    pub telegram_api: String,
    pub retry_period: Duration,
    pub request_timeout: Duration,
    pub from_date: Option<i64>,
}

impl Settings {
    pub fn resolve(
        credentials: credentials::Credentials,
        args: RelayArgs,
    ) -> Result<Self, MissingConfigurationError> {
        let credentials = Credentials::from(credentials)?;

        Ok(Self {
            credentials,
            endpoint: args.endpoint,
            telegram_api: args.telegram_api,
            retry_period: Duration::from_secs(args.retry_period),
            request_timeout: Duration::from_secs(args.request_timeout),
            from_date: args.from_date,
        })
    }
}
