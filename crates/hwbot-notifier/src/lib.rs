use std::sync::Arc;

use async_trait::async_trait;
use telegram::{Telegram, TelegramOptions};

pub mod telegram;

#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("channel is unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("channel rejected the message ({code}): {description}")]
    Rejected { code: u16, description: String },
}

#[async_trait]
pub trait Channel: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), DeliveryError>;
}

/// Best-effort delivery to the configured recipient.
///
/// Failures are logged and swallowed, so callers can treat `notify` as
/// infallible.
#[derive(Clone)]
pub struct Notifier {
    channel: Arc<dyn Channel>,
}

impl Notifier {
    pub fn new(channel: Arc<dyn Channel>) -> Self {
        Self { channel }
    }

    pub fn telegram(options: TelegramOptions) -> anyhow::Result<Self> {
        let telegram = Arc::new(Telegram::new(options)?);

        Ok(Self { channel: telegram })
    }

    pub async fn notify(&self, text: &str) {
        match self.channel.send(text).await {
            Ok(()) => tracing::debug!("bot sent message: {}", text),
            Err(e) => tracing::error!("failed to send message: {}", e),
        }
    }
}
