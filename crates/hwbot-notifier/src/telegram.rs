use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Channel, DeliveryError};

pub const DEFAULT_API: &str = "https://api.telegram.org";

pub struct Telegram {
    client: reqwest::Client,
    send_message_uri: String,
    chat_id: String,
}

#[derive(Clone)]
pub struct TelegramOptions {
    token: String,
    chat_id: String,
    api: String,
    timeout: Duration,
}

impl TelegramOptions {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            chat_id: chat_id.into(),
            api: DEFAULT_API.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn api(mut self, api: impl Into<String>) -> Self {
        self.api = api.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct Reply {
    ok: bool,
    description: Option<String>,
}

impl Telegram {
    pub fn new(options: TelegramOptions) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("hwbot/", env!("CARGO_PKG_VERSION")))
            .timeout(options.timeout)
            .build()
            .context("failed to build telegram http client")?;

        Ok(Self {
            client,
            send_message_uri: format!(
                "{}/bot{}/sendMessage",
                options.api.trim_end_matches('/'),
                options.token
            ),
            chat_id: options.chat_id,
        })
    }
}

#[async_trait]
impl Channel for Telegram {
    async fn send(&self, text: &str) -> Result<(), DeliveryError> {
        tracing::debug!("sending message to chat {}", self.chat_id);

        // The bot token is part of the url, keep it out of error messages.
        let res = self
            .client
            .post(&self.send_message_uri)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url()))?;

        let status = res.status();
        let body = res
            .bytes()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url()))?;

        check_reply(status, &body)
    }
}

fn check_reply(status: StatusCode, body: &[u8]) -> Result<(), DeliveryError> {
    let reply = serde_json::from_slice::<Reply>(body).ok();

    match reply {
        Some(Reply { ok: true, .. }) if status.is_success() => Ok(()),
        Some(Reply { description, .. }) => Err(DeliveryError::Rejected {
            code: status.as_u16(),
            description: description.unwrap_or_else(|| "no description".into()),
        }),
        None => Err(DeliveryError::Rejected {
            code: status.as_u16(),
            description: "reply is not a telegram api response".into(),
        }),
    }
}
