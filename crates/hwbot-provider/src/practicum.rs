use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use http::StatusCode;
use reqwest::Client;

use crate::{error::ApiError, traits::HomeworkStatuses};

pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Practicum {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Clone)]
pub struct PracticumOptions {
    token: String,
    endpoint: String,
    timeout: Duration,
}

impl PracticumOptions {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            endpoint: DEFAULT_ENDPOINT.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Practicum {
    pub fn new(options: PracticumOptions) -> anyhow::Result<Self> {
        let mut authorization =
            reqwest::header::HeaderValue::from_str(&format!("OAuth {}", options.token))
                .context("practicum token is not a valid header value")?;
        authorization.set_sensitive(true);

        let client = Client::builder()
            .user_agent(concat!("hwbot/", env!("CARGO_PKG_VERSION")))
            .timeout(options.timeout)
            .default_headers(
                std::iter::once((reqwest::header::AUTHORIZATION, authorization)).collect(),
            )
            .build()
            .context("failed to build practicum http client")?;

        Ok(Self {
            client,
            endpoint: options.endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn transport_error(&self, source: reqwest::Error) -> ApiError {
        tracing::error!(severity = "critical", "request to {} failed: {}", self.endpoint, source);
        ApiError::Transport {
            endpoint: self.endpoint.clone(),
            source,
        }
    }
}

#[async_trait]
impl HomeworkStatuses for Practicum {
    async fn fetch(&self, from_date: i64) -> Result<serde_json::Value, ApiError> {
        tracing::debug!("requesting homework statuses from_date={}", from_date);

        let res = self
            .client
            .get(&self.endpoint)
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = res.status();
        let body = res.bytes().await.map_err(|e| self.transport_error(e))?;

        classify(&self.endpoint, status, &body)
    }
}

/// Maps a raw http reply onto the api error taxonomy.
pub fn classify(
    endpoint: &str,
    status: StatusCode,
    body: &[u8],
) -> Result<serde_json::Value, ApiError> {
    match status {
        StatusCode::OK => serde_json::from_slice(body).map_err(|e| {
            ApiError::MalformedResponse(format!("response body is not valid json: {e}"))
        }),
        StatusCode::NOT_FOUND => Err(ApiError::EndpointUnavailable {
            endpoint: endpoint.into(),
        }),
        other => {
            tracing::debug!(
                "unexpected response: {}",
                String::from_utf8_lossy(&body[..body.len().min(512)])
            );
            Err(ApiError::UnexpectedStatusCode {
                endpoint: endpoint.into(),
                code: other.as_u16(),
            })
        }
    }
}
