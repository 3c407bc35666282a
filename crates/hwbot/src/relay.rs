use std::time::Duration;

use hwbot_notifier::{telegram::TelegramOptions, Notifier};
use hwbot_provider::{
    extract_latest, practicum::PracticumOptions, server_time, ApiError, HomeworkProvider, Latest,
};
use tokio_util::sync::CancellationToken;

use crate::{
    settings::Settings,
    verdict::{translate, VerdictError},
};

#[derive(thiserror::Error, Debug)]
pub enum CycleError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Verdict(#[from] VerdictError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Delivered(String),
    Duplicate,
    NoNewStatus,
    Failed { message: String, delivered: bool },
}

/// Owns the polling state: the `from_date` cursor and the last message sent.
pub struct Relay {
    provider: HomeworkProvider,
    notifier: Notifier,
    retry_period: Duration,
    cursor: i64,
    last_message: String,
}

impl Relay {
    pub fn new(
        provider: HomeworkProvider,
        notifier: Notifier,
        retry_period: Duration,
        cursor: i64,
    ) -> Self {
        Self {
            provider,
            notifier,
            retry_period,
            cursor,
            last_message: String::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let provider = HomeworkProvider::practicum(
            PracticumOptions::new(&settings.credentials.practicum_token)
                .endpoint(&settings.endpoint)
                .timeout(settings.request_timeout),
        )?;

        let notifier = Notifier::telegram(
            TelegramOptions::new(
                &settings.credentials.telegram_token,
                &settings.credentials.telegram_chat_id,
            )
            .api(&settings.telegram_api)
            .timeout(settings.request_timeout),
        )?;

        Ok(Self::new(
            provider,
            notifier,
            settings.retry_period,
            settings.from_date.unwrap_or_else(now),
        ))
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    #[cfg(test)]
    pub fn last_message(&self) -> &str {
        &self.last_message
    }

    /// Polls until `cancellation_token` fires, sleeping `retry_period` after
    /// every cycle regardless of how it ended.
    pub async fn run(&mut self, cancellation_token: CancellationToken) {
        tracing::info!("starting relay (retry period: {:?})", self.retry_period);

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                outcome = self.cycle() => {
                    tracing::debug!("cycle finished: {:?}, next from_date={}", outcome, self.cursor());
                }
            }

            tokio::select! {
                _ = cancellation_token.cancelled() => break,
                _ = tokio::time::sleep(self.retry_period) => {}
            }
        }

        tracing::info!("relay stopped");
    }

    pub async fn cycle(&mut self) -> CycleOutcome {
        match self.poll().await {
            Ok(None) => {
                tracing::debug!("no new statuses");
                CycleOutcome::NoNewStatus
            }
            Ok(Some(message)) => {
                if self.deliver(&message).await {
                    CycleOutcome::Delivered(message)
                } else {
                    CycleOutcome::Duplicate
                }
            }
            Err(e) => {
                let message = format!("Program failure: {e}");
                tracing::error!("{}", message);
                let delivered = self.deliver(&message).await;

                CycleOutcome::Failed { message, delivered }
            }
        }
    }

    async fn poll(&mut self) -> Result<Option<String>, CycleError> {
        tracing::debug!("fetching homework statuses from_date={}", self.cursor);
        let raw = self.provider.fetch(self.cursor).await?;

        self.cursor = server_time(&raw).unwrap_or_else(now);

        tracing::debug!("checking response");
        let item = match extract_latest(&raw)? {
            Latest::NoNewStatus => return Ok(None),
            Latest::Item(item) => item,
        };

        tracing::debug!("translating status {:?}", item.status);
        Ok(Some(translate(&item)?))
    }

    async fn deliver(&mut self, message: &str) -> bool {
        if message == self.last_message {
            tracing::debug!("message already sent, skipping");
            return false;
        }

        self.notifier.notify(message).await;
        self.last_message = message.to_string();

        true
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod test {
    use std::{
        collections::VecDeque,
        sync::{Arc, Mutex},
    };

    use async_trait::async_trait;
    use hwbot_notifier::{Channel, DeliveryError};
    use hwbot_provider::traits::HomeworkStatuses;
    use serde_json::{json, Value};
    use tracing_test::traced_test;

    use super::*;

    const APPROVED: &str =
        "Status changed for submission \"X\". Work reviewed: the reviewer liked everything. Hooray!";
    const REVIEWING: &str =
        "Status changed for submission \"X\". Work taken for review by the reviewer.";

    #[derive(Default)]
    struct Scripted {
        replies: Mutex<VecDeque<Result<Value, ApiError>>>,
        from_dates: Mutex<Vec<i64>>,
        cancel_when_drained: Option<CancellationToken>,
    }

    impl Scripted {
        fn new(replies: impl IntoIterator<Item = Result<Value, ApiError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().collect()),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl HomeworkStatuses for Scripted {
        async fn fetch(&self, from_date: i64) -> Result<Value, ApiError> {
            self.from_dates.lock().unwrap().push(from_date);

            let mut replies = self.replies.lock().unwrap();
            let reply = replies.pop_front().expect("more fetches than scripted replies");
            if replies.is_empty() {
                if let Some(token) = &self.cancel_when_drained {
                    token.cancel();
                }
            }

            reply
        }
    }

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Channel for Recording {
        async fn send(&self, text: &str) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn relay(statuses: Arc<Scripted>, channel: Arc<Recording>) -> Relay {
        Relay::new(
            HomeworkProvider::new(statuses),
            Notifier::new(channel),
            Duration::from_secs(600),
            1000,
        )
    }

    fn homework(status: &str, current_time: i64) -> Result<Value, ApiError> {
        Ok(json!({
            "homeworks": [{"status": status, "homework_name": "X"}],
            "current_time": current_time
        }))
    }

    fn not_found() -> Result<Value, ApiError> {
        Err(ApiError::EndpointUnavailable {
            endpoint: "http://practicum.test/".into(),
        })
    }

    #[tokio::test]
    async fn test_delivers_translated_status() {
        let statuses = Arc::new(Scripted::new([homework("approved", 2000)]));
        let channel = Arc::new(Recording::default());
        let mut relay = relay(statuses.clone(), channel.clone());

        let outcome = relay.cycle().await;

        assert_eq!(outcome, CycleOutcome::Delivered(APPROVED.into()));
        assert_eq!(*channel.sent.lock().unwrap(), vec![APPROVED.to_string()]);
        assert_eq!(*statuses.from_dates.lock().unwrap(), vec![1000]);
        assert_eq!(relay.cursor(), 2000);
        assert_eq!(relay.last_message(), APPROVED);
    }

    #[tokio::test]
    async fn test_identical_messages_are_sent_once() {
        let statuses = Arc::new(Scripted::new([
            homework("approved", 2000),
            homework("approved", 3000),
        ]));
        let channel = Arc::new(Recording::default());
        let mut relay = relay(statuses.clone(), channel.clone());

        assert_eq!(relay.cycle().await, CycleOutcome::Delivered(APPROVED.into()));
        assert_eq!(relay.cycle().await, CycleOutcome::Duplicate);

        assert_eq!(channel.sent.lock().unwrap().len(), 1);
        assert_eq!(*statuses.from_dates.lock().unwrap(), vec![1000, 2000]);
        assert_eq!(relay.cursor(), 3000);
    }

    #[tokio::test]
    async fn test_changed_status_is_sent_again() {
        let statuses = Arc::new(Scripted::new([
            homework("reviewing", 2000),
            homework("approved", 3000),
        ]));
        let channel = Arc::new(Recording::default());
        let mut relay = relay(statuses, channel.clone());

        relay.cycle().await;
        relay.cycle().await;

        assert_eq!(
            *channel.sent.lock().unwrap(),
            vec![REVIEWING.to_string(), APPROVED.to_string()]
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn test_no_new_status_is_only_logged() {
        let statuses = Arc::new(Scripted::new([
            homework("approved", 2000),
            Ok(json!({"homeworks": [], "current_time": 3000})),
        ]));
        let channel = Arc::new(Recording::default());
        let mut relay = relay(statuses, channel.clone());

        relay.cycle().await;
        assert_eq!(relay.cycle().await, CycleOutcome::NoNewStatus);

        assert_eq!(channel.sent.lock().unwrap().len(), 1);
        assert_eq!(relay.last_message(), APPROVED);
        assert_eq!(relay.cursor(), 3000);
        assert!(logs_contain("no new statuses"));
    }

    #[tokio::test]
    async fn test_recurring_error_is_reported_once() {
        let statuses = Arc::new(Scripted::new([not_found(), not_found()]));
        let channel = Arc::new(Recording::default());
        let mut relay = relay(statuses, channel.clone());

        let expected =
            "Program failure: endpoint http://practicum.test/ is unavailable, response code: 404";

        assert_eq!(
            relay.cycle().await,
            CycleOutcome::Failed {
                message: expected.into(),
                delivered: true
            }
        );
        assert_eq!(
            relay.cycle().await,
            CycleOutcome::Failed {
                message: expected.into(),
                delivered: false
            }
        );

        assert_eq!(*channel.sent.lock().unwrap(), vec![expected.to_string()]);
        assert_eq!(relay.cursor(), 1000);
    }

    #[tokio::test]
    async fn test_error_after_success_is_reported() {
        let statuses = Arc::new(Scripted::new([
            homework("approved", 2000),
            homework("unknown", 3000),
            homework("approved", 4000),
        ]));
        let channel = Arc::new(Recording::default());
        let mut relay = relay(statuses, channel.clone());

        relay.cycle().await;
        let outcome = relay.cycle().await;
        relay.cycle().await;

        let CycleOutcome::Failed { message, delivered } = outcome else {
            panic!("expected failure, got {outcome:?}");
        };
        assert_eq!(message, "Program failure: unexpected homework status: unknown");
        assert!(delivered);

        assert_eq!(
            *channel.sent.lock().unwrap(),
            vec![APPROVED.to_string(), message, APPROVED.to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_current_time_falls_back_to_now() {
        let statuses = Arc::new(Scripted::new([Ok(json!({"homeworks": []}))]));
        let channel = Arc::new(Recording::default());
        let mut relay = relay(statuses, channel);

        let before = now();
        relay.cycle().await;

        assert!(relay.cursor() >= before);
    }

    #[tokio::test]
    async fn test_malformed_response_is_reported() {
        let statuses = Arc::new(Scripted::new([Ok(json!({}))]));
        let channel = Arc::new(Recording::default());
        let mut relay = relay(statuses, channel.clone());

        let outcome = relay.cycle().await;

        assert!(
            matches!(outcome, CycleOutcome::Failed { delivered: true, .. }),
            "{outcome:?}"
        );
        assert_eq!(
            *channel.sent.lock().unwrap(),
            vec!["Program failure: response is missing expected field: homeworks".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_sleeps_after_every_cycle_until_cancelled() {
        let cancellation_token = CancellationToken::new();
        let statuses = Arc::new(Scripted {
            cancel_when_drained: Some(cancellation_token.clone()),
            ..Scripted::new([homework("reviewing", 2000), not_found(), homework("approved", 3000)])
        });
        let channel = Arc::new(Recording::default());
        let mut relay = relay(statuses.clone(), channel.clone());

        let started = tokio::time::Instant::now();
        relay.run(cancellation_token).await;

        assert_eq!(statuses.from_dates.lock().unwrap().len(), 3);
        assert_eq!(channel.sent.lock().unwrap().len(), 3);
        assert!(started.elapsed() >= Duration::from_secs(1200));
    }
}
