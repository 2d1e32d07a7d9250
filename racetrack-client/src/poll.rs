//! Polling transport for endpoints that serve the full game state.

use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use tak_sync::{Transport, TransportEvent};

use crate::error::{ClientError, ClientResult};
use crate::{parse_url, USER_AGENT};

/// Default delay between two snapshot requests.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Fetches a full snapshot every `interval`. Each response is delivered as a
/// `Message`; the driver's classifier turns unchanged snapshots into no-ops.
pub struct PollingTransport {
    client: Client,
    url: Url,
    interval: Duration,
}

impl PollingTransport {
    pub fn new(url: &str, interval: Duration) -> ClientResult<Self> {
        let url = parse_url(url)?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(interval.max(Duration::from_secs(10)))
            .build()?;
        Ok(Self {
            client,
            url,
            interval,
        })
    }
}

impl Transport for PollingTransport {
    fn connect(&mut self) -> BoxStream<'static, TransportEvent> {
        tracing::debug!(
            url = %self.url,
            interval_ms = self.interval.as_millis() as u64,
            "Start polling"
        );
        let poller = Poller {
            client: self.client.clone(),
            url: self.url.clone(),
            interval: self.interval,
            state: PollState::Opening,
        };
        stream::unfold(Some(poller), |poller| async move { poller?.step().await }).boxed()
    }
}

enum PollState {
    /// Nothing fetched yet.
    Opening,
    /// Connected, holding the first snapshot until `Opened` was delivered.
    Opened(String),
    Polling,
}

struct Poller {
    client: Client,
    url: Url,
    interval: Duration,
    state: PollState,
}

impl Poller {
    /// One event of the stream; `None` as next state ends it after a failure.
    async fn step(mut self) -> Option<(TransportEvent, Option<Self>)> {
        match std::mem::replace(&mut self.state, PollState::Polling) {
            PollState::Opening => match self.fetch().await {
                Ok(body) => {
                    self.state = PollState::Opened(body);
                    Some((TransportEvent::Opened, Some(self)))
                }
                Err(e) => Some((TransportEvent::Error(e.to_string()), None)),
            },
            PollState::Opened(body) => Some((TransportEvent::Message(body), Some(self))),
            PollState::Polling => {
                tokio::time::sleep(self.interval).await;
                self.deliver().await
            }
        }
    }

    async fn deliver(self) -> Option<(TransportEvent, Option<Self>)> {
        match self.fetch().await {
            Ok(body) => Some((TransportEvent::Message(body), Some(self))),
            Err(e) => Some((TransportEvent::Error(e.to_string()), None)),
        }
    }

    async fn fetch(&self) -> ClientResult<String> {
        let response = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }
        Ok(response.text().await?)
    }
}
