//! Server-sent events transport.

use std::collections::VecDeque;
use std::fmt::Display;

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Client, RequestBuilder, Response, Url};
use tak_sync::{Transport, TransportEvent};

use crate::decoder::SseDecoder;
use crate::error::{ClientError, ClientResult};
use crate::{parse_url, USER_AGENT};

/// Streams updates from the broadcast server's `text/event-stream` endpoint.
/// Every `message` event carries one snapshot or patch batch.
pub struct SseTransport {
    client: Client,
    url: Url,
}

impl SseTransport {
    pub fn new(url: &str) -> ClientResult<Self> {
        let url = parse_url(url)?;
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, url })
    }
}

impl Transport for SseTransport {
    fn connect(&mut self) -> BoxStream<'static, TransportEvent> {
        tracing::debug!(url = %self.url, "Opening event stream");
        let request = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache");

        stream::once(open(request))
            .flat_map(|opened| match opened {
                Ok(response) => stream::once(future::ready(TransportEvent::Opened))
                    .chain(read_events(response.bytes_stream().boxed()))
                    .boxed(),
                Err(e) => stream::once(future::ready(TransportEvent::Error(e.to_string()))).boxed(),
            })
            .boxed()
    }
}

async fn open(request: RequestBuilder) -> ClientResult<Response> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status(status));
    }
    Ok(response)
}

struct EventReader<S> {
    body: S,
    decoder: SseDecoder,
    pending: VecDeque<String>,
}

/// Turn a response body into `Message` events, ending with `Closed` when the
/// body ends or `Error` when reading it fails.
pub(crate) fn read_events<S, B, E>(body: S) -> impl Stream<Item = TransportEvent>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    let reader = EventReader {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
    };

    stream::unfold(Some(reader), |state| async move {
        let mut reader = state?;
        loop {
            if let Some(data) = reader.pending.pop_front() {
                return Some((TransportEvent::Message(data), Some(reader)));
            }
            match reader.body.next().await {
                Some(Ok(chunk)) => {
                    let events = reader.decoder.push(chunk.as_ref());
                    reader.pending.extend(
                        events
                            .into_iter()
                            .filter(|event| event.is_message())
                            .map(|event| event.data),
                    );
                }
                Some(Err(e)) => {
                    return Some((TransportEvent::Error(format!("Stream read failed: {e}")), None))
                }
                None => return Some((TransportEvent::Closed, None)),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    type Chunk = Result<&'static str, &'static str>;

    fn body(chunks: Vec<Chunk>) -> impl Stream<Item = Chunk> + Unpin {
        stream::iter(chunks)
    }

    #[tokio::test]
    async fn test_messages_then_closed() {
        let events: Vec<_> = read_events(body(vec![
            Ok("data: {\"a\":1}\n\ndata: ["),
            Ok("]\n\nevent: ping\ndata: x\n\n"),
        ]))
        .collect()
        .await;

        assert_eq!(
            events,
            vec![
                TransportEvent::Message("{\"a\":1}".to_string()),
                TransportEvent::Message("[]".to_string()),
                TransportEvent::Closed,
            ]
        );
    }

    #[tokio::test]
    async fn test_read_error_ends_stream() {
        let events: Vec<_> = read_events(body(vec![
            Ok("data: 1\n\n"),
            Err("connection reset"),
            Ok("data: 2\n\n"),
        ]))
        .collect()
        .await;

        assert_eq!(
            events,
            vec![
                TransportEvent::Message("1".to_string()),
                TransportEvent::Error("Stream read failed: connection reset".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_reports_error() {
        let mut transport = SseTransport::new("http://127.0.0.1:1/0/sse").unwrap();
        let events: Vec<_> = transport.connect().collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], TransportEvent::Error(_)));
    }

    #[test]
    fn test_rejects_invalid_url() {
        assert!(matches!(
            SseTransport::new("not a url"),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}
