//! Pull-based stream of application events decoded from transport chunks.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::FusedStream;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::client::ClientError;
use crate::event::{classify, ApplicationEvent};
use crate::sse::{parse_frame, FrameBuffer};

type BoxedEvents = Pin<Box<dyn Stream<Item = Result<ApplicationEvent, ClientError>> + Send>>;

/// Lifecycle of an [`EventStream`].
///
/// A stream starts out `Streaming` and moves to exactly one terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Streaming,
    /// The transport signalled end of data.
    Completed,
    /// The transport failed; the error has been yielded to the consumer.
    Failed,
}

/// Application events of one conversation turn, in arrival order.
///
/// A failure is yielded once as an `Err`, after which the stream ends.
/// The transport is released as soon as a terminal state is reached, or
/// when the stream is dropped.
pub struct EventStream {
    inner: Option<BoxedEvents>,
    state: StreamState,
}

impl EventStream {
    fn new(inner: BoxedEvents) -> Self {
        Self {
            inner: Some(inner),
            state: StreamState::Streaming,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Stream for EventStream {
    type Item = Result<ApplicationEvent, ClientError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(inner) = this.inner.as_mut() else {
            return Poll::Ready(None);
        };

        match inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(event))) => Poll::Ready(Some(Ok(event))),
            Poll::Ready(Some(Err(e))) => {
                this.inner = None;
                this.state = StreamState::Failed;
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.inner = None;
                this.state = StreamState::Completed;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl FusedStream for EventStream {
    fn is_terminated(&self) -> bool {
        self.state != StreamState::Streaming
    }
}

/// Decode a stream of raw transport chunks into application events.
///
/// Chunk boundaries are arbitrary: the same bytes produce the same events no
/// matter how they are split. Content left without a terminating blank line
/// when the chunks run out is discarded. The first chunk error ends the
/// stream.
///
/// # Example
/// ```
/// use adk_client::stream::decode_events;
/// use adk_client::{ApplicationEvent, ClientError};
/// use futures::{stream, StreamExt};
///
/// # futures::executor::block_on(async {
/// let chunks = stream::iter(vec![
///     Ok::<_, ClientError>("data: {\"author\":\"root\"}\n"),
///     Ok("\ndata: {\"content\":{\"parts\":[{\"text\":\"Hi\"}]}}\n\n"),
/// ]);
/// let events: Vec<_> = decode_events(chunks).map(Result::unwrap).collect().await;
/// assert_eq!(events[1], ApplicationEvent::Text { content: "Hi".to_string() });
/// # });
/// ```
pub fn decode_events<S, B>(chunks: S) -> EventStream
where
    S: Stream<Item = Result<B, ClientError>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let events = async_stream::stream! {
        let mut chunks = Box::pin(chunks);
        let mut buffer = FrameBuffer::new();

        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };

            for frame in buffer.push_bytes(chunk.as_ref()) {
                let Some(payload) = parse_frame(&frame) else {
                    if !frame.is_empty() {
                        debug!(frame = %frame, "Skipping non-data SSE frame");
                    }
                    continue;
                };
                for event in classify(payload) {
                    yield Ok(event);
                }
            }
        }

        debug!(
            discarded = buffer.remainder().len(),
            "Event stream completed"
        );
    };

    EventStream::new(Box::pin(events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Chunk source that records when it is dropped.
    struct Tracked<S> {
        inner: S,
        released: Arc<AtomicBool>,
    }

    impl<S> Drop for Tracked<S> {
        fn drop(&mut self) {
            self.released.store(true, Ordering::SeqCst);
        }
    }

    impl<S: Stream + Unpin> Stream for Tracked<S> {
        type Item = S::Item;

        fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
            self.inner.poll_next_unpin(cx)
        }
    }

    fn tracked(
        chunks: Vec<Result<&'static str, ClientError>>,
    ) -> (EventStream, Arc<AtomicBool>) {
        let released = Arc::new(AtomicBool::new(false));
        let source = Tracked {
            inner: stream::iter(chunks),
            released: released.clone(),
        };
        (decode_events(source), released)
    }

    const SAMPLE: &str = concat!(
        ": keepalive\n\n",
        "data: {\"author\":\"root_agent\"}\n\n",
        "event: message\n\n",
        "data: {\"author\":\"root_agent\",\"functionCalls\":[{\"name\":\"query_bigquery\"}]}\n\n",
        "data:{bad json\n\n",
        "data: {\"author\":\"root_agent\",\"functionResponses\":[{\"name\":\"query_bigquery\"}]}\n\n",
        "\n\n",
        "data: {\"author\":\"root_agent\",\"content\":{\"parts\":[{\"text\":\"Größe: 42 €\"}]}}\n\n",
        "data: {\"content\":{\"parts\":[{\"text\":\" done\"}]}}\n\n",
        "data: {\"author\":\"trailing\"}",
    );

    fn expected() -> Vec<ApplicationEvent> {
        let status = |m: &str| ApplicationEvent::Status {
            message: m.to_string(),
        };
        vec![
            status("Agent: root_agent is thinking..."),
            status("Agent: root_agent is calling tool: query_bigquery..."),
            status("Agent: root_agent received response from: query_bigquery..."),
            status("Agent: root_agent is thinking..."),
            ApplicationEvent::Text {
                content: "Größe: 42 €".to_string(),
            },
            ApplicationEvent::Text {
                content: " done".to_string(),
            },
        ]
    }

    async fn decode(chunks: Vec<Vec<u8>>) -> (Vec<ApplicationEvent>, StreamState) {
        let mut events = decode_events(stream::iter(chunks.into_iter().map(Ok)));
        let mut out = Vec::new();
        while let Some(event) = events.next().await {
            out.push(event.expect("no transport error"));
        }
        (out, events.state())
    }

    #[tokio::test]
    async fn test_single_chunk() {
        let (events, state) = decode(vec![SAMPLE.as_bytes().to_vec()]).await;
        assert_eq!(events, expected());
        assert_eq!(state, StreamState::Completed);
    }

    #[tokio::test]
    async fn test_every_two_way_split() {
        let bytes = SAMPLE.as_bytes();
        for split in 1..bytes.len() {
            let chunks = vec![bytes[..split].to_vec(), bytes[split..].to_vec()];
            let (events, _) = decode(chunks).await;
            assert_eq!(events, expected(), "split at byte {}", split);
        }
    }

    #[tokio::test]
    async fn test_byte_at_a_time() {
        let chunks = SAMPLE.as_bytes().iter().map(|b| vec![*b]).collect();
        let (events, _) = decode(chunks).await;
        assert_eq!(events, expected());
    }

    #[tokio::test]
    async fn test_trailing_frame_is_discarded() {
        let (events, state) = decode(vec![b"data: {\"author\":\"X\"}".to_vec()]).await;
        assert!(events.is_empty());
        assert_eq!(state, StreamState::Completed);
    }

    #[tokio::test]
    async fn test_malformed_frame_does_not_stop_later_chunks() {
        let chunks = vec![
            b"data:{bad json\n\ndata: {\"author\":\"A\"}\n\n".to_vec(),
            b"data: {\"content\":{\"parts\":[{\"text\":\"ok\"}]}}\n\n".to_vec(),
        ];
        let (events, _) = decode(chunks).await;
        assert_eq!(
            events,
            vec![
                ApplicationEvent::Status {
                    message: "Agent: A is thinking...".to_string()
                },
                ApplicationEvent::Text {
                    content: "ok".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_transport_error_fails_stream() {
        let chunks: Vec<Result<&'static str, ClientError>> = vec![
            Ok("data: {\"author\":\"A\"}\n\ndata: {\"author\":"),
            Err(ClientError::StreamRead("connection reset".to_string())),
            Ok("\"B\"}\n\n"),
        ];
        let mut events = decode_events(stream::iter(chunks));

        assert!(matches!(
            events.next().await,
            Some(Ok(ApplicationEvent::Status { .. }))
        ));
        assert_eq!(events.state(), StreamState::Streaming);
        assert!(matches!(
            events.next().await,
            Some(Err(ClientError::StreamRead(_)))
        ));
        assert_eq!(events.state(), StreamState::Failed);
        assert!(events.is_terminated());
        assert!(events.next().await.is_none());
        assert_eq!(events.state(), StreamState::Failed);
    }

    #[tokio::test]
    async fn test_non_data_frames_yield_nothing() {
        let chunks = vec![b"event: ping\n\n: comment\n\nid: 7\n\n data: {\"author\":\"X\"}\n\n".to_vec()];
        let (events, state) = decode(chunks).await;
        assert!(events.is_empty());
        assert_eq!(state, StreamState::Completed);
    }

    #[tokio::test]
    async fn test_transport_released_on_completion() {
        let (mut events, released) = tracked(vec![
            Ok("data: {\"author\":\"A\"}\n\n"),
            Ok("data: {\"author\":\"B\"}\n\n"),
        ]);

        while let Some(event) = events.next().await {
            event.expect("no transport error");
        }
        assert_eq!(events.state(), StreamState::Completed);
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_transport_released_on_failure() {
        let (mut events, released) = tracked(vec![
            Err(ClientError::StreamRead("connection reset".to_string())),
            Ok("data: {\"author\":\"A\"}\n\n"),
        ]);

        assert!(matches!(events.next().await, Some(Err(_))));
        assert_eq!(events.state(), StreamState::Failed);
        assert!(released.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_transport_released_on_early_drop() {
        let (mut events, released) = tracked(vec![
            Ok("data: {\"author\":\"A\"}\n\n"),
            Ok("data: {\"author\":\"B\"}\n\n"),
        ]);

        assert!(matches!(events.next().await, Some(Ok(_))));
        assert_eq!(events.state(), StreamState::Streaming);
        assert!(!released.load(Ordering::SeqCst));

        drop(events);
        assert!(released.load(Ordering::SeqCst));
    }
}
