//! Agent service trait, its HTTP implementation and error types.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use thiserror::Error;
use tracing::debug;

use crate::event::ApplicationEvent;
use crate::http::{build_http_client, RequestBuilderExt, ResponseExt};
use crate::model::{CreateSessionRequest, RunRequest, Session, SessionResponse};
use crate::options::{AgentOptions, TransportOptions};
use crate::sse::SSEResponseExt;
use crate::stream::EventStream;

/// Errors that can occur during client operations.
///
/// A malformed event payload is not among them: it is logged and skipped
/// without interrupting the stream.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("API error: {status} - {}", or_unknown(.body))]
    Api { status: u16, body: String },

    /// Reading the event stream failed after it had started.
    #[error("Stream read error: {0}")]
    StreamRead(String),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn or_unknown(body: &str) -> &str {
    if body.is_empty() {
        "Unknown error"
    } else {
        body
    }
}

/// A conversational agent reachable over request/response plus event streams.
///
/// # Example
/// ```rust,ignore
/// let session = service.create_session().await?;
/// let mut events = service.send_message(&session, "Hello").await?;
/// while let Some(event) = events.next().await {
///     match event? {
///         ApplicationEvent::Status { message } => eprintln!("{}", message),
///         ApplicationEvent::Text { content } => print!("{}", content),
///     }
/// }
/// ```
#[async_trait]
pub trait AgentService: Send + Sync {
    /// Create a conversation session. Must succeed before any message is sent.
    async fn create_session(&self) -> Result<Session, ClientError>;

    /// Send a user message and stream the agent's reply.
    ///
    /// Fails without returning a stream if the service rejects the request.
    async fn send_message(
        &self,
        session: &Session,
        message: &str,
    ) -> Result<EventStream, ClientError>;

    /// Send a message and concatenate the text of the reply.
    ///
    /// Status events are dropped. Fails if the stream fails, even after
    /// some text has arrived.
    async fn send_and_collect(
        &self,
        session: &Session,
        message: &str,
    ) -> Result<String, ClientError> {
        let mut events = self.send_message(session, message).await?;
        let mut reply = String::new();
        while let Some(event) = events.next().await {
            if let ApplicationEvent::Text { content } = event? {
                reply.push_str(&content);
            }
        }
        Ok(reply)
    }
}

/// HTTP client for an agent server exposing the session and `/run_sse`
/// endpoints.
#[derive(Debug, Clone)]
pub struct AdkClient {
    agent_options: AgentOptions,
    transport_options: TransportOptions,
    http: reqwest::Client,
}

impl AdkClient {
    /// Fails with [`ClientError::Config`] if the transport options are
    /// unusable, e.g. an invalid extra header.
    pub fn new(
        agent_options: AgentOptions,
        transport_options: TransportOptions,
    ) -> Result<Self, ClientError> {
        let http = build_http_client(&transport_options)?;
        Ok(Self {
            agent_options,
            transport_options,
            http,
        })
    }

    /// Client configured from `ADK_*` environment variables.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(AgentOptions::from_env(), TransportOptions::from_env()?)
    }

    pub fn agent_options(&self) -> &AgentOptions {
        &self.agent_options
    }

    pub fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(self.transport_options.url(path))
            .header(CONTENT_TYPE, "application/json")
    }
}

#[async_trait]
impl AgentService for AdkClient {
    async fn create_session(&self) -> Result<Session, ClientError> {
        let AgentOptions { app_name, user_id } = &self.agent_options;
        let path = format!(
            "/apps/{}/users/{}/sessions",
            urlencoding::encode(app_name),
            urlencoding::encode(user_id)
        );

        let body = CreateSessionRequest {
            app_name: app_name.clone(),
            user_id: user_id.clone(),
        };

        let response = self
            .post(&path)
            .json_logged(&body)
            .send()
            .await?
            .error_for_api_status()
            .await?;

        let text = response.text().await?;
        let session: SessionResponse = serde_json::from_str(&text)?;
        debug!(session_id = %session.id, "Created session");

        Ok(Session {
            id: session.id,
            app_name: app_name.clone(),
            user_id: user_id.clone(),
        })
    }

    async fn send_message(
        &self,
        session: &Session,
        message: &str,
    ) -> Result<EventStream, ClientError> {
        let body = RunRequest::new(session, message);

        let response = self
            .post("/run_sse")
            .header(ACCEPT, "text/event-stream")
            .json_logged(&body)
            .send()
            .await?
            .error_for_api_status()
            .await?;

        Ok(response.agent_events())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ClientError::Api {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 500 - boom");

        let err = ClientError::Api {
            status: 502,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "API error: 502 - Unknown error");
    }

    #[test]
    fn test_new_rejects_invalid_extra_header() {
        let transport = TransportOptions::default().with_header("X-Id".to_string(), "a\r\nb".to_string());
        assert!(matches!(
            AdkClient::new(AgentOptions::default(), transport),
            Err(ClientError::Config(_))
        ));
    }
}
