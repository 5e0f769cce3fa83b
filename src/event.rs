//! Agent event payloads and their mapping to UI-facing notifications.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Name shown when a tool call or response carries no `name`.
const UNKNOWN_TOOL: &str = "unknown";

/// Notification derived from one agent event.
///
/// Serializes as `{"type": "status", "message": ...}` or
/// `{"type": "text", "content": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ApplicationEvent {
    /// Progress of the agent. Transient: each status replaces the previous one.
    Status { message: String },

    /// Fragment of the reply, to be appended to the output.
    Text { content: String },
}

impl ApplicationEvent {
    /// Whether the event should be replaced, rather than appended, by the next one.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApplicationEvent::Status { .. })
    }
}

impl std::fmt::Display for ApplicationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationEvent::Status { message } => f.write_str(message),
            ApplicationEvent::Text { content } => f.write_str(content),
        }
    }
}

/// JSON payload of a `data:` frame. Every field is optional.
///
/// Fields are read independently: a field of an unexpected type is treated
/// as absent and does not affect its siblings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentEvent {
    #[serde(default, deserialize_with = "truthy_scalar")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub content: Option<EventContent>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub function_calls: Option<Vec<ToolRef>>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub function_responses: Option<Vec<ToolRef>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventContent {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub parts: Option<Vec<EventPart>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventPart {
    #[serde(default, deserialize_with = "lenient")]
    pub text: Option<String>,
}

/// Entry of `functionCalls` or `functionResponses`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToolRef {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

/// `None` when the value does not have the expected shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// An array read element by element; elements of the wrong shape become
/// their default. Anything other than an array is `None`.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .map(|item| T::deserialize(item).unwrap_or_default())
                .collect(),
        ),
        _ => None,
    })
}

/// A truthy string, number or boolean rendered as text.
fn truthy_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    })
}

impl ToolRef {
    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_TOOL)
    }
}

impl AgentEvent {
    /// Parse a frame payload.
    ///
    /// Only invalid JSON is an error. Valid JSON that is not an object
    /// carries no fields and parses as an empty event.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<Value>(payload)? {
            value @ Value::Object(_) => Self::deserialize(value),
            other => {
                debug!(payload = %other, "SSE payload is not an object");
                Ok(Self::default())
            }
        }
    }

    /// Status line for this event, if it names an author.
    ///
    /// Only the first tool call or response is inspected, and calls win over
    /// responses.
    pub fn status_message(&self) -> Option<String> {
        let author = self.author.as_deref().filter(|a| !a.is_empty())?;

        let first_call = self.function_calls.as_ref().and_then(|calls| calls.first());
        let first_response = self
            .function_responses
            .as_ref()
            .and_then(|responses| responses.first());

        let message = match (first_call, first_response) {
            (Some(call), _) => format!(
                "Agent: {} is calling tool: {}...",
                author,
                call.display_name()
            ),
            (None, Some(response)) => format!(
                "Agent: {} received response from: {}...",
                author,
                response.display_name()
            ),
            (None, None) => format!("Agent: {} is thinking...", author),
        };

        Some(message)
    }

    /// Text of the first content part, if non-empty. Later parts are ignored.
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_ref()?
            .parts
            .as_deref()?
            .first()?
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
    }

    /// Notifications for this event: a status, then a text fragment, either
    /// of which may be absent.
    pub fn application_events(&self) -> Vec<ApplicationEvent> {
        let mut events = Vec::with_capacity(2);
        if let Some(message) = self.status_message() {
            events.push(ApplicationEvent::Status { message });
        }
        if let Some(content) = self.text() {
            events.push(ApplicationEvent::Text {
                content: content.to_string(),
            });
        }
        events
    }
}

/// Classify a frame payload into application events.
///
/// A payload that is not valid JSON is logged and yields nothing; it never
/// ends the stream it came from.
pub fn classify(payload: &str) -> Vec<ApplicationEvent> {
    match AgentEvent::parse(payload) {
        Ok(event) => event.application_events(),
        Err(e) => {
            warn!(error = %e, payload, "Dropping malformed SSE event");
            Vec::new()
        }
    }
}
