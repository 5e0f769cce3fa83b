//! Request and response bodies of the agent service, and the session handle.

use serde::{Deserialize, Serialize};

/// Conversation handle returned by session creation.
///
/// Carries the identity the session was created with so that every message
/// sent on it is addressed consistently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
}

/// Body of `POST /apps/{appName}/users/{userId}/sessions`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub app_name: String,
    pub user_id: String,
}

/// Successful session creation response. Other fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionResponse {
    pub id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessagePart {
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewMessage {
    pub parts: Vec<MessagePart>,
    pub role: Role,
}

/// Body of `POST /run_sse`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
    #[serde(rename = "new_message")]
    pub new_message: NewMessage,
}

impl RunRequest {
    /// A single user text message on `session`.
    pub fn new(session: &Session, message: impl Into<String>) -> Self {
        Self {
            app_name: session.app_name.clone(),
            user_id: session.user_id.clone(),
            session_id: session.id.clone(),
            new_message: NewMessage {
                parts: vec![MessagePart {
                    text: message.into(),
                }],
                role: Role::User,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_request_wire_format() {
        let session = Session {
            id: "s-1".to_string(),
            app_name: "agent".to_string(),
            user_id: "u-1".to_string(),
        };
        let body = serde_json::to_value(RunRequest::new(&session, "Hello")).unwrap();
        assert_eq!(
            body,
            json!({
                "appName": "agent",
                "userId": "u-1",
                "sessionId": "s-1",
                "new_message": {"parts": [{"text": "Hello"}], "role": "user"}
            })
        );
    }

    #[test]
    fn test_create_session_wire_format() {
        let body = serde_json::to_value(CreateSessionRequest {
            app_name: "agent".to_string(),
            user_id: "u-1".to_string(),
        })
        .unwrap();
        assert_eq!(body, json!({"appName": "agent", "userId": "u-1"}));
    }

    #[test]
    fn test_session_response_ignores_extra_fields() {
        let resp: SessionResponse =
            serde_json::from_str(r#"{"id":"abc","appName":"agent","state":{},"events":[]}"#).unwrap();
        assert_eq!(resp.id, "abc");
        assert!(serde_json::from_str::<SessionResponse>(r#"{"appName":"agent"}"#).is_err());
    }
}
