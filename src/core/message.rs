//! Conversation log entries and inbound transport data
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who produced a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }
}

/// One entry of a session's message log
///
/// Entries are appended in chronological order and never edited in place;
/// clearing rewrites the whole sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub from: Sender,
    #[serde(default)]
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_welcome: bool,
}

impl Message {
    pub fn new(from: Sender, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            from,
            text: text.into(),
            timestamp,
            is_welcome: false,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text, Utc::now())
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text, Utc::now())
    }

    pub fn welcome(text: impl Into<String>) -> Self {
        Self {
            is_welcome: true,
            ..Self::bot(text)
        }
    }
}

/// What the transport tells us about where a message came from
#[derive(Debug, Clone, Default)]
pub struct SenderContext {
    /// Transport-level user id, used in export file names
    pub user_id: Option<String>,
    /// Service URL reported by the channel (e.g. `https://smba.example.net/`)
    pub service_url: Option<String>,
    /// Channel identifier; `emulator` marks a local test channel
    pub channel_id: Option<String>,
}

impl SenderContext {
    pub fn is_emulator(&self) -> bool {
        self.channel_id.as_deref() == Some("emulator")
    }
}

/// A message delivered by the transport
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub text: String,
    pub session_id: String,
    pub sender: SenderContext,
}

impl InboundMessage {
    pub fn new(text: impl Into<String>, session_id: impl Into<String>, sender: SenderContext) -> Self {
        Self {
            text: text.into(),
            session_id: session_id.into(),
            sender,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_json_shape() {
        let ts = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let msg = Message::new(Sender::User, "hello", ts);
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["from"], "user");
        assert_eq!(json["text"], "hello");
        assert!(json.get("isWelcome").is_none());
    }

    #[test]
    fn test_welcome_flag_round_trips() {
        let msg = Message::welcome("hi there");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"isWelcome\":true"));

        let back: Message = serde_json::from_str(&json).unwrap();
        assert!(back.is_welcome);
        assert_eq!(back.from, Sender::Bot);
    }

    #[test]
    fn test_parses_millisecond_timestamps() {
        let raw = r#"{"from":"bot","text":"ok","timestamp":"2024-05-01T10:00:00.123Z"}"#;
        let msg: Message = serde_json::from_str(raw).unwrap();
        assert_eq!(msg.from, Sender::Bot);
        assert!(!msg.is_welcome);
    }

    #[test]
    fn test_emulator_detection() {
        let ctx = SenderContext {
            channel_id: Some("emulator".to_string()),
            ..Default::default()
        };
        assert!(ctx.is_emulator());
        assert!(!SenderContext::default().is_emulator());
    }
}
