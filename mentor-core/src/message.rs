use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

/// A single entry in the conversation history.
///
/// Messages are immutable once created; the conversation only ever appends
/// new ones or replaces the whole sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message with a fresh identifier stamped at the current instant.
    pub fn new(content: impl Into<String>, sender: Sender) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    pub fn is_bot(&self) -> bool {
        self.sender == Sender::Bot
    }

    /// Human-readable age of the message relative to `now`, e.g. "5 minutes ago".
    pub fn age(&self, now: DateTime<Utc>) -> String {
        time_ago(self.timestamp, now)
    }
}

/// Formats the distance between two instants the way chat UIs label messages.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 0 {
        return "just now".to_string();
    }

    let minutes = (secs + 30) / 60;
    match minutes {
        0 => "less than a minute ago".to_string(),
        1 => "1 minute ago".to_string(),
        2..=44 => format!("{} minutes ago", minutes),
        45..=89 => "about 1 hour ago".to_string(),
        90..=1439 => format!("about {} hours ago", (minutes + 30) / 60),
        1440..=2519 => "1 day ago".to_string(),
        2520..=43199 => format!("{} days ago", (minutes + 720) / 1440),
        43200..=86399 => "about 1 month ago".to_string(),
        86400..=525599 => format!("{} months ago", minutes / 43200),
        _ => {
            let years = minutes / 525600;
            if years == 1 {
                "about 1 year ago".to_string()
            } else {
                format!("about {} years ago", years)
            }
        }
    }
}
