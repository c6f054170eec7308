use chrono::{DateTime, Utc};
use serde::Serialize;

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderType {
    User,
    System,
}

impl SenderType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SenderType::User => "user",
            SenderType::System => "system",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Chat {
    pub id: String,
    pub chat_title: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: String,
    pub chat_id: String,
    pub text: String,
    pub sent_by: SenderType,
    pub created_at: DateTime<Utc>,
}
