//! Contact Message Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: MessageStatus,
    pub admin_reply: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus { #[default] Unread, Read, Replied }

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Unread => "unread", Self::Read => "read", Self::Replied => "replied" }
    }
}

impl FromStr for MessageStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(Self::Unread),
            "read" => Ok(Self::Read),
            "replied" => Ok(Self::Replied),
            other => Err(format!("unknown message status: {other}")),
        }
    }
}

impl ContactMessage {
    pub fn new(name: String, email: String, subject: String, message: String) -> Self {
        Self { id: Uuid::now_v7(), name, email, subject, message, status: MessageStatus::Unread, admin_reply: None, created_at: Utc::now() }
    }

    pub fn reply(&mut self, reply: impl Into<String>) {
        self.admin_reply = Some(reply.into());
        self.status = MessageStatus::Replied;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_marks_replied() {
        let mut m = ContactMessage::new("Asha".into(), "asha@example.com".into(), "Late order".into(), "Where is it?".into());
        assert_eq!(m.status, MessageStatus::Unread);
        m.reply("Shipped today");
        assert_eq!(m.status, MessageStatus::Replied);
        assert_eq!(m.admin_reply.as_deref(), Some("Shipped today"));
    }
}
