use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::id::{seed_of, seed_of_str, MessageId, Seed};

/// A stored greeting. Field names on the wire match the `messages.json`
/// data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    pub name: String,
    #[serde(rename = "message")]
    pub text: String,
    #[serde(rename = "timestamp", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_hash: Option<String>,
}

impl MessageRecord {
    pub fn new(id: impl Into<MessageId>, name: &str, text: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.to_owned(),
            text: text.to_owned(),
            created_at,
            visitor_token: None,
            share_token: None,
            ip_hash: None,
        }
    }

    /// Layout seed for this record at display position `index`. Records
    /// without an id fall back to `"{name}-{index}"`.
    pub fn seed(&self, index: usize) -> Seed {
        match &self.id {
            Some(id) => seed_of(id),
            None => seed_of_str(&format!("{}-{index}", self.name)),
        }
    }
}

/// A message as submitted, before the store assigns ids and tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMessage {
    pub name: String,
    pub text: String,
    /// Token the client already holds, if any.
    pub visitor_token: Option<String>,
    /// Submitter address. Only its hash is stored.
    pub client_ip: Option<String>,
}

impl NewMessage {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn visitor_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.visitor_token = (!token.is_empty()).then_some(token);
        self
    }

    pub fn client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = Some(ip.into());
        self
    }

    /// Returns the trimmed `(name, text)` pair, rejecting blanks.
    pub fn validate(&self) -> Result<(&str, &str), ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let text = self.text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        Ok((name, text))
    }
}

/// Shown when the store cannot be reached.
pub fn fallback_messages() -> Vec<MessageRecord> {
    vec![MessageRecord::new(
        1,
        "Admin",
        "Chúc mừng ngày Phụ nữ Việt Nam 20/10! 💐",
        Utc::now(),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_data_file_shape() {
        let raw = r#"[{
            "id": 1760870400000,
            "name": "Lan",
            "message": "Happy day!",
            "visitorToken": "abcDEF123456",
            "ipHash": "deadbeef",
            "shareToken": "tok12345678",
            "timestamp": "2025-10-19T10:00:00.000Z"
        }]"#;
        let records: Vec<MessageRecord> = serde_json::from_str(raw).expect("data file should parse");
        let record = &records[0];
        assert_eq!(record.id, Some(MessageId::Int(1_760_870_400_000)));
        assert_eq!(record.text, "Happy day!");
        assert_eq!(record.share_token.as_deref(), Some("tok12345678"));
        assert_eq!(record.created_at.to_rfc3339(), "2025-10-19T10:00:00+00:00");

        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["message"], "Happy day!");
        assert_eq!(json["visitorToken"], "abcDEF123456");
    }

    #[test]
    fn records_without_id_seed_from_name_and_index() {
        let mut record = MessageRecord::new(7, "Mai", "hi", Utc::now());
        assert_eq!(record.seed(3), seed_of(7));
        record.id = None;
        assert_eq!(record.seed(3), seed_of("Mai-3"));
        assert_ne!(record.seed(3), record.seed(4));
    }

    #[test]
    fn validation_trims_and_rejects_blanks() {
        let draft = NewMessage::new("  Hoa  ", "\tchúc mừng\n");
        assert_eq!(draft.validate(), Ok(("Hoa", "chúc mừng")));
        assert_eq!(NewMessage::new("   ", "x").validate(), Err(ValidationError::EmptyName));
        assert_eq!(NewMessage::new("x", " \n ").validate(), Err(ValidationError::EmptyText));
    }

    #[test]
    fn empty_visitor_token_is_ignored() {
        assert_eq!(NewMessage::new("a", "b").visitor_token("").visitor_token, None);
    }
}
