//! Incoming Telegram update DTOs
//!
//! Only the fields the dispatcher reads are modelled; everything else in
//! the payload is ignored.

use serde::Deserialize;

/// Telegram user as it appears in updates.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

/// Query typed by a user in inline mode.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InlineQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub query: String,
}

/// Button press on an inline keyboard.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub inline_message_id: Option<String>,
}

/// One update delivered by the webhook.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub inline_query: Option<InlineQuery>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

/// Which payload an update carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Message,
    InlineQuery,
    CallbackQuery,
    Unknown,
}

impl Update {
    pub fn kind(&self) -> UpdateKind {
        if self.inline_query.is_some() {
            UpdateKind::InlineQuery
        } else if self.callback_query.is_some() {
            UpdateKind::CallbackQuery
        } else if self.message.is_some() {
            UpdateKind::Message
        } else {
            UpdateKind::Unknown
        }
    }

    /// Id of the user who triggered the update, if any.
    pub fn sender_id(&self) -> Option<i64> {
        if let Some(query) = &self.inline_query {
            return Some(query.from.id);
        }
        if let Some(callback) = &self.callback_query {
            return Some(callback.from.id);
        }
        self.message
            .as_ref()
            .and_then(|m| m.from.as_ref())
            .map(|u| u.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_query_update_deserialize() {
        let json = r#"{
            "update_id": 10,
            "inline_query": {
                "id": "q-1",
                "from": {"id": 42, "first_name": "Sara", "is_bot": false},
                "query": "hello @bob",
                "offset": ""
            }
        }"#;

        let update: Update = serde_json::from_str(json).unwrap();
        assert_eq!(update.kind(), UpdateKind::InlineQuery);
        assert_eq!(update.sender_id(), Some(42));
        assert_eq!(update.inline_query.unwrap().query, "hello @bob");
    }

    #[test]
    fn test_message_update_deserialize() {
        let json = r#"{
            "update_id": 11,
            "message": {
                "message_id": 5,
                "from": {"id": 7, "first_name": "Ali"},
                "chat": {"id": 7, "type": "private"},
                "text": "/start"
            }
        }"#;

        let update: Update = serde_json::from_str(json).unwrap();
        assert_eq!(update.kind(), UpdateKind::Message);
        assert_eq!(update.sender_id(), Some(7));
    }

    #[test]
    fn test_unknown_update() {
        let update: Update = serde_json::from_str(r#"{"update_id": 12}"#).unwrap();
        assert_eq!(update.kind(), UpdateKind::Unknown);
        assert_eq!(update.sender_id(), None);
    }

    #[test]
    fn test_missing_update_id_fails() {
        let result: Result<Update, _> = serde_json::from_str(r#"{"message": null}"#);
        assert!(result.is_err());
    }
}
