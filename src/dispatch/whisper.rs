//! Whisper query parsing.
//!
//! An inline query of the form `secret text @username` (or a numeric user
//! id instead of the username) addresses a whisper to one receiver.

/// Who a whisper is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receiver {
    Username(String),
    UserId(i64),
}

/// A parsed whisper: message text plus its receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhisperDraft {
    pub text: String,
    pub receiver: Receiver,
}

impl WhisperDraft {
    /// Parses an inline query. Returns None when there is no receiver or
    /// no text.
    pub fn parse(query: &str) -> Option<Self> {
        let mut tokens: Vec<&str> = query.split_whitespace().collect();
        let receiver = parse_receiver(tokens.pop()?)?;

        if tokens.is_empty() {
            return None;
        }

        Some(Self {
            text: tokens.join(" "),
            receiver,
        })
    }
}

fn parse_receiver(token: &str) -> Option<Receiver> {
    if let Some(name) = token.strip_prefix('@') {
        let valid = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        return valid.then(|| Receiver::Username(name.to_string()));
    }

    token
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .map(Receiver::UserId)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_username_receiver() {
        let draft = WhisperDraft::parse("meet me at  noon @bob_1").unwrap();
        assert_eq!(draft.text, "meet me at noon");
        assert_eq!(draft.receiver, Receiver::Username("bob_1".to_string()));
    }

    #[test]
    fn test_parse_numeric_receiver() {
        let draft = WhisperDraft::parse("hello 123456").unwrap();
        assert_eq!(draft.receiver, Receiver::UserId(123456));
    }

    #[test]
    fn test_parse_rejects_missing_parts() {
        assert_eq!(WhisperDraft::parse(""), None);
        assert_eq!(WhisperDraft::parse("@bob"), None);
        assert_eq!(WhisperDraft::parse("hello world"), None);
        assert_eq!(WhisperDraft::parse("hello @"), None);
        assert_eq!(WhisperDraft::parse("hello -5"), None);
        assert_eq!(WhisperDraft::parse("hello @bo-b"), None);
    }
}
