//! Opaque pagination cursor.
//!
//! A cursor pins an absolute position in the `(created_at, id)` total order
//! of a result stream. Clients must treat the token as a black box; the
//! encoding is URL-safe base64 over a small JSON struct and may change.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use huddle_common::{AppError, AppResult};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};

/// Decoded cursor position: the `(created_at, id)` of the last item on the
/// previous page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCursor {
    /// ID of the last item returned.
    pub id: String,
    /// Creation timestamp of the last item returned.
    pub created_at: DateTimeWithTimeZone,
}

impl MessageCursor {
    /// Encode the cursor into its opaque token form.
    #[must_use]
    pub fn encode(&self) -> String {
        // Serialization of this struct cannot fail
        #[allow(clippy::unwrap_used)]
        let json = serde_json::to_vec(self).unwrap();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode an opaque token back into a cursor position.
    ///
    /// Malformed tokens are a client error, not a server fault.
    pub fn decode(token: &str) -> AppResult<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|_| AppError::Validation("Invalid cursor".to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|_| AppError::Validation("Invalid cursor".to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let cursor = MessageCursor {
            id: "01hqv3e9lowercase".to_string(),
            created_at: chrono::Utc::now().into(),
        };

        let token = cursor.encode();
        let decoded = MessageCursor::decode(&token).unwrap();
        assert_eq!(decoded, cursor);
    }

    #[test]
    fn test_token_is_urlsafe() {
        let cursor = MessageCursor {
            id: "msg1".to_string(),
            created_at: chrono::Utc::now().into(),
        };
        let token = cursor.encode();
        assert!(!token.contains('+'));
        assert!(!token.contains('/'));
        assert!(!token.contains('='));
    }

    #[test]
    fn test_decode_garbage_is_validation_error() {
        let result = MessageCursor::decode("not a cursor!!");
        assert!(matches!(result, Err(AppError::Validation(_))));

        // Valid base64, invalid payload
        let token = URL_SAFE_NO_PAD.encode(b"{\"nope\":1}");
        let result = MessageCursor::decode(&token);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
