//! Error types for the protocol layer.
//!
//! Each crate defines its own error enum. This keeps errors specific and
//! meaningful — when you see a `ProtocolError`, you know the problem is in
//! serialization/validation, not in networking or room management.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message is invalid at the protocol level: passes deserialization
    /// but violates a protocol rule (e.g. a handshake with version 0).
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A `RoomSettings`/`RoomSettingsPatch` value fails validation
    /// (out-of-range field, custom word list too short, ...).
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// The normative client-visible error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientErrorCode {
    AuthFailed,
    ProfileIncomplete,
    AuthExpired,
    BadRequest,
    RateLimited,
    RoomNotFound,
    RoomFull,
    GameInProgress,
    NotHost,
    NotDrawer,
    NotDrawerChat,
    InvalidWord,
    InvalidSettings,
    PlayerNotFound,
    AlreadyGuessed,
    GameNotActive,
    Backpressure,
}

impl ClientErrorCode {
    /// A stable numeric code, following an HTTP-status-like `400`/`401`/`404`
    /// convention for protocol errors.
    pub fn numeric(self) -> u32 {
        use ClientErrorCode::*;
        match self {
            AuthFailed | ProfileIncomplete | AuthExpired => 401,
            BadRequest | InvalidWord | InvalidSettings => 400,
            RateLimited => 429,
            RoomNotFound | PlayerNotFound => 404,
            RoomFull | GameInProgress | AlreadyGuessed | GameNotActive => 409,
            NotHost | NotDrawer | NotDrawerChat => 403,
            Backpressure => 503,
        }
    }
}

impl std::fmt::Display for ClientErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_codes_match_spec_convention() {
        assert_eq!(ClientErrorCode::RoomNotFound.numeric(), 404);
        assert_eq!(ClientErrorCode::BadRequest.numeric(), 400);
        assert_eq!(ClientErrorCode::AuthFailed.numeric(), 401);
        assert_eq!(ClientErrorCode::RateLimited.numeric(), 429);
    }

    #[test]
    fn test_error_code_json_is_snake_case() {
        let json = serde_json::to_string(&ClientErrorCode::NotDrawerChat).unwrap();
        assert_eq!(json, "\"not_drawer_chat\"");
    }
}
