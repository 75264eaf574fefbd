//! Opaque identifiers used throughout the wire protocol.

use std::fmt;

/// A stable player identity minted by the external identity provider (C1).
///
/// Unlike a locally-assigned sequence number, `UserId` is opaque to this
/// server: it is whatever the identity gateway says it is, so it is modeled
/// as a `String` rather than an integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A room's public identifier: 6 lowercase-base36 characters, unique among
/// live rooms in the registry (rejection-sampled, see `skrawl_room::ids`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// An 8-char base36 invite code minted for private rooms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct InviteCode(pub String);

impl InviteCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InviteCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A monotonically increasing turn counter, scoped to a single room.
///
/// Timers are keyed by `(room_id, turn_id, purpose)`; a timer that fires
/// with a stale `turn_id` is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct TurnId(pub u64);

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "turn-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_display() {
        let id = UserId::new("abc123");
        assert_eq!(id.to_string(), "abc123");
    }

    #[test]
    fn test_room_id_display() {
        let id = RoomId::new("a1b2c3");
        assert_eq!(id.to_string(), "R-a1b2c3");
    }

    #[test]
    fn test_invite_code_display() {
        let code = InviteCode::new("a1b2c3d4");
        assert_eq!(code.to_string(), "a1b2c3d4");
    }

    #[test]
    fn test_turn_id_display_and_ordering() {
        assert_eq!(TurnId(3).to_string(), "turn-3");
        assert!(TurnId(1) < TurnId(2));
    }

    #[test]
    fn test_user_id_json_roundtrip() {
        let id = UserId::new("u-42");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"u-42\"");
        let back: UserId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
