//! The game event catalogue.
//!
//! These are distinct from `system.rs`'s framework messages: everything
//! here is specific to the drawing/guessing game itself, once a player is
//! inside a room.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::UserId;
use crate::settings::RoomSettingsPatch;
use crate::snapshot::{DrawOp, GameResult, LobbyMessage, RoomSnapshot, TurnResult, TurnSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    UpdateRoomSettings { settings: RoomSettingsPatch },
    StartGame,
    PlayerReady { ready: bool },
    SelectWord { word: String },
    DrawOp { op: DrawOp },
    CanvasClear,
    CanvasUndo,
    ChatMessage { text: String },
    LobbyChat { text: String },
    RequestCanvasSync,
    VoteKick { user_id: UserId },
    VoteSkip,
    Ping { t: u64 },
    MobileEvent { tag: String, data: serde_json::Value },
    ConnectionQuality { description: serde_json::Value },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    RoomSettingsUpdated { settings: crate::settings::RoomSettings },
    LobbyMessage { message: LobbyMessage },
    PlayerReadyChanged { user_id: UserId, ready: bool },
    GameStarting { snapshot: RoomSnapshot },
    TurnStarting { turn: TurnSnapshot },
    WordSelection { choices: Vec<String>, deadline_ms: u64 },
    DrawingStroke { op: DrawOp },
    CanvasCleared,
    CanvasState { snapshot: Vec<DrawOp> },
    ChatMessage { message: LobbyMessage },
    PlayerGuessed { user_id: UserId },
    CorrectGuess { user_id: UserId, word: String },
    CloseGuess,
    TimerUpdate { remaining_ms: u64 },
    HintRevealed { index: u32, letter: char },
    ScoreUpdate { scores: HashMap<UserId, u32> },
    TurnEnded { result: TurnResult },
    RoundEnded { scores: HashMap<UserId, u32> },
    GameEnded { result: GameResult },
    Pong { t: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Point, Tool};

    #[test]
    fn test_chat_message_json_shape() {
        let event = ClientEvent::ChatMessage {
            text: "apple".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "chat_message");
        assert_eq!(json["text"], "apple");
    }

    #[test]
    fn test_draw_op_event_roundtrip() {
        let event = ClientEvent::DrawOp {
            op: DrawOp::Stroke {
                tool: Tool::Pen,
                color: "#000000".into(),
                size: 2,
                points: vec![Point { x: 0.0, y: 0.0 }],
                user_id: UserId::new("u1"),
            },
        };
        let bytes = serde_json::to_vec(&event).unwrap();
        let back: ClientEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_vote_skip_has_no_extra_fields() {
        let json = serde_json::to_value(&ClientEvent::VoteSkip).unwrap();
        assert_eq!(json, serde_json::json!({"type": "vote_skip"}));
    }

    #[test]
    fn test_hint_revealed_roundtrip() {
        let event = ServerEvent::HintRevealed { index: 2, letter: 'a' };
        let bytes = serde_json::to_vec(&event).unwrap();
        let back: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(event, back);
    }

    #[test]
    fn test_garbage_decode_fails() {
        let result: Result<ClientEvent, _> = serde_json::from_str(r#"{"type":"unknown_event"}"#);
        assert!(result.is_err());
    }
}
