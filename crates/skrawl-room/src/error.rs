//! Error types for the room layer.

use skrawl_protocol::{ClientErrorCode, RoomId, UserId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room is full — no more player slots available.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The player is already in this room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(UserId, RoomId),

    /// The player is not in this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(UserId, RoomId),

    /// A game is already in progress; the operation (e.g. joining a
    /// public room at capacity policy, changing settings) isn't allowed.
    #[error("room {0} has a game in progress")]
    GameInProgress(RoomId),

    /// The player is not the room's current host.
    #[error("player {0} is not the host of room {1}")]
    NotHost(UserId, RoomId),

    /// A non-drawer attempted a drawer-only action (draw op, word select).
    #[error("player {0} is not the current drawer")]
    NotDrawer(UserId),

    /// A chat message arrived during the drawing phase from the current
    /// drawer, who must not leak the word in chat.
    #[error("the current drawer cannot send chat during drawing")]
    NotDrawerChat,

    /// `select_word` or a custom word doesn't satisfy the word domain.
    #[error("invalid word: {0}")]
    InvalidWord(String),

    /// A settings patch failed validation.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Referenced a player who isn't in the room.
    #[error("player {0} not found")]
    PlayerNotFound(UserId),

    /// The player already guessed correctly this turn.
    #[error("player {0} already guessed correctly this turn")]
    AlreadyGuessed(UserId),

    /// The room isn't mid-game (e.g. a guess arrived while `waiting`).
    #[error("room {0} has no active game")]
    GameNotActive(RoomId),

    /// The room is in a state that doesn't allow this operation.
    #[error("invalid room state for this operation: {0}")]
    InvalidState(String),

    /// The caller is being rate limited.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The room's command channel is full or closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

impl RoomError {
    /// Maps this error onto the client-visible error code, so the transport
    /// layer can report it without matching on every variant itself.
    pub fn code(&self) -> ClientErrorCode {
        use RoomError::*;
        match self {
            NotFound(_) => ClientErrorCode::RoomNotFound,
            RoomFull(_) => ClientErrorCode::RoomFull,
            AlreadyInRoom(_, _) | GameInProgress(_) => ClientErrorCode::GameInProgress,
            NotHost(_, _) => ClientErrorCode::NotHost,
            NotDrawer(_) => ClientErrorCode::NotDrawer,
            NotDrawerChat => ClientErrorCode::NotDrawerChat,
            InvalidWord(_) => ClientErrorCode::InvalidWord,
            InvalidSettings(_) => ClientErrorCode::InvalidSettings,
            PlayerNotFound(_) | NotInRoom(_, _) => ClientErrorCode::PlayerNotFound,
            AlreadyGuessed(_) => ClientErrorCode::AlreadyGuessed,
            GameNotActive(_) => ClientErrorCode::GameNotActive,
            InvalidState(_) => ClientErrorCode::BadRequest,
            RateLimited { .. } => ClientErrorCode::RateLimited,
            Unavailable(_) => ClientErrorCode::Backpressure,
        }
    }
}
