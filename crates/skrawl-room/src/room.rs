//! Room actor: an isolated Tokio task that owns one drawing-game instance.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc command channel plus a per-player outbound channel. This
//! is the "actor model" — no shared mutable state, just message passing.
//! Inside the actor there are exactly two places execution can suspend:
//! sending to a player's outbound channel, and awaiting the next expired
//! timer.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use skrawl_protocol::{
    ClientEvent, ConnectionState, DrawOp, GameResult, GuessResult, RoomId, RoomSettings, RoomSnapshot,
    ServerEvent, ServerPayload, ServerSystemMessage, TurnEndReason, TurnId, TurnResult, UserId,
    Visibility, WordMode,
};
use skrawl_session::PlayerProfile;
use skrawl_timer::{TimerKey, TimerPurpose, TimerWheel};

use crate::error::RoomError;
use crate::guess::{classify, GuessOutcome};
use crate::hints::reveal_offsets;
use crate::lobby::LobbyChat;
use crate::persist::{
    settings_json, GameParticipantRecord, GameRoundRecord, GameSessionRecord, NoopSessionStore,
    SessionStore,
};
use crate::player::Player;
use crate::rate_limit::SlidingWindowLimiter;
use crate::scoreboard::{drawer_points, guesser_points, Scoreboard};
use crate::turn::{RoomStatus, TurnState};
use crate::words;

/// Default reconnection grace window, used unless the room is constructed
/// with an explicit override.
pub const DEFAULT_RECONNECT_GRACE: Duration = Duration::from_secs(120);
const WORD_SELECTION_TIMEOUT: Duration = Duration::from_secs(15);
const CHAT_MAX_PER_WINDOW: u32 = 3;
const CHAT_WINDOW: Duration = Duration::from_secs(10);
const CHAT_COOLDOWN: Duration = Duration::from_secs(5);
const DRAW_OP_MAX_PER_SECOND: u32 = 120;

/// Outbound queue depth per connected player. Bounded so one slow reader
/// can't grow the room actor's memory without limit; see [`PlayerSender`].
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// How long a player's non-droppable send queue can stay full before the
/// room gives up on them and tears the connection down.
const SUSTAINED_OVERFLOW_CLOSE_AFTER: Duration = Duration::from_secs(10);

/// What a room sends to one connected player. The connection layer wraps
/// each payload in a `ServerEnvelope` (seq/timestamp are a per-connection
/// concern, not something the room actor tracks) and forwards it to the
/// transport.
///
/// The channel is bounded: a player who can't keep up must not let the room
/// actor's memory grow without limit. When the queue is full, droppable
/// payloads (high-frequency strokes, heartbeat acks — see
/// [`is_droppable`]) are silently discarded; everything else counts toward
/// a sustained-overflow clock, and if that clock runs past
/// [`SUSTAINED_OVERFLOW_CLOSE_AFTER`] the connection is closed rather than
/// left to back up forever.
#[derive(Clone)]
pub struct PlayerSender {
    tx: mpsc::Sender<ServerPayload>,
    overflow_since: Option<Instant>,
}

/// What happened to a payload handed to [`PlayerSender::try_send`].
enum SendOutcome {
    Sent,
    Dropped,
    CloseConnection,
}

impl PlayerSender {
    pub fn new(tx: mpsc::Sender<ServerPayload>) -> Self {
        Self { tx, overflow_since: None }
    }

    fn try_send(&mut self, payload: ServerPayload) -> SendOutcome {
        match self.tx.try_send(payload) {
            Ok(()) => {
                self.overflow_since = None;
                SendOutcome::Sent
            }
            Err(mpsc::error::TrySendError::Closed(_)) => SendOutcome::CloseConnection,
            Err(mpsc::error::TrySendError::Full(payload)) => {
                if is_droppable(&payload) {
                    return SendOutcome::Dropped;
                }
                let since = *self.overflow_since.get_or_insert(Instant::now());
                if since.elapsed() >= SUSTAINED_OVERFLOW_CLOSE_AFTER {
                    SendOutcome::CloseConnection
                } else {
                    SendOutcome::Dropped
                }
            }
        }
    }
}

/// Payloads that are safe to drop under backpressure because the client
/// will recover on its own: strokes are superseded by the next one drawn
/// (and a late joiner gets a full `CanvasState` sync anyway), and a missed
/// heartbeat ack just costs one round trip.
fn is_droppable(payload: &ServerPayload) -> bool {
    matches!(
        payload,
        ServerPayload::Game(ServerEvent::DrawingStroke { .. })
            | ServerPayload::System(ServerSystemMessage::HeartbeatAck { .. })
    )
}

/// Commands sent to a room actor through its channel.
pub enum RoomCommand {
    /// A (re)join: a brand-new player, or a reconnecting one whose seat is
    /// still held (`ConnectionState::Grace`).
    Join {
        profile: PlayerProfile,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<RoomSnapshot, RoomError>>,
    },

    /// An explicit `leave_room` request.
    Leave {
        user_id: UserId,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// The transport layer detected a dropped connection. Not a full
    /// leave — the player enters the reconnect-grace window.
    Disconnected { user_id: UserId },

    /// A game event from a player.
    Event {
        user_id: UserId,
        event: ClientEvent,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    GetSnapshot {
        reply: oneshot::Sender<RoomSnapshot>,
    },

    Shutdown,
}

/// Handle to a running room actor.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub async fn join(
        &self,
        profile: PlayerProfile,
        sender: PlayerSender,
    ) -> Result<RoomSnapshot, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Join { profile, sender, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    pub async fn leave(&self, user_id: UserId) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Leave { user_id, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    pub async fn disconnected(&self, user_id: UserId) -> Result<(), RoomError> {
        self.send(RoomCommand::Disconnected { user_id }).await
    }

    pub async fn send_event(&self, user_id: UserId, event: ClientEvent) -> Result<(), RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Event { user_id, event, reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id.clone()))?
    }

    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::GetSnapshot { reply }).await?;
        rx.await.map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// Construction-time options for a room.
pub struct RoomOptions {
    pub room_id: RoomId,
    pub visibility: Visibility,
    pub settings: RoomSettings,
    pub reconnect_grace: Duration,
    pub session_store: Arc<dyn SessionStore>,
}

impl Default for RoomOptions {
    fn default() -> Self {
        Self {
            room_id: RoomId::new(""),
            visibility: Visibility::Public,
            settings: RoomSettings::public_defaults(),
            reconnect_grace: DEFAULT_RECONNECT_GRACE,
            session_store: Arc::new(NoopSessionStore),
        }
    }
}

struct RoomActor {
    room_id: RoomId,
    visibility: Visibility,
    settings: RoomSettings,
    reconnect_grace: Duration,
    session_store: Arc<dyn SessionStore>,

    status: RoomStatus,
    host_id: Option<UserId>,
    players: HashMap<UserId, Player>,
    senders: HashMap<UserId, PlayerSender>,
    ready: HashSet<UserId>,

    round_index: u32,
    turn_order: Vec<UserId>,
    turn_order_pos: usize,
    next_turn_id: u64,
    turn: Option<TurnState>,
    used_words: HashSet<String>,
    game_started_at_ms: u64,
    completed_rounds: Vec<GameRoundRecord>,

    skip_votes: HashSet<UserId>,
    kick_votes: HashMap<UserId, HashSet<UserId>>,

    scoreboard: Scoreboard,
    lobby: LobbyChat,
    chat_limiter: SlidingWindowLimiter,
    draw_limiter: SlidingWindowLimiter,

    timers: TimerWheel,
    receiver: mpsc::Receiver<RoomCommand>,
}

pub fn spawn_room(options: RoomOptions, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let actor = RoomActor {
        room_id: options.room_id.clone(),
        visibility: options.visibility,
        settings: options.settings,
        reconnect_grace: options.reconnect_grace,
        session_store: options.session_store,
        status: RoomStatus::Waiting,
        host_id: None,
        players: HashMap::new(),
        senders: HashMap::new(),
        ready: HashSet::new(),
        round_index: 0,
        turn_order: Vec::new(),
        turn_order_pos: 0,
        next_turn_id: 1,
        turn: None,
        used_words: HashSet::new(),
        game_started_at_ms: 0,
        completed_rounds: Vec::new(),
        skip_votes: HashSet::new(),
        kick_votes: HashMap::new(),
        scoreboard: Scoreboard::new(),
        lobby: LobbyChat::new(Vec::new()),
        chat_limiter: SlidingWindowLimiter::new(CHAT_MAX_PER_WINDOW, CHAT_WINDOW, CHAT_COOLDOWN),
        draw_limiter: SlidingWindowLimiter::new(
            DRAW_OP_MAX_PER_SECOND,
            Duration::from_secs(1),
            Duration::from_millis(250),
        ),
        timers: TimerWheel::new(),
        receiver: rx,
    };
    tokio::spawn(actor.run());
    RoomHandle { room_id: options.room_id, sender: tx }
}

impl RoomActor {
    async fn run(mut self) {
        info!(room_id = %self.room_id, "room actor started");
        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => break,
                    }
                }
                key = self.timers.next_expired() => {
                    self.handle_timer(key);
                }
            }
        }
        info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { profile, sender, reply } => {
                let result = self.handle_join(profile, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { user_id, reply } => {
                let result = self.handle_leave(&user_id, "left");
                let _ = reply.send(result);
            }
            RoomCommand::Disconnected { user_id } => {
                self.handle_disconnected(&user_id);
            }
            RoomCommand::Event { user_id, event, reply } => {
                let result = self.handle_event(&user_id, event);
                let _ = reply.send(result);
            }
            RoomCommand::GetSnapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            RoomCommand::Shutdown => {
                info!(room_id = %self.room_id, "room shutting down");
                self.receiver.close();
            }
        }
    }

    // -----------------------------------------------------------------
    // Join / leave / disconnect
    // -----------------------------------------------------------------

    fn handle_join(
        &mut self,
        profile: PlayerProfile,
        sender: PlayerSender,
    ) -> Result<RoomSnapshot, RoomError> {
        let now = Instant::now();

        if let Some(player) = self.players.get_mut(&profile.user_id) {
            // Reconnection: the seat is still held.
            player.connection_state = ConnectionState::Connected;
            player.last_activity = now;
            self.senders.insert(profile.user_id.clone(), sender);
            // Keyed by user_id, not the active turn: a reconnection always
            // cancels this player's own grace timer regardless of whether
            // the turn has since moved on.
            self.timers.cancel(&TimerKey::new(
                self.room_id.clone(),
                TurnId(0),
                TimerPurpose::DisconnectGrace { user_id: profile.user_id.clone() },
            ));
            info!(room_id = %self.room_id, user_id = %profile.user_id, "player reconnected");
            self.send_canvas_sync(&profile.user_id);
            return Ok(self.snapshot());
        }

        if self.status != RoomStatus::Waiting && !self.settings.allow_mid_game_join {
            return Err(RoomError::GameInProgress(self.room_id.clone()));
        }
        if self.players.len() as u32 >= self.settings.max_players {
            return Err(RoomError::RoomFull(self.room_id.clone()));
        }

        let user_id = profile.user_id.clone();
        let display_name = profile.display_name.clone();
        self.players.insert(user_id.clone(), Player::new(profile, now));
        self.senders.insert(user_id.clone(), sender);
        if self.host_id.is_none() {
            self.host_id = Some(user_id.clone());
        }
        if self.status != RoomStatus::Waiting {
            // Mid-game joiner: queued for future rounds, no slot this round.
            self.turn_order.push(user_id.clone());
            self.send_canvas_sync(&user_id);
        }

        let msg = self.lobby.system(format!("{display_name} joined"), now_ms());
        self.broadcast_lobby_message(&msg);
        let scores = self.scoreboard.totals().clone();
        self.broadcast(ServerEvent::ScoreUpdate { scores });

        info!(room_id = %self.room_id, %user_id, players = self.players.len(), "player joined");
        Ok(self.snapshot())
    }

    fn handle_disconnected(&mut self, user_id: &UserId) {
        let Some(player) = self.players.get_mut(user_id) else { return };
        player.connection_state = ConnectionState::Grace;
        self.senders.remove(user_id);

        if self.status == RoomStatus::Waiting {
            // No grace in the lobby — leaving now is unambiguous.
            let _ = self.handle_leave(&user_id.clone(), "disconnected");
            return;
        }

        self.timers.schedule_in(
            TimerKey::new(
                self.room_id.clone(),
                TurnId(0),
                TimerPurpose::DisconnectGrace { user_id: user_id.clone() },
            ),
            self.reconnect_grace,
        );
        debug!(room_id = %self.room_id, %user_id, "player disconnected, grace window started");
    }

    fn handle_leave(&mut self, user_id: &UserId, reason: &str) -> Result<(), RoomError> {
        let Some(player) = self.players.remove(user_id) else {
            return Err(RoomError::NotInRoom(user_id.clone(), self.room_id.clone()));
        };
        self.senders.remove(user_id);
        self.ready.remove(user_id);
        self.chat_limiter.remove(user_id);
        self.draw_limiter.remove(user_id);

        let was_drawer = player.is_drawer;

        if self.host_id.as_ref() == Some(user_id) {
            self.host_id = self
                .players
                .values()
                .min_by_key(|p| p.joined_at)
                .map(|p| p.user_id.clone());
        }

        let msg = self.lobby.system(format!("{} left", player.display_name), now_ms());
        if !self.players.is_empty() {
            self.broadcast_lobby_message(&msg);
        } else {
            self.lobby.clear();
        }

        info!(room_id = %self.room_id, %user_id, reason, players = self.players.len(), "player left");

        if was_drawer && matches!(self.status, RoomStatus::WordSelection | RoomStatus::Drawing) {
            self.end_turn(TurnEndReason::DrawerLeft);
        } else if self.players.len() < 2
            && matches!(
                self.status,
                RoomStatus::WordSelection | RoomStatus::Drawing | RoomStatus::Starting
            )
        {
            self.end_turn(TurnEndReason::Cancelled);
        }

        Ok(())
    }

    // -----------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------

    fn handle_timer(&mut self, key: TimerKey) {
        match key.purpose {
            TimerPurpose::WordSelection => {
                if self.status == RoomStatus::WordSelection
                    && self.turn.as_ref().map(|t| t.turn_id) == Some(key.turn_id)
                {
                    let word = self
                        .turn
                        .as_ref()
                        .and_then(|t| t.word_choices.first().cloned())
                        .unwrap_or_else(|| "mystery".to_string());
                    self.start_drawing(word);
                }
            }
            TimerPurpose::TurnDuration => {
                if self.status == RoomStatus::Drawing
                    && self.turn.as_ref().map(|t| t.turn_id) == Some(key.turn_id)
                {
                    self.end_turn(TurnEndReason::TimeUp);
                }
            }
            TimerPurpose::HintReveal { .. } => {
                if self.status == RoomStatus::Drawing
                    && self.turn.as_ref().map(|t| t.turn_id) == Some(key.turn_id)
                {
                    if let Some(turn) = &mut self.turn {
                        if let Some((hint_index, letter)) = turn.reveal_next_hint() {
                            self.broadcast(ServerEvent::HintRevealed { index: hint_index, letter });
                        }
                    }
                }
            }
            TimerPurpose::DisconnectGrace { user_id } => {
                let still_in_grace = self
                    .players
                    .get(&user_id)
                    .is_some_and(|p| p.connection_state == ConnectionState::Grace);
                if still_in_grace {
                    let _ = self.handle_leave(&user_id, "grace window expired");
                }
            }
        }
    }

    // -----------------------------------------------------------------
    // Game events
    // -----------------------------------------------------------------

    fn handle_event(&mut self, user_id: &UserId, event: ClientEvent) -> Result<(), RoomError> {
        if !self.players.contains_key(user_id) {
            return Err(RoomError::PlayerNotFound(user_id.clone()));
        }
        if let Some(p) = self.players.get_mut(user_id) {
            p.last_activity = Instant::now();
        }

        match event {
            ClientEvent::UpdateRoomSettings { settings } => self.update_settings(user_id, settings),
            ClientEvent::StartGame => self.start_game(user_id),
            ClientEvent::PlayerReady { ready } => {
                self.set_ready(user_id, ready);
                Ok(())
            }
            ClientEvent::SelectWord { word } => self.select_word(user_id, word),
            ClientEvent::DrawOp { op } => self.draw_op(user_id, op),
            ClientEvent::CanvasClear => self.canvas_clear(user_id),
            ClientEvent::CanvasUndo => self.canvas_undo(user_id),
            ClientEvent::ChatMessage { text } => self.chat_or_guess(user_id, text),
            ClientEvent::LobbyChat { text } => self.lobby_chat(user_id, text),
            ClientEvent::RequestCanvasSync => {
                self.send_canvas_sync(user_id);
                Ok(())
            }
            ClientEvent::VoteKick { user_id: target } => self.vote_kick(user_id, target),
            ClientEvent::VoteSkip => self.vote_skip(user_id),
            ClientEvent::Ping { t } => {
                self.send_to(user_id, ServerEvent::Pong { t });
                Ok(())
            }
            ClientEvent::MobileEvent { .. } | ClientEvent::ConnectionQuality { .. } => Ok(()),
        }
    }

    fn update_settings(
        &mut self,
        user_id: &UserId,
        patch: skrawl_protocol::RoomSettingsPatch,
    ) -> Result<(), RoomError> {
        self.require_host(user_id)?;
        self.require_status(RoomStatus::Waiting)?;
        let merged = patch
            .apply(&self.settings)
            .map_err(|e| RoomError::InvalidSettings(e.to_string()))?;
        self.settings = merged.clone();
        self.broadcast(ServerEvent::RoomSettingsUpdated { settings: merged });
        Ok(())
    }

    fn start_game(&mut self, user_id: &UserId) -> Result<(), RoomError> {
        self.require_host(user_id)?;
        self.require_status(RoomStatus::Waiting)?;
        if self.players.len() < 2 {
            return Err(RoomError::InvalidState("need at least 2 players".into()));
        }

        let mut order: Vec<UserId> = self.players.keys().cloned().collect();
        order.shuffle(&mut rand::rng());
        self.turn_order = order;
        self.turn_order_pos = 0;
        self.round_index = 0;
        self.used_words.clear();
        self.scoreboard = Scoreboard::new();
        self.status = RoomStatus::Starting;
        self.game_started_at_ms = now_ms();
        self.completed_rounds.clear();

        let snapshot = self.snapshot();
        self.broadcast(ServerEvent::GameStarting { snapshot });
        self.begin_turn();
        Ok(())
    }

    fn set_ready(&mut self, user_id: &UserId, ready: bool) {
        if ready {
            self.ready.insert(user_id.clone());
        } else {
            self.ready.remove(user_id);
        }
        self.broadcast(ServerEvent::PlayerReadyChanged { user_id: user_id.clone(), ready });
    }

    fn select_word(&mut self, user_id: &UserId, word: String) -> Result<(), RoomError> {
        self.require_status(RoomStatus::WordSelection)?;
        let is_drawer = self.turn.as_ref().is_some_and(|t| &t.drawer_id == user_id);
        if !is_drawer {
            return Err(RoomError::NotDrawer(user_id.clone()));
        }
        let valid = self
            .turn
            .as_ref()
            .is_some_and(|t| t.word_choices.iter().any(|w| w == &word));
        if !valid {
            return Err(RoomError::InvalidWord(word));
        }
        self.timers.cancel(&TimerKey::new(
            self.room_id.clone(),
            self.turn.as_ref().unwrap().turn_id,
            TimerPurpose::WordSelection,
        ));
        self.start_drawing(word);
        Ok(())
    }

    fn draw_op(&mut self, user_id: &UserId, op: DrawOp) -> Result<(), RoomError> {
        self.require_status(RoomStatus::Drawing)?;
        self.require_drawer(user_id)?;
        if !matches!(op, DrawOp::Stroke { .. } | DrawOp::BucketFill { .. }) {
            // Clear/Undo go through `CanvasClear`/`CanvasUndo` instead.
            return Err(RoomError::InvalidState("draw_op must be a stroke or bucket_fill".into()));
        }
        self.check_draw_rate(user_id)?;
        if let Some(turn) = &mut self.turn {
            turn.canvas.push(op.clone());
        }
        for batch in crate::canvas::batch_stroke(op) {
            self.broadcast_except(user_id, ServerEvent::DrawingStroke { op: batch });
        }
        Ok(())
    }

    fn canvas_clear(&mut self, user_id: &UserId) -> Result<(), RoomError> {
        self.require_status(RoomStatus::Drawing)?;
        self.require_drawer(user_id)?;
        if let Some(turn) = &mut self.turn {
            turn.canvas.clear();
        }
        self.broadcast(ServerEvent::CanvasCleared);
        Ok(())
    }

    fn canvas_undo(&mut self, user_id: &UserId) -> Result<(), RoomError> {
        self.require_status(RoomStatus::Drawing)?;
        self.require_drawer(user_id)?;
        let removed = self.turn.as_mut().is_some_and(|t| t.canvas.undo(user_id));
        if removed {
            let snapshot = self.turn.as_ref().unwrap().canvas.snapshot().to_vec();
            self.broadcast(ServerEvent::CanvasState { snapshot });
        }
        Ok(())
    }

    fn send_canvas_sync(&mut self, user_id: &UserId) {
        let snapshot = self
            .turn
            .as_ref()
            .map(|t| t.canvas.snapshot().to_vec())
            .unwrap_or_default();
        self.send_to(user_id, ServerEvent::CanvasState { snapshot });
    }

    fn lobby_chat(&mut self, user_id: &UserId, text: String) -> Result<(), RoomError> {
        self.require_status(RoomStatus::Waiting)?;
        self.check_chat_rate(user_id)?;
        let msg = self.lobby.chat(user_id.clone(), &text, now_ms());
        self.broadcast_lobby_message(&msg);
        Ok(())
    }

    fn chat_or_guess(&mut self, user_id: &UserId, text: String) -> Result<(), RoomError> {
        if self.status != RoomStatus::Drawing {
            self.check_chat_rate(user_id)?;
            let msg = self.lobby.chat(user_id.clone(), &text, now_ms());
            self.broadcast_lobby_message(&msg);
            return Ok(());
        }

        let is_drawer = self.turn.as_ref().is_some_and(|t| &t.drawer_id == user_id);
        if is_drawer {
            return Err(RoomError::NotDrawerChat);
        }
        let already_guessed = self
            .players
            .get(user_id)
            .is_some_and(|p| p.has_guessed_correctly);
        if already_guessed {
            return Err(RoomError::AlreadyGuessed(user_id.clone()));
        }
        self.check_chat_rate(user_id)?;

        let word = self.turn.as_ref().and_then(|t| t.word.clone());
        let Some(word) = word else {
            let msg = self.lobby.chat(user_id.clone(), &text, now_ms());
            self.broadcast_chat_message(&msg);
            return Ok(());
        };

        match classify(&text, &word) {
            GuessOutcome::Correct => self.on_correct_guess(user_id, word),
            GuessOutcome::Close => {
                let msg = self.lobby.chat(user_id.clone(), &text, now_ms());
                self.broadcast_chat_message(&msg);
                self.send_to(user_id, ServerEvent::CloseGuess);
            }
            GuessOutcome::Chat => {
                let msg = self.lobby.chat(user_id.clone(), &text, now_ms());
                self.broadcast_chat_message(&msg);
            }
        }
        Ok(())
    }

    fn on_correct_guess(&mut self, user_id: &UserId, word: String) {
        let now = Instant::now();
        let Some(turn) = &mut self.turn else { return };
        let elapsed_ms = turn.elapsed(now).as_millis() as u64;
        let total_ms = turn.total_duration.as_millis() as u64;
        let points = guesser_points(elapsed_ms, total_ms);
        let guess_order = turn.guesses.len() as u32;
        turn.guesses.push(GuessResult {
            user_id: user_id.clone(),
            guessed_correctly: true,
            points,
            guess_order: Some(guess_order),
            elapsed_ms: Some(elapsed_ms),
        });

        if let Some(player) = self.players.get_mut(user_id) {
            player.has_guessed_correctly = true;
            player.award(points);
        }
        self.scoreboard.add(user_id, points);

        // The word itself is only confirmed back to the guesser; everyone
        // else just learns that a guess landed, so the word stays secret
        // for whoever hasn't found it yet.
        self.send_to(user_id, ServerEvent::CorrectGuess { user_id: user_id.clone(), word });
        self.broadcast(ServerEvent::PlayerGuessed { user_id: user_id.clone() });
        let scores = self.scoreboard.totals().clone();
        self.broadcast(ServerEvent::ScoreUpdate { scores });

        let drawer_id = self.turn.as_ref().map(|t| t.drawer_id.clone());
        let all_guessed = self
            .players
            .iter()
            .filter(|(id, p)| Some((*id).clone()) != drawer_id && p.connection_state != ConnectionState::Gone)
            .all(|(_, p)| p.has_guessed_correctly);
        if all_guessed {
            self.end_turn(TurnEndReason::AllGuessed);
        }
    }

    fn vote_skip(&mut self, user_id: &UserId) -> Result<(), RoomError> {
        self.require_status(RoomStatus::Drawing)?;
        let is_drawer = self.turn.as_ref().is_some_and(|t| &t.drawer_id == user_id);
        if is_drawer {
            return Err(RoomError::NotDrawer(user_id.clone()));
        }
        self.skip_votes.insert(user_id.clone());
        let eligible = self.players.len().saturating_sub(1).max(1);
        if self.skip_votes.len() * 2 >= eligible {
            self.end_turn(TurnEndReason::Skipped);
        }
        Ok(())
    }

    fn vote_kick(&mut self, user_id: &UserId, target: UserId) -> Result<(), RoomError> {
        if !self.players.contains_key(&target) {
            return Err(RoomError::PlayerNotFound(target));
        }
        let voters = self.kick_votes.entry(target.clone()).or_default();
        voters.insert(user_id.clone());
        let eligible = self.players.len().saturating_sub(1).max(1);
        // Strict majority: an exact tie does not carry.
        if voters.len() * 2 > eligible {
            self.kick_votes.remove(&target);
            let _ = self.handle_leave(&target, "kicked");
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Turn / round / game lifecycle
    // -----------------------------------------------------------------

    fn begin_turn(&mut self) {
        self.skip_votes.clear();
        self.kick_votes.clear();

        if self.turn_order_pos >= self.turn_order.len() {
            self.end_round();
            return;
        }

        let drawer_id = self.turn_order[self.turn_order_pos].clone();
        if !self.players.contains_key(&drawer_id) {
            // Drawer left before their turn came up; skip them.
            self.turn_order_pos += 1;
            self.begin_turn();
            return;
        }

        for player in self.players.values_mut() {
            player.reset_turn();
        }
        if let Some(player) = self.players.get_mut(&drawer_id) {
            player.is_drawer = true;
        }

        let turn_id = TurnId(self.next_turn_id);
        self.next_turn_id += 1;

        let pool = self.word_pool();
        let mut available: Vec<String> =
            pool.iter().cloned().filter(|w| !self.used_words.contains(w)).collect();
        if available.len() < 3 {
            self.used_words.clear();
            available = pool;
        }
        available.shuffle(&mut rand::rng());
        let choices: Vec<String> = available.into_iter().take(3).collect();

        let total_duration = Duration::from_secs(self.settings.draw_time_seconds as u64);
        let now = Instant::now();
        let turn = TurnState::with_word_mode(
            turn_id,
            self.round_index,
            drawer_id.clone(),
            choices.clone(),
            total_duration,
            now,
            self.settings.word_mode,
        );
        self.turn = Some(turn);
        self.status = RoomStatus::WordSelection;

        let turn_snapshot = self.turn.as_ref().unwrap().to_snapshot(now);
        self.broadcast(ServerEvent::TurnStarting { turn: turn_snapshot });
        self.send_to(
            &drawer_id,
            ServerEvent::WordSelection {
                choices,
                deadline_ms: WORD_SELECTION_TIMEOUT.as_millis() as u64,
            },
        );
        self.timers.schedule_in(
            TimerKey::new(self.room_id.clone(), turn_id, TimerPurpose::WordSelection),
            WORD_SELECTION_TIMEOUT,
        );
    }

    fn start_drawing(&mut self, word: String) {
        let now = Instant::now();
        let Some(turn) = &mut self.turn else { return };
        let turn_id = turn.turn_id;
        turn.turn_start = now;
        turn.select_word(word.clone());
        self.used_words.insert(word);
        self.status = RoomStatus::Drawing;

        let total_duration = turn.total_duration;
        self.timers.schedule_in(
            TimerKey::new(self.room_id.clone(), turn_id, TimerPurpose::TurnDuration),
            total_duration,
        );
        for (index, offset) in reveal_offsets(total_duration, self.settings.hints).into_iter().enumerate() {
            self.timers.schedule_in(
                TimerKey::new(
                    self.room_id.clone(),
                    turn_id,
                    TimerPurpose::HintReveal { index: index as u32 },
                ),
                offset,
            );
        }

        let turn_snapshot = self.turn.as_ref().unwrap().to_snapshot(now);
        self.broadcast(ServerEvent::TurnStarting { turn: turn_snapshot });
    }

    fn end_turn(&mut self, reason: TurnEndReason) {
        let Some(turn) = self.turn.take() else { return };
        self.status = RoomStatus::TurnEnd;
        self.timers.cancel_turn(&self.room_id, turn.turn_id);

        let other_player_count = self.players.len().saturating_sub(1);
        let guesser_values: Vec<u32> = turn.guesses.iter().map(|g| g.points).collect();
        let d_points = drawer_points(&guesser_values, other_player_count);
        if let Some(drawer) = self.players.get_mut(&turn.drawer_id) {
            drawer.award(d_points);
        }
        self.scoreboard.add(&turn.drawer_id, d_points);

        let elapsed_ms = turn.elapsed(Instant::now()).as_millis() as u64;
        let guesser_count = turn.guesses.iter().filter(|g| g.guessed_correctly).count() as u32;
        self.completed_rounds.push(GameRoundRecord {
            round_index: turn.round_index,
            turn_id: turn.turn_id.0,
            drawer_id: turn.drawer_id.clone(),
            word: turn.word.clone().unwrap_or_default(),
            drawer_points: d_points,
            guesser_count,
            elapsed_ms,
            reason,
        });

        let result = TurnResult {
            drawer_id: turn.drawer_id.clone(),
            word: turn.word.clone().unwrap_or_default(),
            guesses: turn.guesses,
            drawer_points: d_points,
            elapsed_ms,
            reason,
        };
        self.broadcast(ServerEvent::TurnEnded { result });
        let scores = self.scoreboard.totals().clone();
        self.broadcast(ServerEvent::ScoreUpdate { scores });

        self.turn_order_pos += 1;
        self.begin_turn();
    }

    fn end_round(&mut self) {
        self.status = RoomStatus::RoundEnd;
        self.round_index += 1;
        let scores = self.scoreboard.totals().clone();
        self.broadcast(ServerEvent::RoundEnded { scores });

        if self.round_index >= self.settings.rounds {
            self.end_game();
        } else {
            self.turn_order_pos = 0;
            self.begin_turn();
        }
    }

    fn end_game(&mut self) {
        self.status = RoomStatus::Finished;
        let winners = self.scoreboard.winners();
        let final_scores = self.scoreboard.totals().clone();
        let result = GameResult { winners: winners.clone(), final_scores: final_scores.clone() };
        self.broadcast(ServerEvent::GameEnded { result });

        let participants = self
            .players
            .values()
            .map(|p| GameParticipantRecord {
                user_id: p.user_id.clone(),
                display_name: p.display_name.clone(),
                final_score: final_scores.get(&p.user_id).copied().unwrap_or(0),
                is_winner: winners.contains(&p.user_id),
            })
            .collect();

        let store = self.session_store.clone();
        let record = GameSessionRecord {
            room_id: self.room_id.clone(),
            host_id: self.host_id.clone(),
            settings_json: settings_json(&self.settings),
            started_at_ms: self.game_started_at_ms,
            ended_at_ms: now_ms(),
            winners,
            participants,
            rounds: std::mem::take(&mut self.completed_rounds),
        };
        tokio::spawn(async move {
            if let Err(err) = store.record_game(record).await {
                warn!(error = %err, "best-effort session record write failed");
            }
        });

        // Finished transitions straight back to waiting so the room can host
        // another game without anyone having to leave and rejoin.
        self.status = RoomStatus::Waiting;
        self.round_index = 0;
        self.turn_order.clear();
        self.turn_order_pos = 0;
        self.turn = None;
        self.used_words.clear();
        self.scoreboard = Scoreboard::new();
        self.ready.clear();
        self.lobby.clear();
        for player in self.players.values_mut() {
            player.score_game = 0;
            player.score_turn = 0;
            player.is_drawer = false;
            player.has_guessed_correctly = false;
        }
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    /// The word candidates a new turn draws from. `Combination` merges the
    /// room's custom list with the built-in bank instead of the custom list
    /// replacing the bank outright; every other mode uses the custom list
    /// when present and falls back to the bank otherwise.
    fn word_pool(&self) -> Vec<String> {
        let bank = words::bank_for(self.settings.language);
        match (&self.settings.custom_words, self.settings.word_mode) {
            (Some(custom), WordMode::Combination) => {
                let mut pool = custom.clone();
                pool.extend(bank.iter().map(|w| w.to_string()));
                pool
            }
            (Some(custom), _) => custom.clone(),
            (None, _) => bank.iter().map(|w| w.to_string()).collect(),
        }
    }

    fn require_host(&self, user_id: &UserId) -> Result<(), RoomError> {
        if self.host_id.as_ref() == Some(user_id) {
            Ok(())
        } else {
            Err(RoomError::NotHost(user_id.clone(), self.room_id.clone()))
        }
    }

    fn require_status(&self, status: RoomStatus) -> Result<(), RoomError> {
        if self.status == status {
            Ok(())
        } else {
            Err(RoomError::InvalidState(format!(
                "expected {status}, room is {}",
                self.status
            )))
        }
    }

    fn require_drawer(&self, user_id: &UserId) -> Result<(), RoomError> {
        if self.turn.as_ref().is_some_and(|t| &t.drawer_id == user_id) {
            Ok(())
        } else {
            Err(RoomError::NotDrawer(user_id.clone()))
        }
    }

    fn check_chat_rate(&mut self, user_id: &UserId) -> Result<(), RoomError> {
        self.chat_limiter
            .check(user_id, Instant::now())
            .map_err(|d| RoomError::RateLimited { retry_after_ms: d.as_millis() as u64 })
    }

    fn check_draw_rate(&mut self, user_id: &UserId) -> Result<(), RoomError> {
        self.draw_limiter
            .check(user_id, Instant::now())
            .map_err(|d| RoomError::RateLimited { retry_after_ms: d.as_millis() as u64 })
    }

    fn broadcast(&mut self, event: ServerEvent) {
        let user_ids: Vec<UserId> = self.players.keys().cloned().collect();
        for user_id in user_ids {
            self.send_to(&user_id, event.clone());
        }
    }

    fn broadcast_except(&mut self, except: &UserId, event: ServerEvent) {
        let user_ids: Vec<UserId> = self.players.keys().cloned().collect();
        for user_id in user_ids {
            if &user_id != except {
                self.send_to(&user_id, event.clone());
            }
        }
    }

    /// System notices and lobby (`waiting`-phase) chat use the dedicated
    /// `LobbyMessage` event; in-game chat uses `ChatMessage` (see
    /// `broadcast_chat_message`) so clients can tell the two channels apart.
    fn broadcast_lobby_message(&mut self, message: &skrawl_protocol::LobbyMessage) {
        self.broadcast(ServerEvent::LobbyMessage { message: message.clone() });
    }

    fn broadcast_chat_message(&mut self, message: &skrawl_protocol::LobbyMessage) {
        self.broadcast(ServerEvent::ChatMessage { message: message.clone() });
    }

    fn send_to(&mut self, user_id: &UserId, event: ServerEvent) {
        self.send_payload(user_id, ServerPayload::Game(event));
    }

    fn send_payload(&mut self, user_id: &UserId, payload: ServerPayload) {
        let outcome = match self.senders.get_mut(user_id) {
            Some(sender) => sender.try_send(payload),
            None => return,
        };
        if let SendOutcome::CloseConnection = outcome {
            warn!(room_id = %self.room_id, %user_id, "outbound queue overflowed for 10s, closing connection");
            self.senders.remove(user_id);
            self.handle_disconnected(user_id);
        }
    }

    fn snapshot(&self) -> RoomSnapshot {
        let now = Instant::now();
        let mut seated: Vec<_> = self.players.values().collect();
        seated.sort_by_key(|p| p.joined_at);
        let players: Vec<_> = seated.into_iter().map(Player::to_snapshot).collect();
        RoomSnapshot {
            room_id: self.room_id.clone(),
            visibility: self.visibility,
            host_id: self.host_id.clone(),
            settings: self.settings.clone(),
            players,
            status: self.status.as_str().to_string(),
            round_index: self.round_index,
            turn: self.turn.as_ref().map(|t| t.to_snapshot(now)),
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }
}

fn now_ms() -> u64 {
    // Wall-clock timestamp for chat message display, not used for any
    // timing decision (those go through `Instant`/`TimerWheel`).
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skrawl_protocol::{Language, Visibility};

    fn options(room_id: &str) -> RoomOptions {
        RoomOptions {
            room_id: RoomId::new(room_id),
            visibility: Visibility::Public,
            settings: RoomSettings::public_defaults(),
            reconnect_grace: Duration::from_secs(120),
            session_store: Arc::new(NoopSessionStore),
        }
    }

    fn profile(name: &str) -> PlayerProfile {
        PlayerProfile {
            user_id: UserId::new(name),
            display_name: name.to_string(),
            avatar_ref: None,
        }
    }

    async fn join(handle: &RoomHandle, name: &str) -> mpsc::Receiver<ServerPayload> {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        handle.join(profile(name), PlayerSender::new(tx)).await.unwrap();
        rx
    }

    #[tokio::test]
    async fn test_join_then_snapshot_shows_player() {
        let handle = spawn_room(options("abc123"), 16);
        let _rx = join(&handle, "alice").await;
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.players.len(), 1);
        assert_eq!(snap.status, "waiting");
    }

    #[tokio::test]
    async fn test_first_joiner_becomes_host() {
        let handle = spawn_room(options("abc123"), 16);
        let _rx1 = join(&handle, "alice").await;
        let _rx2 = join(&handle, "bob").await;
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.host_id, Some(UserId::new("alice")));
    }

    #[tokio::test]
    async fn test_non_host_cannot_start_game() {
        let handle = spawn_room(options("abc123"), 16);
        let _rx1 = join(&handle, "alice").await;
        let _rx2 = join(&handle, "bob").await;
        let result = handle.send_event(UserId::new("bob"), ClientEvent::StartGame).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_start_game_enters_word_selection() {
        let handle = spawn_room(options("abc123"), 16);
        let _rx1 = join(&handle, "alice").await;
        let _rx2 = join(&handle, "bob").await;
        handle.send_event(UserId::new("alice"), ClientEvent::StartGame).await.unwrap();
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.status, "word_selection");
    }

    #[tokio::test]
    async fn test_drawer_selects_word_enters_drawing() {
        let handle = spawn_room(options("abc123"), 16);
        let mut rx1 = join(&handle, "alice").await;
        let mut rx2 = join(&handle, "bob").await;
        handle.send_event(UserId::new("alice"), ClientEvent::StartGame).await.unwrap();

        let snap = handle.snapshot().await.unwrap();
        let drawer = snap.turn.unwrap().drawer_id;
        let drawer_rx = if drawer == UserId::new("alice") { &mut rx1 } else { &mut rx2 };

        let choices = loop {
            match drawer_rx.recv().await.unwrap() {
                ServerPayload::Game(ServerEvent::WordSelection { choices, .. }) => break choices,
                _ => continue,
            }
        };

        handle
            .send_event(drawer, ClientEvent::SelectWord { word: choices[0].clone() })
            .await
            .unwrap();
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.status, "drawing");
        assert!(snap.turn.unwrap().word_pattern.chars().all(|c| c == '_'));
    }

    #[tokio::test]
    async fn test_non_drawer_cannot_select_word() {
        let handle = spawn_room(options("abc123"), 16);
        let _rx1 = join(&handle, "alice").await;
        let _rx2 = join(&handle, "bob").await;
        handle.send_event(UserId::new("alice"), ClientEvent::StartGame).await.unwrap();
        let snap = handle.snapshot().await.unwrap();
        let drawer = snap.turn.unwrap().drawer_id;
        let other = if drawer == UserId::new("alice") { "bob" } else { "alice" };

        let result = handle
            .send_event(UserId::new(other), ClientEvent::SelectWord { word: "cat".into() })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_leave_removes_player_and_succeeds_host() {
        let handle = spawn_room(options("abc123"), 16);
        let _rx1 = join(&handle, "alice").await;
        let _rx2 = join(&handle, "bob").await;
        handle.leave(UserId::new("alice")).await.unwrap();
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.players.len(), 1);
        assert_eq!(snap.host_id, Some(UserId::new("bob")));
    }

    #[tokio::test]
    async fn test_snapshot_players_keep_join_order_not_alphabetical() {
        let handle = spawn_room(options("abc123"), 16);
        let _rx1 = join(&handle, "zelda").await;
        let _rx2 = join(&handle, "alice").await;
        let _rx3 = join(&handle, "mallory").await;
        let snap = handle.snapshot().await.unwrap();
        let ids: Vec<_> = snap.players.iter().map(|p| p.user_id.clone()).collect();
        assert_eq!(
            ids,
            vec![UserId::new("zelda"), UserId::new("alice"), UserId::new("mallory")]
        );
    }

    #[tokio::test]
    async fn test_lobby_chat_only_allowed_while_waiting() {
        let handle = spawn_room(options("abc123"), 16);
        let _rx1 = join(&handle, "alice").await;
        let _rx2 = join(&handle, "bob").await;
        handle.send_event(UserId::new("alice"), ClientEvent::StartGame).await.unwrap();

        let result = handle
            .send_event(UserId::new("alice"), ClientEvent::LobbyChat { text: "hi".into() })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_custom_words_used_for_language_english_default() {
        let mut opts = options("abc123");
        opts.settings.language = Language::English;
        let handle = spawn_room(opts, 16);
        let _rx1 = join(&handle, "alice").await;
        let _rx2 = join(&handle, "bob").await;
        handle.send_event(UserId::new("alice"), ClientEvent::StartGame).await.unwrap();
        let snap = handle.snapshot().await.unwrap();
        assert_eq!(snap.status, "word_selection");
    }

    /// Builds a standalone `RoomActor` (no spawned task) for unit-testing
    /// actor methods directly, bypassing the `RoomHandle`/message-passing
    /// surface.
    fn actor(opts: RoomOptions) -> RoomActor {
        let (_tx, rx) = mpsc::channel(1);
        RoomActor {
            room_id: opts.room_id,
            visibility: opts.visibility,
            settings: opts.settings,
            reconnect_grace: opts.reconnect_grace,
            session_store: opts.session_store,
            status: RoomStatus::Waiting,
            host_id: None,
            players: HashMap::new(),
            senders: HashMap::new(),
            ready: HashSet::new(),
            round_index: 0,
            turn_order: Vec::new(),
            turn_order_pos: 0,
            next_turn_id: 1,
            turn: None,
            used_words: HashSet::new(),
            game_started_at_ms: 0,
            completed_rounds: Vec::new(),
            skip_votes: HashSet::new(),
            kick_votes: HashMap::new(),
            scoreboard: Scoreboard::new(),
            lobby: LobbyChat::new(Vec::new()),
            chat_limiter: SlidingWindowLimiter::new(CHAT_MAX_PER_WINDOW, CHAT_WINDOW, CHAT_COOLDOWN),
            draw_limiter: SlidingWindowLimiter::new(
                DRAW_OP_MAX_PER_SECOND,
                Duration::from_secs(1),
                Duration::from_millis(250),
            ),
            timers: TimerWheel::new(),
            receiver: rx,
        }
    }

    #[test]
    fn test_word_pool_combination_merges_custom_and_bank() {
        let mut opts = options("abc123");
        opts.settings.word_mode = WordMode::Combination;
        opts.settings.custom_words = Some(vec!["a".into(); 10]);
        let pool = actor(opts).word_pool();
        assert!(pool.iter().any(|w| w == "a"));
        assert!(pool.len() > 10);
    }

    #[test]
    fn test_word_pool_normal_mode_uses_custom_words_only() {
        let mut opts = options("abc123");
        opts.settings.word_mode = WordMode::Normal;
        opts.settings.custom_words = Some(vec!["a".into(); 10]);
        let pool = actor(opts).word_pool();
        assert_eq!(pool.len(), 10);
    }

    /// Captures every record handed to it, for asserting on what `end_game`
    /// assembles.
    #[derive(Default)]
    struct CapturingStore {
        records: std::sync::Mutex<Vec<GameSessionRecord>>,
    }

    impl SessionStore for CapturingStore {
        fn record_game(
            &self,
            record: GameSessionRecord,
        ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), String>> + Send + '_>> {
            self.records.lock().unwrap().push(record);
            Box::pin(async { Ok(()) })
        }
    }

    #[tokio::test]
    async fn test_end_game_assembles_normalized_record() {
        let store = Arc::new(CapturingStore::default());
        let mut opts = options("abc123");
        opts.session_store = store.clone();
        let mut room = actor(opts);

        room.players.insert(UserId::new("alice"), Player::new(profile("alice"), Instant::now()));
        room.players.insert(UserId::new("bob"), Player::new(profile("bob"), Instant::now()));
        room.host_id = Some(UserId::new("alice"));
        room.game_started_at_ms = 1_000;
        room.scoreboard.add(&UserId::new("alice"), 900);
        room.scoreboard.add(&UserId::new("bob"), 400);
        room.completed_rounds.push(GameRoundRecord {
            round_index: 0,
            turn_id: 1,
            drawer_id: UserId::new("alice"),
            word: "cat".to_string(),
            drawer_points: 300,
            guesser_count: 1,
            elapsed_ms: 12_000,
            reason: TurnEndReason::AllGuessed,
        });

        room.end_game();
        // The store write is spawned onto a background task; give it a tick.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let records = store.records.lock().unwrap();
        let record = records.first().expect("end_game should have recorded a session");
        assert_eq!(record.host_id, Some(UserId::new("alice")));
        assert_eq!(record.started_at_ms, 1_000);
        assert_eq!(record.winners, vec![UserId::new("alice")]);
        assert_eq!(record.rounds.len(), 1);
        assert_eq!(record.rounds[0].word, "cat");

        let mut participants = record.participants.clone();
        participants.sort_by(|a, b| a.user_id.as_str().cmp(b.user_id.as_str()));
        assert_eq!(participants.len(), 2);
        assert_eq!(participants[0].user_id, UserId::new("alice"));
        assert_eq!(participants[0].final_score, 900);
        assert!(participants[0].is_winner);
        assert_eq!(participants[1].user_id, UserId::new("bob"));
        assert_eq!(participants[1].final_score, 400);
        assert!(!participants[1].is_winner);

        let parsed: RoomSettings = serde_json::from_str(&record.settings_json).unwrap();
        assert_eq!(parsed, RoomSettings::public_defaults());
    }
}
