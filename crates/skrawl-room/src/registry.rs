//! Process-wide room registry.
//!
//! The only globally shared mutable state in the server: two maps and a
//! set, guarded by one lock. Everything else — all per-room state — lives
//! inside a `Room` actor and is never touched from here.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{info, warn};

use skrawl_protocol::{InviteCode, RoomId, RoomSettings, RoomSettingsPatch, RoomSnapshot, UserId, Visibility};
use skrawl_session::PlayerProfile;

use crate::error::RoomError;
use crate::ids::{allocate_invite_code, allocate_room_id};
use crate::persist::{NoopSessionStore, SessionStore};
use crate::room::{
    spawn_room, PlayerSender, RoomHandle, RoomOptions, DEFAULT_RECONNECT_GRACE,
    OUTBOUND_QUEUE_CAPACITY,
};

/// How often the idle sweeper runs.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
/// How long an empty room may sit idle before eviction.
pub const IDLE_MAX: Duration = Duration::from_secs(30 * 60);
const ROOM_CHANNEL_SIZE: usize = 256;

struct RoomEntry {
    handle: RoomHandle,
    visibility: Visibility,
    invite_code: Option<InviteCode>,
    /// Updated on every admission/lookup; the idle sweeper's only signal
    /// besides current player count.
    last_touch: Instant,
}

struct Inner {
    rooms: HashMap<RoomId, RoomEntry>,
    /// Public rooms in insertion order, newest last — `join_public` scans
    /// newest-first, to keep small rooms filling before creating new ones.
    public_order: Vec<RoomId>,
    invite_codes: HashSet<InviteCode>,
    room_ids: HashSet<RoomId>,
    /// Inverted index, `user_id -> room_id`.
    player_rooms: HashMap<UserId, RoomId>,
}

/// The process-wide room registry.
#[derive(Clone)]
pub struct RoomRegistry {
    inner: Arc<Mutex<Inner>>,
    session_store: Arc<dyn SessionStore>,
    reconnect_grace: Duration,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::with_session_store(Arc::new(NoopSessionStore))
    }

    pub fn with_session_store(session_store: Arc<dyn SessionStore>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                rooms: HashMap::new(),
                public_order: Vec::new(),
                invite_codes: HashSet::new(),
                room_ids: HashSet::new(),
                player_rooms: HashMap::new(),
            })),
            session_store,
            reconnect_grace: DEFAULT_RECONNECT_GRACE,
        }
    }

    /// Finds a public room in `waiting` with room to spare, scanning
    /// newest-first; creates one with the public defaults otherwise.
    pub async fn join_public(
        &self,
        profile: PlayerProfile,
        sender: PlayerSender,
    ) -> Result<RoomSnapshot, RoomError> {
        let user_id = profile.user_id.clone();
        let mut inner = self.inner.lock().await;

        for room_id in inner.public_order.iter().rev() {
            let Some(entry) = inner.rooms.get(room_id) else { continue };
            let handle = entry.handle.clone();
            drop(inner);
            match handle.join(profile.clone(), sender.clone()).await {
                Ok(snapshot) => {
                    let mut inner = self.inner.lock().await;
                    if let Some(entry) = inner.rooms.get_mut(room_id) {
                        entry.last_touch = Instant::now();
                    }
                    inner.player_rooms.insert(user_id, room_id.clone());
                    return Ok(snapshot);
                }
                Err(RoomError::RoomFull(_)) | Err(RoomError::GameInProgress(_)) => {
                    inner = self.inner.lock().await;
                    continue;
                }
                Err(other) => return Err(other),
            }
        }
        drop(inner);

        let room_id = self.create_room(Visibility::Public, RoomSettings::public_defaults(), None).await?;
        let handle = {
            let inner = self.inner.lock().await;
            inner.rooms.get(&room_id).unwrap().handle.clone()
        };
        let snapshot = handle.join(profile, sender).await?;
        let mut inner = self.inner.lock().await;
        inner.player_rooms.insert(user_id, room_id);
        Ok(snapshot)
    }

    /// Creates a private room, merging `patch` into the private defaults,
    /// and admits `host`.
    pub async fn create_private(
        &self,
        host: PlayerProfile,
        sender: PlayerSender,
        patch: RoomSettingsPatch,
    ) -> Result<(RoomSnapshot, InviteCode), RoomError> {
        let settings = patch
            .apply(&RoomSettings::private_defaults())
            .map_err(|e| RoomError::InvalidSettings(e.to_string()))?;

        let invite_code = {
            let mut inner = self.inner.lock().await;
            let code = allocate_invite_code(&inner.invite_codes)
                .ok_or_else(|| RoomError::Unavailable(RoomId::new("")))?;
            inner.invite_codes.insert(code.clone());
            code
        };

        let user_id = host.user_id.clone();
        let room_id = self
            .create_room(Visibility::Private, settings, Some(invite_code.clone()))
            .await?;
        let handle = {
            let inner = self.inner.lock().await;
            inner.rooms.get(&room_id).unwrap().handle.clone()
        };
        let snapshot = handle.join(host, sender).await?;
        let mut inner = self.inner.lock().await;
        inner.player_rooms.insert(user_id, room_id);
        Ok((snapshot, invite_code))
    }

    /// Joins the private room identified by `invite_code`.
    pub async fn join_private(
        &self,
        profile: PlayerProfile,
        sender: PlayerSender,
        invite_code: &InviteCode,
    ) -> Result<RoomSnapshot, RoomError> {
        let user_id = profile.user_id.clone();
        let handle = {
            let inner = self.inner.lock().await;
            inner
                .rooms
                .iter()
                .find(|(_, entry)| entry.invite_code.as_ref() == Some(invite_code))
                .map(|(_, entry)| entry.handle.clone())
        };
        let Some(handle) = handle else {
            return Err(RoomError::NotFound(RoomId::new(invite_code.as_str())));
        };
        let room_id = handle.room_id().clone();
        let snapshot = handle.join(profile, sender).await?;

        let mut inner = self.inner.lock().await;
        if let Some(entry) = inner.rooms.get_mut(&room_id) {
            entry.last_touch = Instant::now();
        }
        inner.player_rooms.insert(user_id, room_id);
        Ok(snapshot)
    }

    /// Removes `user_id` from whatever room they're in. A no-op if they
    /// aren't in one.
    pub async fn leave(&self, user_id: &UserId) -> Result<(), RoomError> {
        let handle = {
            let mut inner = self.inner.lock().await;
            let room_id = inner.player_rooms.remove(user_id);
            room_id.and_then(|id| inner.rooms.get(&id).map(|e| e.handle.clone()))
        };
        match handle {
            Some(handle) => handle.leave(user_id.clone()).await,
            None => Ok(()),
        }
    }

    pub async fn disconnected(&self, user_id: &UserId) {
        let handle = {
            let inner = self.inner.lock().await;
            inner
                .player_rooms
                .get(user_id)
                .and_then(|id| inner.rooms.get(id).map(|e| e.handle.clone()))
        };
        if let Some(handle) = handle {
            let _ = handle.disconnected(user_id.clone()).await;
        }
    }

    /// O(1) lookup of the room a player is currently in.
    pub async fn lookup(&self, user_id: &UserId) -> Option<RoomHandle> {
        let inner = self.inner.lock().await;
        let room_id = inner.player_rooms.get(user_id)?;
        inner.rooms.get(room_id).map(|e| e.handle.clone())
    }

    async fn create_room(
        &self,
        visibility: Visibility,
        settings: RoomSettings,
        invite_code: Option<InviteCode>,
    ) -> Result<RoomId, RoomError> {
        let mut inner = self.inner.lock().await;
        let room_id = allocate_room_id(&inner.room_ids).ok_or_else(|| {
            warn!("room id space exhausted after max collision retries");
            RoomError::Unavailable(RoomId::new(""))
        })?;
        inner.room_ids.insert(room_id.clone());

        let handle = spawn_room(
            RoomOptions {
                room_id: room_id.clone(),
                visibility,
                settings,
                reconnect_grace: self.reconnect_grace,
                session_store: self.session_store.clone(),
            },
            ROOM_CHANNEL_SIZE,
        );

        if visibility == Visibility::Public {
            inner.public_order.push(room_id.clone());
        }
        inner.rooms.insert(
            room_id.clone(),
            RoomEntry { handle, visibility, invite_code, last_touch: Instant::now() },
        );
        info!(%room_id, ?visibility, "room created");
        Ok(room_id)
    }

    /// Evicts rooms whose player count is zero and whose `last_touch` is
    /// older than `idle_max`. Call periodically (see `spawn_idle_sweeper`).
    pub async fn sweep_idle(&self, idle_max: Duration) {
        let now = Instant::now();
        let candidates: Vec<(RoomId, RoomHandle)> = {
            let inner = self.inner.lock().await;
            inner
                .rooms
                .iter()
                .filter(|(_, entry)| now.saturating_duration_since(entry.last_touch) > idle_max)
                .map(|(id, entry)| (id.clone(), entry.handle.clone()))
                .collect()
        };

        for (room_id, handle) in candidates {
            match handle.snapshot().await {
                Ok(snapshot) if snapshot.players.is_empty() => {
                    let _ = handle.shutdown().await;
                    let mut inner = self.inner.lock().await;
                    if let Some(entry) = inner.rooms.remove(&room_id) {
                        inner.room_ids.remove(&room_id);
                        inner.public_order.retain(|id| id != &room_id);
                        if let Some(code) = entry.invite_code {
                            inner.invite_codes.remove(&code);
                        }
                    }
                    info!(%room_id, "idle empty room evicted");
                }
                Ok(_) => {}
                Err(_) => {
                    // Actor already gone; drop our bookkeeping for it too.
                    let mut inner = self.inner.lock().await;
                    if let Some(entry) = inner.rooms.remove(&room_id) {
                        inner.room_ids.remove(&room_id);
                        inner.public_order.retain(|id| id != &room_id);
                        if let Some(code) = entry.invite_code {
                            inner.invite_codes.remove(&code);
                        }
                    }
                }
            }
        }
    }

    /// Spawns a background task that calls `sweep_idle` every `interval`.
    pub fn spawn_idle_sweeper(&self, interval: Duration, idle_max: Duration) -> tokio::task::JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                registry.sweep_idle(idle_max).await;
            }
        })
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
