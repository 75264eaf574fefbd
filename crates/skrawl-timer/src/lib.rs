//! Deadline-keyed, cancellable timer scheduling for the skrawl game server.
//!
//! Every timeout in the system — word-selection deadline, turn duration,
//! hint reveal, disconnect-grace expiry — is a single deadline identified by
//! `(room_id, turn_id, purpose)`. A timer that fires with a stale `turn_id`
//! (the turn already moved on) is a no-op; [`TimerWheel`] makes that the
//! easy path instead of something every call site has to check by hand.
//!
//! # Integration
//!
//! One `TimerWheel` per room actor, polled inside its `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         key = wheel.next_expired() => { /* handle timeout for `key` */ }
//!     }
//! }
//! ```

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use skrawl_protocol::{RoomId, TurnId, UserId};
use tokio::time::{self, Instant as TokioInstant};
use tracing::trace;

// ---------------------------------------------------------------------------
// Timer identity
// ---------------------------------------------------------------------------

/// What a scheduled deadline is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerPurpose {
    /// The drawer must pick a word before this fires.
    WordSelection,
    /// The drawing phase of a turn ends.
    TurnDuration,
    /// A letter hint is revealed. Carries the hint's index so multiple
    /// hints within the same turn don't collide.
    HintReveal { index: u32 },
    /// A disconnected player's reconnection grace window elapses. Carries
    /// the player's id so two players disconnecting in the same turn get
    /// independent deadlines instead of sharing one.
    DisconnectGrace { user_id: UserId },
}

/// A scheduled deadline's identity: which room, which turn, and what it's
/// for. Rescheduling or cancelling always goes through this triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimerKey {
    pub room_id: RoomId,
    pub turn_id: TurnId,
    pub purpose: TimerPurpose,
}

impl TimerKey {
    pub fn new(room_id: RoomId, turn_id: TurnId, purpose: TimerPurpose) -> Self {
        Self {
            room_id,
            turn_id,
            purpose,
        }
    }
}

// ---------------------------------------------------------------------------
// Heap entry
// ---------------------------------------------------------------------------

/// Ordered only by `(deadline, generation)` — `TimerKey` doesn't need `Ord`
/// for this, and generation breaks ties deterministically for entries
/// scheduled at the exact same instant (common under `start_paused` tests).
struct HeapEntry {
    deadline: TokioInstant,
    generation: u64,
    key: TimerKey,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.generation == other.generation
    }
}
impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so `BinaryHeap` (a max-heap) pops the earliest deadline.
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.generation.cmp(&self.generation))
    }
}

// ---------------------------------------------------------------------------
// TimerWheel
// ---------------------------------------------------------------------------

/// A deadline-keyed, cancellable timer scheduler for a single room.
///
/// Internally a lazy-deletion binary heap: cancelling or rescheduling a key
/// only touches the `HashMap` index; stale heap entries are discarded the
/// next time they would otherwise fire. This keeps `cancel` O(log n) instead
/// of requiring a heap scan.
pub struct TimerWheel {
    current: HashMap<TimerKey, u64>,
    heap: BinaryHeap<HeapEntry>,
    next_generation: u64,
}

impl Default for TimerWheel {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerWheel {
    pub fn new() -> Self {
        Self {
            current: HashMap::new(),
            heap: BinaryHeap::new(),
            next_generation: 0,
        }
    }

    /// Schedules `key` to fire at `deadline`. If `key` was already
    /// scheduled, the old deadline is silently superseded.
    pub fn schedule(&mut self, key: TimerKey, deadline: TokioInstant) {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.current.insert(key.clone(), generation);
        self.heap.push(HeapEntry {
            deadline,
            generation,
            key,
        });
    }

    /// Shorthand for `schedule(key, Instant::now() + duration)`.
    pub fn schedule_in(&mut self, key: TimerKey, duration: Duration) {
        self.schedule(key, TokioInstant::now() + duration);
    }

    /// Cancels a single timer. Returns `true` if it was scheduled.
    pub fn cancel(&mut self, key: &TimerKey) -> bool {
        self.current.remove(key).is_some()
    }

    /// Cancels every timer scheduled for `(room_id, turn_id)`, regardless of
    /// purpose. Used when a turn ends early (all guessed, drawer left,
    /// skip-voted) and any outstanding hint-reveal/turn-duration timers for
    /// that turn are now moot.
    pub fn cancel_turn(&mut self, room_id: &RoomId, turn_id: TurnId) {
        self.current
            .retain(|key, _| !(key.room_id == *room_id && key.turn_id == turn_id));
    }

    /// Number of timers currently scheduled (not yet fired or cancelled).
    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Waits for the next timer to fire and returns its key.
    ///
    /// Pends forever if nothing is scheduled — safe to await inside
    /// `tokio::select!` alongside other branches.
    pub async fn next_expired(&mut self) -> TimerKey {
        loop {
            let Some(entry) = self.heap.peek() else {
                std::future::pending::<()>().await;
                unreachable!()
            };

            match self.current.get(&entry.key) {
                Some(&generation) if generation == entry.generation => {
                    let deadline = entry.deadline;
                    time::sleep_until(deadline).await;
                    let entry = self.heap.pop().expect("just peeked");
                    self.current.remove(&entry.key);
                    trace!(room_id = %entry.key.room_id, turn_id = %entry.key.turn_id, purpose = ?entry.key.purpose, "timer fired");
                    return entry.key;
                }
                _ => {
                    // Stale: cancelled or superseded by a later `schedule`.
                    self.heap.pop();
                }
            }
        }
    }
}
