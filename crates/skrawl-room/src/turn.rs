//! Turn state machine types.
//!
//! ```text
//! waiting -> starting -> word_selection -> drawing -> turn_end -> round_end -> finished
//!    ^                                                    |           |
//!    |____________________________________________________|___________|
//!                  (next turn: back to word_selection, or back to waiting at game end)
//! ```

use std::collections::HashSet;
use std::time::{Duration, Instant};

use skrawl_protocol::{GuessResult, TurnId, TurnSnapshot, WordMode};

use crate::canvas::CanvasLog;
use crate::hints::{word_pattern, HintScheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Waiting,
    Starting,
    WordSelection,
    Drawing,
    TurnEnd,
    RoundEnd,
    Finished,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Starting => "starting",
            RoomStatus::WordSelection => "word_selection",
            RoomStatus::Drawing => "drawing",
            RoomStatus::TurnEnd => "turn_end",
            RoomStatus::RoundEnd => "round_end",
            RoomStatus::Finished => "finished",
        }
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Live state for the turn currently in progress.
pub struct TurnState {
    pub turn_id: TurnId,
    pub round_index: u32,
    pub drawer_id: skrawl_protocol::UserId,
    /// The secret word, once chosen. `None` during `word_selection` before
    /// the drawer picks (or the selection timer auto-picks).
    pub word: Option<String>,
    pub word_choices: Vec<String>,
    pub canvas: CanvasLog,
    pub hints: Option<HintScheduler>,
    pub revealed_indices: HashSet<usize>,
    pub hints_revealed: Vec<(u32, char)>,
    pub guesses: Vec<GuessResult>,
    pub turn_start: Instant,
    pub total_duration: Duration,
    pub word_mode: WordMode,
}

impl TurnState {
    pub fn new(
        turn_id: TurnId,
        round_index: u32,
        drawer_id: skrawl_protocol::UserId,
        word_choices: Vec<String>,
        total_duration: Duration,
        now: Instant,
    ) -> Self {
        Self::with_word_mode(
            turn_id,
            round_index,
            drawer_id,
            word_choices,
            total_duration,
            now,
            WordMode::Normal,
        )
    }

    pub fn with_word_mode(
        turn_id: TurnId,
        round_index: u32,
        drawer_id: skrawl_protocol::UserId,
        word_choices: Vec<String>,
        total_duration: Duration,
        now: Instant,
        word_mode: WordMode,
    ) -> Self {
        Self {
            turn_id,
            round_index,
            drawer_id,
            word: None,
            word_choices,
            canvas: CanvasLog::new(),
            hints: None,
            revealed_indices: HashSet::new(),
            hints_revealed: Vec::new(),
            guesses: Vec::new(),
            turn_start: now,
            total_duration,
            word_mode,
        }
    }

    /// Locks in the chosen word and arms the hint scheduler.
    pub fn select_word(&mut self, word: String) {
        self.hints = Some(HintScheduler::new(&word, self.turn_id.0));
        self.word = Some(word);
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.turn_start)
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.total_duration.saturating_sub(self.elapsed(now))
    }

    /// Reveals the next hint letter, recording it for late-joiner replay.
    /// Skips positions already uncovered by an earlier hint (possible once
    /// repeated-letter grouping below has claimed them) and, once a genuinely
    /// new letter is found, unmasks every position sharing that letter in
    /// one hint rather than dribbling them out one at a time. The returned
    /// index is the word's true character position, not a hint ordinal.
    /// No-op if the scheduler is exhausted.
    pub fn reveal_next_hint(&mut self) -> Option<(u32, char)> {
        let word = self.word.as_ref()?;
        let chars: Vec<char> = word.chars().collect();
        loop {
            let index = self.hints.as_mut()?.reveal_next()?;
            if self.revealed_indices.contains(&index) {
                continue;
            }
            let letter = chars[index];
            for (i, c) in chars.iter().enumerate() {
                if *c == letter {
                    self.revealed_indices.insert(i);
                }
            }
            self.hints_revealed.push((index as u32, letter));
            return Some((index as u32, letter));
        }
    }

    /// The drawer's word, masked for guessers. In `Hidden` mode the word's
    /// length stays hidden too — guessers see nothing at all until the
    /// first hint reveals a letter, at which point it behaves like `Normal`.
    pub fn pattern(&self) -> String {
        match &self.word {
            Some(word) if self.revealed_indices.len() == word.chars().count() => word.clone(),
            Some(_) if self.word_mode == WordMode::Hidden && self.hints_revealed.is_empty() => {
                String::new()
            }
            Some(word) => word_pattern(word, &self.revealed_indices),
            None => String::new(),
        }
    }

    pub fn to_snapshot(&self, now: Instant) -> TurnSnapshot {
        TurnSnapshot {
            turn_id: self.turn_id.0,
            round_index: self.round_index,
            drawer_id: self.drawer_id.clone(),
            word_pattern: self.pattern(),
            time_total_ms: self.total_duration.as_millis() as u64,
            time_remaining_ms: self.remaining(now).as_millis() as u64,
            hints_revealed: self.hints_revealed.clone(),
        }
    }
}
