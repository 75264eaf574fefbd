//! Hint reveal scheduling.
//!
//! Reveal *timing* (`T*k/(H+1)` remaining time, k=1..H) is computed here as
//! plain durations; the room actor is responsible for turning each one into
//! a `skrawl_timer::TimerKey::HintReveal` deadline. Reveal *selection* (which
//! letter) is deterministic given the turn id, so two runs of the same turn
//! reveal letters in the same order — useful for tests and for replaying a
//! turn's canvas/hint history to a reconnecting player.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// The elapsed-time-from-turn-start instants at which each of `hint_count`
/// hints fires, given the turn's total duration. Hint `k` (1..H) fires at
/// elapsed `T*k/(H+1)`, i.e. with `T*(H+1-k)/(H+1)` remaining — hints land
/// progressively later in the turn, evenly spaced.
pub fn reveal_offsets(total: Duration, hint_count: u32) -> Vec<Duration> {
    if hint_count == 0 {
        return Vec::new();
    }
    let denom = hint_count as f64 + 1.0;
    (1..=hint_count)
        .map(|k| {
            let frac = k as f64 / denom;
            Duration::from_secs_f64(total.as_secs_f64() * frac)
        })
        .collect()
}

/// Deterministic (seeded by the turn id) selection of which unrevealed
/// letter position to reveal next.
pub struct HintScheduler {
    /// Indices into the word's `chars()` that are alphanumeric, in a
    /// pre-shuffled reveal order.
    order: Vec<usize>,
    next: usize,
}

impl HintScheduler {
    /// `seed` is the turn id: same word + same turn id always reveals
    /// letters in the same order.
    pub fn new(word: &str, seed: u64) -> Self {
        let mut order: Vec<usize> = word
            .chars()
            .enumerate()
            .filter(|(_, c)| c.is_alphanumeric())
            .map(|(i, _)| i)
            .collect();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);
        Self { order, next: 0 }
    }

    /// Reveals the next letter position, or `None` if every letter has
    /// already been revealed (more hints configured than letters to give).
    pub fn reveal_next(&mut self) -> Option<usize> {
        let idx = self.order.get(self.next).copied();
        if idx.is_some() {
            self.next += 1;
        }
        idx
    }
}

/// Builds the client-visible word pattern: spaces are preserved as spaces,
/// revealed letters show their character, everything else is `_`.
pub fn word_pattern(word: &str, revealed: &std::collections::HashSet<usize>) -> String {
    word.chars()
        .enumerate()
        .map(|(i, c)| {
            if c == ' ' {
                ' '
            } else if revealed.contains(&i) {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_reveal_offsets_zero_hints_is_empty() {
        assert!(reveal_offsets(Duration::from_secs(80), 0).is_empty());
    }

    #[test]
    fn test_reveal_offsets_two_hints_splits_into_thirds() {
        let offsets = reveal_offsets(Duration::from_secs(90), 2);
        assert_eq!(offsets.len(), 2);
        // k=1: remaining 2/3*T -> elapsed 1/3*T = 30s
        // k=2: remaining 1/3*T -> elapsed 2/3*T = 60s
        assert!((offsets[0].as_secs_f64() - 30.0).abs() < 0.01);
        assert!((offsets[1].as_secs_f64() - 60.0).abs() < 0.01);
    }

    #[test]
    fn test_reveal_offsets_are_increasing() {
        let offsets = reveal_offsets(Duration::from_secs(80), 3);
        assert!(offsets[0] < offsets[1]);
        assert!(offsets[1] < offsets[2]);
    }

    #[test]
    fn test_hint_scheduler_reveals_only_alphanumeric_positions() {
        let mut sched = HintScheduler::new("a cat", 42);
        let mut revealed = Vec::new();
        while let Some(idx) = sched.reveal_next() {
            revealed.push(idx);
        }
        // "a cat" has 4 alphanumeric chars: indices 0, 2, 3, 4.
        assert_eq!(revealed.len(), 4);
        assert!(!revealed.contains(&1)); // the space
    }

    #[test]
    fn test_hint_scheduler_is_deterministic_for_same_seed() {
        let mut a = HintScheduler::new("apple", 7);
        let mut b = HintScheduler::new("apple", 7);
        assert_eq!(a.reveal_next(), b.reveal_next());
        assert_eq!(a.reveal_next(), b.reveal_next());
    }

    #[test]
    fn test_hint_scheduler_exhausts_to_none() {
        let mut sched = HintScheduler::new("hi", 1);
        assert!(sched.reveal_next().is_some());
        assert!(sched.reveal_next().is_some());
        assert_eq!(sched.reveal_next(), None);
    }

    #[test]
    fn test_word_pattern_preserves_spaces_and_masks_unrevealed() {
        let revealed: HashSet<usize> = [0, 2].into_iter().collect();
        assert_eq!(word_pattern("a cat", &revealed), "a c__");
    }

    #[test]
    fn test_word_pattern_all_revealed_shows_word() {
        let revealed: HashSet<usize> = (0..3).collect();
        assert_eq!(word_pattern("cat", &revealed), "cat");
    }
}
