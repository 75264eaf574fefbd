//! The room settings domain.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Word list language. Custom word lists (when present) override this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Spanish,
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

/// How the word pattern is presented and how words are sourced.
///
/// `Hidden` and `Combination` are implementer decisions — see DESIGN.md.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordMode {
    Normal,
    Hidden,
    Combination,
}

impl Default for WordMode {
    fn default() -> Self {
        WordMode::Normal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

/// Fully-resolved room settings, after merging a patch into defaults and
/// validating against the settings domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSettings {
    pub max_players: u32,
    pub rounds: u32,
    pub draw_time_seconds: u32,
    pub language: Language,
    pub hints: u32,
    pub word_mode: WordMode,
    pub custom_words: Option<Vec<String>>,
    pub is_private: bool,
    pub allow_mid_game_join: bool,
}

impl RoomSettings {
    pub fn public_defaults() -> Self {
        Self {
            max_players: 8,
            rounds: 3,
            draw_time_seconds: 80,
            language: Language::English,
            hints: 2,
            word_mode: WordMode::Normal,
            custom_words: None,
            is_private: false,
            allow_mid_game_join: true,
        }
    }

    pub fn private_defaults() -> Self {
        Self {
            is_private: true,
            ..Self::public_defaults()
        }
    }

    /// Validates the settings domain. Does not check
    /// `max_players` against the room's current occupancy — that's a
    /// `RoomError`, not a `ProtocolError`, raised by the room itself.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let max_players_range = if self.is_private { 2..=20 } else { 2..=8 };
        if !max_players_range.contains(&self.max_players) {
            return Err(ProtocolError::InvalidSettings(format!(
                "max_players {} out of range {:?}",
                self.max_players, max_players_range
            )));
        }
        if !(1..=10).contains(&self.rounds) {
            return Err(ProtocolError::InvalidSettings(format!(
                "rounds {} out of range 1..=10",
                self.rounds
            )));
        }
        if !(30..=240).contains(&self.draw_time_seconds) {
            return Err(ProtocolError::InvalidSettings(format!(
                "draw_time_seconds {} out of range 30..=240",
                self.draw_time_seconds
            )));
        }
        if !(0..=5).contains(&self.hints) {
            return Err(ProtocolError::InvalidSettings(format!(
                "hints {} out of range 0..=5",
                self.hints
            )));
        }
        if let Some(words) = &self.custom_words {
            if words.len() < 10 {
                return Err(ProtocolError::InvalidSettings(format!(
                    "custom_words has {} entries, need >= 10",
                    words.len()
                )));
            }
        }
        Ok(())
    }
}

/// A partial update to `RoomSettings`; every field is optional so clients
/// can send only what they want to change (`update_room_settings(partial)`,
/// `create_private_room(settings)`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomSettingsPatch {
    pub max_players: Option<u32>,
    pub rounds: Option<u32>,
    pub draw_time_seconds: Option<u32>,
    pub language: Option<Language>,
    pub hints: Option<u32>,
    pub word_mode: Option<WordMode>,
    pub custom_words: Option<Vec<String>>,
    pub is_private: Option<bool>,
    pub allow_mid_game_join: Option<bool>,
}

impl RoomSettingsPatch {
    /// Applies this patch on top of `base`, returning validated settings.
    pub fn apply(&self, base: &RoomSettings) -> Result<RoomSettings, ProtocolError> {
        let merged = RoomSettings {
            max_players: self.max_players.unwrap_or(base.max_players),
            rounds: self.rounds.unwrap_or(base.rounds),
            draw_time_seconds: self.draw_time_seconds.unwrap_or(base.draw_time_seconds),
            language: self.language.unwrap_or(base.language),
            hints: self.hints.unwrap_or(base.hints),
            word_mode: self.word_mode.unwrap_or(base.word_mode),
            custom_words: self.custom_words.clone().or_else(|| base.custom_words.clone()),
            is_private: self.is_private.unwrap_or(base.is_private),
            allow_mid_game_join: self.allow_mid_game_join.unwrap_or(base.allow_mid_game_join),
        };
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_defaults_are_valid() {
        assert!(RoomSettings::public_defaults().validate().is_ok());
    }

    #[test]
    fn test_private_defaults_are_valid() {
        assert!(RoomSettings::private_defaults().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_public_max_players_above_8() {
        let mut s = RoomSettings::public_defaults();
        s.max_players = 9;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_allows_private_max_players_up_to_20() {
        let mut s = RoomSettings::private_defaults();
        s.max_players = 20;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_custom_words_below_10() {
        let mut s = RoomSettings::public_defaults();
        s.custom_words = Some(vec!["a".into(); 9]);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_custom_words_at_10() {
        let mut s = RoomSettings::public_defaults();
        s.custom_words = Some(vec!["a".into(); 10]);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_patch_apply_overrides_only_given_fields() {
        let base = RoomSettings::public_defaults();
        let patch = RoomSettingsPatch {
            rounds: Some(5),
            ..Default::default()
        };
        let merged = patch.apply(&base).unwrap();
        assert_eq!(merged.rounds, 5);
        assert_eq!(merged.max_players, base.max_players);
    }

    #[test]
    fn test_patch_apply_rejects_invalid_merge() {
        let base = RoomSettings::public_defaults();
        let patch = RoomSettingsPatch {
            draw_time_seconds: Some(10),
            ..Default::default()
        };
        assert!(patch.apply(&base).is_err());
    }
}
