//! Lobby chat.
//!
//! Distinct from in-game guess routing (`guess.rs`): this is the
//! `status == waiting` chat channel, plus the system-message feed used for
//! join/leave/ready/settings-change notices in every status.

use skrawl_protocol::{LobbyMessage, LobbyMessageKind, UserId};

/// Codepoints, not bytes — a message is trimmed to this length by character
/// count.
pub const MAX_MESSAGE_CODEPOINTS: usize = 200;

/// Appends system notices and (while `status == waiting`) player chat,
/// assigning monotonic message ids.
#[derive(Debug, Default)]
pub struct LobbyChat {
    messages: Vec<LobbyMessage>,
    next_id: u64,
    banned_words: Vec<String>,
}

impl LobbyChat {
    pub fn new(banned_words: Vec<String>) -> Self {
        Self {
            messages: Vec::new(),
            next_id: 0,
            banned_words,
        }
    }

    fn push(&mut self, sender_user_id: Option<UserId>, kind: LobbyMessageKind, text: String, now_ms: u64) -> LobbyMessage {
        let message = LobbyMessage {
            id: self.next_id,
            sender_user_id,
            kind,
            text,
            ts_ms: now_ms,
        };
        self.next_id += 1;
        self.messages.push(message.clone());
        message
    }

    /// Player chat. Caller must already have checked `status == waiting` —
    /// chat outside the lobby goes through guess evaluation instead. Trims
    /// to `MAX_MESSAGE_CODEPOINTS` and runs the word filter before storing.
    pub fn chat(&mut self, sender: UserId, text: &str, now_ms: u64) -> LobbyMessage {
        let trimmed = truncate_codepoints(text.trim(), MAX_MESSAGE_CODEPOINTS);
        let filtered = self.filter_words(&trimmed);
        self.push(Some(sender), LobbyMessageKind::Chat, filtered, now_ms)
    }

    /// A system notice: join, leave, ready/unready, settings changed.
    pub fn system(&mut self, text: impl Into<String>, now_ms: u64) -> LobbyMessage {
        self.push(None, LobbyMessageKind::System, text.into(), now_ms)
    }

    /// Replaces every whole-word occurrence (case-insensitive) of a banned
    /// word with `*` repeated to its length.
    fn filter_words(&self, text: &str) -> String {
        if self.banned_words.is_empty() {
            return text.to_string();
        }
        text.split_inclusive(' ')
            .map(|token| {
                let (word, trailing_space) = match token.strip_suffix(' ') {
                    Some(w) => (w, " "),
                    None => (token, ""),
                };
                let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
                if self
                    .banned_words
                    .iter()
                    .any(|banned| banned.eq_ignore_ascii_case(bare))
                {
                    format!("{}{}", "*".repeat(word.chars().count()), trailing_space)
                } else {
                    token.to_string()
                }
            })
            .collect()
    }

    /// All messages since the room opened (or since `clear`).
    pub fn history(&self) -> &[LobbyMessage] {
        &self.messages
    }

    /// Clears the transcript — called when the room's last player leaves.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

fn truncate_codepoints(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_trims_to_max_codepoints() {
        let mut chat = LobbyChat::new(vec![]);
        let long = "a".repeat(300);
        let msg = chat.chat(UserId::new("alice"), &long, 0);
        assert_eq!(msg.text.chars().count(), MAX_MESSAGE_CODEPOINTS);
    }

    #[test]
    fn test_chat_assigns_monotonic_ids() {
        let mut chat = LobbyChat::new(vec![]);
        let m1 = chat.chat(UserId::new("alice"), "hi", 0);
        let m2 = chat.chat(UserId::new("bob"), "hey", 1);
        assert_eq!(m1.id, 0);
        assert_eq!(m2.id, 1);
    }

    #[test]
    fn test_system_message_has_no_sender() {
        let mut chat = LobbyChat::new(vec![]);
        let msg = chat.system("alice joined", 0);
        assert!(msg.sender_user_id.is_none());
        assert_eq!(msg.kind, LobbyMessageKind::System);
    }

    #[test]
    fn test_word_filter_masks_banned_word() {
        let mut chat = LobbyChat::new(vec!["banana".to_string()]);
        let msg = chat.chat(UserId::new("alice"), "banana split", 0);
        assert_eq!(msg.text, "****** split");
    }

    #[test]
    fn test_word_filter_is_case_insensitive() {
        let mut chat = LobbyChat::new(vec!["banana".to_string()]);
        let msg = chat.chat(UserId::new("alice"), "BANANA", 0);
        assert_eq!(msg.text, "******");
    }

    #[test]
    fn test_word_filter_leaves_unrelated_words() {
        let mut chat = LobbyChat::new(vec!["banana".to_string()]);
        let msg = chat.chat(UserId::new("alice"), "hello world", 0);
        assert_eq!(msg.text, "hello world");
    }

    #[test]
    fn test_clear_empties_history() {
        let mut chat = LobbyChat::new(vec![]);
        chat.chat(UserId::new("alice"), "hi", 0);
        chat.clear();
        assert!(chat.history().is_empty());
    }
}
