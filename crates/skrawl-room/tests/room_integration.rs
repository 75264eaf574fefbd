//! End-to-end tests against a running room actor, driven entirely through
//! `RoomHandle` the way a transport-layer connection handler would.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use skrawl_protocol::{
    ClientEvent, Language, RoomId, RoomSettings, ServerEvent, ServerPayload, TurnEndReason,
    Visibility, WordMode,
};
use skrawl_room::{spawn_room, NoopSessionStore, PlayerSender, RoomHandle, RoomOptions, OUTBOUND_QUEUE_CAPACITY};
use skrawl_session::PlayerProfile;

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

fn profile(name: &str) -> PlayerProfile {
    PlayerProfile {
        user_id: skrawl_protocol::UserId::new(name),
        display_name: name.to_string(),
        avatar_ref: None,
    }
}

fn settings(rounds: u32, words: &[&str]) -> RoomSettings {
    RoomSettings {
        max_players: 8,
        rounds,
        draw_time_seconds: 80,
        language: Language::English,
        hints: 2,
        word_mode: WordMode::Normal,
        custom_words: Some(words.iter().map(|w| w.to_string()).collect()),
        is_private: false,
        allow_mid_game_join: true,
    }
}

fn spawn(settings: RoomSettings) -> RoomHandle {
    let options = RoomOptions {
        room_id: RoomId::new("room1"),
        visibility: Visibility::Public,
        settings,
        reconnect_grace: Duration::from_millis(200),
        session_store: std::sync::Arc::new(NoopSessionStore),
    };
    spawn_room(options, 32)
}

async fn join(handle: &RoomHandle, name: &str) -> mpsc::Receiver<ServerPayload> {
    let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    handle.join(profile(name), PlayerSender::new(tx)).await.unwrap();
    rx
}

/// Drains `rx` until a payload matching `pred` arrives, or times out.
async fn wait_for(
    rx: &mut mpsc::Receiver<ServerPayload>,
    pred: impl Fn(&ServerPayload) -> bool,
) -> ServerPayload {
    timeout(RECV_TIMEOUT, async {
        loop {
            let payload = rx.recv().await.expect("channel closed before match");
            if pred(&payload) {
                return payload;
            }
        }
    })
    .await
    .expect("timed out waiting for expected payload")
}

fn is_word_selection(p: &ServerPayload) -> bool {
    matches!(p, ServerPayload::Game(ServerEvent::WordSelection { .. }))
}

fn is_turn_ended(p: &ServerPayload) -> bool {
    matches!(p, ServerPayload::Game(ServerEvent::TurnEnded { .. }))
}

fn is_game_ended(p: &ServerPayload) -> bool {
    matches!(p, ServerPayload::Game(ServerEvent::GameEnded { .. }))
}

fn is_hint_revealed(p: &ServerPayload) -> bool {
    matches!(p, ServerPayload::Game(ServerEvent::HintRevealed { .. }))
}

// ---------------------------------------------------------------------------
// Full-turn scoring, round/game-end cycle
// ---------------------------------------------------------------------------

/// Drives one turn to completion: waits for the drawer's word choices,
/// picks the first one, then has every other player guess it correctly.
/// Returns the `TurnEnded` result so the caller can assert on it.
async fn play_turn_to_all_guessed(
    handle: &RoomHandle,
    alice_rx: &mut mpsc::Receiver<ServerPayload>,
    bob_rx: &mut mpsc::Receiver<ServerPayload>,
) -> skrawl_protocol::TurnResult {
    let snapshot = handle.snapshot().await.unwrap();
    let drawer_id = snapshot.turn.expect("a turn should be active").drawer_id;
    let (drawer_rx, guesser_id) = if drawer_id.as_str() == "alice" {
        (&mut *alice_rx, "bob")
    } else {
        (&mut *bob_rx, "alice")
    };

    let word_selection = wait_for(drawer_rx, is_word_selection).await;
    let word = match word_selection {
        ServerPayload::Game(ServerEvent::WordSelection { choices, .. }) => choices[0].clone(),
        _ => unreachable!(),
    };
    handle.send_event(drawer_id.clone(), ClientEvent::SelectWord { word: word.clone() }).await.unwrap();

    handle
        .send_event(skrawl_protocol::UserId::new(guesser_id), ClientEvent::ChatMessage { text: word.clone() })
        .await
        .unwrap();

    let guesser_rx = if guesser_id == "alice" { alice_rx } else { bob_rx };
    match wait_for(guesser_rx, is_turn_ended).await {
        ServerPayload::Game(ServerEvent::TurnEnded { result }) => result,
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_full_turn_scoring_and_game_end_cycle() {
    let handle = spawn(settings(1, &["apple", "banana", "cherry"]));
    let mut alice_rx = join(&handle, "alice").await;
    let mut bob_rx = join(&handle, "bob").await;

    handle
        .send_event(skrawl_protocol::UserId::new("alice"), ClientEvent::StartGame)
        .await
        .unwrap();

    // One round with two players means both take a turn drawing before the
    // round (and, with `rounds: 1`, the game) ends.
    let first = play_turn_to_all_guessed(&handle, &mut alice_rx, &mut bob_rx).await;
    assert_eq!(first.reason, TurnEndReason::AllGuessed);
    assert_eq!(first.guesses.len(), 1);
    assert!(first.guesses[0].guessed_correctly);

    let second = play_turn_to_all_guessed(&handle, &mut alice_rx, &mut bob_rx).await;
    assert_eq!(second.reason, TurnEndReason::AllGuessed);
    assert_ne!(second.drawer_id, first.drawer_id, "each player draws once per round");

    let game_ended = wait_for(&mut alice_rx, is_game_ended).await;
    match game_ended {
        ServerPayload::Game(ServerEvent::GameEnded { result }) => {
            assert!(!result.winners.is_empty());
            assert!(result.final_scores.values().any(|&s| s > 0));
        }
        _ => unreachable!(),
    }

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.status, "waiting");
    assert_eq!(snapshot.round_index, 0);
}

// ---------------------------------------------------------------------------
// Disconnect / grace / reconnect
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_disconnect_within_grace_reconnects_without_losing_seat() {
    let handle = spawn(settings(2, &["apple", "banana", "cherry"]));
    let _alice_rx = join(&handle, "alice").await;
    let _bob_rx = join(&handle, "bob").await;

    handle
        .send_event(skrawl_protocol::UserId::new("alice"), ClientEvent::StartGame)
        .await
        .unwrap();

    handle.disconnected(skrawl_protocol::UserId::new("bob")).await.unwrap();

    // Reconnect well within the 200ms grace window configured above.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let mut bob_rx2 = join(&handle, "bob").await;

    // A reconnecting player gets an immediate canvas sync.
    let synced = wait_for(&mut bob_rx2, |p| matches!(p, ServerPayload::Game(ServerEvent::CanvasState { .. }))).await;
    assert!(matches!(synced, ServerPayload::Game(ServerEvent::CanvasState { .. })));

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.players.len(), 2, "bob's seat must survive a within-grace reconnect");
}

#[tokio::test]
async fn test_disconnect_past_grace_is_removed_from_room() {
    let handle = spawn(settings(2, &["apple", "banana", "cherry"]));
    let _alice_rx = join(&handle, "alice").await;
    let _bob_rx = join(&handle, "bob").await;

    handle
        .send_event(skrawl_protocol::UserId::new("alice"), ClientEvent::StartGame)
        .await
        .unwrap();

    handle.disconnected(skrawl_protocol::UserId::new("bob")).await.unwrap();

    // The grace window is 200ms; wait well past it.
    tokio::time::sleep(Duration::from_millis(400)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.players.len(), 1, "bob should have been dropped once grace elapsed");
}

// ---------------------------------------------------------------------------
// Hint reveal timer
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn test_hint_reveal_timer_fires_during_drawing() {
    let mut settings = settings(1, &["elephant"]);
    settings.draw_time_seconds = 10;
    settings.hints = 3;
    let handle = spawn(settings);
    let mut alice_rx = join(&handle, "alice").await;
    let mut bob_rx = join(&handle, "bob").await;

    handle
        .send_event(skrawl_protocol::UserId::new("alice"), ClientEvent::StartGame)
        .await
        .unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    let drawer_id = snapshot.turn.unwrap().drawer_id;
    let (drawer_rx, guesser_rx) = if drawer_id.as_str() == "alice" {
        (&mut alice_rx, &mut bob_rx)
    } else {
        (&mut bob_rx, &mut alice_rx)
    };

    let word_selection = wait_for(drawer_rx, is_word_selection).await;
    let word = match word_selection {
        ServerPayload::Game(ServerEvent::WordSelection { choices, .. }) => choices[0].clone(),
        _ => unreachable!(),
    };
    handle.send_event(drawer_id, ClientEvent::SelectWord { word }).await.unwrap();

    // Advance the paused clock past the first hint's reveal offset; the
    // room's timer wheel fires on the same runtime so this alone drives it.
    tokio::time::advance(Duration::from_secs(9)).await;

    let revealed = wait_for(guesser_rx, is_hint_revealed).await;
    assert!(matches!(revealed, ServerPayload::Game(ServerEvent::HintRevealed { .. })));
}

// ---------------------------------------------------------------------------
// Vote-kick / vote-skip
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_vote_kick_requires_strict_majority_not_ties() {
    // Five players total means four are eligible to vote on the fifth
    // (eve), so a 2-of-4 vote is an exact, even tie.
    let handle = spawn(settings(1, &["apple", "banana", "cherry"]));
    let _a = join(&handle, "alice").await;
    let _b = join(&handle, "bob").await;
    let _c = join(&handle, "carol").await;
    let _d = join(&handle, "dave").await;
    let _e = join(&handle, "eve").await;

    handle
        .send_event(
            skrawl_protocol::UserId::new("alice"),
            ClientEvent::VoteKick { user_id: skrawl_protocol::UserId::new("eve") },
        )
        .await
        .unwrap();
    handle
        .send_event(
            skrawl_protocol::UserId::new("bob"),
            ClientEvent::VoteKick { user_id: skrawl_protocol::UserId::new("eve") },
        )
        .await
        .unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.players.len(), 5, "a 2-of-4 tie must not kick");

    // A third vote makes it a strict majority (3-of-4) and kicks.
    handle
        .send_event(
            skrawl_protocol::UserId::new("carol"),
            ClientEvent::VoteKick { user_id: skrawl_protocol::UserId::new("eve") },
        )
        .await
        .unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.players.len(), 4, "a strict majority should kick eve");
    assert!(snapshot.players.iter().all(|p| p.user_id.as_str() != "eve"));
}

#[tokio::test]
async fn test_vote_skip_ends_turn_early() {
    let mut s = settings(1, &["apple", "banana", "cherry"]);
    s.draw_time_seconds = 80;
    let handle = spawn(s);
    let mut alice_rx = join(&handle, "alice").await;
    let mut bob_rx = join(&handle, "bob").await;
    let mut carol_rx = join(&handle, "carol").await;

    handle
        .send_event(skrawl_protocol::UserId::new("alice"), ClientEvent::StartGame)
        .await
        .unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    let drawer_id = snapshot.turn.unwrap().drawer_id;

    let drawer_rx = if drawer_id.as_str() == "alice" {
        &mut alice_rx
    } else if drawer_id.as_str() == "bob" {
        &mut bob_rx
    } else {
        &mut carol_rx
    };
    let word_selection = wait_for(drawer_rx, is_word_selection).await;
    let word = match word_selection {
        ServerPayload::Game(ServerEvent::WordSelection { choices, .. }) => choices[0].clone(),
        _ => unreachable!(),
    };
    handle.send_event(drawer_id.clone(), ClientEvent::SelectWord { word }).await.unwrap();

    let non_drawers: Vec<&str> =
        ["alice", "bob", "carol"].into_iter().filter(|&n| n != drawer_id.as_str()).collect();

    // With 3 players, only 2 are eligible to skip-vote (everyone but the
    // drawer), so a single vote is already at least half.
    handle
        .send_event(skrawl_protocol::UserId::new(non_drawers[0]), ClientEvent::VoteSkip)
        .await
        .unwrap();

    let everyone_rx = if drawer_id.as_str() == "alice" {
        &mut bob_rx
    } else {
        &mut alice_rx
    };
    let turn_ended = wait_for(everyone_rx, is_turn_ended).await;
    match turn_ended {
        ServerPayload::Game(ServerEvent::TurnEnded { result }) => {
            assert_eq!(result.reason, TurnEndReason::Skipped);
        }
        _ => unreachable!(),
    }
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_lobby_chat_rate_limit_rejects_past_budget() {
    let handle = spawn(settings(1, &["apple", "banana", "cherry"]));
    let _alice_rx = join(&handle, "alice").await;
    let _bob_rx = join(&handle, "bob").await;

    let user_id = skrawl_protocol::UserId::new("alice");
    // CHAT_MAX_PER_WINDOW is 3; the first 3 should succeed.
    for i in 0..3 {
        handle
            .send_event(user_id.clone(), ClientEvent::LobbyChat { text: format!("message {i}") })
            .await
            .unwrap_or_else(|e| panic!("message {i} should be under budget: {e}"));
    }

    let result = handle
        .send_event(user_id, ClientEvent::LobbyChat { text: "one too many".to_string() })
        .await;
    assert!(
        matches!(result, Err(skrawl_room::RoomError::RateLimited { .. })),
        "4th lobby chat within the window should be rate limited, got {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Auth rate limiting (session layer), exercised through SessionManager
// directly since it sits below the room layer.
// ---------------------------------------------------------------------------

#[test]
fn test_session_auth_rate_limit_closes_after_budget() {
    use skrawl_session::{SessionConfig, SessionError, SessionManager};

    let mut mgr = SessionManager::new(SessionConfig { reconnect_grace_secs: 120, max_auths_per_minute: 2 });
    let user_id = skrawl_protocol::UserId::new("alice");

    mgr.check_auth_rate(&user_id).unwrap();
    mgr.check_auth_rate(&user_id).unwrap();
    let result = mgr.check_auth_rate(&user_id);
    assert!(matches!(result, Err(SessionError::RateLimited { .. })));
}
