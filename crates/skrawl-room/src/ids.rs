//! Room id and invite code allocation. Allocation rejection-samples the
//! 6-char base36 space until a unique id is found.

use rand::Rng;
use skrawl_protocol::{InviteCode, RoomId};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ROOM_ID_LEN: usize = 6;
const INVITE_CODE_LEN: usize = 8;

/// Consecutive collisions past this count during rejection sampling indicate
/// the id space is saturated; the caller should treat this as a fatal
/// background condition rather than loop forever.
pub const MAX_COLLISION_RETRIES: u32 = 64;

fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect()
}

/// Rejection-samples a 6-char base36 room id that isn't in `existing`.
///
/// Returns `None` if `MAX_COLLISION_RETRIES` consecutive collisions occur —
/// the caller should log this as fatal-background (space saturation).
pub fn allocate_room_id(existing: &std::collections::HashSet<RoomId>) -> Option<RoomId> {
    for _ in 0..MAX_COLLISION_RETRIES {
        let candidate = RoomId::new(random_base36(ROOM_ID_LEN));
        if !existing.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Rejection-samples an 8-char base36 invite code that isn't in `existing`.
pub fn allocate_invite_code(existing: &std::collections::HashSet<InviteCode>) -> Option<InviteCode> {
    for _ in 0..MAX_COLLISION_RETRIES {
        let candidate = InviteCode::new(random_base36(INVITE_CODE_LEN));
        if !existing.contains(&candidate) {
            return Some(candidate);
        }
    }
    None
}
