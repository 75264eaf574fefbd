//! Append-only canvas log.

use skrawl_protocol::DrawOp;

/// Suggested cap on log length; beyond this the oldest strokes are dropped
/// from what's stored, not merely from what's broadcast.
pub const MAX_OPS: usize = 4_000;

/// Largest number of points a single `Stroke` is rebroadcast with. A drawer
/// that buffers an entire fast gesture into one giant point list must not be
/// allowed to hand every other client one oversized frame to parse and
/// render at once.
pub const MAX_POINTS_PER_BATCH: usize = 64;

/// Splits a `Stroke` with more than [`MAX_POINTS_PER_BATCH`] points into
/// several same-tool/color/size strokes of at most that many points each,
/// preserving point order. Any other op (or a `Stroke` already within the
/// limit) is returned unchanged as the sole element.
///
/// This only affects what's sent out over the wire — the original op is
/// still the one stored in [`CanvasLog`], since replaying it in one piece
/// or in chunks produces the same final canvas for a late joiner.
pub fn batch_stroke(op: DrawOp) -> Vec<DrawOp> {
    match op {
        DrawOp::Stroke {
            tool,
            color,
            size,
            points,
            user_id,
        } if points.len() > MAX_POINTS_PER_BATCH => points
            .chunks(MAX_POINTS_PER_BATCH)
            .map(|chunk| DrawOp::Stroke {
                tool,
                color: color.clone(),
                size,
                points: chunk.to_vec(),
                user_id: user_id.clone(),
            })
            .collect(),
        other => vec![other],
    }
}

/// An append-only log of drawing operations for the current turn.
///
/// `undo` only removes an op authored by the current drawer — a
/// disconnect/reconnect cycle or a stray late message from a previous
/// drawer must not let anyone erase someone else's stroke.
#[derive(Debug, Default)]
pub struct CanvasLog {
    ops: Vec<DrawOp>,
}

impl CanvasLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stroke/bucket-fill, dropping the oldest entry if the log
    /// is at capacity.
    pub fn push(&mut self, op: DrawOp) {
        if self.ops.len() >= MAX_OPS {
            self.ops.remove(0);
        }
        self.ops.push(op);
    }

    /// Removes the most recent `Stroke`/`BucketFill` authored by `drawer`.
    /// Returns `true` if something was removed. `Clear`/`Undo` markers
    /// themselves are never targets of undo.
    pub fn undo(&mut self, drawer: &skrawl_protocol::UserId) -> bool {
        if let Some(pos) = self.ops.iter().rposition(|op| match op {
            DrawOp::Stroke { user_id, .. } | DrawOp::BucketFill { user_id, .. } => {
                user_id == drawer
            }
            DrawOp::Clear | DrawOp::Undo => false,
        }) {
            self.ops.remove(pos);
            true
        } else {
            false
        }
    }

    /// Empties the log entirely (a `canvas_clear`).
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// The current op list, for `canvas_state` snapshots sent to late
    /// joiners/reconnecting players.
    pub fn snapshot(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skrawl_protocol::{Point, Tool, UserId};

    fn stroke(user: &str) -> DrawOp {
        DrawOp::Stroke {
            tool: Tool::Pen,
            color: "#000000".into(),
            size: 2,
            points: vec![Point { x: 0.0, y: 0.0 }],
            user_id: UserId::new(user),
        }
    }

    #[test]
    fn test_push_and_snapshot() {
        let mut log = CanvasLog::new();
        log.push(stroke("alice"));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_undo_removes_latest_stroke_by_drawer() {
        let mut log = CanvasLog::new();
        log.push(stroke("alice"));
        log.push(stroke("alice"));

        assert!(log.undo(&UserId::new("alice")));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_undo_ignores_non_drawer_strokes() {
        let mut log = CanvasLog::new();
        log.push(stroke("alice"));
        // Nothing from bob to undo.
        assert!(!log.undo(&UserId::new("bob")));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_undo_only_targets_most_recent() {
        let mut log = CanvasLog::new();
        log.push(stroke("alice"));
        log.push(stroke("bob"));
        log.push(stroke("alice"));

        assert!(log.undo(&UserId::new("alice")));
        // The middle op (bob's) should survive untouched.
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_clear_empties_log() {
        let mut log = CanvasLog::new();
        log.push(stroke("alice"));
        log.clear();
        assert!(log.is_empty());
    }

    #[test]
    fn test_push_drops_oldest_at_capacity() {
        let mut log = CanvasLog::new();
        for _ in 0..MAX_OPS {
            log.push(stroke("alice"));
        }
        log.push(DrawOp::Clear);
        assert_eq!(log.len(), MAX_OPS);
        assert_eq!(log.snapshot().last(), Some(&DrawOp::Clear));
    }

    fn stroke_with_points(n: usize) -> DrawOp {
        DrawOp::Stroke {
            tool: Tool::Pen,
            color: "#000000".into(),
            size: 2,
            points: (0..n).map(|i| Point { x: i as f32, y: 0.0 }).collect(),
            user_id: UserId::new("alice"),
        }
    }

    #[test]
    fn test_batch_stroke_leaves_small_stroke_untouched() {
        let op = stroke_with_points(10);
        let batches = batch_stroke(op.clone());
        assert_eq!(batches, vec![op]);
    }

    #[test]
    fn test_batch_stroke_splits_large_stroke_into_chunks() {
        let batches = batch_stroke(stroke_with_points(150));
        assert_eq!(batches.len(), 3);
        let lengths: Vec<usize> = batches
            .iter()
            .map(|op| match op {
                DrawOp::Stroke { points, .. } => points.len(),
                _ => panic!("expected Stroke"),
            })
            .collect();
        assert_eq!(lengths, vec![64, 64, 22]);
    }

    #[test]
    fn test_batch_stroke_preserves_point_order() {
        let batches = batch_stroke(stroke_with_points(130));
        let mut all_points = Vec::new();
        for op in &batches {
            if let DrawOp::Stroke { points, .. } = op {
                all_points.extend(points.iter().cloned());
            }
        }
        assert_eq!(all_points.len(), 130);
        assert_eq!(all_points[0], Point { x: 0.0, y: 0.0 });
        assert_eq!(all_points[129], Point { x: 129.0, y: 0.0 });
    }

    #[test]
    fn test_batch_stroke_passes_through_non_stroke_ops() {
        assert_eq!(batch_stroke(DrawOp::Clear), vec![DrawOp::Clear]);
    }
}
