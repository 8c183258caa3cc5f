//! Landmark normalizer: raw 21-point hand landmarks to the per-frame
//! feature vector the gesture engine consumes.

use crate::types::{FingerVector, HandFeatures, HandLandmarks, landmark};

/// Extract finger-openness flags and the index/thumb tip positions.
///
/// Returns `None` when the tips needed for motion and pinch tracking are
/// missing, which downstream treats the same as "no hand". Individual
/// finger lookups that fail default to "closed" so a partial detection can
/// never fake the fist or palm configurations that drive copy/paste.
pub fn extract_features(hand: &HandLandmarks) -> Option<HandFeatures> {
    let index_tip = hand.point(landmark::INDEX_TIP)?;
    let thumb_tip = hand.point(landmark::THUMB_TIP)?;

    Some(HandFeatures {
        fingers: finger_vector(hand),
        index_tip: (index_tip[0], index_tip[1]),
        thumb_tip: (thumb_tip[0], thumb_tip[1]),
    })
}

/// Per-finger openness flags, ordered {thumb, index, middle, ring, pinky}.
pub fn finger_vector(hand: &HandLandmarks) -> FingerVector {
    [
        thumb_extended(hand),
        finger_extended(hand, landmark::INDEX_TIP),
        finger_extended(hand, landmark::MIDDLE_TIP),
        finger_extended(hand, landmark::RING_TIP),
        finger_extended(hand, landmark::PINKY_TIP),
    ]
}

/// The thumb reads as extended when its tip sits outward of its own MCP
/// joint on the x-axis (front-camera mirrored convention).
fn thumb_extended(hand: &HandLandmarks) -> bool {
    match (
        hand.point(landmark::THUMB_TIP),
        hand.point(landmark::THUMB_MCP),
    ) {
        (Some(tip), Some(mcp)) => tip[0] < mcp[0],
        _ => false,
    }
}

/// Non-thumb fingers read as extended when the tip is above (smaller y)
/// their own PIP joint, two indices below the tip.
fn finger_extended(hand: &HandLandmarks, tip_index: usize) -> bool {
    match (hand.point(tip_index), hand.point(tip_index - 2)) {
        (Some(tip), Some(pip)) => tip[1] < pip[1],
        _ => false,
    }
}
