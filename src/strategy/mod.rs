//! Betting strategy: target selection, stake escalation, and the
//! round-time gate.

pub mod escalation;
pub mod round_clock;

use tracing::debug;

use crate::types::{Face, Round};

/// Pick the face to bet on from the most recent rounds.
///
/// Considers the first `min(rounds_to_consider, window.len())` rounds and
/// returns the smallest face that did not show on any die in them, or
/// `None` when every face appeared. An empty window yields `Face::One`.
pub fn best_target(window: &[Round], rounds_to_consider: usize) -> Option<Face> {
    let considered = &window[..rounds_to_consider.min(window.len())];

    let mut seen = [false; 6];
    for face in considered.iter().flat_map(|r| r.faces()) {
        seen[usize::from(face.value()) - 1] = true;
    }

    let target = Face::ALL.into_iter().find(|f| !seen[usize::from(f.value()) - 1]);
    debug!(
        rounds = considered.len(),
        target = ?target.map(Face::value),
        "Target computed"
    );
    target
}

/// Numeric form of a target: the face value, or `0` for no target.
pub fn target_value(target: Option<Face>) -> u8 {
    target.map_or(0, Face::value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
