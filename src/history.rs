//! Rolling outcome history.
//!
//! The server sends its own list of recent rounds with every state update,
//! so the history is replaced wholesale rather than appended to.

use crate::types::Round;

/// Most recently observed rounds, most recent first.
#[derive(Debug, Clone, Default)]
pub struct OutcomeHistory {
    rounds: Vec<Round>,
}

impl OutcomeHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with the rounds of a new state update.
    pub fn replace(&mut self, rounds: Vec<Round>) {
        self.rounds = rounds;
    }

    /// The first `n` rounds, or all of them if fewer are available.
    pub fn window(&self, n: usize) -> &[Round] {
        &self.rounds[..n.min(self.rounds.len())]
    }

    /// The most recent round.
    pub fn latest(&self) -> Option<&Round> {
        self.rounds.first()
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}
