use alloc::collections::VecDeque;
use serde::{Deserialize, Serialize};

use crate::*;

/// Default number of undo steps kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Settled board and score as they were before an action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub board: Board,
    pub score: Score,
}

impl HistorySnapshot {
    /// Captures an independent copy of `board` with animation hints stripped.
    pub fn capture(board: &Board, score: Score) -> Self {
        Self {
            board: board.settled(),
            score,
        }
    }
}

/// Bounded undo stack that drops its oldest entries first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    entries: VecDeque<HistorySnapshot>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, snapshot: HistorySnapshot) {
        if self.limit == 0 {
            return;
        }
        while self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    pub fn pop(&mut self) -> Option<HistorySnapshot> {
        self.entries.pop_back()
    }

    pub fn peek(&self) -> Option<&HistorySnapshot> {
        self.entries.back()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
