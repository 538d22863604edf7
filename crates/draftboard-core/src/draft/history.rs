// Linear undo/redo history around an immutable state value.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// What to do when a transition yields a state equal to the present one
/// (e.g. assigning a player who is no longer available).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoopPolicy {
    /// Push a history entry anyway. Undo always reverts exactly one
    /// `apply`, no-op or not.
    #[default]
    Record,
    /// Leave the history untouched; the future stays redoable.
    Skip,
}

/// Past, present and future of a state value.
///
/// The only way to change the present is through `init`, `apply`, `undo`
/// and `redo`. Applying a transition discards the redo branch. Before the
/// first `init`, every operation is a no-op.
#[derive(Debug, Clone)]
pub struct History<T> {
    past: Vec<T>,
    present: Option<T>,
    future: VecDeque<T>,
    noop_policy: NoopPolicy,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        History::with_policy(NoopPolicy::default())
    }
}

impl<T: Clone + PartialEq> History<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start over from `state`, discarding all history.
    pub fn init(&mut self, state: T) {
        self.past.clear();
        self.future.clear();
        self.present = Some(state);
    }

    /// Replace the present with `f(present)`, pushing the old present onto
    /// the undo stack and clearing the redo stack.
    ///
    /// Returns `true` if a history entry was pushed.
    pub fn apply<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&T) -> T,
    {
        let Some(present) = self.present.take() else {
            return false;
        };
        let next = f(&present);

        if self.noop_policy == NoopPolicy::Skip && next == present {
            self.present = Some(present);
            return false;
        }

        self.past.push(present);
        self.present = Some(next);
        self.future.clear();
        true
    }

    /// Step back one entry. Returns `false` if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        if self.present.is_none() {
            return false;
        }
        let Some(previous) = self.past.pop() else {
            return false;
        };
        if let Some(present) = self.present.replace(previous) {
            self.future.push_front(present);
        }
        true
    }

    /// Step forward one entry. Returns `false` if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        if self.present.is_none() {
            return false;
        }
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        if let Some(present) = self.present.replace(next) {
            self.past.push(present);
        }
        true
    }
}

impl<T> History<T> {
    pub fn with_policy(noop_policy: NoopPolicy) -> Self {
        History {
            past: Vec::new(),
            present: None,
            future: VecDeque::new(),
            noop_policy,
        }
    }

    pub fn present(&self) -> Option<&T> {
        self.present.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.present.is_some()
    }

    pub fn noop_policy(&self) -> NoopPolicy {
        self.noop_policy
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Every retained state, oldest first: past, present, then future.
    pub fn states(&self) -> impl Iterator<Item = &T> {
        self.past
            .iter()
            .chain(self.present.iter())
            .chain(self.future.iter())
    }
}
