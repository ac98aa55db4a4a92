//! Undo/redo history over whole-document snapshots.

use std::collections::VecDeque;

/// Maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// State that can be kept in a [`History`].
pub trait Snapshot: Clone + PartialEq {
    /// Whether a stored entry may become the present again.
    fn is_well_formed(&self) -> bool {
        true
    }
}

/// An open gesture: nesting depth plus the state before the gesture began.
#[derive(Debug, Clone)]
struct Interaction<S> {
    depth: usize,
    snapshot: S,
}

/// Past/present/future state machine with interaction batching.
///
/// Discrete edits go through [`History::push_edit`]. Continuous gestures wrap
/// any number of [`History::update_present_only`] calls in
/// `begin_interaction`/`end_interaction` and become a single undo step.
#[derive(Debug, Clone)]
pub struct History<S> {
    past: VecDeque<S>,
    present: S,
    /// Front is the next state to redo.
    future: VecDeque<S>,
    limit: usize,
    interaction: Option<Interaction<S>>,
}

impl<S: Snapshot> History<S> {
    pub fn new(present: S) -> Self {
        Self::with_limit(present, MAX_UNDO_HISTORY)
    }

    pub fn with_limit(present: S, limit: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(limit.min(MAX_UNDO_HISTORY)),
            present,
            future: VecDeque::new(),
            limit,
            interaction: None,
        }
    }

    pub fn present(&self) -> &S {
        &self.present
    }

    /// Undo entries, oldest first.
    pub fn past(&self) -> impl Iterator<Item = &S> {
        self.past.iter()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty() || self.interaction_changed()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn in_interaction(&self) -> bool {
        self.interaction.is_some()
    }

    /// Apply a discrete edit as one undo step.
    ///
    /// Inside an open interaction the gesture so far is committed first and a
    /// fresh gesture snapshot is taken after the edit.
    pub fn push_edit<R>(&mut self, edit: impl FnOnce(&mut S) -> R) -> R {
        let reopen = self.interaction.as_ref().map(|i| i.depth);
        if reopen.is_some() {
            self.commit_interaction();
        }

        let previous = self.present.clone();
        self.push_past(previous);
        self.future.clear();
        let result = edit(&mut self.present);

        if let Some(depth) = reopen {
            self.interaction = Some(Interaction {
                depth,
                snapshot: self.present.clone(),
            });
        }
        result
    }

    /// Replace the present without recording history (live gesture frames).
    pub fn update_present_only<R>(&mut self, update: impl FnOnce(&mut S) -> R) -> R {
        update(&mut self.present)
    }

    /// Start (or nest) a gesture. Only the outermost call snapshots.
    pub fn begin_interaction(&mut self) {
        match &mut self.interaction {
            Some(interaction) => interaction.depth += 1,
            None => {
                self.interaction = Some(Interaction {
                    depth: 1,
                    snapshot: self.present.clone(),
                })
            }
        }
    }

    /// Close a gesture. The outermost close pushes the pre-gesture snapshot
    /// if the present changed. Returns whether an undo step was recorded.
    pub fn end_interaction(&mut self) -> bool {
        let Some(interaction) = &mut self.interaction else {
            log::debug!("end_interaction without matching begin");
            return false;
        };
        interaction.depth -= 1;
        if interaction.depth > 0 {
            return false;
        }
        self.commit_interaction()
    }

    /// Abandon a gesture, restoring the pre-gesture present. Past and future
    /// are untouched.
    pub fn cancel_interaction(&mut self) -> bool {
        match self.interaction.take() {
            Some(interaction) => {
                self.present = interaction.snapshot;
                true
            }
            None => false,
        }
    }

    pub fn undo(&mut self) -> bool {
        if self.interaction.is_some() {
            self.commit_interaction();
        }
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        if !previous.is_well_formed() {
            log::warn!("discarding malformed undo entry");
            return false;
        }
        let current = std::mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        true
    }

    pub fn redo(&mut self) -> bool {
        if self.interaction.is_some() {
            self.commit_interaction();
        }
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        if !next.is_well_formed() {
            log::warn!("discarding malformed redo entry");
            return false;
        }
        let current = std::mem::replace(&mut self.present, next);
        self.push_past(current);
        true
    }

    /// Replace every slot: `present` becomes the only state.
    pub fn reset(&mut self, present: S) {
        self.past.clear();
        self.future.clear();
        self.interaction = None;
        self.present = present;
    }

    /// Commit an open interaction regardless of nesting depth.
    fn commit_interaction(&mut self) -> bool {
        let Some(interaction) = self.interaction.take() else {
            return false;
        };
        if interaction.snapshot == self.present {
            return false;
        }
        self.push_past(interaction.snapshot);
        self.future.clear();
        true
    }

    fn interaction_changed(&self) -> bool {
        self.interaction
            .as_ref()
            .is_some_and(|i| i.snapshot != self.present)
    }

    fn push_past(&mut self, state: S) {
        self.past.push_back(state);
        while self.past.len() > self.limit {
            self.past.pop_front();
            log::debug!("history limit {} reached, evicting oldest entry", self.limit);
        }
    }
}
