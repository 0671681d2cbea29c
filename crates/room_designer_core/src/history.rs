// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history log.
//!
//! The log is a bounded journal of `(label, snapshot)` actions. Each entry
//! holds the scene as it was when the action was reported, so undoing walks
//! back through the entries while the state displayed before the first undo
//! of a chain is kept aside in a dedicated slot. That slot is the only way to
//! redo past the newest entry.
//!
//! Recording a new action while inside an undo chain discards the redo
//! branch.

use crate::ring::RingBuffer;
use crate::snapshot::SceneSnapshot;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of actions kept by default
pub const DEFAULT_CAPACITY: usize = 15;

/// Label of the action returned when redoing back to the pre-undo state
pub const REDO_BOUNDARY_LABEL: &str = "not identified";

/// History errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    /// The current state was inspected without the matching undo/redo right before
    #[error("Current state inspected without a preceding {expected}")]
    StaleInspection {
        /// Operation that must precede the inspection
        expected: &'static str,
    },

    /// The pre-undo state was never recorded
    #[error("No state was recorded before the first undo")]
    MissingFirstState,
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// A recorded action and the scene state captured with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action<S = SceneSnapshot> {
    /// Why the snapshot was taken (`add_mesh`, `duplicate_mesh`, ...)
    pub label: String,
    /// Captured scene state
    pub state: S,
}

impl<S> Action<S> {
    /// Create a new action
    pub fn new(label: impl Into<String>, state: S) -> Self {
        Self {
            label: label.into(),
            state,
        }
    }
}

/// Source and target states of one undo or redo step
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S = SceneSnapshot> {
    /// What is displayed before the step is applied
    pub source: Action<S>,
    /// What must be displayed afterwards
    pub target: Action<S>,
}

/// History mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UndoMode {
    /// Normal state after recording an action
    #[default]
    Linear,
    /// Inside a run of consecutive undo/redo calls
    UndoChain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Undo,
    Redo,
}

/// Bounded undo/redo history
#[derive(Debug, Clone)]
pub struct HistoryLog<S = SceneSnapshot> {
    entries: RingBuffer<Action<S>>,
    /// Entry describing the displayed state; -1 once undone past the oldest entry
    current_index: isize,
    first_state_at_undo: Option<S>,
    mode: UndoMode,
    last_step: Option<Step>,
}

impl<S: Clone> HistoryLog<S> {
    /// Create a history with [`DEFAULT_CAPACITY`]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a history holding at most `capacity` actions
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RingBuffer::with_capacity(capacity),
            current_index: 0,
            first_state_at_undo: None,
            mode: UndoMode::Linear,
            last_step: None,
        }
    }

    /// Maximum number of actions
    pub fn capacity(&self) -> usize {
        self.entries.capacity()
    }

    /// Number of recorded actions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is recorded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current mode
    pub fn mode(&self) -> UndoMode {
        self.mode
    }

    /// Index of the entry for the displayed state
    pub fn current_index(&self) -> isize {
        self.current_index
    }

    /// Labels of the recorded actions, oldest first
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|a| a.label.as_str()).collect()
    }

    /// Clear everything (new document or full load)
    pub fn reset(&mut self) {
        self.entries.clear();
        self.current_index = 0;
        self.first_state_at_undo = None;
        self.mode = UndoMode::Linear;
        self.last_step = None;
        tracing::debug!("History reset");
    }

    /// Record an action, discarding the redo branch when inside an undo chain
    pub fn add_action(&mut self, label: impl Into<String>, state: S) {
        let label = label.into();
        self.mode = UndoMode::Linear;
        self.first_state_at_undo = None;
        self.last_step = None;

        let len = self.entries.len();
        if len != 0 && self.current_index != self.last_index() {
            let keep = usize::try_from(self.current_index).unwrap_or(0);
            self.entries = self.entries.truncated(keep);
            tracing::debug!(kept = keep, dropped = len - keep, "Overwrote redo branch");
        }

        if let Some(evicted) = self.entries.push(Action::new(label.clone(), state)) {
            tracing::trace!(label = %evicted.label, "Evicted oldest action");
        }
        self.current_index = self.last_index();
        tracing::debug!(%label, index = self.current_index, "Recorded action");
    }

    /// Step back one action.
    ///
    /// Returns the action at the cursor before it moves, or `None` when there
    /// is nothing left to undo.
    pub fn undo(&mut self) -> Option<Action<S>> {
        let index = self.index(self.current_index)?;
        let action = self.entries.get(index)?.clone();

        self.mode = UndoMode::UndoChain;
        self.current_index -= 1;
        self.last_step = Some(Step::Undo);
        tracing::debug!(label = %action.label, index = self.current_index, "Undo");
        Some(action)
    }

    /// Remember the displayed state before the first undo of a chain.
    ///
    /// Ignored while already inside a chain.
    pub fn set_first_state_at_undo(&mut self, state: S) {
        if self.mode != UndoMode::UndoChain {
            self.first_state_at_undo = Some(state);
        }
    }

    /// Step forward one action inside an undo chain
    pub fn redo(&mut self) -> Option<Action<S>> {
        if self.mode != UndoMode::UndoChain {
            return None;
        }

        let boundary = self.boundary_index();
        let action = if self.current_index == boundary {
            let Some(state) = self.first_state_at_undo.clone() else {
                tracing::warn!("Redo requested but no pre-undo state was recorded");
                return None;
            };
            self.current_index += 1;
            Action::new(REDO_BOUNDARY_LABEL, state)
        } else if self.current_index < boundary {
            self.current_index += 1;
            let index = self.index(self.current_index + 1)?;
            self.entries.get(index)?.clone()
        } else {
            return None;
        };

        self.last_step = Some(Step::Redo);
        tracing::debug!(label = %action.label, index = self.current_index, "Redo");
        Some(action)
    }

    /// Get the displayed state before the last undo/redo was applied.
    ///
    /// Only meaningful immediately after [`Self::undo`] (`after_undo = true`)
    /// or [`Self::redo`] (`after_undo = false`).
    pub fn current_state(&self, after_undo: bool) -> Option<Action<S>> {
        if self.entries.is_empty() {
            return None;
        }

        if after_undo {
            if self.current_index == self.boundary_index() {
                self.first_state_at_undo
                    .clone()
                    .map(|state| Action::new(REDO_BOUNDARY_LABEL, state))
            } else {
                let index = self.index(self.current_index + 2)?;
                self.entries.get(index).cloned()
            }
        } else {
            let index = self.index(self.current_index)?;
            self.entries.get(index).cloned()
        }
    }

    /// Like [`Self::current_state`] but rejects inspections that do not follow
    /// the matching undo/redo
    pub fn checked_current_state(&self, after_undo: bool) -> Result<Option<Action<S>>> {
        let (step, expected) = if after_undo {
            (Step::Undo, "undo")
        } else {
            (Step::Redo, "redo")
        };
        if self.last_step != Some(step) {
            return Err(HistoryError::StaleInspection { expected });
        }
        if after_undo
            && self.current_index == self.boundary_index()
            && self.first_state_at_undo.is_none()
        {
            return Err(HistoryError::MissingFirstState);
        }
        Ok(self.current_state(after_undo))
    }

    /// Undo one step, returning what is displayed now and what to display next.
    ///
    /// `live` is the displayed scene; it is kept as the pre-undo state when
    /// this starts a new chain.
    pub fn undo_transition(&mut self, live: S) -> Option<Transition<S>> {
        if !self.can_undo() {
            return None;
        }
        self.set_first_state_at_undo(live);
        let target = self.undo()?;
        let source = self.current_state(true)?;
        Some(Transition { source, target })
    }

    /// Redo one step, returning what is displayed now and what to display next
    pub fn redo_transition(&mut self) -> Option<Transition<S>> {
        let target = self.redo()?;
        let source = self.current_state(false)?;
        Some(Transition { source, target })
    }

    /// Check if [`Self::undo`] would return an action
    pub fn can_undo(&self) -> bool {
        self.index(self.current_index).is_some()
    }

    /// Check if [`Self::redo`] would return an action
    pub fn can_redo(&self) -> bool {
        if self.mode != UndoMode::UndoChain {
            return false;
        }
        let boundary = self.boundary_index();
        self.current_index < boundary
            || (self.current_index == boundary && self.first_state_at_undo.is_some())
    }

    fn last_index(&self) -> isize {
        self.entries.len() as isize - 1
    }

    fn boundary_index(&self) -> isize {
        self.entries.len() as isize - 2
    }

    fn index(&self, index: isize) -> Option<usize> {
        usize::try_from(index)
            .ok()
            .filter(|&index| index < self.entries.len())
    }
}

impl<S: Clone> Default for HistoryLog<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with(labels: &[&str]) -> HistoryLog<String> {
        let mut log = HistoryLog::new();
        for label in labels {
            log.add_action(*label, format!("{label}_state"));
        }
        log
    }

    #[test]
    fn test_default_capacity() {
        let log: HistoryLog<String> = HistoryLog::default();
        assert_eq!(log.capacity(), 15);
        assert!(log.is_empty());
        assert_eq!(log.mode(), UndoMode::Linear);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = HistoryLog::with_capacity(3);
        for i in 1..=5 {
            log.add_action(format!("a{i}"), i);
            assert!(log.len() <= 3);
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.labels(), vec!["a3", "a4", "a5"]);
        assert_eq!(log.current_index(), 2);

        assert_eq!(log.undo().unwrap().state, 5);
        assert_eq!(log.undo().unwrap().state, 4);
        assert_eq!(log.undo().unwrap().state, 3);
        assert!(log.undo().is_none());
    }

    #[test]
    fn test_undo_returns_action_at_cursor() {
        let mut log = log_with(&["a1", "a2", "a3"]);
        let undone = log.undo().unwrap();
        assert_eq!(undone.label, "a3");
        assert_eq!(log.current_index(), 1);
        assert_eq!(log.mode(), UndoMode::UndoChain);
    }

    #[test]
    fn test_add_after_undo_destroys_redo() {
        let mut log = log_with(&["a1", "a2", "a3"]);
        log.set_first_state_at_undo("live".to_string());
        log.undo();
        log.undo();
        assert!(log.can_redo());

        log.add_action("a4", "a4_state".to_string());
        assert_eq!(log.mode(), UndoMode::Linear);
        assert!(!log.can_redo());
        assert!(log.redo().is_none());
        // entries before the cursor survive, the rest is overwritten
        assert_eq!(log.labels(), vec!["a4"]);
        assert_eq!(log.current_index(), 0);
    }

    #[test]
    fn test_overwrite_keeps_entries_before_cursor() {
        let mut log = log_with(&["a1", "a2", "a3", "a4"]);
        log.set_first_state_at_undo("live".to_string());
        log.undo();
        log.add_action("a5", "a5_state".to_string());
        assert_eq!(log.labels(), vec!["a1", "a2", "a5"]);
        assert_eq!(log.current_index(), 2);
    }

    #[test]
    fn test_undo_redo_undo_round_trip() {
        let mut log = log_with(&["a1", "a2", "a3"]);
        log.set_first_state_at_undo("live".to_string());
        let first = log.undo().unwrap();
        log.redo().unwrap();
        let again = log.undo().unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn test_redo_restores_current_state() {
        let mut log = log_with(&["a1", "a2", "a3"]);
        log.set_first_state_at_undo("live".to_string());
        log.undo();
        log.redo();
        assert_eq!(log.current_state(false).unwrap().state, "a3_state");
    }

    #[test]
    fn test_boundary_redo_uses_first_state() {
        let mut log = log_with(&["a1", "a2"]);
        log.set_first_state_at_undo("S2_snapshot".to_string());
        let undone = log.undo().unwrap();
        assert_eq!(undone.label, "a2");
        assert_eq!(log.current_index(), 0);

        // later calls inside the chain do not overwrite the slot
        log.set_first_state_at_undo("ignored".to_string());

        let redone = log.redo().unwrap();
        assert_eq!(redone.state, "S2_snapshot");
        assert_eq!(redone.label, REDO_BOUNDARY_LABEL);
        assert!(log.redo().is_none());
    }

    #[test]
    fn test_boundary_redo_without_first_state() {
        let mut log = log_with(&["a1", "a2"]);
        log.undo().unwrap();
        assert_eq!(log.current_index(), 0);

        assert!(log.redo().is_none());
        assert_eq!(log.current_index(), 0);
        assert!(!log.can_redo());
    }

    #[test]
    fn test_deep_redo_walks_forward() {
        let mut log = log_with(&["a1", "a2", "a3"]);
        log.set_first_state_at_undo("live".to_string());
        log.undo();
        log.undo();
        log.undo();
        assert_eq!(log.current_index(), -1);
        assert!(log.undo().is_none());

        assert_eq!(log.redo().unwrap().state, "a2_state");
        assert_eq!(log.current_state(false).unwrap().state, "a1_state");
        assert_eq!(log.redo().unwrap().state, "a3_state");
        assert_eq!(log.current_state(false).unwrap().state, "a2_state");
        assert_eq!(log.redo().unwrap().state, "live");
        assert_eq!(log.current_state(false).unwrap().state, "a3_state");
        assert!(log.redo().is_none());
    }

    #[test]
    fn test_current_state_after_undo() {
        let mut log = log_with(&["a1", "a2", "a3"]);
        log.set_first_state_at_undo("live".to_string());
        log.undo();
        assert_eq!(log.current_state(true).unwrap().state, "live");
        log.undo();
        assert_eq!(log.current_state(true).unwrap().state, "a3_state");
    }

    #[test]
    fn test_redo_outside_chain() {
        let mut log = log_with(&["a1", "a2"]);
        assert!(log.redo().is_none());
        assert!(!log.can_redo());
    }

    #[test]
    fn test_empty_log() {
        let mut log = log_with(&["a1"]);
        log.reset();
        assert!(log.undo().is_none());
        assert!(log.current_state(true).is_none());
        assert!(log.redo().is_none());
        assert!(!log.can_undo());
    }

    #[test]
    fn test_checked_current_state() {
        let mut log = log_with(&["a1", "a2"]);
        assert_eq!(
            log.checked_current_state(true),
            Err(HistoryError::StaleInspection { expected: "undo" })
        );

        log.undo();
        assert_eq!(log.checked_current_state(true), Err(HistoryError::MissingFirstState));
        assert_eq!(
            log.checked_current_state(false),
            Err(HistoryError::StaleInspection { expected: "redo" })
        );
    }

    #[test]
    fn test_transitions() {
        let mut log = log_with(&["a1", "a2"]);
        let step = log.undo_transition("live".to_string()).unwrap();
        assert_eq!(step.source.state, "live");
        assert_eq!(step.target.state, "a2_state");

        let step = log.undo_transition("ignored".to_string()).unwrap();
        assert_eq!(step.source.state, "a2_state");
        assert_eq!(step.target.state, "a1_state");
        assert!(log.undo_transition("ignored".to_string()).is_none());

        let step = log.redo_transition().unwrap();
        assert_eq!(step.source.state, "a1_state");
        assert_eq!(step.target.state, "a2_state");

        let step = log.redo_transition().unwrap();
        assert_eq!(step.source.state, "a2_state");
        assert_eq!(step.target.state, "live");
        assert!(log.redo_transition().is_none());
    }
}
