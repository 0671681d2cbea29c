// SPDX-License-Identifier: MIT OR Apache-2.0
//! Core of the room designer: undo/redo history and state reconciliation.
//!
//! This crate provides:
//! - The scene snapshot data model exchanged with the embedded 3D scene
//! - A fixed-capacity ring buffer
//! - The branch-overwriting undo/redo history log
//! - Diff-based reconciliation between two scene snapshots
//!
//! ## Architecture
//!
//! Nothing in here performs I/O. The application layer records a snapshot
//! after every user action, asks the history for a transition on undo/redo
//! and applies the edit list produced by [`reconcile`] to the live scene.

pub mod history;
pub mod reconcile;
pub mod ring;
pub mod snapshot;

pub use history::{
    Action, HistoryError, HistoryLog, Transition, UndoMode, DEFAULT_CAPACITY,
    REDO_BOUNDARY_LABEL,
};
pub use reconcile::{
    reconcile, reconcile_json, reconcile_values, reconcile_with, EditList, ReconcileError,
    ReconcileOptions, SceneEdit, SnapshotSide,
};
pub use ring::RingBuffer;
pub use snapshot::{
    MeshTransform, PlacedMesh, RoomSize, SceneSnapshot, SnapshotError, TextureRef, TextureSlot,
    Vec3,
};
