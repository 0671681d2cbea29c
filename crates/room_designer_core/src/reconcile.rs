// SPDX-License-Identifier: MIT OR Apache-2.0
//! Diff-based reconciliation between two scene snapshots.
//!
//! Instead of tearing the scene down on every undo step, [`reconcile`]
//! computes the edits that morph the displayed snapshot into the target one.
//! Edits are ordered: deletions first, then creations and transforms in
//! target order, then selection, then the wall and floor textures.

use crate::snapshot::{
    MeshTransform, PlacedMesh, SceneSnapshot, SnapshotError, TextureRef, TextureSlot, Vec3,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Which input of a reconciliation was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSide {
    /// The displayed state
    Current,
    /// The state to reach
    Target,
}

impl fmt::Display for SnapshotSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotSide::Current => f.write_str("current"),
            SnapshotSide::Target => f.write_str("target"),
        }
    }
}

/// Reconciliation errors
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A snapshot is missing required fields
    #[error("Malformed {side} snapshot: {source}")]
    MalformedSnapshot {
        /// Rejected input
        side: SnapshotSide,
        /// Parse or validation failure
        source: SnapshotError,
    },
}

/// Result type for reconciliation
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// One structural change applied to the live scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SceneEdit {
    /// Remove a mesh
    Delete {
        /// Mesh id
        id: String,
    },
    /// Load a mesh that is not in the scene yet
    Create {
        /// Mesh id
        id: String,
        /// Model file
        file_name: String,
        /// Furniture category
        mesh_type: String,
        /// Initial transform
        transform: MeshTransform,
    },
    /// Move, rotate and scale an existing mesh
    Transform {
        /// Mesh id
        id: String,
        /// Relative translation
        translate_by: Vec3,
        /// Absolute rotation
        rotation: Vec3,
        /// Absolute scale
        scale: Vec3,
    },
    /// Select a mesh
    Select {
        /// Mesh id
        id: String,
    },
    /// Clear the selection
    Deselect,
    /// Apply a texture to a slot
    SetTexture {
        /// Target slot
        slot: TextureSlot,
        /// Texture to apply
        texture: TextureRef,
    },
    /// Remove the texture of a slot
    RemoveTexture {
        /// Target slot
        slot: TextureSlot,
    },
}

/// Ordered list of scene edits
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditList(Vec<SceneEdit>);

impl EditList {
    /// Iterate over the edits in application order
    pub fn iter(&self) -> std::slice::Iter<'_, SceneEdit> {
        self.0.iter()
    }

    /// Number of edits
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there is nothing to apply
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of `Delete` edits
    pub fn deletions(&self) -> usize {
        self.count(|edit| matches!(edit, SceneEdit::Delete { .. }))
    }

    /// Number of `Create` edits
    pub fn creations(&self) -> usize {
        self.count(|edit| matches!(edit, SceneEdit::Create { .. }))
    }

    /// Number of `Transform` edits
    pub fn transforms(&self) -> usize {
        self.count(|edit| matches!(edit, SceneEdit::Transform { .. }))
    }

    /// Get the underlying edits
    pub fn into_inner(self) -> Vec<SceneEdit> {
        self.0
    }

    fn count(&self, predicate: impl Fn(&SceneEdit) -> bool) -> usize {
        self.0.iter().filter(|edit| predicate(*edit)).count()
    }

    fn push(&mut self, edit: SceneEdit) {
        self.0.push(edit);
    }
}

impl IntoIterator for EditList {
    type Item = SceneEdit;
    type IntoIter = std::vec::IntoIter<SceneEdit>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a EditList {
    type Item = &'a SceneEdit;
    type IntoIter = std::slice::Iter<'a, SceneEdit>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Reconciliation settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOptions {
    /// Skip `Transform` edits for meshes whose transform did not change
    pub skip_unchanged_transforms: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            skip_unchanged_transforms: true,
        }
    }
}

/// Compute the edits that turn `current` into `target`
pub fn reconcile(current: &SceneSnapshot, target: &SceneSnapshot) -> EditList {
    reconcile_with(current, target, &ReconcileOptions::default())
}

/// Compute the edits that turn `current` into `target` with explicit options
pub fn reconcile_with(
    current: &SceneSnapshot,
    target: &SceneSnapshot,
    options: &ReconcileOptions,
) -> EditList {
    let mut edits = EditList::default();

    let existing: IndexMap<&str, &PlacedMesh> =
        current.meshes.iter().map(|m| (m.id.as_str(), m)).collect();
    let wanted: IndexMap<&str, &PlacedMesh> =
        target.meshes.iter().map(|m| (m.id.as_str(), m)).collect();

    for id in existing.keys().filter(|id| !wanted.contains_key(*id)) {
        edits.push(SceneEdit::Delete { id: (*id).to_string() });
    }

    for mesh in &target.meshes {
        match existing.get(mesh.id.as_str()) {
            None => edits.push(SceneEdit::Create {
                id: mesh.id.clone(),
                file_name: mesh.file_name.clone(),
                mesh_type: mesh.mesh_type.clone(),
                transform: mesh.transform(),
            }),
            Some(previous) => {
                let unchanged = previous.pos == mesh.pos
                    && previous.rot == mesh.rot
                    && previous.scale == mesh.scale;
                if unchanged && options.skip_unchanged_transforms {
                    continue;
                }
                edits.push(SceneEdit::Transform {
                    id: mesh.id.clone(),
                    translate_by: delta(previous.pos, mesh.pos),
                    rotation: mesh.rot,
                    scale: mesh.scale,
                });
            }
        }
    }

    match target.selection.as_deref() {
        Some(id) if wanted.contains_key(id) => edits.push(SceneEdit::Select { id: id.to_string() }),
        _ => edits.push(SceneEdit::Deselect),
    }

    // The live scene may carry a texture the source snapshot never recorded,
    // so an absent slot is always cleared.
    for &slot in TextureSlot::all() {
        match target.texture(slot) {
            Some(texture) => edits.push(SceneEdit::SetTexture {
                slot,
                texture: texture.clone(),
            }),
            None => edits.push(SceneEdit::RemoveTexture { slot }),
        }
    }

    tracing::trace!(
        deletions = edits.deletions(),
        creations = edits.creations(),
        transforms = edits.transforms(),
        total = edits.len(),
        "Reconciled snapshots"
    );
    edits
}

/// Parse two snapshot documents and reconcile them
pub fn reconcile_json(current: &str, target: &str) -> Result<EditList> {
    let current = SceneSnapshot::from_json(current).map_err(malformed(SnapshotSide::Current))?;
    let target = SceneSnapshot::from_json(target).map_err(malformed(SnapshotSide::Target))?;
    Ok(reconcile(&current, &target))
}

/// Parse two snapshot values and reconcile them
pub fn reconcile_values(current: &Value, target: &Value) -> Result<EditList> {
    let current =
        SceneSnapshot::from_value(current.clone()).map_err(malformed(SnapshotSide::Current))?;
    let target =
        SceneSnapshot::from_value(target.clone()).map_err(malformed(SnapshotSide::Target))?;
    Ok(reconcile(&current, &target))
}

fn malformed(side: SnapshotSide) -> impl Fn(SnapshotError) -> ReconcileError {
    move |source| ReconcileError::MalformedSnapshot { side, source }
}

fn delta(from: Vec3, to: Vec3) -> Vec3 {
    [to[0] - from[0], to[1] - from[1], to[2] - from[2]]
}
