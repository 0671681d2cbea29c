// SPDX-License-Identifier: MIT OR Apache-2.0
//! Design session orchestration.
//!
//! A session owns the scene bridge and the history log. Every editing
//! operation first captures the live scene as an undo point, then mutates the
//! scene. Undo and redo reconcile the displayed snapshot against the target
//! snapshot and apply only the resulting edits.

use crate::bridge::{BridgeError, SceneBridge};
use crate::config::DesignerConfig;
use crate::document::{self, DocumentError};
use parking_lot::Mutex;
use room_designer_core::{
    reconcile_with, EditList, HistoryLog, MeshTransform, PlacedMesh, ReconcileOptions, RoomSize,
    SceneEdit, SceneSnapshot, TextureRef, TextureSlot, Transition, Vec3,
};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

/// Checkpoint identifiers understood by [`DesignSession::checkpoint`]
pub mod labels {
    /// Capture the live scene and undo
    pub const UNDO: &str = "undo";
    /// Capture the live scene for saving, without recording it
    pub const SAVE: &str = "save";
    /// A mesh was added
    pub const ADD_MESH: &str = "add_mesh";
    /// A mesh was duplicated
    pub const DUPLICATE_MESH: &str = "duplicate_mesh";
    /// A mesh was removed
    pub const REMOVE_MESH: &str = "remove_mesh";
    /// A mesh was moved, rotated or scaled
    pub const TRANSFORM_MESH: &str = "transform_mesh";
    /// A wall or floor texture changed
    pub const CHANGE_TEXTURE: &str = "change_texture";
}

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// The scene rejected a call
    #[error("Scene error: {0}")]
    Bridge(#[from] BridgeError),

    /// Saving or opening a document failed
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// No mesh with this id is in the room
    #[error("Unknown mesh: {0}")]
    UnknownMesh(String),

    /// An undo or redo edit was rejected after the history cursor moved.
    ///
    /// The scene no longer matches the history. Call
    /// [`DesignSession::load_state`] with a known snapshot to recover.
    #[error("Applying {edit:?} failed, scene and history are out of step: {source}")]
    EditFailed {
        /// The rejected edit
        edit: Box<SceneEdit>,
        /// Error reported by the scene
        source: BridgeError,
    },
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Unique session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of [`DesignSession::checkpoint`]
#[derive(Debug, Clone, PartialEq)]
pub enum CheckpointOutcome {
    /// The snapshot was recorded as an undo point
    Recorded {
        /// Action label
        label: String,
        /// Number of recorded actions afterwards
        history_len: usize,
    },
    /// The snapshot started or continued an undo chain
    Undone(Option<EditList>),
    /// The snapshot should be written to a file
    SaveRequested(SceneSnapshot),
}

/// Session shared between threads
pub type SharedSession<B> = Arc<Mutex<DesignSession<B>>>;

/// Room editing session
#[derive(Debug)]
pub struct DesignSession<B: SceneBridge> {
    id: SessionId,
    bridge: B,
    history: HistoryLog<SceneSnapshot>,
    selected: Option<String>,
    options: ReconcileOptions,
    default_room: RoomSize,
}

impl<B: SceneBridge> DesignSession<B> {
    /// Create a session around an initialized scene bridge
    pub fn new(mut bridge: B, config: &DesignerConfig) -> Result<Self> {
        bridge.init()?;
        let id = SessionId::new();
        tracing::info!(session = %id, capacity = config.history_capacity, "Session started");
        Ok(Self {
            id,
            bridge,
            history: HistoryLog::with_capacity(config.history_capacity),
            selected: None,
            options: config.reconcile_options(),
            default_room: config.default_room,
        })
    }

    /// Session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Scene bridge
    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Undo history
    pub fn history(&self) -> &HistoryLog<SceneSnapshot> {
        &self.history
    }

    /// Selected mesh
    pub fn selected_mesh(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Room used for new documents
    pub fn default_room(&self) -> RoomSize {
        self.default_room
    }

    /// Check if the Undo command should be enabled
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Check if the Redo command should be enabled
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Wrap the session for sharing between threads
    pub fn into_shared(self) -> SharedSession<B> {
        Arc::new(Mutex::new(self))
    }

    /// Release the scene bridge
    pub fn shutdown(&mut self) {
        self.bridge.teardown();
        tracing::info!(session = %self.id, "Session closed");
    }

    /// Capture the live scene with the session's selection
    pub fn capture(&mut self) -> Result<SceneSnapshot> {
        let mut snapshot = self.bridge.capture_state()?;
        snapshot.selection = self.selected.clone();
        Ok(snapshot)
    }

    /// Capture the live scene and handle it according to `identifier`.
    ///
    /// `"undo"` undoes one step, `"save"` hands the snapshot back for
    /// persistence and any other identifier records an undo point.
    pub fn checkpoint(&mut self, identifier: &str) -> Result<CheckpointOutcome> {
        let snapshot = self.capture()?;
        match identifier {
            labels::UNDO => Ok(CheckpointOutcome::Undone(self.undo_from(snapshot)?)),
            labels::SAVE => Ok(CheckpointOutcome::SaveRequested(snapshot)),
            label => {
                self.history.add_action(label, snapshot);
                Ok(CheckpointOutcome::Recorded {
                    label: label.to_string(),
                    history_len: self.history.len(),
                })
            }
        }
    }

    /// Undo one step, returning the applied edits
    pub fn undo(&mut self) -> Result<Option<EditList>> {
        let live = self.capture()?;
        self.undo_from(live)
    }

    /// Redo one step, returning the applied edits
    pub fn redo(&mut self) -> Result<Option<EditList>> {
        match self.history.redo_transition() {
            Some(transition) => self.apply_transition(transition, "Redo").map(Some),
            None => {
                tracing::debug!("Nothing to redo");
                Ok(None)
            }
        }
    }

    /// Add a mesh, returning its id.
    ///
    /// The id defaults to the mesh type and gets a numeric suffix when taken.
    pub fn add_mesh(
        &mut self,
        file_name: &str,
        mesh_type: &str,
        id: Option<&str>,
        transform: MeshTransform,
    ) -> Result<String> {
        let base = id.unwrap_or(mesh_type);
        let id = self.record(labels::ADD_MESH, |scene| Ok(unique_mesh_id(base, scene)))?;
        self.bridge
            .add_mesh(PlacedMesh::new(id.as_str(), file_name, mesh_type, transform))?;
        tracing::debug!(%id, file_name, "Added mesh");
        Ok(id)
    }

    /// Duplicate a mesh, returning the id of the copy
    pub fn duplicate_mesh(&mut self, id: &str) -> Result<String> {
        let copy_id = self.record(labels::DUPLICATE_MESH, |scene| {
            require_mesh(scene, id)?;
            Ok(unique_mesh_id(&format!("{id}_copy"), scene))
        })?;
        self.bridge.duplicate_mesh(id, &copy_id)?;
        tracing::debug!(%id, %copy_id, "Duplicated mesh");
        Ok(copy_id)
    }

    /// Duplicate the selected mesh, if any
    pub fn duplicate_selected(&mut self) -> Result<Option<String>> {
        match self.selected.clone() {
            Some(id) => self.duplicate_mesh(&id).map(Some),
            None => Ok(None),
        }
    }

    /// Remove a mesh
    pub fn remove_mesh(&mut self, id: &str) -> Result<()> {
        self.record(labels::REMOVE_MESH, |scene| require_mesh(scene, id))?;
        self.bridge.remove_mesh(id)?;
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Ok(())
    }

    /// Move a mesh by a relative offset
    pub fn translate_mesh(&mut self, id: &str, by: Vec3) -> Result<()> {
        self.record(labels::TRANSFORM_MESH, |scene| require_mesh(scene, id))?;
        Ok(self.bridge.translate_mesh(id, by)?)
    }

    /// Set the absolute rotation of a mesh
    pub fn rotate_mesh(&mut self, id: &str, rotation: Vec3) -> Result<()> {
        self.record(labels::TRANSFORM_MESH, |scene| require_mesh(scene, id))?;
        Ok(self.bridge.rotate_mesh(id, rotation)?)
    }

    /// Set the absolute scale of a mesh
    pub fn scale_mesh(&mut self, id: &str, scale: Vec3) -> Result<()> {
        self.record(labels::TRANSFORM_MESH, |scene| require_mesh(scene, id))?;
        Ok(self.bridge.scale_mesh(id, scale)?)
    }

    /// Apply a wall or floor texture
    pub fn change_texture(&mut self, slot: TextureSlot, texture: &TextureRef) -> Result<()> {
        self.record(labels::CHANGE_TEXTURE, |_| Ok(()))?;
        Ok(self.bridge.set_texture(slot, texture)?)
    }

    /// Select a mesh. Selection changes are not undo points.
    pub fn select_mesh(&mut self, id: &str) -> Result<()> {
        self.bridge.select_mesh(id)?;
        self.selected = Some(id.to_string());
        Ok(())
    }

    /// Clear the selection
    pub fn deselect(&mut self) -> Result<()> {
        self.bridge.deselect()?;
        self.selected = None;
        Ok(())
    }

    /// Replace the room with `snapshot`, discarding the current state and history
    pub fn load_state(&mut self, snapshot: &SceneSnapshot) -> Result<EditList> {
        self.clear_all()?;
        self.bridge.rebuild_room(snapshot.room)?;

        let empty = SceneSnapshot::empty(snapshot.room);
        let edits = reconcile_with(&empty, snapshot, &self.options);
        for edit in &edits {
            self.apply_edit(edit)?;
        }
        tracing::info!(session = %self.id, meshes = snapshot.meshes.len(), "Loaded state");
        Ok(edits)
    }

    /// Remove every mesh and texture and forget the history
    pub fn clear_all(&mut self) -> Result<()> {
        let scene = self.bridge.capture_state()?;
        for mesh in &scene.meshes {
            self.bridge.remove_mesh(&mesh.id)?;
        }
        for &slot in TextureSlot::all() {
            self.bridge.remove_texture(slot)?;
        }
        self.selected = None;
        self.history.reset();
        Ok(())
    }

    /// Start an empty room
    pub fn new_document(&mut self, room: RoomSize) -> Result<()> {
        self.clear_all()?;
        self.bridge.rebuild_room(room)?;
        tracing::info!(session = %self.id, x = room.x, y = room.y, "New room");
        Ok(())
    }

    /// Save the live scene, returning the path written
    pub fn save(&mut self, path: &Path) -> Result<PathBuf> {
        let snapshot = self.capture()?;
        Ok(document::save_snapshot(path, &snapshot)?)
    }

    /// Open a saved room, discarding the current state and history
    pub fn open(&mut self, path: &Path) -> Result<EditList> {
        let snapshot = document::load_snapshot(path)?;
        self.load_state(&snapshot)
    }

    fn record<T>(
        &mut self,
        label: &str,
        inspect: impl FnOnce(&SceneSnapshot) -> Result<T>,
    ) -> Result<T> {
        let snapshot = self.capture()?;
        let value = inspect(&snapshot)?;
        self.history.add_action(label, snapshot);
        Ok(value)
    }

    fn undo_from(&mut self, live: SceneSnapshot) -> Result<Option<EditList>> {
        match self.history.undo_transition(live) {
            Some(transition) => self.apply_transition(transition, "Undo").map(Some),
            None => {
                tracing::debug!("Nothing to undo");
                Ok(None)
            }
        }
    }

    fn apply_transition(
        &mut self,
        transition: Transition<SceneSnapshot>,
        step: &str,
    ) -> Result<EditList> {
        let edits = reconcile_with(
            &transition.source.state,
            &transition.target.state,
            &self.options,
        );
        for edit in &edits {
            if let Err(source) = self.apply_edit(edit) {
                tracing::error!(
                    session = %self.id,
                    label = %transition.target.label,
                    ?edit,
                    %source,
                    "{step} left the scene out of step with the history"
                );
                return Err(SessionError::EditFailed {
                    edit: Box::new(edit.clone()),
                    source,
                });
            }
        }
        tracing::info!(
            session = %self.id,
            label = %transition.target.label,
            edits = edits.len(),
            "{step}"
        );
        Ok(edits)
    }

    fn apply_edit(&mut self, edit: &SceneEdit) -> std::result::Result<(), BridgeError> {
        self.bridge.apply(edit)?;
        match edit {
            SceneEdit::Select { id } => self.selected = Some(id.clone()),
            SceneEdit::Deselect => self.selected = None,
            SceneEdit::Delete { id } if self.selected.as_ref() == Some(id) => self.selected = None,
            _ => {}
        }
        Ok(())
    }
}

fn require_mesh(scene: &SceneSnapshot, id: &str) -> Result<()> {
    if scene.contains(id) {
        Ok(())
    } else {
        Err(SessionError::UnknownMesh(id.to_string()))
    }
}

/// `base`, or `base` with the first free numeric suffix
fn unique_mesh_id(base: &str, scene: &SceneSnapshot) -> String {
    let mut id = base.to_string();
    let mut index = 1;
    while scene.contains(&id) {
        id = format!("{base}{index}");
        index += 1;
    }
    id
}
