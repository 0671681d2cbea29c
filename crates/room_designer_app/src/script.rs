// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless replay of scripted user operations.
//!
//! A script is a RON list of steps, for example:
//!
//! ```ron
//! (steps: [
//!     AddMesh(file_name: "chair.babylon", mesh_type: "chair"),
//!     Translate(id: "chair", by: (1.0, 0.0, 0.0)),
//!     Undo,
//!     Redo,
//!     Save(path: "room.json"),
//! ])
//! ```

use crate::bridge::SceneBridge;
use crate::session::{DesignSession, SessionError};
use room_designer_core::{MeshTransform, RoomSize, TextureRef, TextureSlot, Vec3};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Script errors
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Reading the script failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The script is not valid RON
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// A step failed
    #[error("Step {index} failed: {source}")]
    Step {
        /// Zero-based step index
        index: usize,
        /// Session failure
        source: SessionError,
    },
}

/// Result type for script operations
pub type Result<T> = std::result::Result<T, ScriptError>;

/// One user operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptStep {
    /// Start an empty room (the configured default when no size is given)
    NewRoom {
        /// Room dimensions
        #[serde(default)]
        room: Option<RoomSize>,
    },
    /// Add a mesh
    AddMesh {
        /// Model file
        file_name: String,
        /// Furniture category
        mesh_type: String,
        /// Requested id
        #[serde(default)]
        id: Option<String>,
        /// Initial transform
        #[serde(default)]
        transform: Option<MeshTransform>,
    },
    /// Duplicate a mesh
    Duplicate {
        /// Source mesh id
        id: String,
    },
    /// Remove a mesh
    Remove {
        /// Mesh id
        id: String,
    },
    /// Move a mesh by an offset
    Translate {
        /// Mesh id
        id: String,
        /// Offset
        by: Vec3,
    },
    /// Set the rotation of a mesh
    Rotate {
        /// Mesh id
        id: String,
        /// Rotation
        rotation: Vec3,
    },
    /// Set the scale of a mesh
    Scale {
        /// Mesh id
        id: String,
        /// Scale
        scale: Vec3,
    },
    /// Select a mesh
    Select {
        /// Mesh id
        id: String,
    },
    /// Clear the selection
    Deselect,
    /// Apply a texture
    Texture {
        /// Target slot
        slot: TextureSlot,
        /// Texture
        texture: TextureRef,
    },
    /// Undo one step
    Undo,
    /// Redo one step
    Redo,
    /// Save the room
    Save {
        /// Output file
        path: PathBuf,
    },
    /// Open a saved room
    Open {
        /// Input file
        path: PathBuf,
    },
}

/// A list of steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Steps in execution order
    pub steps: Vec<ScriptStep>,
}

impl Script {
    /// Parse a script from RON
    pub fn from_ron(source: &str) -> Result<Self> {
        Ok(ron::from_str(source)?)
    }

    /// Load a script file
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_ron(&std::fs::read_to_string(path)?)
    }
}

/// Summary of a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayReport {
    /// Steps executed
    pub steps: usize,
    /// Undo steps that changed the scene
    pub undone: usize,
    /// Redo steps that changed the scene
    pub redone: usize,
    /// Undo/redo requests with nothing to do
    pub ignored: usize,
    /// Scene edits applied by undo, redo and open
    pub edits_applied: usize,
}

/// Run every step of `script` against `session`, stopping at the first failure
pub fn run_script<B: SceneBridge>(
    session: &mut DesignSession<B>,
    script: &Script,
) -> Result<ReplayReport> {
    let mut report = ReplayReport::default();
    for (index, step) in script.steps.iter().enumerate() {
        tracing::debug!(index, ?step, "Replaying step");
        run_step(session, step, &mut report).map_err(|source| ScriptError::Step { index, source })?;
        report.steps += 1;
    }
    tracing::info!(
        steps = report.steps,
        undone = report.undone,
        redone = report.redone,
        edits = report.edits_applied,
        "Replay finished"
    );
    Ok(report)
}

fn run_step<B: SceneBridge>(
    session: &mut DesignSession<B>,
    step: &ScriptStep,
    report: &mut ReplayReport,
) -> std::result::Result<(), SessionError> {
    match step {
        ScriptStep::NewRoom { room } => {
            let room = room.unwrap_or_else(|| session.default_room());
            session.new_document(room)?;
        }
        ScriptStep::AddMesh {
            file_name,
            mesh_type,
            id,
            transform,
        } => {
            session.add_mesh(
                file_name,
                mesh_type,
                id.as_deref(),
                transform.unwrap_or_default(),
            )?;
        }
        ScriptStep::Duplicate { id } => {
            session.duplicate_mesh(id)?;
        }
        ScriptStep::Remove { id } => session.remove_mesh(id)?,
        ScriptStep::Translate { id, by } => session.translate_mesh(id, *by)?,
        ScriptStep::Rotate { id, rotation } => session.rotate_mesh(id, *rotation)?,
        ScriptStep::Scale { id, scale } => session.scale_mesh(id, *scale)?,
        ScriptStep::Select { id } => session.select_mesh(id)?,
        ScriptStep::Deselect => session.deselect()?,
        ScriptStep::Texture { slot, texture } => session.change_texture(*slot, texture)?,
        ScriptStep::Undo => match session.undo()? {
            Some(edits) => {
                report.undone += 1;
                report.edits_applied += edits.len();
            }
            None => report.ignored += 1,
        },
        ScriptStep::Redo => match session.redo()? {
            Some(edits) => {
                report.redone += 1;
                report.edits_applied += edits.len();
            }
            None => report.ignored += 1,
        },
        ScriptStep::Save { path } => {
            session.save(path)?;
        }
        ScriptStep::Open { path } => {
            report.edits_applied += session.open(path)?.len();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::MemoryScene;
    use crate::config::DesignerConfig;

    const SCRIPT: &str = r#"(steps: [
        AddMesh(file_name: "chair.babylon", mesh_type: "chair"),
        AddMesh(file_name: "table.babylon", mesh_type: "table", transform: Some((
            pos: (2.0, 0.0, 0.0), rot: (0.0, 0.0, 0.0), scale: (1.0, 1.0, 1.0),
        ))),
        Translate(id: "chair", by: (1.0, 0.0, 0.5)),
        Texture(slot: walls, texture: (fileName: "brick.jpg", textureName: "Brick", type: "stone")),
        Undo,
        Undo,
        Redo,
        Redo,
        Redo,
    ])"#;

    fn session() -> DesignSession<MemoryScene> {
        DesignSession::new(MemoryScene::default(), &DesignerConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_script() {
        let script = Script::from_ron(SCRIPT).unwrap();
        assert_eq!(script.steps.len(), 9);
        assert_eq!(script.steps[4], ScriptStep::Undo);
    }

    #[test]
    fn test_parse_demo_script() {
        let script = Script::from_ron(include_str!("../../../demos/furnish_room.ron")).unwrap();
        assert!(script.steps.contains(&ScriptStep::Undo));
        assert!(matches!(script.steps.last(), Some(ScriptStep::Save { .. })));
    }

    #[test]
    fn test_replay() {
        let script = Script::from_ron(SCRIPT).unwrap();
        let mut session = session();
        let report = run_script(&mut session, &script).unwrap();

        assert_eq!(report.steps, 9);
        assert_eq!(report.undone, 2);
        assert_eq!(report.redone, 2);
        assert_eq!(report.ignored, 1);
        assert_eq!(session.bridge().mesh("chair").unwrap().pos, [1.0, 0.0, 0.5]);
        assert!(session.bridge().texture(TextureSlot::Walls).is_some());
    }

    #[test]
    fn test_failing_step_reports_index() {
        let script = Script {
            steps: vec![
                ScriptStep::NewRoom { room: None },
                ScriptStep::Remove { id: "ghost".to_string() },
            ],
        };
        let err = run_script(&mut session(), &script).unwrap_err();
        assert!(matches!(err, ScriptError::Step { index: 1, .. }));
    }

    #[test]
    fn test_save_and_open_steps() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.json");
        let script = Script {
            steps: vec![
                ScriptStep::AddMesh {
                    file_name: "bed.babylon".to_string(),
                    mesh_type: "bed".to_string(),
                    id: None,
                    transform: None,
                },
                ScriptStep::Save { path: path.clone() },
                ScriptStep::Remove { id: "bed".to_string() },
                ScriptStep::Open { path },
            ],
        };
        let mut session = session();
        run_script(&mut session, &script).unwrap();
        assert_eq!(session.bridge().mesh_ids(), vec!["bed"]);
        assert!(!session.can_undo());
    }
}
