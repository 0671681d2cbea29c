// SPDX-License-Identifier: MIT OR Apache-2.0
//! Saving and opening room documents.

use room_designer_core::{SceneSnapshot, SnapshotError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Room document file extension
pub const DOCUMENT_EXTENSION: &str = "json";

/// Document errors
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not hold a valid snapshot
    #[error("Invalid document: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Result type for document operations
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Write a snapshot as indented JSON.
///
/// A path without extension gets [`DOCUMENT_EXTENSION`]. Returns the path written.
pub fn save_snapshot(path: &Path, snapshot: &SceneSnapshot) -> Result<PathBuf> {
    let path = if path.extension().is_none() {
        path.with_extension(DOCUMENT_EXTENSION)
    } else {
        path.to_path_buf()
    };
    let json = snapshot.to_json_pretty()?;
    std::fs::write(&path, json)?;
    tracing::info!("Saved room to {}", path.display());
    Ok(path)
}

/// Read and validate a snapshot
pub fn load_snapshot(path: &Path) -> Result<SceneSnapshot> {
    let json = std::fs::read_to_string(path)?;
    let snapshot = SceneSnapshot::from_json(&json)?;
    tracing::info!(
        meshes = snapshot.meshes.len(),
        "Loaded room from {}",
        path.display()
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use room_designer_core::{MeshTransform, PlacedMesh, RoomSize, TextureRef};

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.json");

        let mut snapshot = SceneSnapshot::empty(RoomSize { x: 3.0, y: 4.0 });
        snapshot.meshes.push(PlacedMesh::new(
            "sofa",
            "sofa.babylon",
            "sofa",
            MeshTransform::at([0.5, 0.0, 1.0]),
        ));
        snapshot.selection = Some("sofa".to_string());
        snapshot.walls = Some(TextureRef::new("paint.png", "Paint", "paint"));

        let written = save_snapshot(&path, &snapshot).unwrap();
        assert_eq!(written, path);
        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_save_adds_extension() {
        let dir = tempfile::tempdir().unwrap();
        let written = save_snapshot(&dir.path().join("room"), &SceneSnapshot::default()).unwrap();
        assert_eq!(written.extension().and_then(|e| e.to_str()), Some("json"));
        assert!(written.exists());
    }

    #[test]
    fn test_load_invalid_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{\"meshes\": 3}").unwrap();
        assert!(matches!(load_snapshot(&path), Err(DocumentError::Snapshot(_))));

        let missing = dir.path().join("missing.json");
        assert!(matches!(load_snapshot(&missing), Err(DocumentError::Io(_))));
    }
}
