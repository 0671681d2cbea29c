// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene snapshot data model.
//!
//! A snapshot is the full serialized room as reported by the embedded scene:
//! room dimensions, every placed mesh with its transform, the selected mesh
//! and the optional wall and floor textures.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Three component vector as stored in snapshots (`[x, y, z]`)
pub type Vec3 = [f64; 3];

/// Snapshot errors
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Required fields are missing or have the wrong shape
    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Two meshes share the same id
    #[error("Duplicate mesh id in snapshot: {0}")]
    DuplicateId(String),

    /// Writing the snapshot failed
    #[error("Serialization error: {0}")]
    Serialization(serde_json::Error),
}

/// Result type for snapshot operations
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Room floor dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomSize {
    /// Width along the x axis
    pub x: f64,
    /// Depth along the z axis (called `y` on the wire)
    pub y: f64,
}

impl Default for RoomSize {
    fn default() -> Self {
        Self { x: 5.0, y: 5.0 }
    }
}

/// Position, rotation and scale of a mesh
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshTransform {
    /// Position
    pub pos: Vec3,
    /// Rotation in radians (Euler angles)
    pub rot: Vec3,
    /// Scale factors
    pub scale: Vec3,
}

impl Default for MeshTransform {
    fn default() -> Self {
        Self {
            pos: [0.0, 0.0, 0.0],
            rot: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        }
    }
}

impl MeshTransform {
    /// Create a transform at a position with identity rotation and scale
    pub fn at(pos: Vec3) -> Self {
        Self {
            pos,
            ..Self::default()
        }
    }
}

/// A furniture mesh placed in the room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedMesh {
    /// Unique id within the scene
    pub id: String,
    /// Model file the mesh was loaded from
    #[serde(rename = "fileName")]
    pub file_name: String,
    /// Furniture category
    #[serde(rename = "type")]
    pub mesh_type: String,
    /// Position
    pub pos: Vec3,
    /// Rotation
    pub rot: Vec3,
    /// Scale
    pub scale: Vec3,
}

impl PlacedMesh {
    /// Create a mesh with the given transform
    pub fn new(
        id: impl Into<String>,
        file_name: impl Into<String>,
        mesh_type: impl Into<String>,
        transform: MeshTransform,
    ) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            mesh_type: mesh_type.into(),
            pos: transform.pos,
            rot: transform.rot,
            scale: transform.scale,
        }
    }

    /// Get the transform of this mesh
    pub fn transform(&self) -> MeshTransform {
        MeshTransform {
            pos: self.pos,
            rot: self.rot,
            scale: self.scale,
        }
    }
}

/// Texture applied to the walls or the floor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureRef {
    /// Image file backing the texture
    #[serde(rename = "fileName")]
    pub file_name: String,
    /// Display name of the texture
    #[serde(rename = "textureName")]
    pub texture_name: String,
    /// Texture category
    #[serde(rename = "type")]
    pub texture_type: String,
}

impl TextureRef {
    /// Create a texture reference
    pub fn new(
        file_name: impl Into<String>,
        texture_name: impl Into<String>,
        texture_type: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            texture_name: texture_name.into(),
            texture_type: texture_type.into(),
        }
    }
}

/// Texture slot of the room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureSlot {
    /// All four walls
    Walls,
    /// The floor
    Floor,
}

impl TextureSlot {
    /// Slots in the order they are reconciled
    pub fn all() -> &'static [TextureSlot] {
        &[TextureSlot::Walls, TextureSlot::Floor]
    }

    /// Key of the slot in the snapshot document
    pub fn snapshot_key(self) -> &'static str {
        match self {
            TextureSlot::Walls => "walls",
            TextureSlot::Floor => "floor",
        }
    }

    /// Name of the textured plane inside the embedded scene
    pub fn scene_key(self) -> &'static str {
        match self {
            TextureSlot::Walls => "walls",
            TextureSlot::Floor => "carpet",
        }
    }
}

/// Full serialized room state
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SceneSnapshot {
    /// Room dimensions
    pub room: RoomSize,
    /// Placed meshes, in scene order
    pub meshes: Vec<PlacedMesh>,
    /// Selected mesh id
    #[serde(with = "selection_serde", default)]
    pub selection: Option<String>,
    /// Wall texture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walls: Option<TextureRef>,
    /// Floor texture
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<TextureRef>,
}

impl SceneSnapshot {
    /// Create an empty room
    pub fn empty(room: RoomSize) -> Self {
        Self {
            room,
            ..Self::default()
        }
    }

    /// Parse and validate a snapshot from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Parse and validate a snapshot from a JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        let snapshot: Self = serde_json::from_value(value)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Serialize to a compact JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(SnapshotError::Serialization)
    }

    /// Serialize to an indented JSON string
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(SnapshotError::Serialization)
    }

    /// Check that mesh ids are unique
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.meshes.len());
        for mesh in &self.meshes {
            if !seen.insert(mesh.id.as_str()) {
                return Err(SnapshotError::DuplicateId(mesh.id.clone()));
            }
        }
        Ok(())
    }

    /// Find a mesh by id
    pub fn mesh(&self, id: &str) -> Option<&PlacedMesh> {
        self.meshes.iter().find(|mesh| mesh.id == id)
    }

    /// Check whether a mesh with this id exists
    pub fn contains(&self, id: &str) -> bool {
        self.mesh(id).is_some()
    }

    /// Get the texture of a slot
    pub fn texture(&self, slot: TextureSlot) -> Option<&TextureRef> {
        match slot {
            TextureSlot::Walls => self.walls.as_ref(),
            TextureSlot::Floor => self.floor.as_ref(),
        }
    }

    /// Set or clear the texture of a slot
    pub fn set_texture(&mut self, slot: TextureSlot, texture: Option<TextureRef>) {
        match slot {
            TextureSlot::Walls => self.walls = texture,
            TextureSlot::Floor => self.floor = texture,
        }
    }
}

/// `selection` is the selected id, or the string `"None"`.
mod selection_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    const NOTHING_SELECTED: &str = "None";

    pub fn serialize<S: Serializer>(
        selection: &Option<String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(selection.as_deref().unwrap_or(NOTHING_SELECTED))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|id| id != NOTHING_SELECTED))
    }
}
