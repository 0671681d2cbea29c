// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interface to the embedded 3D scene.
//!
//! The session owns one [`SceneBridge`] handle for its whole lifetime. The
//! bridge exposes the scene's mutation calls and knows how to translate a
//! reconciled [`SceneEdit`] into them.

use indexmap::IndexMap;
use room_designer_core::{
    PlacedMesh, RoomSize, SceneEdit, SceneSnapshot, TextureRef, TextureSlot, Vec3,
};
use thiserror::Error;

/// Scene bridge errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The bridge was used before `init` or after `teardown`
    #[error("Scene bridge is not initialized")]
    NotInitialized,

    /// No mesh with this id exists in the scene
    #[error("Unknown mesh: {0}")]
    UnknownMesh(String),

    /// A mesh with this id already exists in the scene
    #[error("Mesh already exists: {0}")]
    DuplicateMesh(String),
}

/// Result type for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Mutation and capture API of the live scene
pub trait SceneBridge {
    /// Prepare the scene for use
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Release the scene
    fn teardown(&mut self) {}

    /// Serialize the whole scene. The selection field is owned by the caller.
    fn capture_state(&mut self) -> Result<SceneSnapshot>;

    /// Rebuild the empty room with new dimensions
    fn rebuild_room(&mut self, room: RoomSize) -> Result<()>;

    /// Load a mesh with its initial transform
    fn add_mesh(&mut self, mesh: PlacedMesh) -> Result<()>;

    /// Clone a mesh next to the original
    fn duplicate_mesh(&mut self, source_id: &str, new_id: &str) -> Result<()>;

    /// Remove a mesh
    fn remove_mesh(&mut self, id: &str) -> Result<()>;

    /// Move a mesh by a relative offset
    fn translate_mesh(&mut self, id: &str, by: Vec3) -> Result<()>;

    /// Set the absolute rotation of a mesh
    fn rotate_mesh(&mut self, id: &str, rotation: Vec3) -> Result<()>;

    /// Set the absolute scale of a mesh
    fn scale_mesh(&mut self, id: &str, scale: Vec3) -> Result<()>;

    /// Apply a texture to the walls or the floor
    fn set_texture(&mut self, slot: TextureSlot, texture: &TextureRef) -> Result<()>;

    /// Remove the texture of a slot
    fn remove_texture(&mut self, slot: TextureSlot) -> Result<()>;

    /// Highlight a mesh
    fn select_mesh(&mut self, id: &str) -> Result<()>;

    /// Remove every highlight
    fn deselect(&mut self) -> Result<()>;

    /// Apply one reconciled edit
    fn apply(&mut self, edit: &SceneEdit) -> Result<()> {
        match edit {
            SceneEdit::Delete { id } => self.remove_mesh(id),
            SceneEdit::Create {
                id,
                file_name,
                mesh_type,
                transform,
            } => self.add_mesh(PlacedMesh::new(
                id.as_str(),
                file_name.as_str(),
                mesh_type.as_str(),
                *transform,
            )),
            SceneEdit::Transform {
                id,
                translate_by,
                rotation,
                scale,
            } => {
                self.translate_mesh(id, *translate_by)?;
                self.rotate_mesh(id, *rotation)?;
                self.scale_mesh(id, *scale)
            }
            SceneEdit::Select { id } => self.select_mesh(id),
            SceneEdit::Deselect => self.deselect(),
            SceneEdit::SetTexture { slot, texture } => self.set_texture(*slot, texture),
            SceneEdit::RemoveTexture { slot } => self.remove_texture(*slot),
        }
    }
}

/// Offset factor applied along x when duplicating, relative to the mesh scale
const DUPLICATE_OFFSET: f64 = 1.1;

/// Scene kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryScene {
    initialized: bool,
    room: RoomSize,
    meshes: IndexMap<String, PlacedMesh>,
    walls: Option<TextureRef>,
    floor: Option<TextureRef>,
    highlighted: Option<String>,
    calls: Vec<String>,
}

impl MemoryScene {
    /// Create an empty scene with the given room
    pub fn new(room: RoomSize) -> Self {
        Self {
            room,
            ..Self::default()
        }
    }

    /// Check if `init` was called and `teardown` was not
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Current room dimensions
    pub fn room(&self) -> RoomSize {
        self.room
    }

    /// Get a mesh by id
    pub fn mesh(&self, id: &str) -> Option<&PlacedMesh> {
        self.meshes.get(id)
    }

    /// Ids of all meshes, in scene order
    pub fn mesh_ids(&self) -> Vec<&str> {
        self.meshes.keys().map(String::as_str).collect()
    }

    /// Texture of a slot
    pub fn texture(&self, slot: TextureSlot) -> Option<&TextureRef> {
        match slot {
            TextureSlot::Walls => self.walls.as_ref(),
            TextureSlot::Floor => self.floor.as_ref(),
        }
    }

    /// Highlighted mesh
    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_deref()
    }

    /// Scene calls received so far, oldest first
    pub fn call_log(&self) -> &[String] {
        &self.calls
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(BridgeError::NotInitialized)
        }
    }

    fn mesh_mut(&mut self, id: &str) -> Result<&mut PlacedMesh> {
        self.meshes
            .get_mut(id)
            .ok_or_else(|| BridgeError::UnknownMesh(id.to_string()))
    }

    fn log(&mut self, call: String) {
        tracing::trace!(%call, "Scene call");
        self.calls.push(call);
    }
}

impl SceneBridge for MemoryScene {
    fn init(&mut self) -> Result<()> {
        self.initialized = true;
        Ok(())
    }

    fn teardown(&mut self) {
        self.initialized = false;
    }

    fn capture_state(&mut self) -> Result<SceneSnapshot> {
        self.ensure_ready()?;
        Ok(SceneSnapshot {
            room: self.room,
            meshes: self.meshes.values().cloned().collect(),
            selection: None,
            walls: self.walls.clone(),
            floor: self.floor.clone(),
        })
    }

    fn rebuild_room(&mut self, room: RoomSize) -> Result<()> {
        self.ensure_ready()?;
        self.room = room;
        self.log(format!("rebuild_room({}, {})", room.x, room.y));
        Ok(())
    }

    fn add_mesh(&mut self, mesh: PlacedMesh) -> Result<()> {
        self.ensure_ready()?;
        if self.meshes.contains_key(&mesh.id) {
            return Err(BridgeError::DuplicateMesh(mesh.id));
        }
        self.log(format!("add_mesh({})", mesh.id));
        self.meshes.insert(mesh.id.clone(), mesh);
        Ok(())
    }

    fn duplicate_mesh(&mut self, source_id: &str, new_id: &str) -> Result<()> {
        self.ensure_ready()?;
        if self.meshes.contains_key(new_id) {
            return Err(BridgeError::DuplicateMesh(new_id.to_string()));
        }
        let mut copy = self
            .meshes
            .get(source_id)
            .cloned()
            .ok_or_else(|| BridgeError::UnknownMesh(source_id.to_string()))?;
        copy.id = new_id.to_string();
        copy.pos[0] += copy.scale[0] * DUPLICATE_OFFSET;

        if self.highlighted.as_deref() == Some(source_id) {
            self.highlighted = None;
        }
        self.log(format!("duplicate_mesh({source_id}, {new_id})"));
        self.meshes.insert(new_id.to_string(), copy);
        Ok(())
    }

    fn remove_mesh(&mut self, id: &str) -> Result<()> {
        self.ensure_ready()?;
        if self.meshes.shift_remove(id).is_none() {
            return Err(BridgeError::UnknownMesh(id.to_string()));
        }
        if self.highlighted.as_deref() == Some(id) {
            self.highlighted = None;
        }
        self.log(format!("remove_mesh({id})"));
        Ok(())
    }

    fn translate_mesh(&mut self, id: &str, by: Vec3) -> Result<()> {
        self.ensure_ready()?;
        let mesh = self.mesh_mut(id)?;
        for (axis, offset) in mesh.pos.iter_mut().zip(by) {
            *axis += offset;
        }
        self.log(format!("translate_mesh({id}, {by:?})"));
        Ok(())
    }

    fn rotate_mesh(&mut self, id: &str, rotation: Vec3) -> Result<()> {
        self.ensure_ready()?;
        self.mesh_mut(id)?.rot = rotation;
        self.log(format!("rotate_mesh({id}, {rotation:?})"));
        Ok(())
    }

    fn scale_mesh(&mut self, id: &str, scale: Vec3) -> Result<()> {
        self.ensure_ready()?;
        self.mesh_mut(id)?.scale = scale;
        self.log(format!("scale_mesh({id}, {scale:?})"));
        Ok(())
    }

    fn set_texture(&mut self, slot: TextureSlot, texture: &TextureRef) -> Result<()> {
        self.ensure_ready()?;
        match slot {
            TextureSlot::Walls => self.walls = Some(texture.clone()),
            TextureSlot::Floor => self.floor = Some(texture.clone()),
        }
        self.log(format!(
            "set_texture({}, {})",
            slot.scene_key(),
            texture.texture_name
        ));
        Ok(())
    }

    fn remove_texture(&mut self, slot: TextureSlot) -> Result<()> {
        self.ensure_ready()?;
        match slot {
            TextureSlot::Walls => self.walls = None,
            TextureSlot::Floor => self.floor = None,
        }
        self.log(format!("remove_texture({})", slot.scene_key()));
        Ok(())
    }

    fn select_mesh(&mut self, id: &str) -> Result<()> {
        self.ensure_ready()?;
        if !self.meshes.contains_key(id) {
            return Err(BridgeError::UnknownMesh(id.to_string()));
        }
        self.highlighted = Some(id.to_string());
        self.log(format!("select_mesh({id})"));
        Ok(())
    }

    fn deselect(&mut self) -> Result<()> {
        self.ensure_ready()?;
        self.highlighted = None;
        self.log("deselect()".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use room_designer_core::MeshTransform;

    fn ready_scene() -> MemoryScene {
        let mut scene = MemoryScene::new(RoomSize::default());
        scene.init().unwrap();
        scene
    }

    fn chair() -> PlacedMesh {
        PlacedMesh::new("chair", "chair.babylon", "chair", MeshTransform::at([1.0, 0.0, 1.0]))
    }

    #[test]
    fn test_requires_init() {
        let mut scene = MemoryScene::default();
        assert_eq!(scene.capture_state(), Err(BridgeError::NotInitialized));
        scene.init().unwrap();
        assert!(scene.capture_state().is_ok());
        scene.teardown();
        assert!(!scene.is_initialized());
    }

    #[test]
    fn test_add_and_duplicate() {
        let mut scene = ready_scene();
        scene.add_mesh(chair()).unwrap();
        assert_eq!(scene.add_mesh(chair()), Err(BridgeError::DuplicateMesh("chair".into())));

        scene.duplicate_mesh("chair", "chair_copy").unwrap();
        let copy = scene.mesh("chair_copy").unwrap();
        assert!((copy.pos[0] - 2.1).abs() < 1e-9);
        assert_eq!(scene.mesh_ids(), vec!["chair", "chair_copy"]);
    }

    #[test]
    fn test_apply_transform_edit() {
        let mut scene = ready_scene();
        scene.add_mesh(chair()).unwrap();
        scene
            .apply(&SceneEdit::Transform {
                id: "chair".into(),
                translate_by: [0.5, 0.0, -1.0],
                rotation: [0.0, 3.0, 0.0],
                scale: [2.0, 2.0, 2.0],
            })
            .unwrap();

        let mesh = scene.mesh("chair").unwrap();
        assert_eq!(mesh.pos, [1.5, 0.0, 0.0]);
        assert_eq!(mesh.rot, [0.0, 3.0, 0.0]);
        assert_eq!(mesh.scale, [2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_apply_texture_and_selection_edits() {
        let mut scene = ready_scene();
        scene.add_mesh(chair()).unwrap();
        scene
            .apply(&SceneEdit::SetTexture {
                slot: TextureSlot::Floor,
                texture: TextureRef::new("oak.jpg", "Oak", "wood"),
            })
            .unwrap();
        scene.apply(&SceneEdit::Select { id: "chair".into() }).unwrap();
        assert_eq!(scene.highlighted(), Some("chair"));
        assert!(scene.texture(TextureSlot::Floor).is_some());

        scene.apply(&SceneEdit::Delete { id: "chair".into() }).unwrap();
        assert_eq!(scene.highlighted(), None);
        scene
            .apply(&SceneEdit::RemoveTexture { slot: TextureSlot::Floor })
            .unwrap();
        assert!(scene.texture(TextureSlot::Floor).is_none());
        assert!(scene.call_log().contains(&"remove_texture(carpet)".to_string()));
    }

    #[test]
    fn test_unknown_mesh() {
        let mut scene = ready_scene();
        assert_eq!(
            scene.remove_mesh("ghost"),
            Err(BridgeError::UnknownMesh("ghost".into()))
        );
        assert!(scene.select_mesh("ghost").is_err());
    }
}
