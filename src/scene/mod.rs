pub mod resolver;
pub mod switcher;

pub use resolver::{resolve, SlotMap};

use crate::render::MaterialInstance;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Handle to one mesh node inside a [`ModelScene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshId(usize);

impl MeshId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One renderable mesh of an imported asset (one material slot after splitting).
#[derive(Debug, Clone)]
pub struct MeshNode {
    pub name: String,
    pub visible: bool,
    pub material: Option<Arc<MaterialInstance>>,
}

/// Flattened mesh nodes of one loaded asset, in traversal order.
#[derive(Debug, Default)]
pub struct ModelScene {
    source: String,
    meshes: Vec<MeshNode>,
}

impl ModelScene {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            meshes: Vec::new(),
        }
    }

    pub fn from_names<I, S>(source: impl Into<String>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut scene = Self::new(source);
        for name in names {
            scene.push_mesh(name);
        }
        scene
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn push_mesh(&mut self, name: impl Into<String>) -> MeshId {
        let id = MeshId(self.meshes.len());
        self.meshes.push(MeshNode {
            name: name.into(),
            visible: true,
            material: None,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Traversal primitive: every mesh handle with its name.
    pub fn meshes(&self) -> impl Iterator<Item = (MeshId, &str)> {
        self.meshes
            .iter()
            .enumerate()
            .map(|(index, mesh)| (MeshId(index), mesh.name.as_str()))
    }

    pub fn mesh(&self, id: MeshId) -> Option<&MeshNode> {
        self.meshes.get(id.0)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut MeshNode> {
        self.meshes.get_mut(id.0)
    }

    pub fn set_visible(&mut self, id: MeshId, visible: bool) {
        if let Some(mesh) = self.meshes.get_mut(id.0) {
            mesh.visible = visible;
        }
    }

    pub fn set_material(&mut self, id: MeshId, material: Arc<MaterialInstance>) {
        if let Some(mesh) = self.meshes.get_mut(id.0) {
            mesh.material = Some(material);
        }
    }

    pub fn find_by_name(&self, name: &str) -> Option<MeshId> {
        self.meshes
            .iter()
            .position(|mesh| mesh.name == name)
            .map(MeshId)
    }
}

/// A user-facing object that the importer may split into several mesh nodes.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LogicalObject {
    pub key: String,
    #[serde(rename = "name")]
    pub display_name: String,
    /// Mesh name the authoring tool used before the per-material split.
    #[serde(rename = "meshName")]
    pub mesh_name: String,
    #[serde(skip)]
    pub visible: bool,
    #[serde(rename = "materials", default)]
    pub slot_materials: BTreeMap<u32, String>,
}

impl LogicalObject {
    pub fn new(key: &str, display_name: &str, mesh_name: &str) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            mesh_name: mesh_name.to_string(),
            visible: false,
            slot_materials: BTreeMap::new(),
        }
    }

    pub fn with_slot(mut self, slot: u32, material: &str) -> Self {
        self.slot_materials.insert(slot, material.to_string());
        self
    }

    /// Material assigned to `slot`; empty assignments count as unset.
    pub fn slot_material(&self, slot: u32) -> Option<&str> {
        self.slot_materials
            .get(&slot)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    pub fn assigned_slots(&self) -> impl Iterator<Item = (u32, &str)> {
        self.slot_materials
            .iter()
            .filter(|(_, name)| !name.is_empty())
            .map(|(slot, name)| (*slot, name.as_str()))
    }
}

/// Statically configured logical objects, in configuration order, plus the
/// current-object pointer.
#[derive(Debug, Clone, Default)]
pub struct ObjectCatalog {
    objects: Vec<LogicalObject>,
    current: Option<String>,
}

impl ObjectCatalog {
    pub fn new(objects: Vec<LogicalObject>) -> Self {
        Self {
            objects,
            current: None,
        }
    }

    pub fn objects(&self) -> &[LogicalObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&LogicalObject> {
        self.objects.iter().find(|object| object.key == key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut LogicalObject> {
        self.objects.iter_mut().find(|object| object.key == key)
    }

    pub fn by_index(&self, index: usize) -> Option<&LogicalObject> {
        self.objects.get(index)
    }

    pub(crate) fn by_index_mut(&mut self, index: usize) -> Option<&mut LogicalObject> {
        self.objects.get_mut(index)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut LogicalObject> {
        self.objects.iter_mut()
    }

    pub fn current_key(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&LogicalObject> {
        self.current.as_deref().and_then(|key| self.get(key))
    }

    /// Moves the current-object pointer without touching any visibility.
    /// Returns false for unknown keys.
    pub fn set_current(&mut self, key: &str) -> bool {
        if self.get(key).is_none() {
            return false;
        }
        self.current = Some(key.to_string());
        true
    }

    pub fn visible_count(&self) -> usize {
        self.objects.iter().filter(|object| object.visible).count()
    }
}
