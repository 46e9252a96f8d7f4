use crate::assets::{self, StudioConfig};
use crate::materials::serialization::{self, load_catalog_or_empty, load_texture_index};
use crate::materials::{MapKind, MaterialCatalog, MaterialDefinition};
use crate::render::camera::{load_camera_config, save_camera_config};
use crate::render::{MaterialBinder, OrbitCamera, TextureLoader};
use crate::scene::{resolve, switcher, ModelScene, ObjectCatalog, SlotMap};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One line of the slot diagnostic report.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotReportRow {
    pub object: String,
    pub slot: u32,
    pub mesh: String,
    pub material: Option<String>,
    pub visible: bool,
}

impl fmt::Display for SlotReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<10} slot {:<3} {:<24} {:<16} {}",
            self.object,
            self.slot,
            self.mesh,
            self.material.as_deref().unwrap_or("-"),
            if self.visible { "visible" } else { "hidden" }
        )
    }
}

/// All editor state, owned in one place.
///
/// Holds the material catalog, the logical objects with the current-object
/// pointer, the instance cache, the loaded asset and its slot map, and the
/// camera.
pub struct EditorSession {
    catalog: MaterialCatalog,
    objects: ObjectCatalog,
    binder: MaterialBinder,
    model: Option<ModelScene>,
    slots: Option<SlotMap>,
    camera: OrbitCamera,
    catalog_path: PathBuf,
    texture_index_path: PathBuf,
    camera_path: PathBuf,
    texture_options: Vec<(String, String)>,
}

impl EditorSession {
    pub fn new(config: &StudioConfig, loader: Arc<dyn TextureLoader>) -> Self {
        let mut objects = ObjectCatalog::new(config.objects.clone());
        if !objects.set_current(&config.default_object) {
            log::warn!("Default object '{}' not declared", config.default_object);
        }
        Self {
            catalog: MaterialCatalog::new(),
            objects,
            binder: MaterialBinder::new(loader, config.texture_root(), config.env_intensity()),
            model: None,
            slots: None,
            camera: OrbitCamera::default(),
            catalog_path: config.materials.clone(),
            texture_index_path: config.texture_index.clone(),
            camera_path: config.camera.clone(),
            texture_options: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &MaterialCatalog {
        &self.catalog
    }

    pub fn objects(&self) -> &ObjectCatalog {
        &self.objects
    }

    pub fn model(&self) -> Option<&ModelScene> {
        self.model.as_ref()
    }

    pub fn slots(&self) -> Option<&SlotMap> {
        self.slots.as_ref()
    }

    pub fn binder(&self) -> &MaterialBinder {
        &self.binder
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn texture_options(&self) -> &[(String, String)] {
        &self.texture_options
    }

    /// Applies `camera.json` when it can be read. Returns whether it was.
    pub fn load_camera(&mut self) -> bool {
        match load_camera_config(&self.camera_path) {
            Some(config) => {
                self.camera.apply(&config);
                log::info!("Applied camera config from {}", self.camera_path.display());
                true
            }
            None => false,
        }
    }

    pub fn export_camera(&self) -> serialization::Result<()> {
        save_camera_config(&self.camera.current_config(), &self.camera_path)?;
        log::info!("Saved camera config to {}", self.camera_path.display());
        Ok(())
    }

    /// Loads the catalog document; a missing or broken file leaves an empty
    /// catalog. Cached instances are dropped.
    pub fn load_catalog(&mut self) {
        self.catalog = load_catalog_or_empty(&self.catalog_path);
        self.binder.clear();
    }

    pub fn replace_catalog(&mut self, catalog: MaterialCatalog) {
        self.catalog = catalog;
        self.binder.clear();
    }

    pub fn load_model(&mut self, path: &Path) -> assets::Result<()> {
        let scene = assets::load_model(path)?;
        self.install_model(scene);
        Ok(())
    }

    /// Replaces the loaded asset, resolves its meshes, shows the current
    /// object and binds its slot materials.
    pub fn install_model(&mut self, mut scene: ModelScene) {
        let slots = resolve(scene.meshes(), &mut self.objects);
        if self.objects.current().is_some() {
            switcher::apply_visibility(&mut self.objects, &slots, &mut scene);
        }
        self.model = Some(scene);
        self.slots = Some(slots);
        if let Some(key) = self.objects.current_key().map(str::to_string) {
            self.bind_object(&key);
        }
    }

    /// Shows `key` alone and binds its slot materials.
    pub fn switch_to(&mut self, key: &str) -> bool {
        if !switcher::switch_to(
            &mut self.objects,
            self.slots.as_ref(),
            self.model.as_mut(),
            key,
        ) {
            return false;
        }
        self.bind_object(key);
        true
    }

    pub fn bind(&mut self, key: &str, slot: u32, material: &str) -> bool {
        let (Some(slots), Some(model)) = (self.slots.as_ref(), self.model.as_mut()) else {
            return false;
        };
        self.binder
            .bind(&self.catalog, slots, model, key, slot, material)
    }

    fn bind_object(&mut self, key: &str) -> usize {
        let (Some(slots), Some(model)) = (self.slots.as_ref(), self.model.as_mut()) else {
            return 0;
        };
        self.binder
            .bind_object(&self.catalog, &self.objects, slots, model, key)
    }

    /// Re-binds the current object's slots that use `material`.
    pub fn rebind(&mut self, material: &str) -> usize {
        let (Some(slots), Some(model)) = (self.slots.as_ref(), self.model.as_mut()) else {
            self.binder.evict(material);
            return 0;
        };
        self.binder
            .rebind(&self.catalog, &self.objects, slots, model, material)
    }

    /// Assigns `material` to a slot of `key`, binding it right away when
    /// `key` is the current object.
    pub fn set_object_material_slot(&mut self, key: &str, slot: u32, material: &str) -> bool {
        let Some(object) = self.objects.get_mut(key) else {
            log::warn!("Unknown object '{}'", key);
            return false;
        };
        object.slot_materials.insert(slot, material.to_string());
        if self.objects.current_key() == Some(key) {
            self.bind(key, slot, material);
        }
        true
    }

    pub fn object_material_slots(&self, key: &str) -> Option<&BTreeMap<u32, String>> {
        self.objects.get(key).map(|object| &object.slot_materials)
    }

    pub fn object_main_material(&self, key: &str) -> Option<&str> {
        self.objects.get(key).and_then(|object| object.slot_material(0))
    }

    /// Mutates a definition in place and refreshes what is on screen.
    pub fn edit_material<F>(&mut self, name: &str, edit: F) -> bool
    where
        F: FnOnce(&mut MaterialDefinition),
    {
        let Some(definition) = self.catalog.get_mut(name) else {
            log::warn!("Cannot edit unknown material '{}'", name);
            return false;
        };
        edit(definition);
        let rebound = self.rebind(name);
        log::debug!("Edited material '{}' ({} slot(s) re-bound)", name, rebound);
        true
    }

    /// Sets a texture map; `None` or an empty url removes it.
    pub fn set_texture_map(&mut self, name: &str, kind: MapKind, url: Option<&str>) -> bool {
        self.edit_material(name, |definition| definition.set_map(kind, url))
    }

    /// Renames a catalog entry. Slot assignments keep the old name.
    pub fn rename_material(&mut self, old: &str, new: &str) -> bool {
        if !self.catalog.rename(old, new) {
            log::warn!("Rename '{}' -> '{}' refused", old, new);
            return false;
        }
        self.binder.evict(old);
        log::info!("Renamed material '{}' to '{}'", old, new.trim());
        true
    }

    pub fn delete_material(&mut self, name: &str) -> bool {
        if self.catalog.remove(name).is_none() {
            return false;
        }
        self.binder.evict(name);
        log::info!("Deleted material '{}'", name);
        true
    }

    /// Writes the whole catalog, then reads it back and adopts what was
    /// written. Returns the number of materials exported.
    pub fn export_catalog(&mut self) -> serialization::Result<usize> {
        serialization::save_catalog_to_file(&self.catalog, &self.catalog_path)?;
        let fresh = serialization::load_catalog_from_file(&self.catalog_path)?;
        self.catalog = fresh;
        log::info!(
            "Exported {} material(s) to {}",
            self.catalog.len(),
            self.catalog_path.display()
        );
        Ok(self.catalog.len())
    }

    /// Re-reads the texture index and rebuilds the picker options.
    pub fn refresh_textures(&mut self) -> &[(String, String)] {
        let names = load_texture_index(&self.texture_index_path);
        self.texture_options = serialization::texture_options(&names);
        &self.texture_options
    }

    pub fn slot_report(&self) -> Vec<SlotReportRow> {
        let (Some(slots), Some(model)) = (self.slots.as_ref(), self.model.as_ref()) else {
            return Vec::new();
        };
        slots
            .iter()
            .filter_map(|(key, slot, mesh)| {
                let node = model.mesh(mesh)?;
                Some(SlotReportRow {
                    object: key.to_string(),
                    slot,
                    mesh: node.name.clone(),
                    material: node.material.as_ref().map(|m| m.name.clone()),
                    visible: node.visible,
                })
            })
            .collect()
    }
}
