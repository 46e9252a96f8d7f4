pub mod camera;
pub mod textures;

pub use camera::OrbitCamera;
pub use textures::{ImageTextureLoader, TextureLoader, TextureMap};

use crate::materials::{
    parse_hex_color, MapKind, MaterialCatalog, MaterialDefinition, DEFAULT_COLOR,
    DEFAULT_EMISSIVE,
};
use crate::scene::{ModelScene, ObjectCatalog, SlotMap};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Render-ready material built from one [`MaterialDefinition`].
#[derive(Debug, Clone)]
pub struct MaterialInstance {
    pub name: String,
    pub base_color: [f32; 3],
    pub emissive: [f32; 3],
    pub roughness: f32,
    pub metalness: f32,
    pub opacity: f32,
    pub transparent: bool,
    pub double_sided: bool,
    pub normal_scale: f32,
    pub env_intensity: f32,
    pub maps: Vec<TextureMap>,
}

impl MaterialInstance {
    pub fn map(&self, kind: MapKind) -> Option<&TextureMap> {
        self.maps.iter().find(|map| map.kind == kind)
    }
}

fn color_or_default(name: &str, field: &str, value: &str, default: &str) -> [f32; 3] {
    parse_hex_color(value).unwrap_or_else(|| {
        log::warn!("Material '{}' has invalid {} '{}'", name, field, value);
        parse_hex_color(default).unwrap_or([1.0, 1.0, 1.0])
    })
}

/// Built instances by material name.
pub type MaterialCache = HashMap<String, Arc<MaterialInstance>>;

/// Builds instances and keeps them by material name until evicted.
pub struct MaterialBinder {
    cache: MaterialCache,
    loader: Arc<dyn TextureLoader>,
    texture_root: PathBuf,
    env_intensity: f32,
}

impl MaterialBinder {
    pub fn new(loader: Arc<dyn TextureLoader>, texture_root: PathBuf, env_intensity: f32) -> Self {
        Self {
            cache: HashMap::new(),
            loader,
            texture_root,
            env_intensity: env_intensity.clamp(0.0, 2.0),
        }
    }

    pub fn cached(&self, name: &str) -> Option<&Arc<MaterialInstance>> {
        self.cache.get(name)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn evict(&mut self, name: &str) -> bool {
        self.cache.remove(name).is_some()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Returns the cached instance, or builds one from the catalog.
    pub fn instance(
        &mut self,
        catalog: &MaterialCatalog,
        name: &str,
    ) -> Option<Arc<MaterialInstance>> {
        if let Some(instance) = self.cache.get(name) {
            return Some(Arc::clone(instance));
        }
        let definition = catalog.get(name)?;
        let instance = Arc::new(self.build(name, definition));
        self.cache.insert(name.to_string(), Arc::clone(&instance));
        Some(instance)
    }

    fn build(&self, name: &str, definition: &MaterialDefinition) -> MaterialInstance {
        let requests = definition.requested_maps();
        let maps = textures::load_maps(
            self.loader.as_ref(),
            &self.texture_root,
            &requests,
            definition.texture_transform(),
        );
        let opacity = definition.alpha();
        let has_normal = maps.iter().any(|map| map.kind == MapKind::Normal);
        let has_alpha = maps.iter().any(|map| map.kind == MapKind::Alpha);

        log::debug!(
            "Built material '{}' with {}/{} map(s)",
            name,
            maps.len(),
            requests.len()
        );

        MaterialInstance {
            name: name.to_string(),
            base_color: color_or_default(name, "color", definition.color_hex(), DEFAULT_COLOR),
            emissive: color_or_default(
                name,
                "emissive",
                definition.emissive_hex(),
                DEFAULT_EMISSIVE,
            ),
            roughness: definition.roughness(),
            metalness: definition.metalness(),
            opacity,
            transparent: opacity < 1.0 || has_alpha,
            double_sided: !definition.backface_culling(),
            normal_scale: if has_normal {
                definition.normal_intensity()
            } else {
                1.0
            },
            env_intensity: self.env_intensity,
            maps,
        }
    }

    /// Assigns `material` to the mesh resolved at `(key, slot)`.
    ///
    /// Returns false, leaving the scene untouched, when the cell was not
    /// resolved or the material is not in the catalog.
    pub fn bind(
        &mut self,
        catalog: &MaterialCatalog,
        slots: &SlotMap,
        model: &mut ModelScene,
        key: &str,
        slot: u32,
        material: &str,
    ) -> bool {
        let Some(mesh) = slots.get(key, slot) else {
            log::debug!("No mesh resolved for {} slot {}", key, slot);
            return false;
        };
        let Some(instance) = self.instance(catalog, material) else {
            log::warn!("Material '{}' not found in catalog", material);
            return false;
        };
        model.set_material(mesh, instance);
        true
    }

    /// Binds every assigned slot of one object. Returns the number bound.
    pub fn bind_object(
        &mut self,
        catalog: &MaterialCatalog,
        objects: &ObjectCatalog,
        slots: &SlotMap,
        model: &mut ModelScene,
        key: &str,
    ) -> usize {
        let Some(object) = objects.get(key) else {
            return 0;
        };
        object
            .assigned_slots()
            .filter(|(slot, material)| self.bind(catalog, slots, model, key, *slot, material))
            .count()
    }

    /// Drops the cached instance of `material` and re-binds the current
    /// object's slots that use it. Other objects pick up the change on their
    /// next switch.
    pub fn rebind(
        &mut self,
        catalog: &MaterialCatalog,
        objects: &ObjectCatalog,
        slots: &SlotMap,
        model: &mut ModelScene,
        material: &str,
    ) -> usize {
        self.evict(material);
        let Some(object) = objects.current() else {
            return 0;
        };
        let using: Vec<u32> = object
            .assigned_slots()
            .filter(|(_, name)| *name == material)
            .map(|(slot, _)| slot)
            .collect();
        using
            .into_iter()
            .filter(|slot| self.bind(catalog, slots, model, &object.key, *slot, material))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::textures::fake::CountingLoader;
    use super::MaterialBinder;
    use crate::materials::{MapKind, MaterialCatalog, MaterialDefinition, TextureTransform};
    use crate::scene::{resolve, LogicalObject, ModelScene, ObjectCatalog, SlotMap};
    use std::path::PathBuf;
    use std::sync::Arc;

    struct Fixture {
        loader: Arc<CountingLoader>,
        binder: MaterialBinder,
        catalog: MaterialCatalog,
        objects: ObjectCatalog,
        model: ModelScene,
        slots: SlotMap,
    }

    fn fixture() -> Fixture {
        let loader = Arc::new(CountingLoader::default());
        let binder = MaterialBinder::new(loader.clone(), PathBuf::from("materials"), 1.0);

        let mut catalog = MaterialCatalog::new();
        let mut blue = MaterialDefinition {
            color: Some("#0000ff".to_string()),
            roughness: Some(0.2),
            ..Default::default()
        };
        blue.set_map(MapKind::Albedo, Some("../materials/textures/blue.png"));
        blue.set_map(MapKind::Normal, Some("../materials/textures/blue_n.png"));
        catalog.set("blue", blue);
        catalog.set(
            "red",
            MaterialDefinition {
                color: Some("#ff0000".to_string()),
                alpha: Some(0.5),
                backface_culling: Some(false),
                ..Default::default()
            },
        );

        let mut objects = ObjectCatalog::new(vec![
            LogicalObject::new("cube", "Cube", "Cube")
                .with_slot(0, "blue")
                .with_slot(1, "red"),
            LogicalObject::new("sphere", "Sphere", "Sphere").with_slot(0, "blue"),
        ]);
        objects.set_current("cube");
        let model = ModelScene::from_names("m.glb", ["Cube", "Cube.001", "Sphere"]);
        let slots = resolve(model.meshes(), &mut objects);

        Fixture {
            loader,
            binder,
            catalog,
            objects,
            model,
            slots,
        }
    }

    fn material_name(f: &Fixture, mesh: &str) -> Option<String> {
        let id = f.model.find_by_name(mesh)?;
        f.model.mesh(id)?.material.as_ref().map(|m| m.name.clone())
    }

    #[test]
    fn instance_reflects_definition() {
        let mut f = fixture();
        let red = f.binder.instance(&f.catalog, "red").unwrap();
        assert_eq!(red.base_color, [1.0, 0.0, 0.0]);
        assert_eq!(red.opacity, 0.5);
        assert!(red.transparent);
        assert!(red.double_sided);
        assert!(red.maps.is_empty());

        let blue = f.binder.instance(&f.catalog, "blue").unwrap();
        assert_eq!(blue.roughness, 0.2);
        assert!(!blue.transparent);
        assert!(blue.map(MapKind::Albedo).is_some());
        assert!(blue.map(MapKind::Normal).is_some());
        assert_eq!(f.loader.count(), 2);
    }

    #[test]
    fn bind_is_idempotent_and_hits_the_cache() {
        let mut f = fixture();
        assert!(f.binder.bind(&f.catalog, &f.slots, &mut f.model, "cube", 0, "blue"));
        let first = f.model.mesh(f.slots.get("cube", 0).unwrap()).unwrap().material.clone();
        let loads = f.loader.count();

        assert!(f.binder.bind(&f.catalog, &f.slots, &mut f.model, "cube", 0, "blue"));
        let second = f.model.mesh(f.slots.get("cube", 0).unwrap()).unwrap().material.clone();

        assert!(Arc::ptr_eq(&first.unwrap(), &second.unwrap()));
        assert_eq!(f.loader.count(), loads);
        assert_eq!(f.binder.cache_len(), 1);
    }

    #[test]
    fn bind_is_a_no_op_for_missing_cells_or_materials() {
        let mut f = fixture();
        assert!(!f.binder.bind(&f.catalog, &f.slots, &mut f.model, "cube", 7, "blue"));
        assert!(!f.binder.bind(&f.catalog, &f.slots, &mut f.model, "torus", 0, "blue"));
        assert!(!f.binder.bind(&f.catalog, &f.slots, &mut f.model, "cube", 0, "chrome"));
        assert!(f.model.meshes().all(|(id, _)| f.model.mesh(id).unwrap().material.is_none()));
        assert_eq!(f.binder.cache_len(), 0);
    }

    #[test]
    fn bind_object_covers_every_assigned_slot() {
        let mut f = fixture();
        let bound = f
            .binder
            .bind_object(&f.catalog, &f.objects, &f.slots, &mut f.model, "cube");
        assert_eq!(bound, 2);
        assert_eq!(material_name(&f, "Cube").as_deref(), Some("blue"));
        assert_eq!(material_name(&f, "Cube.001").as_deref(), Some("red"));
        assert_eq!(material_name(&f, "Sphere"), None);
    }

    #[test]
    fn rebind_refreshes_current_object_from_latest_definition() {
        let mut f = fixture();
        f.binder
            .bind_object(&f.catalog, &f.objects, &f.slots, &mut f.model, "cube");
        f.binder
            .bind_object(&f.catalog, &f.objects, &f.slots, &mut f.model, "sphere");
        let stale_sphere = f.model.mesh(f.slots.get("sphere", 0).unwrap()).unwrap().material.clone();

        let transform = TextureTransform {
            scale_x: 3.0,
            offset_y: 0.25,
            ..Default::default()
        };
        {
            let blue = f.catalog.get_mut("blue").unwrap();
            blue.color = Some("#00ff00".to_string());
            blue.roughness = Some(0.9);
            blue.metalness = Some(0.4);
            blue.set_texture_transform(transform);
        }
        let loads = f.loader.count();
        let rebound = f
            .binder
            .rebind(&f.catalog, &f.objects, &f.slots, &mut f.model, "blue");
        assert_eq!(rebound, 1);
        assert_eq!(f.loader.count(), loads + 2);

        let cube = f.model.mesh(f.slots.get("cube", 0).unwrap()).unwrap();
        let instance = cube.material.as_ref().unwrap();
        assert_eq!(instance.base_color, [0.0, 1.0, 0.0]);
        assert_eq!(instance.roughness, 0.9);
        assert_eq!(instance.metalness, 0.4);
        assert!(instance
            .maps
            .iter()
            .all(|map| map.uv_transform == transform.matrix()));

        // Non-current objects keep their previous instance until switched to.
        let sphere = f.model.mesh(f.slots.get("sphere", 0).unwrap()).unwrap();
        assert!(Arc::ptr_eq(
            sphere.material.as_ref().unwrap(),
            stale_sphere.as_ref().unwrap()
        ));
    }

    #[test]
    fn invalid_colors_fall_back_to_defaults() {
        let mut f = fixture();
        f.catalog.set(
            "broken",
            MaterialDefinition {
                color: Some("teal".to_string()),
                emissive: Some("#zzzzzz".to_string()),
                ..Default::default()
            },
        );
        let instance = f.binder.instance(&f.catalog, "broken").unwrap();
        assert_eq!(instance.base_color, [1.0, 1.0, 1.0]);
        assert_eq!(instance.emissive, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn env_intensity_is_clamped() {
        let mut binder =
            MaterialBinder::new(Arc::new(CountingLoader::default()), PathBuf::new(), 5.0);
        let mut catalog = MaterialCatalog::new();
        catalog.set("plain", MaterialDefinition::default());
        assert_eq!(binder.instance(&catalog, "plain").unwrap().env_intensity, 2.0);
    }
}
