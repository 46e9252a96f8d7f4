//! Mesh-slot resolution.
//!
//! glTF importers split one multi-material object into one mesh node per
//! material slot and rename the pieces along the way. Only the mesh names
//! survive, so the slot of every node is recovered from naming conventions:
//!
//! | Mesh name            | Slot                                       |
//! |----------------------|--------------------------------------------|
//! | `Cube`               | 0                                          |
//! | `Cube.002`           | 2                                          |
//! | `Cube_Red`           | slot whose material name overlaps `red`    |
//! | `Cube_SubMat3`       | 3                                          |
//! | `Cube_anything_else` | 0                                          |
//! | `Cube001`            | 0                                          |
//! | `Cube001_4`          | 4                                          |
//!
//! Exact names are checked against every object first; the remaining rules
//! run object by object in catalog order and the first object that produces a
//! match owns the mesh.

use super::{MeshId, ObjectCatalog};
use std::collections::BTreeMap;

/// Materials handed to newly discovered slots, indexed by slot.
///
/// Slots past the end reuse the first entry. No shipped configuration has
/// more than two slots, so the reuse has never been observed; it is kept
/// as-is because existing bindings depend on it.
pub const DEFAULT_SLOT_MATERIALS: [&str; 4] = ["blue", "red", "white", "black"];

pub fn default_material_for_slot(slot: u32) -> &'static str {
    DEFAULT_SLOT_MATERIALS
        .get(slot as usize)
        .copied()
        .unwrap_or(DEFAULT_SLOT_MATERIALS[0])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    Exact,
    DotNumbered,
    MaterialSuffix,
    SubMat,
    SuffixFallback,
    ExportTool,
    ExportToolNumbered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotMatch {
    /// Index of the owning object in the catalog.
    pub object: usize,
    pub slot: u32,
    pub rule: MatchRule,
}

/// `(object key, slot) -> mesh` for one loaded asset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotMap {
    cells: BTreeMap<String, BTreeMap<u32, MeshId>>,
}

impl SlotMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places `mesh` in a cell, replacing whatever occupied it.
    pub fn insert(&mut self, key: &str, slot: u32, mesh: MeshId) -> Option<MeshId> {
        self.cells
            .entry(key.to_string())
            .or_default()
            .insert(slot, mesh)
    }

    pub fn get(&self, key: &str, slot: u32) -> Option<MeshId> {
        self.cells.get(key).and_then(|slots| slots.get(&slot)).copied()
    }

    pub fn slots(&self, key: &str) -> Option<&BTreeMap<u32, MeshId>> {
        self.cells.get(key)
    }

    pub fn meshes_of<'a>(&'a self, key: &str) -> impl Iterator<Item = MeshId> + 'a {
        self.cells
            .get(key)
            .into_iter()
            .flat_map(|slots| slots.values().copied())
    }

    pub fn object_keys(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32, MeshId)> {
        self.cells.iter().flat_map(|(key, slots)| {
            slots
                .iter()
                .map(move |(slot, mesh)| (key.as_str(), *slot, *mesh))
        })
    }

    pub fn locate(&self, mesh: MeshId) -> Option<(&str, u32)> {
        self.iter()
            .find(|(_, _, candidate)| *candidate == mesh)
            .map(|(key, slot, _)| (key, slot))
    }

    pub fn cell_count(&self) -> usize {
        self.cells.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }
}

/// Classifies every mesh of one freshly loaded asset.
///
/// Slots discovered without a material assignment receive
/// [`default_material_for_slot`] immediately, so later meshes in the same
/// traversal already see those names during material-suffix inference.
/// Meshes that match nothing are left out of the map.
pub fn resolve<'a, I>(meshes: I, objects: &mut ObjectCatalog) -> SlotMap
where
    I: IntoIterator<Item = (MeshId, &'a str)>,
{
    let mut slots = SlotMap::new();
    let mut unresolved = 0usize;

    for (mesh, name) in meshes {
        let Some(found) = classify(name, objects) else {
            log::debug!("No slot pattern matched mesh '{}'", name);
            unresolved += 1;
            continue;
        };
        let Some(object) = objects.by_index_mut(found.object) else {
            continue;
        };
        if let Some(previous) = slots.insert(&object.key, found.slot, mesh) {
            log::debug!(
                "Mesh '{}' replaces mesh #{} in {} slot {}",
                name,
                previous.index(),
                object.key,
                found.slot
            );
        }
        log::debug!(
            "Mesh '{}' -> {} slot {} ({:?})",
            name,
            object.key,
            found.slot,
            found.rule
        );
        if object.slot_material(found.slot).is_none() {
            let material = default_material_for_slot(found.slot);
            object.slot_materials.insert(found.slot, material.to_string());
            log::debug!(
                "Assigned default material '{}' to {} slot {}",
                material,
                object.key,
                found.slot
            );
        }
    }

    log::info!(
        "Resolved {} mesh slot(s) across {} object(s), {} mesh(es) unresolved",
        slots.cell_count(),
        slots.object_keys().count(),
        unresolved
    );
    slots
}

/// Decides which object and slot a single mesh name belongs to.
pub fn classify(name: &str, objects: &ObjectCatalog) -> Option<SlotMatch> {
    if let Some(object) = objects
        .objects()
        .iter()
        .position(|object| object.mesh_name == name)
    {
        return Some(SlotMatch {
            object,
            slot: 0,
            rule: MatchRule::Exact,
        });
    }

    objects
        .objects()
        .iter()
        .enumerate()
        .find_map(|(index, object)| {
            match_variant(name, &object.mesh_name, object.assigned_slots()).map(|(slot, rule)| {
                SlotMatch {
                    object: index,
                    slot,
                    rule,
                }
            })
        })
}

fn match_variant<'a>(
    name: &str,
    base: &str,
    assigned: impl Iterator<Item = (u32, &'a str)>,
) -> Option<(u32, MatchRule)> {
    let rest = name.strip_prefix(base)?;

    if let Some(slot) = rest.strip_prefix('.').and_then(parse_slot) {
        return Some((slot, MatchRule::DotNumbered));
    }

    if let Some(suffix) = rest.strip_prefix('_').filter(|suffix| !suffix.is_empty()) {
        return Some(match_suffix(suffix, assigned));
    }

    if rest == "001" {
        return Some((0, MatchRule::ExportTool));
    }

    rest.strip_prefix("001_")
        .and_then(parse_slot)
        .map(|slot| (slot, MatchRule::ExportToolNumbered))
}

fn match_suffix<'a>(
    suffix: &str,
    assigned: impl Iterator<Item = (u32, &'a str)>,
) -> (u32, MatchRule) {
    let wanted = suffix.to_lowercase();
    for (slot, material) in assigned {
        let material = material.to_lowercase();
        if material.contains(&wanted) || wanted.contains(&material) {
            return (slot, MatchRule::MaterialSuffix);
        }
    }

    if let Some(slot) = strip_prefix_ignore_case(suffix, "submat").and_then(parse_slot) {
        return (slot, MatchRule::SubMat);
    }

    // Ambiguous suffixes land on slot 0 even when it is already taken.
    (0, MatchRule::SuffixFallback)
}

/// A non-empty run of ASCII digits that fits in a slot index.
fn parse_slot(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        value.get(prefix.len()..)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, default_material_for_slot, resolve, MatchRule, SlotMap};
    use crate::scene::{LogicalObject, ModelScene, ObjectCatalog};

    fn cube_and_sphere() -> ObjectCatalog {
        ObjectCatalog::new(vec![
            LogicalObject::new("cube", "Cube", "Cube"),
            LogicalObject::new("sphere", "Sphere", "Sphere"),
        ])
    }

    fn resolve_names(names: &[&str], objects: &mut ObjectCatalog) -> (ModelScene, SlotMap) {
        let scene = ModelScene::from_names("test.glb", names.iter().copied());
        let slots = resolve(scene.meshes(), objects);
        (scene, slots)
    }

    fn name_at<'a>(scene: &'a ModelScene, slots: &SlotMap, key: &str, slot: u32) -> Option<&'a str> {
        slots
            .get(key, slot)
            .and_then(|id| scene.mesh(id))
            .map(|mesh| mesh.name.as_str())
    }

    #[test]
    fn cube_sphere_scenario() {
        let mut objects = cube_and_sphere();
        let (scene, slots) = resolve_names(&["Cube", "Cube.001", "Sphere"], &mut objects);

        assert_eq!(name_at(&scene, &slots, "cube", 0), Some("Cube"));
        assert_eq!(name_at(&scene, &slots, "cube", 1), Some("Cube.001"));
        assert_eq!(name_at(&scene, &slots, "sphere", 0), Some("Sphere"));
        assert_eq!(slots.cell_count(), 3);
        assert_eq!(slots.slots("cube").map(|cells| cells.len()), Some(2));
        assert_eq!(slots.slots("sphere").map(|cells| cells.len()), Some(1));
    }

    #[test]
    fn exact_names_belong_to_one_object_only() {
        let objects = cube_and_sphere();
        for (name, expected) in [("Cube", 0usize), ("Sphere", 1usize)] {
            let found = classify(name, &objects).unwrap();
            assert_eq!(found.object, expected);
            assert_eq!(found.slot, 0);
            assert_eq!(found.rule, MatchRule::Exact);
        }
    }

    #[test]
    fn exact_match_wins_over_earlier_object_prefix() {
        // "Cube_Big" would hit the underscore rule of "Cube", but the exact
        // pass over every object runs first.
        let objects = ObjectCatalog::new(vec![
            LogicalObject::new("cube", "Cube", "Cube"),
            LogicalObject::new("big", "Big Cube", "Cube_Big"),
        ]);
        let found = classify("Cube_Big", &objects).unwrap();
        assert_eq!(found.object, 1);
        assert_eq!(found.rule, MatchRule::Exact);
    }

    #[test]
    fn dot_numbered_suffix_selects_slot() {
        let objects = cube_and_sphere();
        for n in [0u32, 1, 2, 7, 42, 1000] {
            let found = classify(&format!("Sphere.{n}"), &objects).unwrap();
            assert_eq!((found.object, found.slot), (1, n));
            assert_eq!(found.rule, MatchRule::DotNumbered);
        }
        assert_eq!(classify("Cube.003", &objects).map(|found| found.slot), Some(3));
    }

    #[test]
    fn dot_suffix_without_digits_does_not_match() {
        let objects = cube_and_sphere();
        assert_eq!(classify("Cube.abc", &objects), None);
        assert_eq!(classify("Cube.", &objects), None);
        assert_eq!(classify("Cube.99999999999", &objects), None);
    }

    #[test]
    fn submat_suffix_ignores_material_assignments() {
        let mut objects = ObjectCatalog::new(vec![LogicalObject::new("cube", "Cube", "Cube")
            .with_slot(0, "blue")
            .with_slot(2, "red")]);
        let (scene, slots) = resolve_names(&["Cube_SubMat2"], &mut objects);
        assert_eq!(name_at(&scene, &slots, "cube", 2), Some("Cube_SubMat2"));

        let mut objects = cube_and_sphere();
        let (scene, slots) = resolve_names(&["Cube_SubMat2"], &mut objects);
        assert_eq!(name_at(&scene, &slots, "cube", 2), Some("Cube_SubMat2"));
    }

    #[test]
    fn submat_prefix_is_case_insensitive() {
        let objects = cube_and_sphere();
        for name in ["Cube_SubMat3", "Cube_submat3", "Cube_SUBMAT3"] {
            let found = classify(name, &objects).unwrap();
            assert_eq!((found.slot, found.rule), (3, MatchRule::SubMat));
        }
    }

    #[test]
    fn underscore_suffix_infers_slot_from_material_name() {
        let objects = ObjectCatalog::new(vec![LogicalObject::new("cube", "Cube", "Cube")
            .with_slot(0, "blue")
            .with_slot(1, "red")]);

        let found = classify("Cube_Red", &objects).unwrap();
        assert_eq!((found.slot, found.rule), (1, MatchRule::MaterialSuffix));

        // Substring in the other direction: the suffix contains the material name.
        let found = classify("Cube_DarkBlueGlass", &objects).unwrap();
        assert_eq!((found.slot, found.rule), (0, MatchRule::MaterialSuffix));

        // The material name contains the suffix.
        let found = classify("Cube_re", &objects).unwrap();
        assert_eq!(found.slot, 1);
    }

    #[test]
    fn material_inference_prefers_lowest_slot() {
        let objects = ObjectCatalog::new(vec![LogicalObject::new("cube", "Cube", "Cube")
            .with_slot(3, "red_paint")
            .with_slot(1, "red")]);
        let found = classify("Cube_red", &objects).unwrap();
        assert_eq!(found.slot, 1);
    }

    #[test]
    fn material_inference_runs_before_submat() {
        let objects = ObjectCatalog::new(vec![
            LogicalObject::new("cube", "Cube", "Cube").with_slot(5, "submat2_metal")
        ]);
        let found = classify("Cube_SubMat2", &objects).unwrap();
        assert_eq!((found.slot, found.rule), (5, MatchRule::MaterialSuffix));
    }

    #[test]
    fn unknown_underscore_suffix_falls_back_to_slot_zero_and_overwrites() {
        let mut objects = ObjectCatalog::new(vec![LogicalObject::new("cube", "Cube", "Cube")
            .with_slot(0, "blue")
            .with_slot(1, "red")]);
        let (scene, slots) = resolve_names(&["Cube", "Cube_Chrome"], &mut objects);

        // Accepted lossy heuristic: the fallback silently replaces "Cube".
        assert_eq!(name_at(&scene, &slots, "cube", 0), Some("Cube_Chrome"));
        assert_eq!(slots.cell_count(), 1);
        assert_eq!(
            classify("Cube_Chrome", &objects).map(|found| found.rule),
            Some(MatchRule::SuffixFallback)
        );
    }

    #[test]
    fn export_tool_patterns() {
        let mut objects = cube_and_sphere();
        let (scene, slots) = resolve_names(&["Cube001", "Cube001_1", "Sphere001_12"], &mut objects);
        assert_eq!(name_at(&scene, &slots, "cube", 0), Some("Cube001"));
        assert_eq!(name_at(&scene, &slots, "cube", 1), Some("Cube001_1"));
        assert_eq!(name_at(&scene, &slots, "sphere", 12), Some("Sphere001_12"));

        assert_eq!(
            classify("Cube001", &objects).map(|found| found.rule),
            Some(MatchRule::ExportTool)
        );
        assert_eq!(classify("Cube002", &objects), None);
        assert_eq!(classify("Cube001_x", &objects), None);
    }

    #[test]
    fn unparsed_names_are_dropped() {
        let mut objects = cube_and_sphere();
        let names = [
            "Cube",
            "Light",
            "Cube.002",
            "Camera.001",
            "Sphere_SubMat1",
            "cube",
            "Plane001",
        ];
        let (scene, slots) = resolve_names(&names, &mut objects);

        assert_eq!(slots.cell_count(), 3);
        for dropped in ["Light", "Camera.001", "cube", "Plane001"] {
            let id = scene.find_by_name(dropped).unwrap();
            assert_eq!(slots.locate(id), None, "{dropped} should be unresolved");
        }
    }

    #[test]
    fn every_mesh_lands_in_at_most_one_cell() {
        let mut objects = cube_and_sphere();
        let names = ["Cube", "Cube.001", "Cube_SubMat4", "Sphere", "Sphere001_2", "Sphere.9"];
        let (scene, slots) = resolve_names(&names, &mut objects);

        let mut seen = std::collections::HashSet::new();
        for (_, _, mesh) in slots.iter() {
            assert!(seen.insert(mesh), "mesh placed twice");
        }
        assert_eq!(seen.len(), scene.len());
    }

    #[test]
    fn new_slots_receive_default_materials() {
        let mut objects = ObjectCatalog::new(vec![
            LogicalObject::new("cube", "Cube", "Cube").with_slot(0, "gold")
        ]);
        resolve_names(&["Cube", "Cube.001", "Cube.002", "Cube.005"], &mut objects);
        let cube = objects.get("cube").unwrap();
        assert_eq!(cube.slot_material(0), Some("gold"));
        assert_eq!(cube.slot_material(1), Some("red"));
        assert_eq!(cube.slot_material(2), Some("white"));
        assert_eq!(cube.slot_material(5), Some("blue"));
    }

    #[test]
    fn default_material_list_reuses_first_entry_on_overflow() {
        assert_eq!(default_material_for_slot(0), "blue");
        assert_eq!(default_material_for_slot(3), "black");
        // Likely unintended, preserved: slot 4 and beyond repeat slot 0's default.
        assert_eq!(default_material_for_slot(4), "blue");
        assert_eq!(default_material_for_slot(40), "blue");
    }

    #[test]
    fn defaults_assigned_mid_traversal_feed_material_inference() {
        let mut objects = cube_and_sphere();
        // "Cube.001" creates slot 1 with default "red", so "Cube_Red" maps there.
        let (scene, slots) = resolve_names(&["Cube.001", "Cube_Red"], &mut objects);
        assert_eq!(name_at(&scene, &slots, "cube", 1), Some("Cube_Red"));
    }

    #[test]
    fn empty_assignment_is_ignored_by_inference_and_then_defaulted() {
        let mut objects = ObjectCatalog::new(vec![
            LogicalObject::new("cube", "Cube", "Cube").with_slot(0, "")
        ]);
        let found = classify("Cube_Glass", &objects).unwrap();
        assert_eq!(found.rule, MatchRule::SuffixFallback);
        resolve_names(&["Cube_Glass"], &mut objects);
        assert_eq!(objects.get("cube").unwrap().slot_material(0), Some("blue"));
    }

    #[test]
    fn first_object_in_catalog_order_wins_for_variants() {
        let objects = ObjectCatalog::new(vec![
            LogicalObject::new("short", "Car", "Car"),
            LogicalObject::new("long", "Car Body", "Car_Body"),
        ]);
        // Not an exact name, so "Car"'s underscore rule claims it first.
        let found = classify("Car_Body.001", &objects).unwrap();
        assert_eq!(found.object, 0);
        assert_eq!(found.rule, MatchRule::SuffixFallback);
    }
}
