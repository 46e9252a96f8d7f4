use super::{ModelScene, ObjectCatalog, SlotMap};

/// Makes `key` the only visible object.
///
/// Returns false and changes nothing when the key is unknown or no asset has
/// been resolved yet.
pub fn switch_to(
    objects: &mut ObjectCatalog,
    slots: Option<&SlotMap>,
    model: Option<&mut ModelScene>,
    key: &str,
) -> bool {
    let (Some(slots), Some(model)) = (slots, model) else {
        log::debug!("Ignoring switch to '{}': no model loaded", key);
        return false;
    };
    if !objects.set_current(key) {
        log::warn!("Ignoring switch to unknown object '{}'", key);
        return false;
    }
    apply_visibility(objects, slots, model);
    log::info!("Current object: {}", key);
    true
}

/// Re-applies visibility for the current object to every resolved mesh.
pub fn apply_visibility(objects: &mut ObjectCatalog, slots: &SlotMap, model: &mut ModelScene) {
    let current = objects.current_key().map(str::to_string);
    for object in objects.iter_mut() {
        let shown = current.as_deref() == Some(object.key.as_str());
        object.visible = shown;
        for mesh in slots.meshes_of(&object.key) {
            model.set_visible(mesh, shown);
        }
    }

    let visible = objects.visible_count();
    if visible != 1 {
        log::error!("Expected exactly one visible object, found {}", visible);
    }
    debug_assert_eq!(visible, 1, "exactly one logical object must be visible");
}
