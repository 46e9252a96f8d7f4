pub mod serialization;

use glam::{Mat3, Vec2};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_COLOR: &str = "#ffffff";
pub const DEFAULT_EMISSIVE: &str = "#000000";
pub const DEFAULT_ROUGHNESS: f32 = 0.5;
pub const DEFAULT_METALNESS: f32 = 0.0;

/// Persisted, user-editable description of a material.
///
/// Fields mirror the keys of `materials.json`. Everything is optional in the
/// document; the accessors supply defaults. A known key holding the wrong JSON
/// type reads as unset. It stays in `extra` with any unknown key, so an export
/// never drops it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialDefinition {
    pub color: Option<String>,
    pub emissive: Option<String>,
    pub roughness: Option<f32>,
    pub metalness: Option<f32>,
    pub backface_culling: Option<bool>,
    pub alpha: Option<f32>,
    pub albedo_map: Option<String>,
    pub normal_map: Option<String>,
    pub roughness_map: Option<String>,
    pub metalness_map: Option<String>,
    pub alpha_map: Option<String>,
    pub transform_scale_x: Option<f32>,
    pub transform_scale_y: Option<f32>,
    pub transform_offset_x: Option<f32>,
    pub transform_offset_y: Option<f32>,
    pub transform_rotation: Option<f32>,
    pub normal_intensity: Option<f32>,
    pub extra: Map<String, Value>,
}

impl MaterialDefinition {
    /// Reads a definition out of its JSON object.
    pub fn from_document(mut document: Map<String, Value>) -> Self {
        fn take<T>(
            document: &mut Map<String, Value>,
            key: &str,
            read: impl Fn(&Value) -> Option<T>,
        ) -> Option<T> {
            let value = document.get(key)?;
            match read(value) {
                Some(parsed) => {
                    document.remove(key);
                    Some(parsed)
                }
                None => {
                    log::warn!("Material field '{}' ignored: unexpected value {}", key, value);
                    None
                }
            }
        }
        let text = |value: &Value| value.as_str().map(str::to_string);
        let number = |value: &Value| value.as_f64().map(|number| number as f32);

        let mut definition = Self::default();
        for (key, field) in [
            ("color", &mut definition.color),
            ("emissive", &mut definition.emissive),
            ("albedoMap", &mut definition.albedo_map),
            ("normalMap", &mut definition.normal_map),
            ("roughnessMap", &mut definition.roughness_map),
            ("metalnessMap", &mut definition.metalness_map),
            ("alphaMap", &mut definition.alpha_map),
        ] {
            *field = take(&mut document, key, text);
        }
        for (key, field) in [
            ("roughness", &mut definition.roughness),
            ("metalness", &mut definition.metalness),
            ("alpha", &mut definition.alpha),
            ("TextureTransform_ScaleX", &mut definition.transform_scale_x),
            ("TextureTransform_ScaleY", &mut definition.transform_scale_y),
            ("TextureTransform_OffsetX", &mut definition.transform_offset_x),
            ("TextureTransform_OffsetY", &mut definition.transform_offset_y),
            ("TextureTransform_Rotation", &mut definition.transform_rotation),
            ("normalIntensity", &mut definition.normal_intensity),
        ] {
            *field = take(&mut document, key, number);
        }
        definition.backface_culling = take(&mut document, "backfaceCulling", Value::as_bool);
        definition.extra = document;
        definition
    }

    /// JSON object for this definition. Set fields win over raw values kept
    /// in `extra` under the same key.
    pub fn to_document(&self) -> Map<String, Value> {
        let mut document = self.extra.clone();
        for (key, field) in [
            ("color", &self.color),
            ("emissive", &self.emissive),
            ("albedoMap", &self.albedo_map),
            ("normalMap", &self.normal_map),
            ("roughnessMap", &self.roughness_map),
            ("metalnessMap", &self.metalness_map),
            ("alphaMap", &self.alpha_map),
        ] {
            if let Some(value) = field {
                document.insert(key.to_string(), Value::from(value.as_str()));
            }
        }
        for (key, field) in [
            ("roughness", self.roughness),
            ("metalness", self.metalness),
            ("alpha", self.alpha),
            ("TextureTransform_ScaleX", self.transform_scale_x),
            ("TextureTransform_ScaleY", self.transform_scale_y),
            ("TextureTransform_OffsetX", self.transform_offset_x),
            ("TextureTransform_OffsetY", self.transform_offset_y),
            ("TextureTransform_Rotation", self.transform_rotation),
            ("normalIntensity", self.normal_intensity),
        ] {
            if let Some(value) = field {
                document.insert(key.to_string(), Value::from(value));
            }
        }
        if let Some(value) = self.backface_culling {
            document.insert("backfaceCulling".to_string(), Value::from(value));
        }
        document
    }
}

impl serde::Serialize for MaterialDefinition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_document().serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for MaterialDefinition {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Self::from_document)
    }
}

impl MaterialDefinition {
    pub fn color_hex(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_COLOR)
    }

    pub fn emissive_hex(&self) -> &str {
        self.emissive.as_deref().unwrap_or(DEFAULT_EMISSIVE)
    }

    pub fn roughness(&self) -> f32 {
        self.roughness.unwrap_or(DEFAULT_ROUGHNESS)
    }

    pub fn metalness(&self) -> f32 {
        self.metalness.unwrap_or(DEFAULT_METALNESS)
    }

    pub fn backface_culling(&self) -> bool {
        self.backface_culling.unwrap_or(true)
    }

    /// Opacity clamped to `[0, 1]`.
    pub fn alpha(&self) -> f32 {
        self.alpha.map(|alpha| alpha.clamp(0.0, 1.0)).unwrap_or(1.0)
    }

    pub fn normal_intensity(&self) -> f32 {
        self.normal_intensity.unwrap_or(1.0)
    }

    pub fn texture_transform(&self) -> TextureTransform {
        TextureTransform {
            scale_x: self.transform_scale_x.unwrap_or(1.0),
            scale_y: self.transform_scale_y.unwrap_or(1.0),
            offset_x: self.transform_offset_x.unwrap_or(0.0),
            offset_y: self.transform_offset_y.unwrap_or(0.0),
            rotation: self.transform_rotation.unwrap_or(0.0),
        }
    }

    pub fn set_texture_transform(&mut self, transform: TextureTransform) {
        self.transform_scale_x = Some(transform.scale_x);
        self.transform_scale_y = Some(transform.scale_y);
        self.transform_offset_x = Some(transform.offset_x);
        self.transform_offset_y = Some(transform.offset_y);
        self.transform_rotation = Some(transform.rotation);
    }

    pub fn map(&self, kind: MapKind) -> Option<&str> {
        let slot = match kind {
            MapKind::Albedo => &self.albedo_map,
            MapKind::Normal => &self.normal_map,
            MapKind::Roughness => &self.roughness_map,
            MapKind::Metalness => &self.metalness_map,
            MapKind::Alpha => &self.alpha_map,
        };
        slot.as_deref().filter(|url| !url.is_empty())
    }

    /// Sets or (with `None`/empty) removes a texture map reference.
    pub fn set_map(&mut self, kind: MapKind, url: Option<&str>) {
        let value = url.filter(|url| !url.is_empty()).map(str::to_string);
        match kind {
            MapKind::Albedo => self.albedo_map = value,
            MapKind::Normal => self.normal_map = value,
            MapKind::Roughness => self.roughness_map = value,
            MapKind::Metalness => self.metalness_map = value,
            MapKind::Alpha => self.alpha_map = value,
        }
    }

    /// Requested texture maps in [`MapKind::ALL`] order.
    pub fn requested_maps(&self) -> Vec<(MapKind, &str)> {
        MapKind::ALL
            .into_iter()
            .filter_map(|kind| self.map(kind).map(|url| (kind, url)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    Albedo,
    Normal,
    Roughness,
    Metalness,
    Alpha,
}

impl MapKind {
    pub const ALL: [MapKind; 5] = [
        MapKind::Albedo,
        MapKind::Normal,
        MapKind::Roughness,
        MapKind::Metalness,
        MapKind::Alpha,
    ];

    /// Key of the map reference in the catalog document.
    pub fn key(self) -> &'static str {
        match self {
            MapKind::Albedo => "albedoMap",
            MapKind::Normal => "normalMap",
            MapKind::Roughness => "roughnessMap",
            MapKind::Metalness => "metalnessMap",
            MapKind::Alpha => "alphaMap",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.strip_suffix("Map").unwrap_or(value);
        MapKind::ALL
            .into_iter()
            .find(|kind| kind.key().trim_end_matches("Map").eq_ignore_ascii_case(value))
    }

    /// Only albedo carries color data.
    pub fn is_color(self) -> bool {
        matches!(self, MapKind::Albedo)
    }
}

/// Single UV transform shared by every map of a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureTransform {
    pub scale_x: f32,
    pub scale_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    /// Radians, around the UV center.
    pub rotation: f32,
}

impl Default for TextureTransform {
    fn default() -> Self {
        Self {
            scale_x: 1.0,
            scale_y: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            rotation: 0.0,
        }
    }
}

impl TextureTransform {
    /// UV matrix: rotate around (0.5, 0.5), then offset, then scale.
    pub fn matrix(&self) -> Mat3 {
        let mut matrix = Mat3::IDENTITY;
        if self.rotation != 0.0 {
            let center = Vec2::splat(0.5);
            matrix = Mat3::from_translation(center)
                * Mat3::from_angle(self.rotation)
                * Mat3::from_translation(-center);
        }
        matrix = Mat3::from_translation(Vec2::new(self.offset_x, self.offset_y)) * matrix;
        Mat3::from_scale(Vec2::new(self.scale_x, self.scale_y)) * matrix
    }
}

/// Parses `#rrggbb` or `#rgb` into linear-unaware 0..1 channels.
pub fn parse_hex_color(value: &str) -> Option<[f32; 3]> {
    let hex = value.trim().strip_prefix('#')?;
    let channel = |digits: &str| u8::from_str_radix(digits, 16).ok();
    let (r, g, b) = match hex.len() {
        6 => (
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
        ),
        3 => {
            let expand = |digit: &str| channel(digit).map(|value| value * 17);
            (
                expand(hex.get(0..1)?)?,
                expand(hex.get(1..2)?)?,
                expand(hex.get(2..3)?)?,
            )
        }
        _ => return None,
    };
    Some([r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0])
}

/// Named material definitions in document order.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct MaterialCatalog {
    entries: IndexMap<String, MaterialDefinition>,
}

/// Entries that are not JSON objects are skipped with a warning; the rest
/// of the catalog still loads.
impl<'de> serde::Deserialize<'de> for MaterialCatalog {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, Value>::deserialize(deserializer)?;
        let mut entries = IndexMap::with_capacity(raw.len());
        for (name, value) in raw {
            match value {
                Value::Object(document) => {
                    entries.insert(name, MaterialDefinition::from_document(document));
                }
                other => {
                    log::warn!("Material '{}' skipped: expected an object, got {}", name, other)
                }
            }
        }
        Ok(Self { entries })
    }
}

impl MaterialCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&MaterialDefinition> {
        self.entries.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut MaterialDefinition> {
        self.entries.get_mut(name)
    }

    pub fn set(&mut self, name: &str, definition: MaterialDefinition) {
        self.entries.insert(name.to_string(), definition);
    }

    pub fn remove(&mut self, name: &str) -> Option<MaterialDefinition> {
        self.entries.shift_remove(name)
    }

    /// Moves a definition to a new name in one step.
    ///
    /// Refused when `old` is missing, `new` is blank, unchanged, or taken.
    /// The renamed entry goes to the end of the catalog.
    pub fn rename(&mut self, old: &str, new: &str) -> bool {
        let new = new.trim();
        if new.is_empty() || new == old || self.entries.contains_key(new) {
            return false;
        }
        let Some(definition) = self.entries.shift_remove(old) else {
            return false;
        };
        self.entries.insert(new.to_string(), definition);
        true
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MaterialDefinition)> {
        self.entries
            .iter()
            .map(|(name, definition)| (name.as_str(), definition))
    }
}
