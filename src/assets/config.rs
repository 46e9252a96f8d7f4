use crate::scene::LogicalObject;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("config declares no objects")]
    NoObjects,
    #[error("duplicate object key '{0}'")]
    DuplicateObject(String),
    #[error("default object '{0}' is not declared")]
    UnknownDefaultObject(String),
}

/// Studio configuration document (`studio.json`).
///
/// Relative paths are resolved against the directory holding the document.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudioConfig {
    pub model: PathBuf,
    pub materials: PathBuf,
    pub texture_index: PathBuf,
    pub camera: PathBuf,
    pub default_object: String,
    pub environment_intensity: f32,
    pub objects: Vec<LogicalObject>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            model: PathBuf::from("assets/cube_sphere.glb"),
            materials: PathBuf::from("materials/materials.json"),
            texture_index: PathBuf::from("materials/textures/index.json"),
            camera: PathBuf::from("studio/camera.json"),
            default_object: "objet1".to_string(),
            environment_intensity: 1.0,
            objects: vec![
                LogicalObject::new("objet1", "Cube", "Cube")
                    .with_slot(0, "blue")
                    .with_slot(1, "red"),
                LogicalObject::new("objet2", "Sphere", "Sphere")
                    .with_slot(0, "white")
                    .with_slot(1, "red"),
            ],
        }
    }
}

impl StudioConfig {
    /// Loads the document at `path`. A missing file yields the built-in
    /// defaults; a malformed or inconsistent one is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let base = path.parent().unwrap_or(Path::new(""));
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No studio config at {}; using defaults", path.display());
                return Ok(Self::default().relative_to(base));
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let config: Self = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config.relative_to(base))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.objects.is_empty() {
            return Err(ConfigError::NoObjects);
        }
        let mut keys = HashSet::new();
        for object in &self.objects {
            if !keys.insert(object.key.as_str()) {
                return Err(ConfigError::DuplicateObject(object.key.clone()));
            }
        }
        if !keys.contains(self.default_object.as_str()) {
            return Err(ConfigError::UnknownDefaultObject(
                self.default_object.clone(),
            ));
        }
        Ok(())
    }

    /// Environment (IBL) intensity limited to `[0, 2]`.
    pub fn env_intensity(&self) -> f32 {
        self.environment_intensity.clamp(0.0, 2.0)
    }

    /// Directory texture references in the catalog are relative to.
    pub fn texture_root(&self) -> PathBuf {
        self.materials
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    fn relative_to(mut self, base: &Path) -> Self {
        for path in [
            &mut self.model,
            &mut self.materials,
            &mut self.texture_index,
            &mut self.camera,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }
}
