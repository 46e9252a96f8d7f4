use crate::materials::MaterialCatalog;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Where texture-picker entries point, relative to the catalog document.
pub const TEXTURE_URL_PREFIX: &str = "../materials/textures/";

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

pub fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn save_catalog_to_file(catalog: &MaterialCatalog, path: &Path) -> Result<()> {
    save_json(catalog, path)
}

pub fn load_catalog_from_file(path: &Path) -> Result<MaterialCatalog> {
    load_json(path)
}

/// Startup load: a missing or broken document yields an empty catalog.
pub fn load_catalog_or_empty(path: &Path) -> MaterialCatalog {
    match load_catalog_from_file(path) {
        Ok(catalog) => {
            log::info!(
                "Loaded {} material(s) from {}",
                catalog.len(),
                path.display()
            );
            catalog
        }
        Err(err) => {
            log::warn!(
                "Material catalog {} unavailable ({}); starting empty",
                path.display(),
                err
            );
            MaterialCatalog::new()
        }
    }
}

/// Reads the texture index (a JSON array of file names). Anything else,
/// including a read failure, yields an empty list.
pub fn load_texture_index(path: &Path) -> Vec<String> {
    match load_json::<serde_json::Value>(path) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(name) => Some(name),
                _ => None,
            })
            .collect(),
        Ok(_) => {
            log::warn!("Texture index {} is not an array", path.display());
            Vec::new()
        }
        Err(err) => {
            log::warn!("Texture index {} unavailable: {}", path.display(), err);
            Vec::new()
        }
    }
}

/// Picker options as `(label, value)`; the first entry clears the map.
pub fn texture_options(names: &[String]) -> Vec<(String, String)> {
    std::iter::once(("None".to_string(), String::new()))
        .chain(
            names
                .iter()
                .map(|name| (name.clone(), format!("{TEXTURE_URL_PREFIX}{name}"))),
        )
        .collect()
}

#[cfg(test)]
pub(crate) fn temp_path(label: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    path.push(format!(
        "material_studio_{}_{}_{}.json",
        label,
        std::process::id(),
        nonce
    ));
    path
}
