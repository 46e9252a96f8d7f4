use crate::materials::{MapKind, TextureTransform};
use glam::Mat3;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("failed to read texture {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode texture {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureColorSpace {
    Srgb,
    Linear,
}

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// A loaded map attached to a material instance.
#[derive(Debug, Clone)]
pub struct TextureMap {
    pub kind: MapKind,
    pub texture: Arc<Texture>,
    pub wrap_repeat_u: bool,
    pub wrap_repeat_v: bool,
    pub color_space: TextureColorSpace,
    pub uv_transform: Mat3,
}

pub trait TextureLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Texture, TextureError>;
}

/// Reads images from disk with the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageTextureLoader;

impl TextureLoader for ImageTextureLoader {
    fn load(&self, path: &Path) -> Result<Texture, TextureError> {
        let bytes = std::fs::read(path).map_err(|source| TextureError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let image = image::load_from_memory(&bytes).map_err(|source| TextureError::Decode {
            path: path.display().to_string(),
            source,
        })?;
        let rgba = image.to_rgba8();
        Ok(Texture {
            source: path.display().to_string(),
            width: rgba.width(),
            height: rgba.height(),
            pixels: rgba.into_raw(),
        })
    }
}

/// Resolves a catalog map reference against the catalog document directory.
pub fn resolve_texture_path(root: &Path, url: &str) -> PathBuf {
    let url = url.split(['?', '#']).next().unwrap_or(url);
    let path = Path::new(url);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Loads every requested map as one batch and returns them with the shared
/// UV transform applied.
///
/// The transform is only attached after the whole batch has completed, so no
/// caller ever observes a partially transformed set. Maps that fail to load
/// are logged and left out.
pub fn load_maps(
    loader: &dyn TextureLoader,
    root: &Path,
    requests: &[(MapKind, &str)],
    transform: TextureTransform,
) -> Vec<TextureMap> {
    let loaded: Vec<(MapKind, Option<Texture>)> = requests
        .par_iter()
        .map(|(kind, url)| {
            let path = resolve_texture_path(root, url);
            match loader.load(&path) {
                Ok(texture) => (*kind, Some(texture)),
                Err(err) => {
                    log::warn!("{} map unavailable: {}", kind.key(), err);
                    (*kind, None)
                }
            }
        })
        .collect();

    let uv_transform = transform.matrix();
    loaded
        .into_iter()
        .filter_map(|(kind, texture)| {
            texture.map(|texture| TextureMap {
                kind,
                texture: Arc::new(texture),
                wrap_repeat_u: true,
                wrap_repeat_v: true,
                color_space: if kind.is_color() {
                    TextureColorSpace::Srgb
                } else {
                    TextureColorSpace::Linear
                },
                uv_transform,
            })
        })
        .collect()
}
