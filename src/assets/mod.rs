pub mod config;

pub use config::{ConfigError, StudioConfig};

use crate::scene::ModelScene;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read model at {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse glTF {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: gltf::Error,
    },
    #[error("unsupported model format: {path}")]
    UnsupportedFormat { path: String },
}

pub type Result<T> = std::result::Result<T, AssetError>;

/// Reads a `.gltf` or `.glb` file and flattens its mesh nodes.
pub fn load_model(path: &Path) -> Result<ModelScene> {
    let display = path.display().to_string();
    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gltf") || ext.eq_ignore_ascii_case("glb"));
    if !supported {
        return Err(AssetError::UnsupportedFormat { path: display });
    }
    let bytes = std::fs::read(path).map_err(|source| AssetError::Read {
        path: display.clone(),
        source,
    })?;
    let scene = parse_model(&display, &bytes)?;
    log::info!("Loaded {} mesh node(s) from {}", scene.len(), display);
    Ok(scene)
}

/// Parses glTF JSON or GLB bytes. Only the document is read; buffers and
/// images are never touched.
pub fn parse_model(source: &str, bytes: &[u8]) -> Result<ModelScene> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|source_err| AssetError::Parse {
        path: source.to_string(),
        source: source_err,
    })?;

    let mut scene = ModelScene::new(source);
    let mut names = UniqueNames::default();
    let roots: Vec<gltf::Node<'_>> = match gltf.default_scene() {
        Some(default) => default.nodes().collect(),
        None => gltf.scenes().flat_map(|scene| scene.nodes()).collect(),
    };
    for node in roots {
        flatten_node(&node, &mut names, &mut scene);
    }
    Ok(scene)
}

fn flatten_node(node: &gltf::Node<'_>, names: &mut UniqueNames, scene: &mut ModelScene) {
    if let Some(mesh) = node.mesh() {
        let primitives = mesh.primitives().len();
        let mesh_name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        if primitives == 1 {
            let name = node.name().unwrap_or(mesh_name.as_str());
            scene.push_mesh(names.claim(name));
        } else {
            for _ in 0..primitives {
                scene.push_mesh(names.claim(&mesh_name));
            }
        }
    }
    for child in node.children() {
        flatten_node(&child, names, scene);
    }
}

/// Makes a name safe for property paths: whitespace becomes `_` and the
/// reserved characters `[ ] . : /` are dropped.
pub fn sanitize_node_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '[' | ']' | '.' | ':' | '/'))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Hands out sanitized names; repeats get `_1`, `_2`, ...
#[derive(Debug, Default)]
struct UniqueNames {
    seen: HashMap<String, usize>,
}

impl UniqueNames {
    fn claim(&mut self, raw: &str) -> String {
        let base = sanitize_node_name(raw);
        match self.seen.get_mut(&base) {
            Some(count) => {
                *count += 1;
                format!("{}_{}", base, count)
            }
            None => {
                self.seen.insert(base.clone(), 0);
                base
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{load_model, parse_model, sanitize_node_name, AssetError};
    use crate::materials::serialization::temp_path;
    use serde_json::json;

    fn gltf_json(nodes: serde_json::Value, meshes: serde_json::Value, roots: &[usize]) -> Vec<u8> {
        let doc = json!({
            "asset": { "version": "2.0" },
            "scene": 0,
            "scenes": [{ "nodes": roots }],
            "nodes": nodes,
            "meshes": meshes,
            "buffers": [{
                "byteLength": 36,
                "uri": format!("data:application/octet-stream;base64,{}", "A".repeat(48))
            }],
            "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
            "accessors": [{
                "bufferView": 0,
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
                "min": [0.0, 0.0, 0.0],
                "max": [1.0, 1.0, 1.0]
            }]
        });
        serde_json::to_vec(&doc).unwrap()
    }

    fn primitive() -> serde_json::Value {
        json!({ "attributes": { "POSITION": 0 } })
    }

    fn names(bytes: &[u8]) -> Vec<String> {
        let scene = parse_model("test.gltf", bytes).unwrap();
        scene.meshes().map(|(_, name)| name.to_string()).collect()
    }

    #[test]
    fn test_sanitize_node_name() {
        assert_eq!(sanitize_node_name("Cube.001"), "Cube001");
        assert_eq!(sanitize_node_name("My Mesh[2]:a/b"), "My_Mesh2ab");
        assert_eq!(sanitize_node_name("Sphere_SubMat1"), "Sphere_SubMat1");
    }

    #[test]
    fn test_single_primitive_meshes_take_node_names() {
        let bytes = gltf_json(
            json!([
                { "name": "Cube", "mesh": 0 },
                { "name": "Cube.001", "mesh": 1 },
                { "mesh": 2 }
            ]),
            json!([
                { "name": "CubeMesh", "primitives": [primitive()] },
                { "name": "CubeMesh.001", "primitives": [primitive()] },
                { "primitives": [primitive()] }
            ]),
            &[0, 1, 2],
        );
        assert_eq!(names(&bytes), vec!["Cube", "Cube001", "mesh_2"]);
    }

    #[test]
    fn test_multi_primitive_meshes_split_with_unique_names() {
        let bytes = gltf_json(
            json!([
                { "name": "Root", "children": [1] },
                { "name": "Sphere", "mesh": 0 }
            ]),
            json!([
                { "name": "Sphere", "primitives": [primitive(), primitive(), primitive()] }
            ]),
            &[0],
        );
        assert_eq!(names(&bytes), vec!["Sphere", "Sphere_1", "Sphere_2"]);
    }

    #[test]
    fn test_nodes_without_meshes_are_skipped() {
        let bytes = gltf_json(
            json!([{ "name": "Camera" }, { "name": "Cone", "mesh": 0 }]),
            json!([{ "name": "Cone", "primitives": [primitive()] }]),
            &[0, 1],
        );
        let scene = parse_model("test.gltf", &bytes).unwrap();
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.source(), "test.gltf");
    }

    #[test]
    fn test_invalid_documents_fail_to_parse() {
        let err = parse_model("broken.gltf", b"{ \"asset\": ").unwrap_err();
        assert!(matches!(err, AssetError::Parse { .. }));
    }

    #[test]
    fn test_load_model_checks_extension_and_file() {
        let err = load_model(std::path::Path::new("scene.fbx")).unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedFormat { .. }));

        let missing = temp_path("missing_model").with_extension("glb");
        let err = load_model(&missing).unwrap_err();
        assert!(matches!(err, AssetError::Read { .. }));

        let path = temp_path("model").with_extension("gltf");
        std::fs::write(
            &path,
            gltf_json(
                json!([{ "name": "Cube", "mesh": 0 }]),
                json!([{ "name": "Cube", "primitives": [primitive()] }]),
                &[0],
            ),
        )
        .unwrap();
        let scene = load_model(&path).unwrap();
        assert_eq!(scene.find_by_name("Cube").map(|id| id.index()), Some(0));
        let _ = std::fs::remove_file(path);
    }
}
