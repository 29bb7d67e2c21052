//! Everything needed to get scene graphs out of external files.

use std::fmt::Display;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::{
    data_structures::{
        instance::Instance,
        model::{Drawable, Material},
        scene_graph::{ContainerNode, ModelNode, SceneGraph, SceneNode},
    },
    error::{PreviewError, Result},
    resources::source::AssetSource,
};

pub mod cache;
pub mod mesh;
pub mod source;

/// Opaque identifier of a binary 3D asset (a path or URL path).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetReference(String);

impl AssetReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolves `relative` against the directory this reference lives in.
    pub fn sibling(&self, relative: &str) -> AssetReference {
        match self.0.rfind('/') {
            Some(idx) => Self(format!("{}/{}", &self.0[..idx], relative)),
            None => Self(relative.to_string()),
        }
    }
}

impl Display for AssetReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetReference {
    fn from(reference: &str) -> Self {
        Self::new(reference)
    }
}

impl From<String> for AssetReference {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

/**
 * Fetches `reference` from `source` and decodes it (GLB or JSON glTF) into a
 * scene graph with the asset's native materials, normals and orientation.
 *
 * The default scene (or the first one) becomes the children of a fresh
 * container root, so the root itself always starts at identity.
 */
pub async fn load_scene_gltf(
    source: &dyn AssetSource,
    reference: &AssetReference,
) -> Result<SceneGraph> {
    let bytes = source.fetch(reference).await?;
    let gltf = gltf::Gltf::from_slice(&bytes).map_err(|e| PreviewError::parse(reference, e))?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .as_deref()
                .map(<[u8]>::to_vec)
                .ok_or_else(|| PreviewError::parse(reference, "GLB binary chunk is missing"))?,
            gltf::buffer::Source::Uri(uri) => load_uri(source, reference, uri).await?,
        };
        if data.len() < buffer.length() {
            return Err(PreviewError::parse(
                reference,
                format!(
                    "buffer {} holds {} bytes but declares {}",
                    buffer.index(),
                    data.len(),
                    buffer.length()
                ),
            ));
        }
        buffer_data.push(data);
    }
    for view in gltf.views() {
        let end = view.offset() + view.length();
        if end > view.buffer().length() {
            return Err(PreviewError::parse(
                reference,
                format!("buffer view {} ends past its buffer", view.index()),
            ));
        }
    }

    // Load materials
    let materials: Vec<Material> = gltf.materials().map(to_material).collect();

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| PreviewError::parse(reference, "asset contains no scene"))?;

    let mut root = ContainerNode::new(scene.name().unwrap_or("Scene"));
    for node in scene.nodes() {
        root.add_child(to_scene_node(node, &buffer_data, &materials, reference)?);
    }
    let mut graph = SceneGraph::new(Box::new(root));
    graph.update_world_transforms();

    log::debug!(
        "decoded {} with {} nodes and {} drawables",
        reference,
        graph.node_count(),
        graph.drawable_nodes().len()
    );
    Ok(graph)
}

async fn load_uri(
    source: &dyn AssetSource,
    reference: &AssetReference,
    uri: &str,
) -> Result<Vec<u8>> {
    match uri.strip_prefix("data:") {
        Some(data) => {
            let (header, payload) = data
                .split_once(',')
                .ok_or_else(|| PreviewError::parse(reference, "malformed data URI"))?;
            if !header.ends_with(";base64") {
                return Err(PreviewError::parse(
                    reference,
                    "only base64 data URIs are supported",
                ));
            }
            BASE64
                .decode(payload.as_bytes())
                .map_err(|e| PreviewError::parse(reference, format!("base64 decode buffer: {e}")))
        }
        None => source.fetch(&reference.sibling(uri)).await,
    }
}

fn to_material(material: gltf::Material) -> Material {
    let pbr = material.pbr_metallic_roughness();
    let name = match (material.name(), material.index()) {
        (Some(name), _) => name.to_string(),
        (None, Some(idx)) => format!("material_{idx}"),
        (None, None) => "default".to_string(),
    };
    Material {
        name,
        base_color: pbr.base_color_factor(),
        roughness: pbr.roughness_factor(),
        metalness: pbr.metallic_factor(),
        flat_shading: false,
        double_sided: material.double_sided(),
    }
}

/**
 * Converts a glTF node and its subtree.
 *
 * A mesh with a single primitive turns its node into a `ModelNode`. With
 * several primitives the node becomes a container holding one `ModelNode`
 * per primitive.
 */
pub fn to_scene_node(
    node: gltf::Node,
    buffers: &[Vec<u8>],
    materials: &[Material],
    reference: &AssetReference,
) -> Result<Box<dyn SceneNode>> {
    let name = node
        .name()
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));

    let mut scene_node: Box<dyn SceneNode> = match node.mesh() {
        Some(gltf_mesh) => {
            let mut drawables = Vec::new();
            for primitive in gltf_mesh.primitives() {
                let Some(geometry) = mesh::read_geometry(&primitive, buffers, reference)? else {
                    continue;
                };
                let material = primitive
                    .material()
                    .index()
                    .and_then(|idx| materials.get(idx))
                    .cloned()
                    .unwrap_or_default();
                drawables.push(Drawable::new(geometry, material));
            }
            if drawables.len() == 1 {
                Box::new(ModelNode::new(name, drawables.remove(0)))
            } else {
                let mut container = ContainerNode::new(name.as_str());
                for (idx, drawable) in drawables.into_iter().enumerate() {
                    container.add_child(Box::new(ModelNode::new(format!("{name}_{idx}"), drawable)));
                }
                Box::new(container)
            }
        }
        None => Box::new(ContainerNode::new(name)),
    };

    let (position, rotation, scale) = node.transform().decomposed();
    scene_node.set_local_transform(Instance::from_decomposed(position, rotation, scale));

    for child in node.children() {
        scene_node.add_child(to_scene_node(child, buffers, materials, reference)?);
    }
    Ok(scene_node)
}
