use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use stonehead_preview::{
    Result,
    resources::{
        AssetReference,
        source::{AssetSource, BoxedFuture, MemoryAssetSource},
    },
};

pub const MODE_POINTS: u32 = 0;
pub const MODE_TRIANGLES: u32 = 4;
pub const MODE_TRIANGLE_STRIP: u32 = 5;

/// Unit cube corners, `-0.5..0.5` on every axis.
pub const CUBE_POSITIONS: [[f32; 3]; 8] = [
    [-0.5, -0.5, 0.5],
    [0.5, -0.5, 0.5],
    [0.5, 0.5, 0.5],
    [-0.5, 0.5, 0.5],
    [-0.5, -0.5, -0.5],
    [0.5, -0.5, -0.5],
    [0.5, 0.5, -0.5],
    [-0.5, 0.5, -0.5],
];

/// Counter-clockwise seen from outside.
pub const CUBE_INDICES: [u16; 36] = [
    0, 1, 2, 0, 2, 3, // +z
    5, 4, 7, 5, 7, 6, // -z
    1, 5, 6, 1, 6, 2, // +x
    4, 0, 3, 4, 3, 7, // -x
    3, 2, 6, 3, 6, 7, // +y
    4, 5, 1, 4, 1, 0, // -y
];

/// Rotation a scan exporter might leave on its mesh node: a quarter turn about Y.
pub const NODE_ROTATION: [f32; 4] = [0.0, 0.70710677, 0.0, 0.70710677];

#[derive(Clone, Debug)]
pub struct PrimitiveFixture {
    pub positions: Vec<[f32; 3]>,
    pub normals: Option<Vec<[f32; 3]>>,
    pub indices: Option<Vec<u16>>,
    pub mode: u32,
    /// Accessor counts written to the document in place of the real ones.
    pub declared_vertex_count: Option<usize>,
    pub declared_index_count: Option<usize>,
}

impl PrimitiveFixture {
    pub fn triangles(positions: &[[f32; 3]], indices: &[u16]) -> Self {
        Self {
            positions: positions.to_vec(),
            normals: None,
            indices: Some(indices.to_vec()),
            mode: MODE_TRIANGLES,
            declared_vertex_count: None,
            declared_index_count: None,
        }
    }

    pub fn cube() -> Self {
        Self::triangles(&CUBE_POSITIONS, &CUBE_INDICES)
    }

    /// Cube carrying baked normals that all point the wrong way.
    pub fn cube_with_bogus_normals() -> Self {
        Self {
            normals: Some(vec![[0.0, -1.0, 0.0]; CUBE_POSITIONS.len()]),
            ..Self::cube()
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = mode;
        self
    }

    /// Claims more vertices than the buffer holds.
    pub fn with_declared_vertex_count(mut self, count: usize) -> Self {
        self.declared_vertex_count = Some(count);
        self
    }

    /// Claims more indices than the buffer holds.
    pub fn with_declared_index_count(mut self, count: usize) -> Self {
        self.declared_index_count = Some(count);
        self
    }
}

/// Red, fully metallic and glossy: as far from the canonical stone as it gets.
#[derive(Clone, Copy, Debug)]
pub struct MaterialFixture {
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
}

impl Default for MaterialFixture {
    fn default() -> Self {
        Self {
            base_color: [1.0, 0.0, 0.0, 1.0],
            metallic: 1.0,
            roughness: 0.2,
        }
    }
}

/// Assembles a single-node glTF asset in memory.
#[derive(Clone, Debug)]
pub struct GltfBuilder {
    node_name: String,
    rotation: [f32; 4],
    primitives: Vec<PrimitiveFixture>,
    material: Option<MaterialFixture>,
}

impl GltfBuilder {
    pub fn new(node_name: &str) -> Self {
        Self {
            node_name: node_name.to_string(),
            rotation: [0.0, 0.0, 0.0, 1.0],
            primitives: Vec::new(),
            material: None,
        }
    }

    /// The red metallic cube under a rotated node.
    pub fn red_cube() -> Self {
        Self::new("Cube")
            .with_rotation(NODE_ROTATION)
            .with_material(MaterialFixture::default())
            .with_primitive(PrimitiveFixture::cube_with_bogus_normals())
    }

    pub fn with_rotation(mut self, rotation: [f32; 4]) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_material(mut self, material: MaterialFixture) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_primitive(mut self, primitive: PrimitiveFixture) -> Self {
        self.primitives.push(primitive);
        self
    }

    /// Binary payload and the JSON document pointing into it.
    fn assemble(&self, buffer: &str) -> (String, Vec<u8>) {
        let mut bin: Vec<u8> = Vec::new();
        let mut views = Vec::new();
        let mut accessors = Vec::new();
        let mut primitives = Vec::new();

        let mut push_view = |bin: &mut Vec<u8>, bytes: Vec<u8>, target: u32| {
            let offset = bin.len();
            bin.extend_from_slice(&bytes);
            while bin.len() % 4 != 0 {
                bin.push(0);
            }
            views.push(format!(
                r#"{{"buffer":0,"byteOffset":{offset},"byteLength":{},"target":{target}}}"#,
                bytes.len()
            ));
            views.len() - 1
        };

        for primitive in &self.primitives {
            let mut attributes = Vec::new();

            let view = push_view(&mut bin, vec3_bytes(&primitive.positions), 34962);
            let (min, max) = bounds(&primitive.positions);
            accessors.push(format!(
                r#"{{"bufferView":{view},"componentType":5126,"count":{},"type":"VEC3","min":{min:?},"max":{max:?}}}"#,
                primitive
                    .declared_vertex_count
                    .unwrap_or(primitive.positions.len())
            ));
            attributes.push(format!(r#""POSITION":{}"#, accessors.len() - 1));

            if let Some(normals) = &primitive.normals {
                let view = push_view(&mut bin, vec3_bytes(normals), 34962);
                accessors.push(format!(
                    r#"{{"bufferView":{view},"componentType":5126,"count":{},"type":"VEC3"}}"#,
                    normals.len()
                ));
                attributes.push(format!(r#""NORMAL":{}"#, accessors.len() - 1));
            }

            let mut fields = vec![
                format!(r#""attributes":{{{}}}"#, attributes.join(",")),
                format!(r#""mode":{}"#, primitive.mode),
            ];
            if let Some(indices) = &primitive.indices {
                let bytes = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
                let view = push_view(&mut bin, bytes, 34963);
                accessors.push(format!(
                    r#"{{"bufferView":{view},"componentType":5123,"count":{},"type":"SCALAR"}}"#,
                    primitive.declared_index_count.unwrap_or(indices.len())
                ));
                fields.push(format!(r#""indices":{}"#, accessors.len() - 1));
            }
            if self.material.is_some() {
                fields.push(r#""material":0"#.to_string());
            }
            primitives.push(format!("{{{}}}", fields.join(",")));
        }

        let materials = match self.material {
            Some(m) => format!(
                r#","materials":[{{"name":"RedMetal","pbrMetallicRoughness":{{"baseColorFactor":{:?},"metallicFactor":{:?},"roughnessFactor":{:?}}}}}]"#,
                m.base_color, m.metallic, m.roughness
            ),
            None => String::new(),
        };

        let json = format!(
            concat!(
                r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"name":"Fixture","nodes":[0]}}],"#,
                r#""nodes":[{{"name":"{name}","mesh":0,"rotation":{rotation:?}}}],"#,
                r#""meshes":[{{"name":"{name}","primitives":[{primitives}]}}]{materials},"#,
                r#""accessors":[{accessors}],"bufferViews":[{views}],"#,
                r#""buffers":[{{"byteLength":{length}{buffer}}}]}}"#
            ),
            name = self.node_name,
            rotation = self.rotation,
            primitives = primitives.join(","),
            materials = materials,
            accessors = accessors.join(","),
            views = views.join(","),
            length = bin.len(),
            buffer = buffer,
        );
        (json, bin)
    }

    /// Binary glTF with the payload in the BIN chunk.
    pub fn glb(&self) -> Vec<u8> {
        let (json, bin) = self.assemble("");
        let mut json = json.into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let total = 12 + 8 + json.len() + 8 + bin.len();
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(&0x4E4F_534Au32.to_le_bytes());
        glb.extend_from_slice(&json);
        glb.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        glb.extend_from_slice(&0x004E_4942u32.to_le_bytes());
        glb.extend_from_slice(&bin);
        glb
    }

    /// JSON glTF referencing its payload as the sibling file `bin_name`.
    pub fn gltf_with_sibling(&self, bin_name: &str) -> (Vec<u8>, Vec<u8>) {
        let (json, bin) = self.assemble(&format!(r#","uri":"{bin_name}""#));
        (json.into_bytes(), bin)
    }
}

fn vec3_bytes(values: &[[f32; 3]]) -> Vec<u8> {
    values
        .iter()
        .flatten()
        .flat_map(|f| f.to_le_bytes())
        .collect()
}

fn bounds(positions: &[[f32; 3]]) -> ([f32; 3], [f32; 3]) {
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for p in positions {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    (min, max)
}

/// Counts fetches and optionally stalls each one, so overlapping loads really overlap.
pub struct CountingSource {
    inner: MemoryAssetSource,
    fetches: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl CountingSource {
    pub fn new(inner: MemoryAssetSource) -> Self {
        Self {
            inner,
            fetches: Arc::new(AtomicUsize::new(0)),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Shared handle to the fetch counter; stays valid after the source moves into a cache.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }
}

impl AssetSource for CountingSource {
    fn fetch<'a>(&'a self, reference: &'a AssetReference) -> BoxedFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.inner.fetch(reference).await
        })
    }
}

pub fn fetches(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}
