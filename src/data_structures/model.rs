//! CPU-side drawable data: vertices, triangle geometry and materials.

use cgmath::InnerSpace;

use crate::error::{PreviewError, Result};

/// Squared sine of the corner angle below which a triangle counts as degenerate.
/// Relative to the edge lengths, so the test does not depend on the model's units.
const DEGENERATE_SIN2_EPSILON: f32 = 1e-12;

/// A single vertex as it is uploaded to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

/// Indexed triangle list.
///
/// `has_normals` and `has_tex_coords` record whether the source supplied the
/// attribute; missing attributes are zero-filled in `vertices`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub has_normals: bool,
    pub has_tex_coords: bool,
}

impl Geometry {
    pub fn new(vertices: Vec<ModelVertex>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            has_normals: false,
            has_tex_coords: false,
        }
    }

    pub fn from_positions(positions: &[[f32; 3]], indices: Vec<u32>) -> Self {
        let vertices = positions
            .iter()
            .map(|&position| ModelVertex {
                position,
                ..Default::default()
            })
            .collect();
        Self::new(vertices, indices)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /**
     * Smooth, area-weighted vertex normals derived from the triangle winding.
     *
     * Every non-degenerate triangle `(a, b, c)` adds `(b - a) x (c - a)` to each
     * of its vertices and the sums are normalized afterwards. Vertices that
     * no valid triangle touches end up with the zero vector.
     *
     * `name` only labels the error.
     */
    pub fn vertex_normals(&self, name: &str) -> Result<Vec<[f32; 3]>> {
        if self.indices.is_empty() {
            return Err(PreviewError::invalid_geometry(name, "mesh has no triangles"));
        }
        if self.indices.len() % 3 != 0 {
            return Err(PreviewError::invalid_geometry(
                name,
                format!("index count {} is not a multiple of 3", self.indices.len()),
            ));
        }
        let vertex_count = self.vertices.len();
        if let Some(&idx) = self.indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(PreviewError::invalid_geometry(
                name,
                format!("index {idx} is out of range for {vertex_count} vertices"),
            ));
        }

        let mut sums = vec![cgmath::Vector3::new(0.0f32, 0.0, 0.0); vertex_count];
        let mut valid_triangles = 0usize;

        for c in self.indices.chunks(3) {
            let pos0: cgmath::Vector3<f32> = self.vertices[c[0] as usize].position.into();
            let pos1: cgmath::Vector3<f32> = self.vertices[c[1] as usize].position.into();
            let pos2: cgmath::Vector3<f32> = self.vertices[c[2] as usize].position.into();

            // Unnormalized, so larger faces weigh more
            let (edge0, edge1) = (pos1 - pos0, pos2 - pos0);
            let face_normal = edge0.cross(edge1);
            let area2 = face_normal.magnitude2();
            if !area2.is_finite()
                || area2 == 0.0
                || area2 <= DEGENERATE_SIN2_EPSILON * edge0.magnitude2() * edge1.magnitude2()
            {
                continue;
            }
            valid_triangles += 1;

            sums[c[0] as usize] += face_normal;
            sums[c[1] as usize] += face_normal;
            sums[c[2] as usize] += face_normal;
        }

        if valid_triangles == 0 {
            return Err(PreviewError::invalid_geometry(
                name,
                format!("all {} triangles are degenerate", self.triangle_count()),
            ));
        }

        Ok(sums
            .into_iter()
            .map(|sum| {
                if sum.magnitude2() > 0.0 {
                    sum.normalize().into()
                } else {
                    [0.0; 3]
                }
            })
            .collect())
    }

    /// Overwrites every vertex normal. `normals` must be one entry per vertex.
    pub fn set_normals(&mut self, normals: &[[f32; 3]]) {
        debug_assert_eq!(normals.len(), self.vertices.len());
        self.vertices
            .iter_mut()
            .zip(normals)
            .for_each(|(vertex, normal)| vertex.normal = *normal);
        self.has_normals = true;
    }

    /// Recomputes the smooth normals in place.
    pub fn compute_vertex_normals(&mut self, name: &str) -> Result<()> {
        let normals = self.vertex_normals(name)?;
        self.set_normals(&normals);
        Ok(())
    }
}

/// Metallic-roughness surface parameters.
///
/// `base_color` is linear RGBA, the same space glTF's `baseColorFactor` uses.
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
    pub roughness: f32,
    pub metalness: f32,
    pub flat_shading: bool,
    pub double_sided: bool,
}

impl Default for Material {
    /// glTF's default material: white, fully metallic, fully rough.
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            roughness: 1.0,
            metalness: 1.0,
            flat_shading: false,
            double_sided: false,
        }
    }
}

/// Converts one 8-bit sRGB channel to linear light.
pub fn srgb_to_linear(channel: u8) -> f32 {
    let c = channel as f32 / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Geometry plus the material it is drawn with.
#[derive(Clone, Debug, PartialEq)]
pub struct Drawable {
    pub geometry: Geometry,
    pub material: Material,
}

impl Drawable {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self { geometry, material }
    }
}
