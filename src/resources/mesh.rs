use gltf::{Semantic, mesh::Mode};

use crate::{
    data_structures::model::{Geometry, ModelVertex},
    error::{PreviewError, Result},
    resources::AssetReference,
};

/**
 * Reads one glTF primitive into an indexed triangle list.
 *
 * Strips and fans are unrolled into plain triangles and non-indexed
 * primitives get sequential indices. Point and line primitives have no
 * surface to shade, so they are skipped and `Ok(None)` is returned.
 */
pub fn read_geometry(
    primitive: &gltf::Primitive,
    buffers: &[Vec<u8>],
    reference: &AssetReference,
) -> Result<Option<Geometry>> {
    let mode = primitive.mode();
    if !matches!(
        mode,
        Mode::Triangles | Mode::TriangleStrip | Mode::TriangleFan
    ) {
        log::warn!(
            "Skipping primitive {} in {}: {:?} primitives are not drawable surfaces.",
            primitive.index(),
            reference,
            mode
        );
        return Ok(None);
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    if primitive.get(&Semantic::Positions).is_none() {
        return Err(PreviewError::parse(
            reference,
            format!("primitive {} has no POSITION attribute", primitive.index()),
        ));
    }
    let mut vertices: Vec<ModelVertex> = reader
        .read_positions()
        .ok_or_else(|| out_of_bounds(primitive, "POSITION", reference))?
        .map(|position| ModelVertex {
            position,
            ..Default::default()
        })
        .collect();

    let mut has_normals = false;
    if primitive.get(&Semantic::Normals).is_some() {
        let normal_attribute = reader
            .read_normals()
            .ok_or_else(|| out_of_bounds(primitive, "NORMAL", reference))?;
        let normals: Vec<[f32; 3]> = normal_attribute.collect();
        if normals.len() == vertices.len() {
            vertices
                .iter_mut()
                .zip(normals)
                .for_each(|(vertex, normal)| vertex.normal = normal);
            has_normals = true;
        } else {
            log::warn!(
                "Ignoring {} normals for {} vertices in {}.",
                normals.len(),
                vertices.len(),
                reference
            );
        }
    }

    let mut has_tex_coords = false;
    if primitive.get(&Semantic::TexCoords(0)).is_some() {
        let tex_coord_attribute = reader
            .read_tex_coords(0)
            .ok_or_else(|| out_of_bounds(primitive, "TEXCOORD_0", reference))?
            .into_f32();
        let tex_coords: Vec<[f32; 2]> = tex_coord_attribute.collect();
        if tex_coords.len() == vertices.len() {
            vertices
                .iter_mut()
                .zip(tex_coords)
                .for_each(|(vertex, tex_coord)| vertex.tex_coords = tex_coord);
            has_tex_coords = true;
        }
    }

    let raw_indices: Vec<u32> = match primitive.indices() {
        Some(_) => reader
            .read_indices()
            .ok_or_else(|| out_of_bounds(primitive, "indices", reference))?
            .into_u32()
            .collect(),
        None => (0..vertices.len() as u32).collect(),
    };

    let indices = match mode {
        Mode::TriangleStrip => unroll_strip(&raw_indices),
        Mode::TriangleFan => unroll_fan(&raw_indices),
        _ => raw_indices,
    };

    Ok(Some(Geometry {
        vertices,
        indices,
        has_normals,
        has_tex_coords,
    }))
}

fn out_of_bounds(
    primitive: &gltf::Primitive,
    accessor: &str,
    reference: &AssetReference,
) -> PreviewError {
    PreviewError::parse(
        reference,
        format!(
            "{accessor} accessor of primitive {} reads past its buffer view",
            primitive.index()
        ),
    )
}

/// Every triangle of a strip keeps the winding of the first one.
pub fn unroll_strip(strip: &[u32]) -> Vec<u32> {
    let mut triangles = Vec::with_capacity(strip.len().saturating_sub(2) * 3);
    for i in 0..strip.len().saturating_sub(2) {
        if i % 2 == 0 {
            triangles.extend_from_slice(&[strip[i], strip[i + 1], strip[i + 2]]);
        } else {
            triangles.extend_from_slice(&[strip[i + 2], strip[i + 1], strip[i]]);
        }
    }
    triangles
}

pub fn unroll_fan(fan: &[u32]) -> Vec<u32> {
    let mut triangles = Vec::with_capacity(fan.len().saturating_sub(2) * 3);
    for i in 1..fan.len().saturating_sub(1) {
        triangles.extend_from_slice(&[fan[0], fan[i], fan[i + 1]]);
    }
    triangles
}
