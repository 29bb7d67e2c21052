//! Scene normalization.
//!
//! Turns a freshly loaded asset into its canonical presentation: smooth
//! normals recomputed from the triangle winding, one matte stone material on
//! every drawable and a fixed corrective rotation on the root. The pass is
//! all-or-nothing. Every drawable's normals are computed before anything is
//! written, so a malformed mesh leaves the graph exactly as it was loaded.

use std::f32::consts::{FRAC_PI_2, PI};

use cgmath::{Quaternion, Rad, Rotation3};

use crate::{
    data_structures::{
        model::{Material, srgb_to_linear},
        scene_graph::{SceneGraph, traverse_mut},
    },
    error::Result,
};

/// Medium-dark gray, `#777777`.
pub const CANONICAL_COLOR_SRGB: [u8; 3] = [0x77, 0x77, 0x77];
pub const CANONICAL_ROUGHNESS: f32 = 0.9;
pub const CANONICAL_METALNESS: f32 = 0.0;

/// Matte, non-metallic, flat-shaded gray.
pub fn canonical_material() -> Material {
    let [r, g, b] = CANONICAL_COLOR_SRGB.map(srgb_to_linear);
    Material {
        name: "stone".to_string(),
        base_color: [r, g, b, 1.0],
        roughness: CANONICAL_ROUGHNESS,
        metalness: CANONICAL_METALNESS,
        flat_shading: true,
        double_sided: false,
    }
}

/**
 * The upright, front-facing correction: a quarter turn about X, a half turn
 * about Y and a fifth of a half turn about Z, applied as intrinsic X-Y-Z
 * Euler angles.
 */
pub fn canonical_orientation() -> Quaternion<f32> {
    Quaternion::from_angle_x(Rad(FRAC_PI_2))
        * Quaternion::from_angle_y(Rad(PI))
        * Quaternion::from_angle_z(Rad(PI / 5.0))
}

#[derive(Clone, Debug, PartialEq)]
pub struct NormalizeOptions {
    pub material: Material,
    pub orientation: Quaternion<f32>,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            material: canonical_material(),
            orientation: canonical_orientation(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &NormalizeOptions {
        &self.options
    }

    /// Consumes `scene` and returns it in its canonical state.
    pub fn normalize(&self, mut scene: SceneGraph) -> Result<SceneGraph> {
        self.normalize_in_place(&mut scene)?;
        Ok(scene)
    }

    /**
     * Applies the canonical presentation to `scene`.
     *
     * The root's rotation is replaced by the canonical orientation, its
     * position and scale are kept. A graph that was already normalized is
     * left alone. On `InvalidGeometry` nothing has been modified.
     */
    pub fn normalize_in_place(&self, scene: &mut SceneGraph) -> Result<()> {
        if scene.is_normalized() {
            log::debug!("scene `{}` is already normalized", scene.root().name());
            return Ok(());
        }

        let mut staged = Vec::new();
        for node in scene.drawable_nodes() {
            if let Some(drawable) = node.drawable() {
                staged.push(drawable.geometry.vertex_normals(node.name())?);
            }
        }
        let drawables = staged.len();

        let mut staged = staged.into_iter();
        traverse_mut(scene.root_mut(), &mut |node| {
            let name = node.name().to_string();
            if let Some(drawable) = node.drawable_mut() {
                if let Some(normals) = staged.next() {
                    drawable.geometry.set_normals(&normals);
                }
                log::debug!(
                    "replacing material `{}` on `{}`",
                    drawable.material.name,
                    name
                );
                drawable.material = self.options.material.clone();
            }
        });

        let orientation = self.options.orientation;
        scene
            .root_mut()
            .set_local_transform_with(&mut |local| local.rotation = orientation);
        scene.update_world_transforms();
        scene.mark_normalized();

        log::info!(
            "normalized scene `{}` ({} drawables)",
            scene.root().name(),
            drawables
        );
        Ok(())
    }
}

/// [`Normalizer::normalize`] with the canonical options.
pub fn normalize(scene: SceneGraph) -> Result<SceneGraph> {
    Normalizer::default().normalize(scene)
}
