//! The render surface a page embeds.
//!
//! A [`Stage`] is the camera, the light rig and the yaw-only orbit controller
//! around a mounted model. [`PreviewSurface`] drives one stage through its
//! lifecycle: it asks the cache for the asset, normalizes it exactly once and
//! only then exposes it. Until the model is ready the draw list stays empty,
//! so the page shows nothing rather than a half-prepared model.

use std::sync::Arc;

use cgmath::{Deg, Point3, Vector3};

use crate::{
    camera::{Camera, CameraUniform, OrbitController, Projection},
    config::PreviewConfig,
    data_structures::{
        instance::InstanceRaw,
        model::{Material, ModelVertex},
        scene_graph::{SceneGraph, traverse},
    },
    error::{PreviewError, Result},
    normalize::Normalizer,
    resources::{AssetReference, cache::AssetCache},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: [f32; 3],
    pub intensity: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub intensity: f32,
}

/// Where the mounted root sits in the stage. Rotation is left to the normalizer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub position: Vector3<f32>,
    pub scale: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageOptions {
    pub camera_position: Point3<f32>,
    pub fov: Deg<f32>,
    pub znear: f32,
    pub zfar: f32,
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub placement: Placement,
    pub rotate_speed: f32,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            camera_position: Point3::new(0.0, 0.0, 4.0),
            fov: Deg(35.0),
            znear: 0.1,
            zfar: 1000.0,
            ambient: AmbientLight {
                color: [1.0, 1.0, 1.0],
                intensity: 0.5,
            },
            directional: DirectionalLight {
                position: [3.0, 2.0, 5.0],
                color: [1.0, 1.0, 1.0],
                intensity: 1.2,
            },
            placement: Placement {
                position: Vector3::new(0.0, -1.0, 0.0),
                scale: 0.013,
            },
            rotate_speed: 1.0,
        }
    }
}

/// One drawable, resolved to everything a GPU pass needs.
#[derive(Debug)]
pub struct DrawItem<'a> {
    pub name: &'a str,
    pub transform: InstanceRaw,
    pub vertices: &'a [ModelVertex],
    pub indices: &'a [u32],
    pub material: &'a Material,
}

pub struct Stage {
    pub camera: Camera,
    pub projection: Projection,
    pub controller: OrbitController,
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    placement: Placement,
    viewport_height: u32,
    scene: Option<SceneGraph>,
}

impl Stage {
    pub fn new(options: &StageOptions, width: u32, height: u32) -> Self {
        let camera = Camera::new(options.camera_position, Point3::new(0.0, 0.0, 0.0));
        let projection = Projection::new(width, height, options.fov, options.znear, options.zfar);
        let controller = OrbitController::yaw_only(&camera, options.rotate_speed);
        Self {
            camera,
            projection,
            controller,
            ambient: options.ambient,
            directional: options.directional,
            placement: options.placement,
            viewport_height: height,
            scene: None,
        }
    }

    /**
     * Attaches `scene` and places its root.
     *
     * The stage only ever holds normalized graphs: one that arrives
     * unnormalized gets the canonical presentation first. If that fails the
     * stage keeps whatever it showed before.
     */
    pub fn mount(&mut self, scene: SceneGraph) -> Result<()> {
        let mut scene = if scene.is_normalized() {
            scene
        } else {
            log::debug!("normalizing `{}` on mount", scene.root().name());
            Normalizer::default().normalize(scene)?
        };
        let placement = self.placement;
        scene.root_mut().set_local_transform_with(&mut |local| {
            local.position = placement.position;
            local.scale = Vector3::new(placement.scale, placement.scale, placement.scale);
        });
        scene.update_world_transforms();
        self.scene = Some(scene);
        Ok(())
    }

    pub fn unmount(&mut self) -> Option<SceneGraph> {
        self.scene.take()
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.scene.as_ref()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.projection.resize(width, height);
            self.viewport_height = height;
        }
    }

    pub fn handle_drag(&mut self, dx: f32, dy: f32) {
        self.controller.rotate(dx, dy, self.viewport_height as f32);
        self.controller.update_camera(&mut self.camera);
    }

    /// Returns whether the zoom had an effect; it never does on a yaw-only stage.
    pub fn handle_zoom(&mut self, scale: f32) -> bool {
        let zoomed = self.controller.zoom(scale);
        if zoomed {
            self.controller.update_camera(&mut self.camera);
        }
        zoomed
    }

    pub fn camera_uniform(&self) -> CameraUniform {
        CameraUniform::from_camera(&self.camera, &self.projection)
    }

    pub fn draw_list(&self) -> Vec<DrawItem<'_>> {
        let mut items = Vec::new();
        if let Some(scene) = &self.scene {
            traverse(scene.root(), &mut |node| {
                if let Some(drawable) = node.drawable() {
                    items.push(DrawItem {
                        name: node.name(),
                        transform: node.get_world_transform().to_raw(),
                        vertices: &drawable.geometry.vertices,
                        indices: &drawable.geometry.indices,
                        material: &drawable.material,
                    });
                }
            });
        }
        items
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum MountState {
    Loading,
    Ready,
    Failed(PreviewError),
}

/// The single embedding point: the normalized model for one reference on one stage.
pub struct PreviewSurface {
    cache: Arc<AssetCache>,
    reference: AssetReference,
    normalizer: Normalizer,
    stage: Stage,
    state: MountState,
}

impl PreviewSurface {
    pub fn new(cache: Arc<AssetCache>, config: &PreviewConfig, width: u32, height: u32) -> Self {
        Self {
            cache,
            reference: config.model.clone(),
            normalizer: Normalizer::new(config.normalize.clone()),
            stage: Stage::new(&config.stage, width, height),
            state: MountState::Loading,
        }
    }

    pub fn reference(&self) -> &AssetReference {
        &self.reference
    }

    pub fn state(&self) -> &MountState {
        &self.state
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    /**
     * Loads, normalizes and mounts the model.
     *
     * Once the surface is `Ready` this is a no-op: the mounted graph may have
     * been rotated by the user and must not be normalized again. A failed
     * mount is reported and stays failed; the cache decides whether a later
     * attempt fetches again.
     */
    pub async fn mount(&mut self) -> Result<()> {
        if self.state == MountState::Ready {
            return Ok(());
        }
        self.state = MountState::Loading;
        let outcome = match self.cache.load(&self.reference).await {
            Ok(scene) => self
                .normalizer
                .normalize(scene)
                .and_then(|scene| self.stage.mount(scene)),
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => {
                self.state = MountState::Ready;
                log::info!("{} is ready", self.reference);
                Ok(())
            }
            Err(e) => {
                log::error!("{} could not be mounted: {}", self.reference, e);
                self.state = MountState::Failed(e.clone());
                Err(e)
            }
        }
    }

    /// Empty until the model is `Ready`.
    pub fn draw_list(&self) -> Vec<DrawItem<'_>> {
        match self.state {
            MountState::Ready => self.stage.draw_list(),
            _ => Vec::new(),
        }
    }
}
