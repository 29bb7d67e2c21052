//! stonehead-preview
//!
//! Loads a scanned head model and turns it into the canonical, interactive
//! preview shown on the product page. The asset arrives with whatever
//! materials, normals and orientation the reconstruction produced; this crate
//! makes the presentation deterministic: smooth recomputed normals, one matte
//! stone material, a fixed upright orientation and a camera that can only
//! yaw around the model. Works natively and on `wasm32`.
//!
//! High-level modules
//! - `camera`: camera, projection and the yaw-only orbit controller
//! - `config`: preview configuration and environment overrides
//! - `data_structures`: transforms, meshes, materials and the scene graph
//! - `error`: the error taxonomy shared by every stage
//! - `normalize`: the scene normalizer
//! - `resources`: asset sources, glTF decoding and the keyed load cache
//! - `surface`: the stage and mount lifecycle a page embeds
//!

pub mod camera;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod normalize;
pub mod resources;
pub mod surface;

pub use config::PreviewConfig;
pub use data_structures::scene_graph::{SceneGraph, SceneNode};
pub use error::{PreviewError, Result};
pub use normalize::{Normalizer, normalize};
pub use resources::{AssetReference, cache::AssetCache};
pub use surface::{MountState, PreviewSurface};

/// Routes `log` output to stderr natively and to the browser console on wasm.
pub fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys_warn(&format!("Could not initialize logger: {e}"));
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn web_sys_warn(message: &str) {
    use wasm_bindgen::JsValue;
    web_sys::console::warn_1(&JsValue::from_str(message));
}

/// Warms the process-wide cache so the first mount does not wait on the network.
pub fn preload(reference: impl Into<AssetReference>) {
    resources::cache::global().preload(&reference.into());
}

/// The normalized scene for `reference`, loaded through the process-wide cache.
pub async fn load_normalized(reference: impl Into<AssetReference>) -> Result<SceneGraph> {
    let reference = reference.into();
    let scene = resources::cache::global().load(&reference).await?;
    normalize(scene)
}
