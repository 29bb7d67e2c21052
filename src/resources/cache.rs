//! Keyed asset cache with at-most-one fetch per reference.
//!
//! Every reference maps to a single shared load future. Callers that ask for
//! the same reference, concurrently or later, all await that one future, so
//! the underlying source is hit once per reference for the lifetime of the
//! cache. Failures are cached like successes; [`AssetCache::evict`] is the
//! only way to make a reference fetchable again.

use std::{collections::HashMap, sync::Arc};

use futures::{FutureExt, future::Shared};
use instant::Instant;
use parking_lot::Mutex;

use crate::{
    config::PreviewConfig,
    data_structures::scene_graph::SceneGraph,
    error::Result,
    resources::{
        AssetReference, load_scene_gltf,
        source::{AssetSource, BoxedFuture, default_source},
    },
};

type SharedLoad = Shared<BoxedFuture<'static, Result<Arc<SceneGraph>>>>;

pub struct AssetCache {
    source: Arc<dyn AssetSource>,
    entries: Mutex<HashMap<AssetReference, SharedLoad>>,
}

impl AssetCache {
    pub fn new(source: impl AssetSource + 'static) -> Self {
        Self::with_shared_source(Arc::new(source))
    }

    pub fn with_shared_source(source: Arc<dyn AssetSource>) -> Self {
        Self {
            source,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entry(&self, reference: &AssetReference) -> SharedLoad {
        self.entries
            .lock()
            .entry(reference.clone())
            .or_insert_with(|| {
                log::debug!("scheduling load of {reference}");
                let source = Arc::clone(&self.source);
                let reference = reference.clone();
                let load = async move {
                    let started = Instant::now();
                    let result = load_scene_gltf(source.as_ref(), &reference).await;
                    match &result {
                        Ok(_) => log::info!(
                            "loaded {} in {} ms",
                            reference,
                            started.elapsed().as_millis()
                        ),
                        Err(e) => log::warn!("loading {reference} failed: {e}"),
                    }
                    result.map(Arc::new)
                };
                #[cfg(not(target_arch = "wasm32"))]
                let load = load.boxed();
                #[cfg(target_arch = "wasm32")]
                let load = load.boxed_local();
                load.shared()
            })
            .clone()
    }

    /**
     * Resolves `reference` to a scene graph in its native, unnormalized state.
     *
     * The cached graph is never handed out directly: each caller receives its
     * own deep copy, so normalizing or mounting one copy cannot leak into
     * another consumer of the same asset.
     */
    pub async fn load(&self, reference: &AssetReference) -> Result<SceneGraph> {
        let scene = self.entry(reference).await?;
        Ok(SceneGraph::clone(&scene))
    }

    /// Starts loading `reference` without waiting for it.
    pub fn preload(&self, reference: &AssetReference) {
        let load = self.entry(reference);
        spawn_detached(async move {
            let _ = load.await;
        });
    }

    /// Drops the cached entry; returns whether there was one.
    pub fn evict(&self, reference: &AssetReference) -> bool {
        self.entries.lock().remove(reference).is_some()
    }

    pub fn contains(&self, reference: &AssetReference) -> bool {
        self.entries.lock().contains_key(reference)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_detached(task: impl Future<Output = ()> + Send + 'static) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(task);
        }
        Err(_) => log::debug!("no async runtime active, the preload runs on first load instead"),
    }
}

#[cfg(target_arch = "wasm32")]
fn spawn_detached(task: impl Future<Output = ()> + 'static) {
    wasm_bindgen_futures::spawn_local(task);
}

fn new_global() -> Arc<AssetCache> {
    let config = PreviewConfig::from_env();
    Arc::new(AssetCache::new(default_source(&config)))
}

#[cfg(not(target_arch = "wasm32"))]
static GLOBAL: std::sync::OnceLock<Arc<AssetCache>> = std::sync::OnceLock::new();

// Loads on wasm are not `Send`, so the page-wide cache lives on the one JS thread.
#[cfg(target_arch = "wasm32")]
thread_local! {
    static GLOBAL: std::cell::OnceCell<Arc<AssetCache>> = const { std::cell::OnceCell::new() };
}

/// The process-wide cache, created from [`PreviewConfig::from_env`] on first use.
#[cfg(not(target_arch = "wasm32"))]
pub fn global() -> Arc<AssetCache> {
    Arc::clone(GLOBAL.get_or_init(new_global))
}

#[cfg(target_arch = "wasm32")]
pub fn global() -> Arc<AssetCache> {
    GLOBAL.with(|cell| Arc::clone(cell.get_or_init(new_global)))
}

/// Installs `cache` as the process-wide cache. Fails if one is already in use.
#[cfg(not(target_arch = "wasm32"))]
pub fn set_global(cache: AssetCache) -> std::result::Result<(), Arc<AssetCache>> {
    GLOBAL.set(Arc::new(cache))
}

#[cfg(target_arch = "wasm32")]
pub fn set_global(cache: AssetCache) -> std::result::Result<(), Arc<AssetCache>> {
    GLOBAL.with(|cell| cell.set(Arc::new(cache)))
}
