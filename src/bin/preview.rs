//! Headless preview: loads the configured model, normalizes and mounts it,
//! then reports what a renderer would draw.
//!
//! Usage: `preview [MODEL]`. Without an argument the model comes from
//! `STONEHEAD_MODEL`, falling back to the stock model.

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use std::sync::Arc;

    use anyhow::Context;
    use stonehead_preview::{
        AssetCache, PreviewConfig, PreviewSurface, init_logger, resources::source::FsAssetSource,
    };

    init_logger();

    let mut config = PreviewConfig::from_env();
    if let Some(model) = std::env::args().nth(1) {
        config = config.with_model(model);
    }

    let cache = Arc::new(AssetCache::new(FsAssetSource::new(&config.asset_root)));
    cache.preload(&config.model);

    let mut surface = PreviewSurface::new(Arc::clone(&cache), &config, 1280, 720);
    surface
        .mount()
        .await
        .with_context(|| format!("failed to mount {}", config.model))?;

    for item in surface.draw_list() {
        log::info!(
            "{}: {} vertices, {} triangles, material `{}`",
            item.name,
            item.vertices.len(),
            item.indices.len() / 3,
            item.material.name
        );
    }

    // A quarter-viewport drag, as a user spinning the head would do.
    surface.stage_mut().handle_drag(180.0, 0.0);
    let eye = surface.stage().camera.position;
    log::info!("camera after drag at ({:.3}, {:.3}, {:.3})", eye.x, eye.y, eye.z);

    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {}
