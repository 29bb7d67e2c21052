use std::collections::HashMap;

use crate::{
    error::{PreviewError, Result},
    resources::AssetReference,
};

#[cfg(not(target_arch = "wasm32"))]
pub type BoxedFuture<'a, T> = futures::future::BoxFuture<'a, T>;
#[cfg(target_arch = "wasm32")]
pub type BoxedFuture<'a, T> = futures::future::LocalBoxFuture<'a, T>;

/// Where asset bytes come from.
///
/// Implementations only resolve and read; decoding is the loader's job. A
/// reference that cannot be resolved must fail with
/// [`PreviewError::AssetNotFound`].
pub trait AssetSource: Send + Sync {
    fn fetch<'a>(&'a self, reference: &'a AssetReference) -> BoxedFuture<'a, Result<Vec<u8>>>;
}

/// Reads assets relative to a directory on disk.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Clone, Debug)]
pub struct FsAssetSource {
    root: std::path::PathBuf,
}

#[cfg(not(target_arch = "wasm32"))]
impl FsAssetSource {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_of(&self, reference: &AssetReference) -> std::path::PathBuf {
        // Web-style absolute references ("/stonehead.glb") live under the root too
        self.root.join(reference.as_str().trim_start_matches('/'))
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl AssetSource for FsAssetSource {
    fn fetch<'a>(&'a self, reference: &'a AssetReference) -> BoxedFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            let path = self.path_of(reference);
            log::debug!("reading {}", path.display());
            tokio::fs::read(&path)
                .await
                .map_err(|e| PreviewError::not_found(reference, format!("{}: {e}", path.display())))
        })
    }
}

/// Fetches assets over HTTP relative to the page origin.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Debug)]
pub struct HttpAssetSource {
    base_path: String,
}

#[cfg(target_arch = "wasm32")]
impl HttpAssetSource {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn format_url(&self, reference: &AssetReference) -> std::result::Result<reqwest::Url, String> {
        let window = web_sys::window().ok_or("no window available")?;
        let origin = window
            .location()
            .origin()
            .map_err(|_| "page origin is not readable".to_string())?;
        let base_path = self.base_path.trim_matches('/');
        let base = if base_path.is_empty() {
            format!("{origin}/")
        } else {
            format!("{origin}/{base_path}/")
        };
        let base = reqwest::Url::parse(&base).map_err(|e| e.to_string())?;
        base.join(reference.as_str().trim_start_matches('/'))
            .map_err(|e| e.to_string())
    }
}

#[cfg(target_arch = "wasm32")]
impl AssetSource for HttpAssetSource {
    fn fetch<'a>(&'a self, reference: &'a AssetReference) -> BoxedFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            let url = self
                .format_url(reference)
                .map_err(|e| PreviewError::not_found(reference, e))?;
            let response = reqwest::get(url)
                .await
                .map_err(|e| PreviewError::not_found(reference, e))?;
            if !response.status().is_success() {
                return Err(PreviewError::not_found(
                    reference,
                    format!("server answered {}", response.status()),
                ));
            }
            let bytes = response
                .bytes()
                .await
                .map_err(|e| PreviewError::not_found(reference, e))?;
            Ok(bytes.to_vec())
        })
    }
}

/// Serves assets from memory, e.g. bytes embedded with `include_bytes!`.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssetSource {
    assets: HashMap<AssetReference, Vec<u8>>,
}

impl MemoryAssetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset(mut self, reference: impl Into<AssetReference>, bytes: Vec<u8>) -> Self {
        self.insert(reference, bytes);
        self
    }

    pub fn insert(&mut self, reference: impl Into<AssetReference>, bytes: Vec<u8>) {
        self.assets.insert(reference.into(), bytes);
    }
}

impl AssetSource for MemoryAssetSource {
    fn fetch<'a>(&'a self, reference: &'a AssetReference) -> BoxedFuture<'a, Result<Vec<u8>>> {
        let found = self
            .assets
            .get(reference)
            .cloned()
            .ok_or_else(|| PreviewError::not_found(reference, "not present in memory source"));
        Box::pin(async move { found })
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub type DefaultAssetSource = FsAssetSource;
#[cfg(target_arch = "wasm32")]
pub type DefaultAssetSource = HttpAssetSource;

/// The platform's natural source for `config.asset_root`.
pub fn default_source(config: &crate::config::PreviewConfig) -> DefaultAssetSource {
    #[cfg(not(target_arch = "wasm32"))]
    let source = FsAssetSource::new(&config.asset_root);
    #[cfg(target_arch = "wasm32")]
    let source = HttpAssetSource::new(config.asset_root.to_string_lossy());
    source
}
