//! Preview configuration.
//!
//! Everything has a sensible default so `PreviewConfig::default()` reproduces
//! the stock product page. Deployments override the asset location through
//! the environment.

use std::path::PathBuf;

use crate::{normalize::NormalizeOptions, resources::AssetReference, surface::StageOptions};

/// Directory (native) or URL path (wasm) assets are resolved against.
pub const ASSET_ROOT_ENV: &str = "STONEHEAD_ASSET_ROOT";
/// Reference of the model to display.
pub const MODEL_ENV: &str = "STONEHEAD_MODEL";

pub const DEFAULT_ASSET_ROOT: &str = "assets";
pub const DEFAULT_MODEL: &str = "stonehead.glb";

#[derive(Clone, Debug, PartialEq)]
pub struct PreviewConfig {
    pub asset_root: PathBuf,
    pub model: AssetReference,
    pub normalize: NormalizeOptions,
    pub stage: StageOptions,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from(DEFAULT_ASSET_ROOT),
            model: AssetReference::from(DEFAULT_MODEL),
            normalize: NormalizeOptions::default(),
            stage: StageOptions::default(),
        }
    }
}

impl PreviewConfig {
    /// Defaults, overridden by `STONEHEAD_ASSET_ROOT` and `STONEHEAD_MODEL`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Like [`PreviewConfig::from_env`] but reads variables through `lookup`.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(root) = lookup(ASSET_ROOT_ENV).filter(|v| !v.trim().is_empty()) {
            config.asset_root = PathBuf::from(root.trim());
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            config.model = AssetReference::from(model.trim());
        }
        log::debug!(
            "preview config: asset root {}, model {}",
            config.asset_root.display(),
            config.model
        );
        config
    }

    pub fn with_asset_root(mut self, asset_root: impl Into<PathBuf>) -> Self {
        self.asset_root = asset_root.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<AssetReference>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_normalize(mut self, normalize: NormalizeOptions) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_stage(mut self, stage: StageOptions) -> Self {
        self.stage = stage;
        self
    }
}
