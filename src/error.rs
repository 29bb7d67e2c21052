//! Error taxonomy shared by the loader, the normalizer and the render surface.

use thiserror::Error;

use crate::resources::AssetReference;

/// Everything that can go wrong between an asset reference and a mounted model.
///
/// The enum is `Clone` because a single cached load is awaited by every
/// consumer of the same reference, and each of them receives the outcome.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PreviewError {
    #[error("asset `{reference}` could not be resolved: {reason}")]
    AssetNotFound {
        reference: AssetReference,
        reason: String,
    },

    #[error("asset `{reference}` could not be decoded: {reason}")]
    AssetParseError {
        reference: AssetReference,
        reason: String,
    },

    #[error("drawable `{node}` has no valid triangle topology: {reason}")]
    InvalidGeometry { node: String, reason: String },
}

impl PreviewError {
    pub(crate) fn not_found(reference: &AssetReference, reason: impl ToString) -> Self {
        Self::AssetNotFound {
            reference: reference.clone(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn parse(reference: &AssetReference, reason: impl ToString) -> Self {
        Self::AssetParseError {
            reference: reference.clone(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid_geometry(node: &str, reason: impl ToString) -> Self {
        Self::InvalidGeometry {
            node: node.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PreviewError>;
