//! Preview data structures: transforms, meshes, materials and scene graphs.
//!
//! - `instance` holds node transforms and their GPU-ready raw form
//! - `model` contains vertices, triangle geometry, materials and drawables
//! - `scene_graph` enables hierarchical scene organization and traversal

pub mod instance;
pub mod model;
pub mod scene_graph;
