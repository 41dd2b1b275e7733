//! Engine data structures: meshes, per-draw transforms and textures.
//!
//! - `model` contains the CPU [`model::Mesh`] and its GPU [`model::GeometryBuffer`]
//! - `instance` holds the per-draw model and normal matrices
//! - `texture` contains the GPU texture wrapper, including the shadow map

pub mod instance;
pub mod model;
pub mod texture;
