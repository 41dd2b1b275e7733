//! Light-space depth mapping.
//!
//! - `projector` builds the light's orthographic view-projection
//! - `target` owns the fixed-size depth texture
//! - `pass` renders occluders into it
//! - `sampling` is the CPU form of the per-fragment shadow test

pub mod pass;
pub mod projector;
pub mod sampling;
pub mod target;

pub use pass::{PassStats, ShadowPass};
pub use projector::{LightProjector, LightSpaceMatrix, compute_light_space_matrix};
pub use sampling::{DepthMap, DepthSampler, ShadowCoord, ShadowTest};
pub use target::DepthTarget;
