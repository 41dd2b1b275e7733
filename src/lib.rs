//! umbra
//!
//! A small two-pass shadow-mapping renderer. Every frame first renders the
//! scene's depth from a light into a square depth texture, then renders the
//! scene from the camera and compares each fragment's light-space depth with
//! that texture to decide whether it is lit.
//!
//! High-level modules
//! - `camera`: camera, projection and the WASD/mouse controller
//! - `config`: renderer configuration and shadow parameters
//! - `context`: GPU context owning device/queue/surface, and per-frame state
//! - `data_structures`: meshes, instances and textures
//! - `device`: the command seam between passes and the GPU, plus a recording backend
//! - `flow`: the winit application loop and input mapping
//! - `frame`: the per-frame stage machine that sequences both passes
//! - `pipelines`: depth, shading and debug pipelines and their shader sources
//! - `resources`: OBJ/texture loading and procedural primitives
//! - `scene`: renderable instances and scene configurations
//! - `shading`: the camera pass and the depth-map debug view
//! - `shadow`: light projection, depth target, shadow pass and CPU-side sampling
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod device;
pub mod error;
pub mod flow;
pub mod frame;
pub mod pipelines;
pub mod resources;
pub mod scene;
pub mod shading;
pub mod shadow;

// Re-exports commonly used types for convenience in downstream code.
pub use config::{RendererConfig, ShadowSettings};
pub use device::{GraphicsDevice, TextureHandle, GeometryHandle};
pub use error::RenderError;
pub use frame::{FrameOrchestrator, FrameReport, FrameStage};
pub use scene::{RenderableInstance, Scene, SceneConfiguration, TransformPolicy};
pub use shadow::{LightProjector, LightSpaceMatrix};
pub use cgmath;
