//! Error kinds surfaced by the renderer.
//!
//! Asset, shader and depth-target errors are fatal during initialisation.
//! Graphics API errors are collected by the device and drained once per
//! frame; they are logged and never stop the frame loop.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while building or running the shadow-mapping pipeline.
#[derive(Error, Debug)]
pub enum RenderError {
    /// A mesh or texture file is missing or could not be decoded.
    #[error("Failed to load asset {path:?}: {reason}")]
    AssetLoad { path: PathBuf, reason: String },

    /// A shader module failed validation.
    #[error("Shader '{label}' failed to compile: {message}")]
    ShaderCompile { label: String, message: String },

    /// A render pipeline could not be created from otherwise valid modules.
    #[error("Program '{label}' failed to link: {message}")]
    ShaderLink { label: String, message: String },

    /// The depth target cannot be used as a render attachment.
    #[error("Depth target is incomplete: {0}")]
    FramebufferIncomplete(String),

    /// An error reported by the graphics API after a frame was submitted.
    #[error("Graphics API error: {0}")]
    GraphicsApi(String),

    /// The surface could not hand out a frame.
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

impl RenderError {
    pub(crate) fn asset(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::AssetLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error should abort initialisation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::GraphicsApi(_))
    }
}
