use crate::{
    device::{GraphicsDevice, TextureHandle},
    error::RenderError,
};

/// The shadow map: one square depth texture, created at startup and reused
/// every frame. The window size never affects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthTarget {
    resolution: u32,
    texture: TextureHandle,
}

impl DepthTarget {
    /// Allocate the depth texture. Completeness is checked here once, never
    /// per frame.
    pub fn create<D: GraphicsDevice + ?Sized>(
        device: &mut D,
        resolution: u32,
    ) -> Result<Self, RenderError> {
        Self::validate(resolution, device.max_texture_dimension())?;
        let texture = device.create_depth_target(resolution)?;
        log::info!("Shadow map created at {0}x{0}", resolution);
        Ok(Self {
            resolution,
            texture,
        })
    }

    pub fn validate(resolution: u32, max_dimension: u32) -> Result<(), RenderError> {
        if resolution == 0 {
            return Err(RenderError::FramebufferIncomplete(
                "depth attachment has zero size".to_string(),
            ));
        }
        if resolution > max_dimension {
            return Err(RenderError::FramebufferIncomplete(format!(
                "depth attachment {resolution}x{resolution} exceeds the device limit of {max_dimension}"
            )));
        }
        Ok(())
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }
}
