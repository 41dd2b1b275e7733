use std::path::Path;

use crate::{
    device::{GraphicsDevice, TextureHandle},
    error::RenderError,
};

pub async fn load_string(path: &Path) -> Result<String, RenderError> {
    std::fs::read_to_string(path).map_err(|e| RenderError::asset(path, e))
}

/// Decode an image file. Format is detected from the contents.
pub fn load_image(path: &Path) -> Result<image::DynamicImage, RenderError> {
    let data = std::fs::read(path).map_err(|e| RenderError::asset(path, e))?;
    image::load_from_memory(&data).map_err(|e| RenderError::asset(path, e))
}

/// Decode an image file and upload it as a diffuse texture.
pub fn load_texture<D: GraphicsDevice + ?Sized>(
    device: &mut D,
    path: &Path,
) -> Result<TextureHandle, RenderError> {
    let img = load_image(path)?;
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "texture".to_string());
    log::info!("Loaded texture {:?} ({}x{})", path, img.width(), img.height());
    Ok(device.create_texture(&img, &label))
}
