//! Framebuffer quantization and PNG output

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::renderer::Framebuffer;
use crate::Color;

/// Channel edits applied after rendering and before quantization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcess {
    /// Drop the green channel, giving the magenta look of the basic scene
    pub zero_green: bool,
}

impl PostProcess {
    pub fn apply(&self, mut color: Color) -> Color {
        if self.zero_green {
            color.y = 0.0;
        }
        color
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Failed to create output directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Framebuffer of {width}x{height} does not fit an image")]
    Dimensions { width: usize, height: usize },
}

/// Map linear radiance to 8-bit channels: `min(c * 255, 255)`, truncated
pub fn quantize(color: &Color) -> [u8; 3] {
    // `as` saturates, so negative channels land on 0
    let channel = |c: f64| (c * 255.0).min(255.0) as u8;
    [channel(color.x), channel(color.y), channel(color.z)]
}

/// Write the framebuffer as an 8-bit RGB PNG
pub fn write_png<P: AsRef<Path>>(framebuffer: &Framebuffer, post: &PostProcess, path: P) -> Result<(), OutputError> {
    let path = path.as_ref();
    let dimensions_error = || OutputError::Dimensions {
        width: framebuffer.width(),
        height: framebuffer.height(),
    };
    let width = u32::try_from(framebuffer.width()).map_err(|_| dimensions_error())?;
    let height = u32::try_from(framebuffer.height()).map_err(|_| dimensions_error())?;

    let image = image::RgbImage::from_raw(width, height, framebuffer.to_rgb8(post)).ok_or_else(dimensions_error)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    image.save_with_format(path, image::ImageFormat::Png)?;

    tracing::debug!(path = %path.display(), width, height, "Wrote PNG");
    Ok(())
}
