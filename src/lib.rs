//! 2D light transport renderer over signed distance fields
//!
//! Rays are sphere-marched from every pixel through an implicit scene. At each
//! surface hit the tracer applies reflection, refraction with Fresnel weighting
//! and Beer-Lambert absorption recursively, and the sampler averages many
//! stratified directions per pixel.

pub mod config;
pub mod gradient;
pub mod optics;
pub mod output;
pub mod renderer;
pub mod sampler;
pub mod scene;
pub mod scenes;
pub mod sdf;
pub mod tracer;

pub use config::{ConfigError, RenderConfig};
pub use renderer::{Framebuffer, Renderer};
pub use sampler::{Sampler, SamplingStrategy};
pub use scene::{CsgOp, DistanceField, Material, Scene, SceneEntry, SurfaceSample};
pub use sdf::Shape;
pub use tracer::{TraceConfig, Tracer};

/// RGB radiance, unbounded until quantized for output
pub type Color = nalgebra::Vector3<f64>;

/// Default output resolution (square)
pub const DEFAULT_SIZE: u32 = 512;

/// Default number of directions sampled per pixel
pub const DEFAULT_SAMPLES: u32 = 256;
