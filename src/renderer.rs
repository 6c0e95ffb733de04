//! Parallel renderer
//!
//! Every pixel is a sensor inside the scene: the sampler integrates the light
//! arriving at the pixel position from all directions. Rows are rendered in
//! parallel, each with its own random stream derived from the render seed.

use std::time::Instant;

use nalgebra::{Point2, Vector2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::config::RenderConfig;
use crate::output::{quantize, PostProcess};
use crate::sampler::{Sampler, SamplingStrategy};
use crate::scene::Scene;
use crate::tracer::{TraceConfig, Tracer};
use crate::Color;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to build render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Linear radiance per pixel, row-major
#[derive(Debug, Clone, PartialEq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::zeros(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn get(&self, x: usize, y: usize) -> Color {
        self.pixels[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, color: Color) {
        self.pixels[y * self.width + x] = color;
    }

    /// Mean radiance over the whole image
    pub fn average(&self) -> Color {
        if self.pixels.is_empty() {
            return Color::zeros();
        }
        self.pixels.iter().sum::<Color>() / self.pixels.len() as f64
    }

    /// Interleaved 8-bit RGB after post-processing
    pub fn to_rgb8(&self, post: &PostProcess) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for color in &self.pixels {
            bytes.extend_from_slice(&quantize(&post.apply(*color)));
        }
        bytes
    }
}

/// Renders scenes into framebuffers
#[derive(Debug, Clone)]
pub struct Renderer {
    width: usize,
    height: usize,
    sampler: Sampler,
    tracer: TraceConfig,
    seed: u64,
    threads: Option<usize>,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            sampler: Sampler::new(crate::DEFAULT_SAMPLES, SamplingStrategy::default()),
            tracer: TraceConfig::default(),
            seed: rand::random(),
            threads: None,
        }
    }

    /// Renderer for a configuration; draws a fresh seed when none is set
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            width: config.width as usize,
            height: config.height as usize,
            sampler: Sampler::new(config.samples, config.strategy),
            tracer: config.tracer,
            seed: config.seed.unwrap_or_else(rand::random),
            threads: config.threads,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_sampler(mut self, sampler: Sampler) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_tracer(mut self, tracer: TraceConfig) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Render the scene to a new framebuffer
    pub fn render(&self, scene: &Scene) -> Result<Framebuffer, RenderError> {
        if self.tracer.max_depth == 0 && scene.has_dielectrics() {
            tracing::warn!("max_depth is 0; dielectric surfaces will render black");
        }
        tracing::info!(
            width = self.width,
            height = self.height,
            samples = self.sampler.samples(),
            strategy = ?self.sampler.strategy(),
            seed = self.seed,
            "Rendering"
        );
        tracing::debug!(tracer = ?self.tracer, threads = ?self.threads, "Tracer configuration");

        let start = Instant::now();
        let framebuffer = match self.threads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
                pool.install(|| self.render_rows(scene))
            }
            None => self.render_rows(scene),
        };

        if tracing::enabled!(tracing::Level::DEBUG) {
            let tracer = Tracer::new(scene, self.tracer);
            let (color, stats) = tracer.trace_counted(Point2::new(0.5, 0.5), Vector2::new(1.0, 0.0), 0);
            tracing::debug!(
                rays = stats.rays,
                hits = stats.hits,
                max_steps = stats.max_steps,
                max_depth = stats.max_depth,
                color = ?color,
                "Center ray"
            );
        }

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            average = ?framebuffer.average(),
            "Render complete"
        );
        Ok(framebuffer)
    }

    fn render_rows(&self, scene: &Scene) -> Framebuffer {
        let (width, height) = (self.width, self.height);
        let tracer = Tracer::new(scene, self.tracer);
        let sampler = self.sampler;
        let seed = self.seed;

        let mut framebuffer = Framebuffer::new(width, height);
        if width == 0 {
            return framebuffer;
        }
        framebuffer
            .pixels
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(y, row)| {
                // One stream per row keeps output independent of scheduling.
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(y as u64));
                let py = y as f64 / height as f64;
                for (x, pixel) in row.iter_mut().enumerate() {
                    let px = x as f64 / width as f64;
                    *pixel = sampler.sample(&tracer, Point2::new(px, py), &mut rng);
                }
            });
        framebuffer
    }
}
