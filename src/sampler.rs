//! Monte-Carlo integration of incoming radiance over all directions

use std::f64::consts::TAU;

use nalgebra::{Point2, Vector2};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::scene::DistanceField;
use crate::tracer::Tracer;
use crate::Color;

/// How sample directions are distributed over the circle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingStrategy {
    /// One jittered direction in each of `N` equal sectors
    #[default]
    Stratified,
    /// Independent uniform directions
    Uniform,
    /// Evenly spaced directions without jitter; shows banding
    Fixed,
}

impl SamplingStrategy {
    /// Angle of sample `i` out of `n`
    pub fn angle<R: Rng>(&self, i: u32, n: u32, rng: &mut R) -> f64 {
        match self {
            SamplingStrategy::Stratified => TAU * (i as f64 + rng.gen::<f64>()) / n as f64,
            SamplingStrategy::Uniform => TAU * rng.gen::<f64>(),
            SamplingStrategy::Fixed => TAU * i as f64 / n as f64,
        }
    }
}

/// Estimates the radiance reaching a point from every direction
#[derive(Debug, Clone, Copy)]
pub struct Sampler {
    samples: u32,
    strategy: SamplingStrategy,
}

impl Sampler {
    pub fn new(samples: u32, strategy: SamplingStrategy) -> Self {
        Self {
            samples: samples.max(1),
            strategy,
        }
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    pub fn strategy(&self) -> SamplingStrategy {
        self.strategy
    }

    /// Average of `samples` traces leaving `point`
    pub fn sample<F, R>(&self, tracer: &Tracer<'_, F>, point: Point2<f64>, rng: &mut R) -> Color
    where
        F: DistanceField + ?Sized,
        R: Rng,
    {
        let n = self.samples;
        let sum = (0..n).fold(Color::zeros(), |sum, i| {
            let a = self.strategy.angle(i, n, rng);
            sum + tracer.trace(point, Vector2::new(a.cos(), a.sin()), 0)
        });
        sum / n as f64
    }
}
