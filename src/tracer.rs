//! Recursive sphere-marching tracer
//!
//! A ray marches through the distance field until it reaches a surface. At a
//! hit the surface emission is collected and, for reflective or dielectric
//! materials, reflected and refracted rays are traced recursively and blended
//! by Fresnel reflectance. The result is attenuated by Beer-Lambert absorption
//! over the marched distance.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::gradient::gradient;
use crate::optics::{beer_lambert, reflect, refract, ReflectanceModel};
use crate::scene::{DistanceField, Material};
use crate::Color;

/// Bounds and tolerances of the tracer.
///
/// `max_step`, `max_depth` and `max_distance` are the only limits on the
/// work done per ray.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Sphere-tracing iterations per ray
    pub max_step: u32,
    /// Recursion depth for reflected and refracted rays
    pub max_depth: u32,
    pub max_distance: f64,
    /// Surface hit threshold
    pub epsilon: f64,
    /// Initial march distance, keeps a ray from re-hitting its own origin
    pub start_offset: f64,
    /// Offset of secondary ray origins along the normal
    pub bias: f64,
    /// Finite-difference step of the gradient estimator
    pub gradient_step: f64,
    pub reflectance: ReflectanceModel,
    /// March every ray on the unsigned field, so a ray starting inside a
    /// shape hits it at once instead of travelling to its boundary
    pub interior_is_hit: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            max_step: 64,
            max_depth: 3,
            max_distance: 5.0,
            epsilon: 1e-6,
            start_offset: 1e-3,
            bias: 1e-4,
            gradient_step: 1e-6,
            reflectance: ReflectanceModel::Fresnel,
            interior_is_hit: false,
        }
    }
}

impl TraceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_step == 0 {
            return Err(ConfigError::Validation("tracer.max_step must be at least 1".to_string()));
        }
        let positive = [
            ("max_distance", self.max_distance),
            ("epsilon", self.epsilon),
            ("gradient_step", self.gradient_step),
        ];
        for (name, value) in positive {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::Validation(format!("tracer.{} must be positive, got {}", name, value)));
            }
        }
        let non_negative = [("start_offset", self.start_offset), ("bias", self.bias)];
        for (name, value) in non_negative {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::Validation(format!(
                    "tracer.{} must be non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// A ray in the plane
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point2<f64>,
    /// Unit direction
    pub direction: Vector2<f64>,
    pub depth: u32,
}

impl Ray {
    pub fn new(origin: Point2<f64>, direction: Vector2<f64>, depth: u32) -> Self {
        Self { origin, direction, depth }
    }

    pub fn at(&self, t: f64) -> Point2<f64> {
        self.origin + self.direction * t
    }
}

/// Work counters collected by [`Tracer::trace_counted`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TraceStats {
    /// Primary and secondary rays marched
    pub rays: u64,
    pub hits: u64,
    /// Most sphere-tracing iterations taken by a single ray
    pub max_steps: u32,
    /// Deepest recursion level reached
    pub max_depth: u32,
}

impl TraceStats {
    fn record(&mut self, depth: u32, steps: u32, hit: bool) {
        self.rays += 1;
        self.hits += hit as u64;
        self.max_steps = self.max_steps.max(steps);
        self.max_depth = self.max_depth.max(depth);
    }
}

/// Traces rays through a distance field
pub struct Tracer<'a, F: DistanceField + ?Sized> {
    field: &'a F,
    config: TraceConfig,
}

impl<'a, F: DistanceField + ?Sized> Tracer<'a, F> {
    pub fn new(field: &'a F, config: TraceConfig) -> Self {
        Self { field, config }
    }

    /// Radiance arriving at `origin` from `direction`
    pub fn trace(&self, origin: Point2<f64>, direction: Vector2<f64>, depth: u32) -> Color {
        self.march(&Ray::new(origin, direction, depth), None)
    }

    /// Like [`Tracer::trace`], also reporting how much work the ray tree took
    pub fn trace_counted(&self, origin: Point2<f64>, direction: Vector2<f64>, depth: u32) -> (Color, TraceStats) {
        let mut stats = TraceStats::default();
        let color = self.march(&Ray::new(origin, direction, depth), Some(&mut stats));
        (color, stats)
    }

    fn march(&self, ray: &Ray, mut stats: Option<&mut TraceStats>) -> Color {
        let cfg = &self.config;
        // Rays that start inside a shape march on the negated field.
        let sign = if cfg.interior_is_hit || self.field.distance(&ray.origin) > 0.0 {
            1.0
        } else {
            -1.0
        };

        let mut t = cfg.start_offset;
        let mut steps = 0;
        while steps < cfg.max_step && t < cfg.max_distance {
            steps += 1;
            let p = ray.at(t);
            let sample = self.field.sample(&p);
            if sample.distance * sign < cfg.epsilon {
                if let Some(s) = stats.as_deref_mut() {
                    s.record(ray.depth, steps, true);
                }
                return self.shade(ray, &p, t, sign, &sample.material, stats);
            }
            t += sample.distance * sign;
        }

        if let Some(s) = stats {
            s.record(ray.depth, steps, false);
        }
        Color::zeros()
    }

    fn shade(
        &self,
        ray: &Ray,
        p: &Point2<f64>,
        t: f64,
        sign: f64,
        material: &Material,
        mut stats: Option<&mut TraceStats>,
    ) -> Color {
        let cfg = &self.config;
        let mut sum = material.emissive;

        if ray.depth < cfg.max_depth && material.scatters() {
            // Outward normal scaled by 1/|g|^2 instead of normalized.
            let g = gradient(self.field, p, cfg.gradient_step);
            let n = g * (sign / g.norm_squared());
            let d = &ray.direction;
            let mut refl = material.reflectivity;

            if material.is_dielectric() {
                let eta = if sign < 0.0 { material.eta } else { 1.0 / material.eta };
                match refract(d, &n, eta) {
                    Some(r) => {
                        let cos_i = -d.dot(&n);
                        let cos_t = -r.dot(&n);
                        refl = if sign < 0.0 {
                            cfg.reflectance.reflectance(cos_i, cos_t, material.eta, 1.0)
                        } else {
                            cfg.reflectance.reflectance(cos_i, cos_t, 1.0, material.eta)
                        };
                        let transmitted = Ray::new(p - n * cfg.bias, r, ray.depth + 1);
                        sum += self.march(&transmitted, stats.as_deref_mut()) * (1.0 - refl);
                    }
                    None => refl = 1.0,
                }
            }

            if refl > 0.0 {
                let reflected = Ray::new(p + n * cfg.bias, reflect(d, &n), ray.depth + 1);
                sum += self.march(&reflected, stats.as_deref_mut()) * refl;
            }
        }

        sum.component_mul(&beer_lambert(&material.absorption, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Scene, SceneEntry};
    use crate::scenes;
    use crate::sdf::Shape;
    use std::f64::consts::TAU;

    fn config_with_depth(max_depth: u32) -> TraceConfig {
        TraceConfig {
            max_depth,
            ..TraceConfig::default()
        }
    }

    fn opaque_scene() -> Scene {
        Scene::new(vec![
            SceneEntry::new(Shape::circle(0.8, 0.5, 0.1), Material::emitter_rgb(Color::new(10.0, 5.0, 2.0))),
            SceneEntry::new(Shape::rect(0.2, 0.2, 0.3, 0.05, 0.1), Material::emitter(3.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point2::new(0.1, 0.2), Vector2::new(1.0, 0.0), 0);
        assert!((ray.at(0.5).x - 0.6).abs() < 1e-12);
        assert_eq!(ray.at(0.5).y, 0.2);
    }

    #[test]
    fn test_opaque_hit_returns_emission_for_any_depth() {
        let scene = opaque_scene();
        for max_depth in [0, 1, 3, 8] {
            let tracer = Tracer::new(&scene, config_with_depth(max_depth));
            let c = tracer.trace(Point2::new(0.3, 0.5), Vector2::new(1.0, 0.0), 0);
            assert_eq!(c, Color::new(10.0, 5.0, 2.0));
        }
    }

    #[test]
    fn test_miss_is_black() {
        let scene = opaque_scene();
        let tracer = Tracer::new(&scene, TraceConfig::default());
        let (c, stats) = tracer.trace_counted(Point2::new(0.5, 0.5), Vector2::new(0.0, 1.0), 0);
        assert_eq!(c, Color::zeros());
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.rays, 1);
    }

    #[test]
    fn test_ray_from_inside_hits_boundary() {
        let scene = Scene::new(vec![SceneEntry::new(
            Shape::circle(0.5, 0.5, 0.1),
            Material::emitter(2.0).with_absorption(Color::new(1.0, 0.0, 3.0)),
        )])
        .unwrap();
        let tracer = Tracer::new(&scene, TraceConfig::default());
        let c = tracer.trace(Point2::new(0.5, 0.5), Vector2::new(0.0, -1.0), 0);
        // hit at t = r, attenuated over the radius
        assert!((c.x - 2.0 * (-0.1f64).exp()).abs() < 1e-5);
        assert!((c.y - 2.0).abs() < 1e-12);
        assert!((c.z - 2.0 * (-0.3f64).exp()).abs() < 1e-5);
    }

    #[test]
    fn test_mirror_reflects_emitter() {
        let mirror = Material {
            reflectivity: 1.0,
            ..Material::default()
        };
        let scene = Scene::new(vec![
            SceneEntry::new(Shape::plane(0.0, 0.2, 0.0, 1.0), mirror),
            SceneEntry::new(Shape::circle(0.7, 0.6, 0.05), Material::emitter(1.0)),
        ])
        .unwrap();
        let direction = Vector2::new(0.2, -0.4).normalize();

        let tracer = Tracer::new(&scene, config_with_depth(1));
        let c = tracer.trace(Point2::new(0.3, 0.6), direction, 0);
        assert!((c - Color::repeat(1.0)).magnitude() < 1e-6, "got {:?}", c);

        let tracer = Tracer::new(&scene, config_with_depth(0));
        assert_eq!(tracer.trace(Point2::new(0.3, 0.6), direction, 0), Color::zeros());
    }

    #[test]
    fn test_glass_slab_transmits_fresnel_weighted() {
        let scene = Scene::new(vec![
            SceneEntry::new(Shape::rect(0.5, 0.5, 0.0, 0.1, 0.3), Material::dielectric(0.0, 1.5)),
            SceneEntry::new(Shape::circle(0.9, 0.5, 0.05), Material::emitter(1.0)),
        ])
        .unwrap();
        let tracer = Tracer::new(&scene, config_with_depth(3));
        let c = tracer.trace(Point2::new(0.1, 0.5), Vector2::new(1.0, 0.0), 0);
        // two interfaces at normal incidence, 4% reflected at each
        let expected = 0.96 * 0.96;
        assert!((c.x - expected).abs() < 1e-6, "got {:?}", c);
        assert_eq!(c.x, c.y);
        assert_eq!(c.y, c.z);
    }

    #[test]
    fn test_glass_slab_with_schlick_reflectance() {
        let scene = Scene::new(vec![
            SceneEntry::new(Shape::rect(0.5, 0.5, 0.0, 0.1, 0.3), Material::dielectric(0.0, 1.5)),
            SceneEntry::new(Shape::circle(0.9, 0.5, 0.05), Material::emitter(1.0)),
        ])
        .unwrap();
        let config = TraceConfig {
            reflectance: ReflectanceModel::Schlick,
            ..config_with_depth(3)
        };
        let tracer = Tracer::new(&scene, config);
        let c = tracer.trace(Point2::new(0.1, 0.5), Vector2::new(1.0, 0.0), 0);
        // Schlick reduces to r0 = 0.04 at normal incidence
        let expected = 0.96 * 0.96;
        assert!((c.x - expected).abs() < 1e-6, "got {:?}", c);
        assert_eq!(c.x, c.z);
    }

    #[test]
    fn test_interior_is_hit_returns_emission_from_inside() {
        let scene = Scene::new(vec![SceneEntry::new(
            Shape::circle(0.5, 0.5, 0.1),
            Material::emitter(2.0).with_absorption(Color::new(1.0, 0.0, 3.0)),
        )])
        .unwrap();
        let config = TraceConfig {
            max_step: 10,
            max_distance: 2.0,
            start_offset: 0.0,
            interior_is_hit: true,
            ..TraceConfig::default()
        };
        let tracer = Tracer::new(&scene, config);
        for origin in [Point2::new(0.55, 0.5), Point2::new(0.58, 0.5), Point2::new(0.59, 0.52)] {
            for i in 0..64 {
                let a = TAU * i as f64 / 64.0;
                let (c, stats) = tracer.trace_counted(origin, Vector2::new(a.cos(), a.sin()), 0);
                // hit at t = 0, so no absorption either
                assert_eq!(c, Color::repeat(2.0), "origin {:?}, angle {}", origin, a);
                assert_eq!(stats.max_steps, 1);
            }
        }
    }

    #[test]
    fn test_trace_respects_step_and_depth_bounds() {
        let preset = scenes::find("fresnel").unwrap();
        let scene = preset.scene().unwrap();
        for max_depth in [0, 1, 3, 5] {
            let config = TraceConfig {
                max_depth,
                ..preset.config().tracer
            };
            let tracer = Tracer::new(&scene, config);
            for i in 0..64 {
                let a = TAU * (i as f64 + 0.5) / 64.0;
                let (_, stats) = tracer.trace_counted(Point2::new(0.5, 0.5), Vector2::new(a.cos(), a.sin()), 0);
                assert!(stats.max_steps <= config.max_step);
                assert!(stats.max_depth <= max_depth);
                assert!(stats.rays < 1u64 << (max_depth + 1));
            }
        }
    }

    #[test]
    fn test_validate() {
        assert!(TraceConfig::default().validate().is_ok());
        let bad = TraceConfig {
            max_step: 0,
            ..TraceConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = TraceConfig {
            epsilon: 0.0,
            ..TraceConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = TraceConfig {
            bias: -1.0,
            ..TraceConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
