//! Scene composition
//!
//! A scene is an ordered list of shapes with materials, reduced left to right
//! through boolean operators into a single distance and material field.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::sdf::Shape;
use crate::Color;

/// Surface and volume properties of a scene entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Fraction of light mirrored at the surface, in [0, 1]
    pub reflectivity: f64,
    /// Index of refraction; zero marks an opaque surface
    pub eta: f64,
    pub emissive: Color,
    /// Beer-Lambert absorption coefficient per channel
    pub absorption: Color,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            reflectivity: 0.0,
            eta: 0.0,
            emissive: Color::zeros(),
            absorption: Color::zeros(),
        }
    }
}

impl Material {
    /// Opaque light source with equal channels
    pub fn emitter(intensity: f64) -> Self {
        Self {
            emissive: Color::repeat(intensity),
            ..Self::default()
        }
    }

    pub fn emitter_rgb(emissive: Color) -> Self {
        Self { emissive, ..Self::default() }
    }

    pub fn dielectric(reflectivity: f64, eta: f64) -> Self {
        Self {
            reflectivity,
            eta,
            ..Self::default()
        }
    }

    pub fn with_absorption(mut self, absorption: Color) -> Self {
        self.absorption = absorption;
        self
    }

    pub fn is_dielectric(&self) -> bool {
        self.eta > 0.0
    }

    /// True when a hit on this material spawns secondary rays
    pub fn scatters(&self) -> bool {
        self.reflectivity > 0.0 || self.eta > 0.0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.reflectivity) {
            return Err(ConfigError::Validation(format!(
                "reflectivity must be within [0, 1], got {}",
                self.reflectivity
            )));
        }
        if !(self.eta >= 0.0 && self.eta.is_finite()) {
            return Err(ConfigError::Validation(format!(
                "eta must be zero (opaque) or a positive index, got {}",
                self.eta
            )));
        }
        if self.emissive.iter().any(|c| !(*c >= 0.0)) {
            return Err(ConfigError::Validation("emissive color must be non-negative".to_string()));
        }
        if self.absorption.iter().any(|c| !(*c >= 0.0)) {
            return Err(ConfigError::Validation("absorption must be non-negative".to_string()));
        }
        Ok(())
    }
}

/// Result of evaluating a scene at a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSample {
    /// Negative inside, positive outside
    pub distance: f64,
    pub material: Material,
}

impl SurfaceSample {
    pub fn new(distance: f64, material: Material) -> Self {
        Self { distance, material }
    }
}

/// Boolean operator combining the accumulated field with the next entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CsgOp {
    #[default]
    Union,
    Intersect,
    Subtract,
}

impl CsgOp {
    pub fn apply(&self, a: SurfaceSample, b: SurfaceSample) -> SurfaceSample {
        match self {
            CsgOp::Union => union(a, b),
            CsgOp::Intersect => intersect(a, b),
            CsgOp::Subtract => subtract(a, b),
        }
    }
}

/// Keep the nearer surface
pub fn union(a: SurfaceSample, b: SurfaceSample) -> SurfaceSample {
    if a.distance < b.distance {
        a
    } else {
        b
    }
}

/// Keep the farther surface
pub fn intersect(a: SurfaceSample, b: SurfaceSample) -> SurfaceSample {
    if a.distance > b.distance {
        a
    } else {
        b
    }
}

/// Carve `b` out of `a`, keeping the material of `a`
pub fn subtract(a: SurfaceSample, b: SurfaceSample) -> SurfaceSample {
    SurfaceSample {
        distance: a.distance.max(-b.distance),
        material: a.material,
    }
}

/// One shape of a scene and how it joins the entries before it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntry {
    /// Ignored for the first entry, which seeds the reduction
    #[serde(default)]
    pub op: CsgOp,
    pub shape: Shape,
    #[serde(default)]
    pub material: Material,
}

impl SceneEntry {
    pub fn new(shape: Shape, material: Material) -> Self {
        Self {
            op: CsgOp::Union,
            shape,
            material,
        }
    }

    pub fn with_op(mut self, op: CsgOp) -> Self {
        self.op = op;
        self
    }

    pub fn sample(&self, p: &Point2<f64>) -> SurfaceSample {
        SurfaceSample::new(self.shape.distance(p), self.material)
    }
}

/// Anything that maps a point of the plane to a surface sample
pub trait DistanceField: Sync {
    fn sample(&self, p: &Point2<f64>) -> SurfaceSample;

    fn distance(&self, p: &Point2<f64>) -> f64 {
        self.sample(p).distance
    }
}

/// Immutable composed scene
#[derive(Debug, Clone)]
pub struct Scene {
    entries: Vec<SceneEntry>,
}

impl Scene {
    pub fn new(entries: Vec<SceneEntry>) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::Validation("scene has no entries".to_string()));
        }
        for (i, entry) in entries.iter().enumerate() {
            entry
                .shape
                .validate()
                .and_then(|_| entry.material.validate())
                .map_err(|e| match e {
                    ConfigError::Validation(msg) => ConfigError::Validation(format!("scene entry {}: {}", i, msg)),
                    other => other,
                })?;
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    pub fn has_dielectrics(&self) -> bool {
        self.entries.iter().any(|e| e.material.is_dielectric())
    }
}

impl DistanceField for Scene {
    fn sample(&self, p: &Point2<f64>) -> SurfaceSample {
        let mut entries = self.entries.iter();
        match entries.next() {
            Some(first) => entries.fold(first.sample(p), |acc, entry| entry.op.apply(acc, entry.sample(p))),
            None => SurfaceSample::new(f64::INFINITY, Material::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(d: f64, tag: f64) -> SurfaceSample {
        SurfaceSample::new(d, Material::emitter(tag))
    }

    #[test]
    fn test_operators_on_sampled_pairs() {
        let values = [-0.7, -0.2, -0.0, 0.0, 0.05, 0.3, 1.25];
        for &a in &values {
            for &b in &values {
                let (sa, sb) = (sample(a, 1.0), sample(b, 2.0));
                assert_eq!(union(sa, sb).distance, a.min(b));
                assert_eq!(intersect(sa, sb).distance, a.max(b));
                assert_eq!(subtract(sa, sb).distance, a.max(-b));
                assert_eq!(subtract(sa, sb).material, sa.material);
            }
        }
    }

    #[test]
    fn test_operators_propagate_winner_material() {
        let near = sample(0.1, 1.0);
        let far = sample(0.4, 2.0);
        assert_eq!(union(near, far).material, near.material);
        assert_eq!(union(far, near).material, near.material);
        assert_eq!(intersect(near, far).material, far.material);
        assert_eq!(CsgOp::Subtract.apply(far, near).material, far.material);
    }

    #[test]
    fn test_scene_reduces_left_to_right() {
        // c U (f - (g U h)) written as the fold f, -g, -h, U c
        let scene = Scene::new(vec![
            SceneEntry::new(Shape::rect(0.5, 0.5, 0.0, 0.2, 0.1), Material::dielectric(0.2, 1.5)),
            SceneEntry::new(Shape::circle(0.5, 0.12, 0.35), Material::dielectric(0.2, 1.5))
                .with_op(CsgOp::Subtract),
            SceneEntry::new(Shape::circle(0.5, 0.87, 0.35), Material::dielectric(0.2, 1.5))
                .with_op(CsgOp::Subtract),
            SceneEntry::new(Shape::circle(0.5, -0.5, 0.05), Material::emitter(20.0)),
        ])
        .unwrap();

        for i in 0..20 {
            for j in 0..20 {
                let p = Point2::new(i as f64 / 19.0, j as f64 / 19.0);
                let f = Shape::rect(0.5, 0.5, 0.0, 0.2, 0.1).distance(&p);
                let g = Shape::circle(0.5, 0.12, 0.35).distance(&p);
                let h = Shape::circle(0.5, 0.87, 0.35).distance(&p);
                let c = Shape::circle(0.5, -0.5, 0.05).distance(&p);
                let expected = c.min(f.max(-g.min(h)));
                assert!((scene.distance(&p) - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_first_entry_op_is_ignored() {
        let a = Scene::new(vec![SceneEntry::new(Shape::circle(0.5, 0.5, 0.1), Material::emitter(1.0))
            .with_op(CsgOp::Subtract)])
        .unwrap();
        let p = Point2::new(0.5, 0.5);
        assert!((a.distance(&p) + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_scene_validation() {
        assert!(matches!(Scene::new(vec![]), Err(ConfigError::Validation(_))));

        let bad_material = Material {
            reflectivity: 1.5,
            ..Material::default()
        };
        let result = Scene::new(vec![SceneEntry::new(Shape::circle(0.5, 0.5, 0.1), bad_material)]);
        assert!(result.is_err());

        let negative_eta = Material::dielectric(0.0, -1.0);
        assert!(negative_eta.validate().is_err());
        assert!(Material::emitter(-1.0).validate().is_err());
        assert!(Material::default().with_absorption(Color::new(0.0, -1.0, 0.0)).validate().is_err());
    }

    #[test]
    fn test_material_yaml_defaults() {
        let m: Material = serde_yaml::from_str("eta: 1.5\nabsorption: [4.0, 4.0, 1.0]\n").unwrap();
        assert_eq!(m.eta, 1.5);
        assert_eq!(m.reflectivity, 0.0);
        assert_eq!(m.emissive, Color::zeros());
        assert_eq!(m.absorption, Color::new(4.0, 4.0, 1.0));
        assert!(m.scatters());
        assert!(!Material::emitter(2.0).scatters());
    }

    #[test]
    fn test_entry_yaml() {
        let yaml = r#"
op: subtract
shape:
  type: circle
  center: [0.5, 0.12]
  radius: 0.35
material:
  reflectivity: 0.2
  eta: 1.5
"#;
        let entry: SceneEntry = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entry.op, CsgOp::Subtract);
        assert_eq!(entry.shape, Shape::circle(0.5, 0.12, 0.35));
        assert_eq!(entry.material, Material::dielectric(0.2, 1.5));
    }
}
