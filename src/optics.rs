//! Geometric optics helpers shared by the tracer

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::Color;

/// Reflect a vector around a normal
pub fn reflect(incident: &Vector2<f64>, normal: &Vector2<f64>) -> Vector2<f64> {
    incident - normal * (2.0 * incident.dot(normal))
}

/// Refract a vector through a surface using Snell's law.
///
/// `eta` is the ratio of the incident to the transmitted index of refraction.
/// Returns `None` on total internal reflection.
pub fn refract(incident: &Vector2<f64>, normal: &Vector2<f64>, eta: f64) -> Option<Vector2<f64>> {
    let idotn = incident.dot(normal);
    let k = 1.0 - eta * eta * (1.0 - idotn * idotn);
    if k < 0.0 {
        return None;
    }
    Some(incident * eta - normal * (eta * idotn + k.sqrt()))
}

/// Unpolarized Fresnel reflectance, the mean of the s and p terms
pub fn fresnel(cos_i: f64, cos_t: f64, eta_i: f64, eta_t: f64) -> f64 {
    let rs = (eta_t * cos_i - eta_i * cos_t) / (eta_t * cos_i + eta_i * cos_t);
    let rp = (eta_i * cos_i - eta_t * cos_t) / (eta_i * cos_i + eta_t * cos_t);
    (rs * rs + rp * rp) * 0.5
}

/// Schlick's approximation for reflectance
pub fn schlick(cos_i: f64, cos_t: f64, eta_i: f64, eta_t: f64) -> f64 {
    let r0 = (eta_i - eta_t) / (eta_i + eta_t);
    let r0 = r0 * r0;
    let a = 1.0 - if eta_i < eta_t { cos_i } else { cos_t };
    r0 + (1.0 - r0) * a.powi(5)
}

/// Per-channel Beer-Lambert transmittance over `distance`
pub fn beer_lambert(absorption: &Color, distance: f64) -> Color {
    absorption.map(|a| (-a * distance).exp())
}

/// How the tracer weights reflection against transmission at a dielectric
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReflectanceModel {
    #[default]
    Fresnel,
    Schlick,
}

impl ReflectanceModel {
    /// Reflectance clamped to [0, 1]
    pub fn reflectance(&self, cos_i: f64, cos_t: f64, eta_i: f64, eta_t: f64) -> f64 {
        let r = match self {
            ReflectanceModel::Fresnel => fresnel(cos_i, cos_t, eta_i, eta_t),
            ReflectanceModel::Schlick => schlick(cos_i, cos_t, eta_i, eta_t),
        };
        r.clamp(0.0, 1.0)
    }
}
