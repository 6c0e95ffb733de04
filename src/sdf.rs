//! Signed distance primitives
//!
//! All functions return a negative distance inside the shape, zero on its
//! boundary and a positive distance outside.

use std::f64::consts::TAU;

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Distance to a circle of radius `radius` around `center`
pub fn circle(p: &Point2<f64>, center: &Point2<f64>, radius: f64) -> f64 {
    (p - center).magnitude() - radius
}

/// Distance to the line through `origin` with unit `normal`.
///
/// The half-plane on the normal side is outside.
pub fn plane(p: &Point2<f64>, origin: &Point2<f64>, normal: &Vector2<f64>) -> f64 {
    (p - origin).dot(normal)
}

/// Distance to a box rotated by `theta` radians with the given half extents
pub fn rect(p: &Point2<f64>, center: &Point2<f64>, theta: f64, half_extents: &Vector2<f64>) -> f64 {
    let (sin, cos) = theta.sin_cos();
    let u = p - center;
    let dx = (u.x * cos + u.y * sin).abs() - half_extents.x;
    let dy = (u.y * cos - u.x * sin).abs() - half_extents.y;
    let ax = dx.max(0.0);
    let ay = dy.max(0.0);
    dx.max(dy).min(0.0) + (ax * ax + ay * ay).sqrt()
}

/// Distance to a regular polygon with `sides` vertices on a circle of `radius`.
///
/// The offset angle is folded into the first sector, so only one edge needs
/// to be tested. One vertex sits on the positive x axis.
pub fn ngon(p: &Point2<f64>, center: &Point2<f64>, radius: f64, sides: u32) -> f64 {
    let u = p - center;
    let sector = TAU / sides as f64;
    let folded = (u.y.atan2(u.x) + TAU).rem_euclid(sector);
    let s = u.magnitude();
    let local = Point2::new(s * folded.cos(), s * folded.sin());
    let half = sector * 0.5;
    plane(&local, &Point2::new(radius, 0.0), &Vector2::new(half.cos(), half.sin()))
}

/// Geometry of a single scene entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Circle {
        center: Point2<f64>,
        radius: f64,
    },
    Plane {
        origin: Point2<f64>,
        normal: Vector2<f64>,
    },
    Box {
        center: Point2<f64>,
        #[serde(default)]
        theta: f64,
        half_extents: Vector2<f64>,
    },
    Ngon {
        center: Point2<f64>,
        radius: f64,
        sides: u32,
    },
}

impl Shape {
    pub fn circle(cx: f64, cy: f64, radius: f64) -> Self {
        Shape::Circle { center: Point2::new(cx, cy), radius }
    }

    pub fn plane(px: f64, py: f64, nx: f64, ny: f64) -> Self {
        Shape::Plane { origin: Point2::new(px, py), normal: Vector2::new(nx, ny) }
    }

    pub fn rect(cx: f64, cy: f64, theta: f64, sx: f64, sy: f64) -> Self {
        Shape::Box { center: Point2::new(cx, cy), theta, half_extents: Vector2::new(sx, sy) }
    }

    pub fn ngon(cx: f64, cy: f64, radius: f64, sides: u32) -> Self {
        Shape::Ngon { center: Point2::new(cx, cy), radius, sides }
    }

    pub fn distance(&self, p: &Point2<f64>) -> f64 {
        match self {
            Shape::Circle { center, radius } => circle(p, center, *radius),
            Shape::Plane { origin, normal } => plane(p, origin, normal),
            Shape::Box { center, theta, half_extents } => rect(p, center, *theta, half_extents),
            Shape::Ngon { center, radius, sides } => ngon(p, center, *radius, *sides),
        }
    }

    /// Reject degenerate geometry before it reaches the tracer
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Shape::Circle { radius, .. } if !(*radius > 0.0) => Err(ConfigError::Validation(
                format!("circle radius must be positive, got {}", radius),
            )),
            Shape::Plane { normal, .. } if (normal.magnitude() - 1.0).abs() > 1e-3 => {
                Err(ConfigError::Validation(format!(
                    "plane normal must be unit length, got [{}, {}]",
                    normal.x, normal.y
                )))
            }
            Shape::Box { half_extents, .. } if !(half_extents.x > 0.0 && half_extents.y > 0.0) => {
                Err(ConfigError::Validation(format!(
                    "box half extents must be positive, got [{}, {}]",
                    half_extents.x, half_extents.y
                )))
            }
            Shape::Ngon { radius, sides, .. } => {
                if *sides < 3 {
                    Err(ConfigError::Validation(format!("ngon needs at least 3 sides, got {}", sides)))
                } else if !(*radius > 0.0) {
                    Err(ConfigError::Validation(format!("ngon radius must be positive, got {}", radius)))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }
}
