//! Finite-difference surface normals

use nalgebra::{Point2, Vector2};

use crate::scene::DistanceField;

/// Central-difference gradient of the field's distance at `p`.
///
/// The result is not normalized. For an exact SDF its length is close to one,
/// and the tracer folds the normalization into a division by the squared
/// length. A vanishing gradient (e.g. at the center of a circle) is not
/// guarded against; surface hits never land there for the supported shapes.
pub fn gradient<F: DistanceField + ?Sized>(field: &F, p: &Point2<f64>, step: f64) -> Vector2<f64> {
    let dx = Vector2::new(step, 0.0);
    let dy = Vector2::new(0.0, step);
    let scale = 0.5 / step;
    Vector2::new(
        (field.distance(&(p + dx)) - field.distance(&(p - dx))) * scale,
        (field.distance(&(p + dy)) - field.distance(&(p - dy))) * scale,
    )
}
