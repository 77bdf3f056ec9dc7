/// 3D transformation matrices and per-object placement
use nalgebra::{Matrix4, Translation3, Unit, UnitQuaternion, Vector3};
use std::f32::consts::FRAC_PI_2;

/// Orientation, uniform scale and translation of one renderable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    pub orientation: UnitQuaternion<f32>,
    pub scale: f32,
    pub translation: Vector3<f32>,
}

impl ModelTransform {
    pub fn identity() -> Self {
        Self {
            orientation: UnitQuaternion::identity(),
            scale: 1.0,
            translation: Vector3::zeros(),
        }
    }

    pub fn oriented(orientation: UnitQuaternion<f32>) -> Self {
        Self {
            orientation,
            ..Self::identity()
        }
    }

    /// Model matrix: scale, then rotate, then translate
    pub fn matrix(&self) -> Matrix4<f32> {
        Transform::translation_matrix(self.translation.x, self.translation.y, self.translation.z)
            * self.orientation.to_homogeneous()
            * Transform::scale_matrix(self.scale, self.scale, self.scale)
    }
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// A quarter turn (90°) about `axis`, counter-clockwise looking down it
    pub fn quarter_turn(axis: Vector3<f32>) -> UnitQuaternion<f32> {
        Self::rotation(axis, FRAC_PI_2)
    }

    pub fn rotation(axis: Vector3<f32>, angle: f32) -> UnitQuaternion<f32> {
        UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis), angle)
    }

    /// Create a rotation matrix about `axis`
    pub fn rotation_matrix(axis: Vector3<f32>, angle: f32) -> Matrix4<f32> {
        Self::rotation(axis, angle).to_homogeneous()
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Translation3::new(x, y, z).to_homogeneous()
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn test_identity_transform() {
        let matrix = ModelTransform::identity().matrix();
        assert!((matrix - Matrix4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_quarter_turn_about_x_maps_up_to_forward() {
        let turn = Transform::quarter_turn(Vector3::x());
        let up = turn * Vector3::y();
        assert!((up - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn test_scale_applies_before_translation() {
        let placement = ModelTransform {
            scale: 2.0,
            translation: Vector3::new(1.0, 0.0, 0.0),
            ..ModelTransform::identity()
        };
        let moved = placement.matrix().transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert!((moved - Point3::new(3.0, 0.0, 0.0)).norm() < 1e-6);
    }
}
