/// Frame-driven camera animation and direct manipulation of the main view
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::config::{ANIMATION_EPSILON_SQ, ANIMATION_LERP, PRESET_DISTANCE};
use crate::error::VizError;
use crate::projection::Camera;

/// Camera placement around the origin, angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spherical {
    pub horizontal_deg: f32,
    pub vertical_deg: f32,
    pub distance: f32,
}

impl Spherical {
    pub fn new(horizontal_deg: f32, vertical_deg: f32, distance: f32) -> Self {
        Self {
            horizontal_deg,
            vertical_deg,
            distance,
        }
    }

    pub fn to_cartesian(&self) -> Point3<f32> {
        let h = self.horizontal_deg.to_radians();
        let v = self.vertical_deg.to_radians();
        Point3::new(
            self.distance * v.cos() * h.sin(),
            self.distance * v.sin(),
            self.distance * v.cos() * h.cos(),
        )
    }

    pub fn from_cartesian(offset: &Vector3<f32>) -> Self {
        let distance = offset.norm();
        if distance < 1e-6 {
            return Self::new(0.0, 0.0, 0.0);
        }
        Self {
            horizontal_deg: offset.x.atan2(offset.z).to_degrees(),
            vertical_deg: (offset.y / distance).clamp(-1.0, 1.0).asin().to_degrees(),
            distance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewPreset {
    Top,
    Front,
    Side,
    Isometric,
}

impl ViewPreset {
    pub const ALL: [ViewPreset; 4] = [
        ViewPreset::Top,
        ViewPreset::Front,
        ViewPreset::Side,
        ViewPreset::Isometric,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ViewPreset::Top => "top",
            ViewPreset::Front => "front",
            ViewPreset::Side => "side",
            ViewPreset::Isometric => "isometric",
        }
    }

    pub fn spherical(self) -> Spherical {
        match self {
            ViewPreset::Top => Spherical::new(0.0, 90.0, PRESET_DISTANCE),
            ViewPreset::Front => Spherical::new(0.0, 0.0, PRESET_DISTANCE),
            ViewPreset::Side => Spherical::new(90.0, 0.0, PRESET_DISTANCE),
            ViewPreset::Isometric => Spherical::new(45.0, 35.0, PRESET_DISTANCE),
        }
    }
}

impl fmt::Display for ViewPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ViewPreset {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ViewPreset::ALL
            .into_iter()
            .find(|preset| preset.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| VizError::UnknownView(s.to_string()))
    }
}

/// What currently controls the main camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraMotion {
    Idle,
    Animating { target: Point3<f32> },
    UserDragging,
}

/// Drives the main camera toward preset positions one tick at a time.
///
/// A drag in progress always wins: it cancels a running animation and
/// requests made while dragging are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraAnimator {
    motion: CameraMotion,
    lerp: f32,
    epsilon_sq: f32,
}

impl Default for CameraAnimator {
    fn default() -> Self {
        Self::new(ANIMATION_LERP, ANIMATION_EPSILON_SQ)
    }
}

impl CameraAnimator {
    pub fn new(lerp: f32, epsilon_sq: f32) -> Self {
        Self {
            motion: CameraMotion::Idle,
            lerp,
            epsilon_sq,
        }
    }

    pub fn motion(&self) -> CameraMotion {
        self.motion
    }

    pub fn is_dragging(&self) -> bool {
        self.motion == CameraMotion::UserDragging
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.motion, CameraMotion::Animating { .. })
    }

    /// Start (or retarget) an animation. Returns `false` when ignored
    /// because the user is dragging.
    pub fn animate_to(&mut self, target: Point3<f32>) -> bool {
        if self.is_dragging() {
            debug!("animation request ignored during drag");
            return false;
        }
        self.motion = CameraMotion::Animating { target };
        true
    }

    pub fn animate_to_preset(&mut self, preset: ViewPreset) -> bool {
        debug!(%preset, "camera preset requested");
        self.animate_to(preset.spherical().to_cartesian())
    }

    /// Advance one frame. Returns whether the camera moved.
    pub fn step(&mut self, camera: &mut Camera) -> bool {
        let CameraMotion::Animating { target } = self.motion else {
            return false;
        };

        camera.position += (target - camera.position) * self.lerp;
        camera.target = Point3::origin();

        if (target - camera.position).norm_squared() < self.epsilon_sq {
            camera.position = target;
            self.motion = CameraMotion::Idle;
            debug!("camera animation finished");
        }
        true
    }

    /// Place the camera directly, cancelling any animation. Ignored while
    /// dragging.
    pub fn set_position(&mut self, camera: &mut Camera, placement: Spherical) -> bool {
        if self.is_dragging() {
            return false;
        }
        self.motion = CameraMotion::Idle;
        camera.position = placement.to_cartesian();
        camera.target = Point3::origin();
        true
    }

    pub fn begin_drag(&mut self) {
        if self.is_animating() {
            debug!("drag cancelled camera animation");
        }
        self.motion = CameraMotion::UserDragging;
    }

    /// Orbit around the look-at target by angle deltas in degrees
    pub fn orbit(&mut self, camera: &mut Camera, dh_deg: f32, dv_deg: f32) {
        if !self.is_dragging() {
            return;
        }
        let mut placement = Spherical::from_cartesian(&(camera.position - camera.target));
        placement.horizontal_deg += dh_deg;
        placement.vertical_deg = (placement.vertical_deg + dv_deg).clamp(-89.0, 89.0);
        camera.position = camera.target + placement.to_cartesian().coords;
    }

    /// Slide camera and target together along the screen axes
    pub fn pan(&mut self, camera: &mut Camera, dx: f32, dy: f32) {
        if !self.is_dragging() {
            return;
        }
        let forward = (camera.target - camera.position)
            .try_normalize(1e-6)
            .unwrap_or(-Vector3::z());
        let right = forward
            .cross(&camera.up)
            .try_normalize(1e-6)
            .unwrap_or(Vector3::x());
        let up = right.cross(&forward);
        let delta = right * dx + up * dy;
        camera.position += delta;
        camera.target += delta;
    }

    /// Finish a drag; the look-at target returns to the origin.
    pub fn end_drag(&mut self, camera: &mut Camera) {
        if !self.is_dragging() {
            return;
        }
        self.motion = CameraMotion::Idle;
        camera.target = Point3::origin();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera_at(position: Point3<f32>) -> Camera {
        Camera {
            position,
            ..Camera::perspective(800, 600)
        }
    }

    #[test]
    fn test_spherical_conversion() {
        let front = ViewPreset::Front.spherical().to_cartesian();
        assert_relative_eq!(front, Point3::new(0.0, 0.0, 12.0), epsilon = 1e-5);

        let side = ViewPreset::Side.spherical().to_cartesian();
        assert_relative_eq!(side, Point3::new(12.0, 0.0, 0.0), epsilon = 1e-5);

        let top = ViewPreset::Top.spherical().to_cartesian();
        assert_relative_eq!(top.y, 12.0, epsilon = 1e-5);
    }

    #[test]
    fn test_spherical_round_trip_through_cartesian() {
        let placement = Spherical::new(45.0, 35.0, 12.0);
        let back = Spherical::from_cartesian(&placement.to_cartesian().coords);
        assert_relative_eq!(back.horizontal_deg, 45.0, epsilon = 1e-3);
        assert_relative_eq!(back.vertical_deg, 35.0, epsilon = 1e-3);
        assert_relative_eq!(back.distance, 12.0, epsilon = 1e-4);
    }

    #[test]
    fn test_step_moves_five_percent() {
        let mut animator = CameraAnimator::default();
        let mut camera = camera_at(Point3::new(0.0, 0.0, 12.0));
        animator.animate_to(Point3::new(12.0, 0.0, 12.0));

        assert!(animator.step(&mut camera));
        assert_relative_eq!(camera.position.x, 0.6, epsilon = 1e-5);
        assert_eq!(camera.target, Point3::origin());
    }

    #[test]
    fn test_animation_converges_and_snaps() {
        let mut animator = CameraAnimator::default();
        let mut camera = camera_at(Point3::new(0.0, 0.0, 5.0));
        let target = ViewPreset::Isometric.spherical().to_cartesian();
        animator.animate_to(target);

        let mut ticks = 0;
        while animator.step(&mut camera) {
            ticks += 1;
            assert!(ticks < 1000, "animation did not converge");
        }
        assert_eq!(camera.position, target);
        assert_eq!(animator.motion(), CameraMotion::Idle);
    }

    #[test]
    fn test_drag_preempts_animation() {
        let mut animator = CameraAnimator::default();
        let mut camera = camera_at(Point3::new(0.0, 0.0, 5.0));
        animator.animate_to_preset(ViewPreset::Top);
        animator.begin_drag();

        assert!(!animator.step(&mut camera));
        assert!(!animator.animate_to_preset(ViewPreset::Front));
        assert!(!animator.set_position(&mut camera, Spherical::new(0.0, 0.0, 3.0)));
        assert_eq!(camera.position, Point3::new(0.0, 0.0, 5.0));
    }

    #[test]
    fn test_set_position_cancels_animation() {
        let mut animator = CameraAnimator::default();
        let mut camera = camera_at(Point3::new(0.0, 0.0, 5.0));
        animator.animate_to_preset(ViewPreset::Side);
        assert!(animator.set_position(&mut camera, Spherical::new(0.0, 0.0, 8.0)));
        assert!(!animator.is_animating());
        assert_relative_eq!(camera.position.z, 8.0, epsilon = 1e-5);
    }

    #[test]
    fn test_orbit_keeps_distance() {
        let mut animator = CameraAnimator::default();
        let mut camera = camera_at(Point3::new(0.0, 0.0, 10.0));
        animator.begin_drag();
        animator.orbit(&mut camera, 90.0, 0.0);
        assert_relative_eq!(camera.position.x, 10.0, epsilon = 1e-4);
        assert_relative_eq!((camera.position - camera.target).norm(), 10.0, epsilon = 1e-4);
    }

    #[test]
    fn test_pan_drifts_target_until_drag_ends() {
        let mut animator = CameraAnimator::default();
        let mut camera = camera_at(Point3::new(0.0, 0.0, 10.0));
        animator.begin_drag();
        animator.pan(&mut camera, 1.0, 0.0);
        assert_relative_eq!(camera.target.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(camera.position.x, 1.0, epsilon = 1e-5);

        animator.end_drag(&mut camera);
        assert_eq!(camera.target, Point3::origin());
        assert_eq!(animator.motion(), CameraMotion::Idle);
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!("Isometric".parse::<ViewPreset>().unwrap(), ViewPreset::Isometric);
        assert!("diagonal".parse::<ViewPreset>().is_err());
    }
}
