/// Camera and projection utilities
use nalgebra::{Matrix4, Point3, Vector3};

use crate::config::{CAMERA_FAR, CAMERA_NEAR, PERSPECTIVE_FOV_DEG};

/// Projection parameters of a camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        fov_y: f32,
        aspect: f32,
    },
    /// Half extents of the view volume around the line of sight
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
    },
}

/// Width over height, treating an unmeasured container as square
pub fn container_aspect(width: u32, height: u32) -> f32 {
    if width == 0 || height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

/// Camera configuration for 3D rendering
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub near: f32,
    pub far: f32,
    pub projection: Projection,
}

impl Camera {
    /// Perspective camera for a surface of the given pixel size
    pub fn perspective(width: u32, height: u32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::origin(),
            up: Vector3::y(),
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            projection: Projection::Perspective {
                fov_y: PERSPECTIVE_FOV_DEG.to_radians(),
                aspect: container_aspect(width, height),
            },
        }
    }

    /// Orthographic camera on the +Z axis looking at the origin
    pub fn orthographic(distance: f32, half_extent: f32) -> Self {
        Self {
            position: Point3::new(0.0, 0.0, distance),
            target: Point3::origin(),
            up: Vector3::y(),
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
            projection: Projection::Orthographic {
                left: -half_extent,
                right: half_extent,
                top: half_extent,
                bottom: -half_extent,
            },
        }
    }

    pub fn is_orthographic(&self) -> bool {
        matches!(self.projection, Projection::Orthographic { .. })
    }

    /// Update the aspect ratio of a perspective camera
    pub fn set_aspect(&mut self, aspect: f32) {
        if let Projection::Perspective { aspect: current, .. } = &mut self.projection {
            *current = aspect;
        }
    }

    /// Size an orthographic frustum so one world unit covers the same number
    /// of pixels horizontally and vertically.
    pub fn fit_orthographic(&mut self, base_view_size: f32, aspect: f32) {
        if let Projection::Orthographic {
            left,
            right,
            top,
            bottom,
        } = &mut self.projection
        {
            let half_width = base_view_size * aspect.max(1.0);
            let half_height = base_view_size / aspect.min(1.0);
            *left = -half_width;
            *right = half_width;
            *top = half_height;
            *bottom = -half_height;
        }
    }

    /// Horizontal and vertical half extents of an orthographic camera
    pub fn half_extents(&self) -> Option<(f32, f32)> {
        match self.projection {
            Projection::Orthographic { right, top, .. } => Some((right, top)),
            Projection::Perspective { .. } => None,
        }
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.effective_up())
    }

    /// The up vector, swapped for ±Z when looking straight along it
    fn effective_up(&self) -> Vector3<f32> {
        let forward = self.target - self.position;
        if forward.cross(&self.up).norm_squared() > 1e-10 * forward.norm_squared() {
            self.up
        } else {
            Vector3::new(0.0, 0.0, forward.y.signum())
        }
    }

    /// Create the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        match self.projection {
            Projection::Perspective { fov_y, aspect } => {
                Matrix4::new_perspective(aspect, fov_y, self.near, self.far)
            }
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
            } => Matrix4::new_orthographic(left, right, bottom, top, self.near, self.far),
        }
    }

    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world-space point to screen space.
    ///
    /// Returns `(x, y, depth)` with `x`/`y` in pixels (possibly off-screen)
    /// and depth in normalized device units, or `None` when the point lies
    /// outside the near/far range.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        view_projection: &Matrix4<f32>,
        width: u32,
        height: u32,
    ) -> Option<(f32, f32, f32)> {
        let clip = view_projection * point.to_homogeneous();

        // Prevent division by near-zero w values
        if clip.w.abs() < 1e-6 {
            return None;
        }

        let ndc_x = clip.x / clip.w;
        let ndc_y = clip.y / clip.w;
        let depth = clip.z / clip.w;

        if !(-1.0..=1.0).contains(&depth) {
            return None;
        }

        // Convert to screen space
        let screen_x = (ndc_x + 1.0) * 0.5 * width as f32;
        let screen_y = (1.0 - ndc_y) * 0.5 * height as f32;

        Some((screen_x, screen_y, depth))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(800, 600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::perspective(800, 600);
        assert!(!camera.is_orthographic());
        match camera.projection {
            Projection::Perspective { aspect, .. } => {
                assert!((aspect - 800.0 / 600.0).abs() < 1e-6)
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_view_matrix() {
        let camera = Camera::perspective(800, 600);
        let view = camera.view_matrix();
        // View matrix should be non-zero
        assert!(view.norm() > 0.0);
    }

    #[test]
    fn test_fit_orthographic_keeps_square_cells() {
        let mut camera = Camera::orthographic(20.0, 1.0);

        camera.fit_orthographic(4.5, 2.0);
        assert_eq!(camera.half_extents(), Some((9.0, 4.5)));

        camera.fit_orthographic(4.5, 0.5);
        assert_eq!(camera.half_extents(), Some((4.5, 9.0)));
    }

    #[test]
    fn test_fit_ignores_perspective() {
        let mut camera = Camera::perspective(100, 100);
        let before = camera;
        camera.fit_orthographic(3.0, 1.0);
        assert_eq!(camera, before);
    }

    #[test]
    fn test_orthographic_projects_origin_to_center() {
        let camera = Camera::orthographic(20.0, 5.0);
        let (x, y, _) = camera
            .project_to_screen(&Point3::origin(), &camera.view_projection(), 100, 50)
            .unwrap();
        assert!((x - 50.0).abs() < 1e-4);
        assert!((y - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_looking_straight_down_stays_finite() {
        let camera = Camera {
            position: Point3::new(0.0, 12.0, 0.0),
            ..Camera::perspective(100, 100)
        };
        let view = camera.view_matrix();
        assert!(view.iter().all(|v| v.is_finite()));
        let (_, y, _) = camera
            .project_to_screen(&Point3::new(0.0, 0.0, 1.0), &camera.view_projection(), 100, 100)
            .unwrap();
        // +Z (the front of the shape) ends up at the bottom of the screen
        assert!(y > 50.0);
    }

    #[test]
    fn test_container_aspect_guards_zero() {
        assert_eq!(container_aspect(0, 10), 1.0);
        assert_eq!(container_aspect(300, 150), 2.0);
    }
}
