/// Line overlays: unit grids drawn on shapes and the fixed scene decor
use nalgebra::{Point3, Vector3};
use std::f32::consts::{PI, TAU};

use crate::config::{
    DEFAULT_RADIAL_SEGMENTS, GRID_GENERATORS, GRID_SPACING, GRID_SPHERE_LATITUDES,
    GRID_SPHERE_MERIDIANS, GRID_SURFACE_OFFSET,
};
use crate::geometry::LineSet;
use crate::shape::ShapeDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridPlane {
    XY,
    YZ,
    XZ,
}

impl GridPlane {
    pub const ALL: [GridPlane; 3] = [GridPlane::XY, GridPlane::YZ, GridPlane::XZ];

    /// Map in-plane coordinates `(u, v)` and an offset along the plane
    /// normal to a world point.
    fn point(self, u: f32, v: f32, offset: f32) -> Point3<f32> {
        match self {
            GridPlane::XY => Point3::new(u, v, offset),
            GridPlane::YZ => Point3::new(offset, u, v),
            GridPlane::XZ => Point3::new(u, offset, v),
        }
    }

    /// Pick the in-plane components out of a 3D extent
    fn span(self, extent: &Vector3<f32>) -> (f32, f32) {
        match self {
            GridPlane::XY => (extent.x, extent.y),
            GridPlane::YZ => (extent.y, extent.z),
            GridPlane::XZ => (extent.x, extent.z),
        }
    }
}

/// Steps of `spacing` from `-half` toward `half`, both ends included when
/// `with_ends` is set.
fn steps(half: f32, spacing: f32, with_ends: bool) -> Vec<f32> {
    let count = ((2.0 * half) / spacing + 1e-4).floor() as i32;
    let mut out = Vec::new();
    for i in 0..=count {
        let value = -half + i as f32 * spacing;
        let on_end = i == 0 || (half - value).abs() < 1e-4;
        if with_ends || !on_end {
            out.push(value);
        }
    }
    if with_ends && out.last().is_some_and(|last| (half - last).abs() >= 1e-4) {
        out.push(half);
    }
    out
}

/// Rectangular grid of `spacing` centered in `plane`, covering
/// `half_u` × `half_v` and lifted `offset` along the plane normal.
pub fn plane_grid(
    plane: GridPlane,
    half_u: f32,
    half_v: f32,
    offset: f32,
    spacing: f32,
    with_border: bool,
) -> LineSet {
    let mut lines = LineSet::new();
    for u in steps(half_u, spacing, with_border) {
        lines.push(plane.point(u, -half_v, offset), plane.point(u, half_v, offset));
    }
    for v in steps(half_v, spacing, with_border) {
        lines.push(plane.point(-half_u, v, offset), plane.point(half_u, v, offset));
    }
    lines
}

fn ring(radius: f32, y: f32, segments: u32) -> Vec<Point3<f32>> {
    (0..segments)
        .map(|j| {
            let theta = TAU * j as f32 / segments as f32;
            Point3::new(radius * theta.cos(), y, radius * theta.sin())
        })
        .collect()
}

/// Unit grid on the six faces of a centered box
fn box_grid(width: f32, height: f32, length: f32) -> LineSet {
    let half = Vector3::new(width, height, length) / 2.0;
    let mut lines = LineSet::new();
    for plane in GridPlane::ALL {
        let (half_u, half_v) = plane.span(&half);
        let normal_half = match plane {
            GridPlane::XY => half.z,
            GridPlane::YZ => half.x,
            GridPlane::XZ => half.y,
        };
        for side in [-1.0, 1.0] {
            lines.extend(&plane_grid(
                plane,
                half_u,
                half_v,
                side * normal_half * GRID_SURFACE_OFFSET,
                GRID_SPACING,
                false,
            ));
        }
    }
    lines
}

/// Unit grids on the three principal planes through the center
fn bounding_grid(extents: Vector3<f32>) -> LineSet {
    let half = extents / 2.0;
    let mut lines = LineSet::new();
    for plane in GridPlane::ALL {
        let (half_u, half_v) = plane.span(&half);
        lines.extend(&plane_grid(plane, half_u, half_v, 0.0, GRID_SPACING, true));
    }
    lines
}

/// Rings at unit heights plus vertical generators; `radius_top` of zero
/// draws a cone whose rings shrink toward the apex.
fn revolution_grid(radius_bottom: f32, radius_top: f32, height: f32) -> LineSet {
    let half = height / 2.0;
    let radius_at = |y: f32| {
        let t = (y + half) / height;
        (radius_bottom + (radius_top - radius_bottom) * t) * GRID_SURFACE_OFFSET
    };

    let mut lines = LineSet::new();
    for y in steps(half, GRID_SPACING, false) {
        lines.push_loop(&ring(radius_at(y), y, DEFAULT_RADIAL_SEGMENTS));
    }

    let bottom = ring(radius_at(-half), -half, GRID_GENERATORS);
    let top = ring(radius_at(half), half, GRID_GENERATORS);
    for (a, b) in bottom.into_iter().zip(top) {
        lines.push(a, b);
    }
    lines
}

/// Latitude rings and pole-to-pole meridians
fn sphere_grid(radius: f32) -> LineSet {
    let r = radius * GRID_SURFACE_OFFSET;
    let mut lines = LineSet::new();

    for i in 1..=GRID_SPHERE_LATITUDES {
        let phi = PI * i as f32 / (GRID_SPHERE_LATITUDES + 1) as f32;
        lines.push_loop(&ring(r * phi.sin(), r * phi.cos(), DEFAULT_RADIAL_SEGMENTS));
    }

    let arc_segments = DEFAULT_RADIAL_SEGMENTS / 2;
    for j in 0..GRID_SPHERE_MERIDIANS {
        let theta = TAU * j as f32 / GRID_SPHERE_MERIDIANS as f32;
        let arc: Vec<Point3<f32>> = (0..=arc_segments)
            .map(|i| {
                let phi = PI * i as f32 / arc_segments as f32;
                Point3::new(
                    r * phi.sin() * theta.cos(),
                    r * phi.cos(),
                    r * phi.sin() * theta.sin(),
                )
            })
            .collect();
        for pair in arc.windows(2) {
            lines.push(pair[0], pair[1]);
        }
    }
    lines
}

/// Scale-communicating grid overlay for a shape, in its local frame
pub fn shape_grid(descriptor: &ShapeDescriptor) -> LineSet {
    match *descriptor {
        ShapeDescriptor::TriangularPrism { .. } => {
            let [x, y, z] = descriptor.extents();
            bounding_grid(Vector3::new(x as f32, y as f32, z as f32))
        }
        ShapeDescriptor::RectangularPrism {
            width,
            height,
            length,
        } => box_grid(width as f32, height as f32, length as f32),
        ShapeDescriptor::Cube { size } => box_grid(size as f32, size as f32, size as f32),
        ShapeDescriptor::Cylinder { radius, height, .. } => {
            revolution_grid(radius as f32, radius as f32, height as f32)
        }
        ShapeDescriptor::Cone { radius, height, .. } => {
            revolution_grid(radius as f32, 0.0, height as f32)
        }
        ShapeDescriptor::Sphere { radius, .. } => sphere_grid(radius as f32),
    }
}

/// Directional light shared by every scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub direction: Vector3<f32>,
    pub intensity: f32,
}

/// Fixed content of a scene that survives shape swaps
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDecor {
    pub grid: LineSet,
    /// X, Y and Z axis helpers in that order
    pub axes: [LineSet; 3],
    pub ambient: f32,
    pub lights: Vec<Light>,
}

impl SceneDecor {
    fn with_grid(grid: LineSet, axis_length: f32) -> Self {
        let axis = |direction: Vector3<f32>| {
            let mut line = LineSet::new();
            line.push(Point3::origin(), Point3::from(direction * axis_length));
            line
        };
        Self {
            grid,
            axes: [axis(Vector3::x()), axis(Vector3::y()), axis(Vector3::z())],
            ambient: 0.6,
            lights: vec![Light {
                direction: Vector3::new(1.0, 1.0, 1.0).normalize(),
                intensity: 0.8,
            }],
        }
    }

    /// Floor grid in the XZ plane under the perspective view
    pub fn perspective(extent: f32, axis_length: f32) -> Self {
        let grid = plane_grid(GridPlane::XZ, extent, extent, 0.0, GRID_SPACING, true);
        Self::with_grid(grid, axis_length)
    }

    /// Backdrop grid behind the shape, facing an orthographic camera on +Z
    pub fn orthographic(extent: f32, axis_length: f32) -> Self {
        let grid = plane_grid(GridPlane::XY, extent, extent, -extent, GRID_SPACING, true);
        Self::with_grid(grid, axis_length)
    }

    /// Number of scene children the decor contributes
    pub fn child_count(&self) -> usize {
        1 + self.axes.len() + self.lights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_steps_skip_ends_for_face_grids() {
        assert_eq!(steps(1.5, 1.0, false), vec![-0.5, 0.5]);
        assert_eq!(steps(1.0, 1.0, false), vec![0.0]);
        assert_eq!(steps(1.0, 1.0, true), vec![-1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_steps_close_partial_cell() {
        let values = steps(1.25, 1.0, true);
        assert_eq!(values.len(), 4);
        assert_relative_eq!(*values.last().unwrap(), 1.25);
    }

    #[test]
    fn test_cube_grid_lines_sit_outside_faces() {
        let grid = shape_grid(&ShapeDescriptor::cube(3.0));
        // Two interior lines per direction, two directions, six faces
        assert_eq!(grid.len(), 2 * 2 * 6);
        let aabb = grid.bounding_box();
        assert_relative_eq!(aabb.max.x, 1.5 * GRID_SURFACE_OFFSET, epsilon = 1e-5);
    }

    #[test]
    fn test_triangular_prism_grid_spans_bounding_box() {
        let descriptor = ShapeDescriptor::triangular_prism(4.0, 5.0, 2.0);
        let aabb = shape_grid(&descriptor).bounding_box();
        let size = aabb.size();
        assert_relative_eq!(size.x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(size.y, 4.0, epsilon = 1e-5);
        assert_relative_eq!(size.z, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_cone_rings_shrink_toward_apex() {
        let grid = revolution_grid(2.0, 0.0, 4.0);
        let widest_near = |y: f32| {
            grid.segments
                .iter()
                .filter(|s| (s[0].y - y).abs() < 1e-4 && (s[1].y - y).abs() < 1e-4)
                .map(|s| s[0].coords.xz().norm())
                .fold(0.0f32, f32::max)
        };
        assert!(widest_near(-1.0) > widest_near(1.0));
        assert_relative_eq!(widest_near(1.0), 0.5 * GRID_SURFACE_OFFSET, epsilon = 1e-4);
    }

    #[test]
    fn test_sphere_grid_counts() {
        let grid = sphere_grid(2.0);
        let rings = GRID_SPHERE_LATITUDES * DEFAULT_RADIAL_SEGMENTS;
        let meridians = GRID_SPHERE_MERIDIANS * DEFAULT_RADIAL_SEGMENTS / 2;
        assert_eq!(grid.len() as u32, rings + meridians);
    }

    #[test]
    fn test_orthographic_backdrop_is_behind_origin() {
        let decor = SceneDecor::orthographic(10.0, 5.0);
        let aabb = decor.grid.bounding_box();
        assert_relative_eq!(aabb.max.z, -10.0);
        assert_eq!(decor.child_count(), 5);
    }
}
