/// Surface meshes for each solid, centered at the origin with Y up
use nalgebra::{Point3, Vector3};
use std::f32::consts::{PI, TAU};

use crate::geometry::{LineSet, Mesh, Triangle, Vertex};
use crate::transform::Transform;

/// Add a quad with per-corner normals, dropping collapsed halves at poles
fn push_smooth_quad(mesh: &mut Mesh, corners: [(Point3<f32>, Vector3<f32>); 4]) {
    let [a, b, c, d] = corners.map(|(p, n)| Vertex::at(p, n));
    for triangle in [Triangle::new(a, b, c), Triangle::new(a, c, d)] {
        if triangle.face_normal().is_some() {
            mesh.add_triangle(triangle);
        }
    }
}

/// Axis-aligned box centered at the origin
pub fn box_mesh(width: f32, height: f32, length: f32) -> Mesh {
    let (x, y, z) = (width / 2.0, height / 2.0, length / 2.0);
    let p = Point3::new;
    let mut mesh = Mesh::with_capacity(12);

    // Front / back
    mesh.add_quad(p(-x, -y, z), p(x, -y, z), p(x, y, z), p(-x, y, z));
    mesh.add_quad(p(x, -y, -z), p(-x, -y, -z), p(-x, y, -z), p(x, y, -z));
    // Top / bottom
    mesh.add_quad(p(-x, y, z), p(x, y, z), p(x, y, -z), p(-x, y, -z));
    mesh.add_quad(p(-x, -y, -z), p(x, -y, -z), p(x, -y, z), p(-x, -y, z));
    // Right / left
    mesh.add_quad(p(x, -y, z), p(x, -y, -z), p(x, y, -z), p(x, y, z));
    mesh.add_quad(p(-x, -y, -z), p(-x, -y, z), p(-x, y, z), p(-x, y, -z));

    mesh
}

/// The eight corners of a centered box
pub fn box_corners(width: f32, height: f32, length: f32) -> [Point3<f32>; 8] {
    let (x, y, z) = (width / 2.0, height / 2.0, length / 2.0);
    let mut corners = [Point3::origin(); 8];
    for (i, corner) in corners.iter_mut().enumerate() {
        let sx = if i & 1 == 0 { -x } else { x };
        let sy = if i & 2 == 0 { -y } else { y };
        let sz = if i & 4 == 0 { -z } else { z };
        *corner = Point3::new(sx, sy, sz);
    }
    corners
}

/// Right-triangle prism.
///
/// The legs run along +X (`side1`) and +Y (`side2`) from a right angle at
/// the origin and the triangle is extruded `height` along +Z. The solid is
/// then moved so its bounding-box center sits at the origin and turned a
/// quarter turn about Z.
pub fn triangular_prism_mesh(side1: f32, side2: f32, height: f32) -> Mesh {
    let base = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(side1, 0.0, 0.0),
        Point3::new(0.0, side2, 0.0),
    ];
    let lift = |p: Point3<f32>| Point3::new(p.x, p.y, height);
    let mut mesh = Mesh::with_capacity(8);

    mesh.add_face(base[0], base[2], base[1]);
    mesh.add_face(lift(base[0]), lift(base[1]), lift(base[2]));
    for i in 0..3 {
        let a = base[i];
        let b = base[(i + 1) % 3];
        mesh.add_quad(a, b, lift(b), lift(a));
    }

    let center = mesh.bounding_box().center();
    mesh.translate(&-center.coords);
    mesh.transform(&Transform::rotation_matrix(Vector3::z(), PI / 2.0));
    mesh
}

/// Cylinder or cone along Y; a zero `radius_top` closes into an apex
fn frustum_mesh(radius_bottom: f32, radius_top: f32, height: f32, segments: u32) -> Mesh {
    let (y_bottom, y_top) = (-height / 2.0, height / 2.0);
    let slope = (radius_bottom - radius_top) / height;
    let ring = |radius: f32, y: f32, j: u32| {
        let theta = TAU * j as f32 / segments as f32;
        Point3::new(radius * theta.cos(), y, radius * theta.sin())
    };
    let side_normal = |j: u32| {
        let theta = TAU * j as f32 / segments as f32;
        Vector3::new(theta.cos(), slope, theta.sin()).normalize()
    };

    let mut mesh = Mesh::with_capacity(segments as usize * 4);
    for j in 0..segments {
        let k = j + 1;
        push_smooth_quad(
            &mut mesh,
            [
                (ring(radius_bottom, y_bottom, j), side_normal(j)),
                (ring(radius_top, y_top, j), side_normal(j)),
                (ring(radius_top, y_top, k), side_normal(k)),
                (ring(radius_bottom, y_bottom, k), side_normal(k)),
            ],
        );

        let bottom_center = Point3::new(0.0, y_bottom, 0.0);
        mesh.add_face(
            bottom_center,
            ring(radius_bottom, y_bottom, j),
            ring(radius_bottom, y_bottom, k),
        );
        if radius_top > 0.0 {
            let top_center = Point3::new(0.0, y_top, 0.0);
            mesh.add_face(
                top_center,
                ring(radius_top, y_top, k),
                ring(radius_top, y_top, j),
            );
        }
    }
    mesh
}

pub fn cylinder_mesh(radius: f32, height: f32, segments: u32) -> Mesh {
    frustum_mesh(radius, radius, height, segments)
}

/// Cone with its apex at `+height / 2`
pub fn cone_mesh(radius: f32, height: f32, segments: u32) -> Mesh {
    frustum_mesh(radius, 0.0, height, segments)
}

/// UV sphere; `height_segments` rings from pole to pole
pub fn sphere_mesh(radius: f32, width_segments: u32, height_segments: u32) -> Mesh {
    let point = |i: u32, j: u32| {
        // Poles are pinned so the collapsed quads there are exactly degenerate
        let normal = if i == 0 {
            Vector3::y()
        } else if i == height_segments {
            -Vector3::y()
        } else {
            let phi = PI * i as f32 / height_segments as f32;
            let theta = TAU * j as f32 / width_segments as f32;
            Vector3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin())
        };
        (Point3::from(normal * radius), normal)
    };

    let capacity = (width_segments as usize)
        .checked_mul(height_segments as usize)
        .and_then(|quads| quads.checked_mul(2))
        .unwrap_or(0);
    let mut mesh = Mesh::with_capacity(capacity);
    for i in 0..height_segments {
        for j in 0..width_segments {
            push_smooth_quad(
                &mut mesh,
                [point(i + 1, j), point(i, j), point(i, j + 1), point(i + 1, j + 1)],
            );
        }
    }
    mesh
}

/// Equator plus the two vertical great circles, one facing each
/// orthographic axis. A smooth sphere has no crease edges to outline.
pub fn sphere_outline(radius: f32, segments: u32) -> LineSet {
    let mut outline = LineSet::new();
    outline.push_loop(&circle(radius, segments, |a, b| Point3::new(a, 0.0, b)));
    outline.push_loop(&circle(radius, segments, |a, b| Point3::new(a, b, 0.0)));
    outline.push_loop(&circle(radius, segments, |a, b| Point3::new(0.0, b, a)));
    outline
}

fn circle(
    radius: f32,
    segments: u32,
    place: impl Fn(f32, f32) -> Point3<f32>,
) -> Vec<Point3<f32>> {
    (0..segments)
        .map(|j| {
            let theta = TAU * j as f32 / segments as f32;
            place(radius * theta.cos(), radius * theta.sin())
        })
        .collect()
}

/// Small octahedron used to mark a vertex
pub fn marker_mesh(center: Point3<f32>, radius: f32) -> Mesh {
    let axis = |v: Vector3<f32>| center + v * radius;
    let (px, nx) = (axis(Vector3::x()), axis(-Vector3::x()));
    let (py, ny) = (axis(Vector3::y()), axis(-Vector3::y()));
    let (pz, nz) = (axis(Vector3::z()), axis(-Vector3::z()));

    let mut mesh = Mesh::with_capacity(8);
    for (a, b) in [(px, pz), (pz, nx), (nx, nz), (nz, px)] {
        mesh.add_face(a, py, b);
        mesh.add_face(b, ny, a);
    }
    mesh
}

/// Square of edge `size` centered at `normal * offset`, facing both ways
pub fn plane_quad(normal: &Vector3<f32>, offset: f32, size: f32) -> Mesh {
    let helper = if normal.y.abs() < 0.9 {
        Vector3::y()
    } else {
        Vector3::z()
    };
    let u = normal.cross(&helper).normalize() * (size / 2.0);
    let v = normal.cross(&u).normalize() * (size / 2.0);
    let center = Point3::from(normal * offset);

    let corners = [center - u - v, center + u - v, center + u + v, center - u + v];
    let mut mesh = Mesh::with_capacity(4);
    mesh.add_quad(corners[0], corners[1], corners[2], corners[3]);
    mesh.add_quad(corners[3], corners[2], corners[1], corners[0]);
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_outward(mesh: &Mesh) {
        for triangle in &mesh.triangles {
            let normal = triangle.calculate_normal();
            let outward = triangle.centroid().coords;
            assert!(normal.dot(&outward) > 0.0, "inward face at {:?}", outward);
        }
    }

    #[test]
    fn test_box_faces_point_outward() {
        let mesh = box_mesh(3.0, 2.0, 5.0);
        assert_eq!(mesh.triangle_count(), 12);
        assert_outward(&mesh);
        let size = mesh.bounding_box().size();
        assert_relative_eq!(size.x, 3.0);
        assert_relative_eq!(size.y, 2.0);
        assert_relative_eq!(size.z, 5.0);
    }

    #[test]
    fn test_box_outline_has_twelve_edges() {
        assert_eq!(box_mesh(1.0, 2.0, 3.0).feature_edges(15.0).len(), 12);
    }

    #[test]
    fn test_triangular_prism_is_centered_and_turned() {
        let mesh = triangular_prism_mesh(4.0, 5.0, 2.0);
        let aabb = mesh.bounding_box();
        assert!((aabb.center() - Point3::origin()).norm() < 1e-5);
        let size = aabb.size();
        assert_relative_eq!(size.x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(size.y, 4.0, epsilon = 1e-5);
        assert_relative_eq!(size.z, 2.0, epsilon = 1e-5);
        assert_eq!(mesh.triangle_count(), 8);
        assert_eq!(mesh.feature_edges(15.0).len(), 9);
    }

    #[test]
    fn test_cylinder_outline_is_two_rims() {
        let mesh = cylinder_mesh(2.0, 4.0, 32);
        assert_outward(&mesh);
        assert_eq!(mesh.feature_edges(15.0).len(), 64);
    }

    #[test]
    fn test_cone_outline_is_base_rim() {
        let mesh = cone_mesh(2.0, 4.0, 32);
        assert_eq!(mesh.feature_edges(15.0).len(), 32);
        let aabb = mesh.bounding_box();
        assert_relative_eq!(aabb.max.y, 2.0);
    }

    #[test]
    fn test_sphere_is_closed_and_outward() {
        let mesh = sphere_mesh(2.0, 32, 16);
        assert_outward(&mesh);
        assert_relative_eq!(mesh.bounding_box().size().y, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_outline_is_three_great_circles() {
        let outline = sphere_outline(2.0, 32);
        assert_eq!(outline.len(), 3 * 32);
        for [a, b] in &outline.segments {
            assert_relative_eq!(a.coords.norm(), 2.0, epsilon = 1e-5);
            assert_relative_eq!(b.coords.norm(), 2.0, epsilon = 1e-5);
        }
        let size = outline.bounding_box().size();
        assert_relative_eq!(size.x, 4.0, epsilon = 1e-5);
        assert_relative_eq!(size.y, 4.0, epsilon = 1e-5);
        assert_relative_eq!(size.z, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_plane_quad_is_double_sided() {
        let mesh = plane_quad(&Vector3::y(), 1.5, 10.0);
        assert_eq!(mesh.triangle_count(), 4);
        let aabb = mesh.bounding_box();
        assert_relative_eq!(aabb.min.y, 1.5);
        assert_relative_eq!(aabb.size().x, 10.0, epsilon = 1e-5);
    }
}
