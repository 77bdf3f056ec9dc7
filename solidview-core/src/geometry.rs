/// Geometry primitives: triangle meshes and line sets
use nalgebra::{Matrix4, Point3, Vector3};
use std::collections::HashMap;

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn at(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        self.face_normal().unwrap_or_else(Vector3::zeros)
    }

    /// Face normal, or `None` for a zero-area triangle
    pub fn face_normal(&self) -> Option<Vector3<f32>> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).try_normalize(1e-12)
    }

    pub fn centroid(&self) -> Point3<f32> {
        let sum = self.vertices[0].position.coords
            + self.vertices[1].position.coords
            + self.vertices[2].position.coords;
        Point3::from(sum / 3.0)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn include(&mut self, point: &Point3<f32>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3<f32> {
        if self.is_empty() {
            return Vector3::zeros();
        }
        self.max - self.min
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    /// Add a flat-shaded triangle, counter-clockwise when seen from outside
    pub fn add_face(&mut self, a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) {
        let normal = (b - a).cross(&(c - a)).try_normalize(1e-12);
        if let Some(n) = normal {
            self.add_triangle(Triangle::new(
                Vertex::at(a, n),
                Vertex::at(b, n),
                Vertex::at(c, n),
            ));
        }
    }

    /// Add a flat-shaded quad as two triangles (`a b c d` counter-clockwise)
    pub fn add_quad(&mut self, a: Point3<f32>, b: Point3<f32>, c: Point3<f32>, d: Point3<f32>) {
        self.add_face(a, b, c);
        self.add_face(a, c, d);
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn merge(&mut self, other: &Mesh) {
        self.triangles.extend(other.triangles.iter().cloned());
    }

    pub fn bounding_box(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for triangle in &self.triangles {
            for vertex in &triangle.vertices {
                aabb.include(&vertex.position);
            }
        }
        aabb
    }

    pub fn translate(&mut self, offset: &Vector3<f32>) {
        for triangle in &mut self.triangles {
            for vertex in &mut triangle.vertices {
                vertex.position += offset;
            }
        }
    }

    /// Apply an affine transform to positions and normals in place
    pub fn transform(&mut self, matrix: &Matrix4<f32>) {
        let linear = matrix.fixed_view::<3, 3>(0, 0).into_owned();
        let normal_matrix = linear
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(linear);

        for triangle in &mut self.triangles {
            for vertex in &mut triangle.vertices {
                vertex.position = matrix.transform_point(&vertex.position);
                vertex.normal = (normal_matrix * vertex.normal)
                    .try_normalize(1e-12)
                    .unwrap_or(vertex.normal);
            }
        }
    }

    /// Outline edges: boundary edges and edges whose adjacent faces meet at
    /// an angle of at least `threshold_deg`.
    pub fn feature_edges(&self, threshold_deg: f32) -> LineSet {
        let cos_threshold = threshold_deg.to_radians().cos();
        let mut shared: HashMap<(EdgeKey, EdgeKey), SharedEdge> = HashMap::new();
        let mut order = Vec::new();

        for triangle in &self.triangles {
            let Some(normal) = triangle.face_normal() else {
                continue;
            };
            for i in 0..3 {
                let a = triangle.vertices[i].position;
                let b = triangle.vertices[(i + 1) % 3].position;
                let (ka, kb) = (EdgeKey::of(&a), EdgeKey::of(&b));
                let key = if ka <= kb { (ka, kb) } else { (kb, ka) };
                shared
                    .entry(key)
                    .or_insert_with(|| {
                        order.push(key);
                        SharedEdge {
                            ends: [a, b],
                            normals: Vec::with_capacity(2),
                        }
                    })
                    .normals
                    .push(normal);
            }
        }

        let mut lines = LineSet::new();
        for key in order {
            let edge = &shared[&key];
            let is_feature = match edge.normals.as_slice() {
                [_] => true,
                normals => normals
                    .iter()
                    .skip(1)
                    .any(|n| n.dot(&normals[0]) < cos_threshold),
            };
            if is_feature {
                lines.push(edge.ends[0], edge.ends[1]);
            }
        }
        lines
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

/// Quantized vertex position so coincident vertices of different faces match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct EdgeKey([i64; 3]);

impl EdgeKey {
    const SCALE: f32 = 1e4;

    fn of(point: &Point3<f32>) -> Self {
        Self([
            (point.x * Self::SCALE).round() as i64,
            (point.y * Self::SCALE).round() as i64,
            (point.z * Self::SCALE).round() as i64,
        ])
    }
}

struct SharedEdge {
    ends: [Point3<f32>; 2],
    normals: Vec<Vector3<f32>>,
}

/// A set of independent line segments (outlines, grids, helpers)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineSet {
    pub segments: Vec<[Point3<f32>; 2]>,
}

impl LineSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, a: Point3<f32>, b: Point3<f32>) {
        self.segments.push([a, b]);
    }

    /// Append a closed polyline through `points`
    pub fn push_loop(&mut self, points: &[Point3<f32>]) {
        for (i, a) in points.iter().enumerate() {
            let b = points[(i + 1) % points.len()];
            self.push(*a, b);
        }
    }

    pub fn extend(&mut self, other: &LineSet) {
        self.segments.extend_from_slice(&other.segments);
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn bounding_box(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for segment in &self.segments {
            aabb.include(&segment[0]);
            aabb.include(&segment[1]);
        }
        aabb
    }
}
