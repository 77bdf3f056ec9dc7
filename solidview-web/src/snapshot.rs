/// Plain-data copies of frames, ready to hand to JavaScript
use nalgebra::Matrix4;
use serde::Serialize;
use solidview_core::{DrawItem, Frame, LineSet, Mesh, Primitive, Side};

/// Flatten a matrix in column-major order, as WebGL expects
fn columns(matrix: &Matrix4<f32>) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(matrix.as_slice());
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    Triangles,
    Lines,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightSnapshot {
    pub direction: [f32; 3],
    pub intensity: f32,
}

/// One draw call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    pub kind: PrimitiveKind,
    /// `[x, y, z, ...]`, three vertices per triangle or two per segment
    pub positions: Vec<f32>,
    /// Per-vertex normals matching `positions`, empty for lines
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub normals: Vec<f32>,
    /// RGB plus opacity
    pub color: [f32; 4],
    pub side: &'static str,
    /// `[nx, ny, nz, offset]`; fragments with `n·p > offset` are discarded
    pub clip: Option<[f32; 4]>,
    pub model: [f32; 16],
}

impl ItemSnapshot {
    pub fn new(item: &DrawItem<'_>) -> Self {
        let material = &item.material;
        let (kind, positions, normals) = match item.primitive {
            Primitive::Triangles(mesh) => {
                let (positions, normals) = flatten_mesh(mesh);
                (PrimitiveKind::Triangles, positions, normals)
            }
            Primitive::Lines(lines) => (PrimitiveKind::Lines, flatten_lines(lines), Vec::new()),
        };
        let [r, g, b] = material.color;

        Self {
            kind,
            positions,
            normals,
            color: [r, g, b, material.opacity],
            side: match material.side {
                Side::Front => "front",
                Side::Back => "back",
                Side::Double => "double",
            },
            clip: material
                .clip
                .map(|plane| [plane.normal.x, plane.normal.y, plane.normal.z, plane.offset]),
            model: columns(&item.model),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }
}

fn flatten_mesh(mesh: &Mesh) -> (Vec<f32>, Vec<f32>) {
    let count = mesh.triangle_count() * 9;
    let mut positions = Vec::with_capacity(count);
    let mut normals = Vec::with_capacity(count);
    for vertex in mesh.triangles.iter().flat_map(|t| t.vertices.iter()) {
        positions.extend_from_slice(vertex.position.coords.as_slice());
        normals.extend_from_slice(vertex.normal.as_slice());
    }
    (positions, normals)
}

fn flatten_lines(lines: &LineSet) -> Vec<f32> {
    lines
        .segments
        .iter()
        .flat_map(|segment| segment.iter())
        .flat_map(|point| [point.x, point.y, point.z])
        .collect()
}

/// A complete view, as presented on the last render
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSnapshot {
    pub view: String,
    pub orthographic: bool,
    pub camera_position: [f32; 3],
    pub view_matrix: [f32; 16],
    pub projection_matrix: [f32; 16],
    pub ambient: f32,
    pub lights: Vec<LightSnapshot>,
    pub items: Vec<ItemSnapshot>,
}

impl FrameSnapshot {
    pub fn new(frame: &Frame<'_>) -> Self {
        let camera = frame.camera;
        Self {
            view: frame.view.to_string(),
            orthographic: camera.is_orthographic(),
            camera_position: [camera.position.x, camera.position.y, camera.position.z],
            view_matrix: columns(&camera.view_matrix()),
            projection_matrix: columns(&camera.projection_matrix()),
            ambient: frame.ambient,
            lights: frame
                .lights
                .iter()
                .map(|light| LightSnapshot {
                    direction: [light.direction.x, light.direction.y, light.direction.z],
                    intensity: light.intensity,
                })
                .collect(),
            items: frame.items.iter().map(ItemSnapshot::new).collect(),
        }
    }
}
