/// Builds the multi-view render bundle for a shape descriptor
use tracing::debug;

use crate::config::{Rgb, VisualizerConfig, VERTEX_MARKER_RADIUS};
use crate::error::VizError;
use crate::geometry::{LineSet, Mesh};
use crate::ortho::{OrthoSet, OrthoView};
use crate::overlay;
use crate::primitives;
use crate::shape::ShapeDescriptor;
use crate::transform::ModelTransform;
use crate::transition::{ClipPlane, SectionOverlay};

/// Which faces of a surface get rasterized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    Double,
}

/// Appearance of one renderable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Rgb,
    pub opacity: f32,
    pub visible: bool,
    pub side: Side,
    /// World-space half-space outside of which fragments are discarded
    pub clip: Option<ClipPlane>,
}

impl Material {
    pub fn surface(color: Rgb) -> Self {
        Self {
            color,
            opacity: 1.0,
            visible: true,
            side: Side::Front,
            clip: None,
        }
    }

    pub fn line(color: Rgb) -> Self {
        Self {
            side: Side::Double,
            ..Self::surface(color)
        }
    }

    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }
}

/// One shape as placed in a single view
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeModel {
    pub surface: Mesh,
    pub surface_material: Material,
    pub edges: LineSet,
    pub edge_material: Material,
    pub grid: Option<LineSet>,
    pub grid_material: Material,
    /// Corner markers, present on boxes only
    pub markers: Option<Mesh>,
    pub marker_material: Material,
    pub transform: ModelTransform,
}

impl ShapeModel {
    /// Number of scene objects this model contributes
    pub fn object_count(&self) -> usize {
        2 + usize::from(self.grid.is_some()) + usize::from(self.markers.is_some())
    }

    /// Every material owned by the model
    pub fn materials_mut(&mut self) -> [&mut Material; 4] {
        [
            &mut self.surface_material,
            &mut self.edge_material,
            &mut self.grid_material,
            &mut self.marker_material,
        ]
    }
}

/// Edge-only copy faded in while the transition leans toward 2D
#[derive(Debug, Clone, PartialEq)]
pub struct Wireframe {
    pub edges: LineSet,
    pub material: Material,
    pub transform: ModelTransform,
}

/// Every view-specific representation of one shape instance
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBundle {
    pub descriptor: ShapeDescriptor,
    pub main: ShapeModel,
    pub views: OrthoSet<ShapeModel>,
    pub wireframe: Wireframe,
    pub section: Option<SectionOverlay>,
}

impl RenderBundle {
    pub fn max_dimension(&self) -> f32 {
        self.descriptor.max_dimension() as f32
    }

    /// Objects the main scene holds for this bundle
    pub fn main_object_count(&self) -> usize {
        let section = self.section.as_ref().map_or(0, SectionOverlay::object_count);
        self.main.object_count() + 1 + section
    }
}

/// Surface mesh of a descriptor in its local frame
pub fn surface_mesh(descriptor: &ShapeDescriptor) -> Mesh {
    match *descriptor {
        ShapeDescriptor::TriangularPrism {
            height,
            side1,
            side2,
        } => primitives::triangular_prism_mesh(side1 as f32, side2 as f32, height as f32),
        ShapeDescriptor::RectangularPrism {
            width,
            height,
            length,
        } => primitives::box_mesh(width as f32, height as f32, length as f32),
        ShapeDescriptor::Cube { size } => {
            let size = size as f32;
            primitives::box_mesh(size, size, size)
        }
        ShapeDescriptor::Cylinder {
            radius,
            height,
            radius_segments,
        } => primitives::cylinder_mesh(radius as f32, height as f32, radius_segments),
        ShapeDescriptor::Cone {
            radius,
            height,
            radius_segments,
        } => primitives::cone_mesh(radius as f32, height as f32, radius_segments),
        ShapeDescriptor::Sphere {
            radius,
            width_segments,
            height_segments,
        } => primitives::sphere_mesh(radius as f32, width_segments, height_segments),
    }
}

/// One marker per corner for boxes, nothing for other kinds
fn corner_markers(descriptor: &ShapeDescriptor) -> Option<Mesh> {
    let [w, h, l] = match *descriptor {
        ShapeDescriptor::RectangularPrism { .. } | ShapeDescriptor::Cube { .. } => {
            descriptor.extents().map(|e| e as f32)
        }
        _ => return None,
    };
    let mut markers = Mesh::with_capacity(64);
    for corner in primitives::box_corners(w, h, l) {
        markers.merge(&primitives::marker_mesh(corner, VERTEX_MARKER_RADIUS));
    }
    Some(markers)
}

/// Turns descriptors into render bundles. Does not touch any scene.
#[derive(Debug, Clone, Default)]
pub struct ShapeFactory {
    config: VisualizerConfig,
}

impl ShapeFactory {
    pub fn new(config: VisualizerConfig) -> Self {
        Self { config }
    }

    /// Build every representation of `descriptor`, or fail before anything
    /// is produced.
    pub fn build(&self, descriptor: &ShapeDescriptor) -> Result<RenderBundle, VizError> {
        descriptor.validate()?;

        let palette = &self.config.palette;
        let surface = surface_mesh(descriptor);
        if surface.is_empty() {
            return Err(VizError::degenerate(format!(
                "{} produced no surface",
                descriptor.kind()
            )));
        }
        let edges = match *descriptor {
            ShapeDescriptor::Sphere {
                radius,
                width_segments,
                ..
            } => primitives::sphere_outline(radius as f32, width_segments),
            _ => surface.feature_edges(self.config.edge_threshold_deg),
        };

        let model = |grid: Option<LineSet>, markers: Option<Mesh>, view: Option<OrthoView>| {
            ShapeModel {
                surface: surface.clone(),
                surface_material: Material::surface(palette.surface),
                edges: edges.clone(),
                edge_material: Material::line(palette.edge),
                grid,
                grid_material: Material::line(palette.grid),
                markers,
                marker_material: Material::surface(palette.marker),
                transform: view
                    .map(|v| ModelTransform::oriented(v.orientation()))
                    .unwrap_or_default(),
            }
        };

        let main = model(
            Some(overlay::shape_grid(descriptor)),
            corner_markers(descriptor),
            None,
        );
        let views = OrthoSet::from_fn(|view| model(None, None, Some(view)));
        let wireframe = Wireframe {
            edges: edges.clone(),
            material: Material::line(palette.wireframe),
            transform: ModelTransform::identity(),
        };

        debug!(
            kind = %descriptor.kind(),
            triangles = surface.triangle_count(),
            edges = edges.len(),
            "built render bundle"
        );

        Ok(RenderBundle {
            descriptor: *descriptor,
            main,
            views,
            wireframe,
            section: None,
        })
    }
}
