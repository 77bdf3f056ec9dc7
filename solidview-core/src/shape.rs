/// Shape descriptors and the predefined shape catalog
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{
    DEFAULT_RADIAL_SEGMENTS, DEFAULT_SPHERE_HEIGHT_SEGMENTS, DEFAULT_SPHERE_WIDTH_SEGMENTS,
    MAX_DIMENSION, MAX_HEIGHT_SEGMENTS, MAX_RADIAL_SEGMENTS, MIN_DIMENSION,
};
use crate::error::VizError;

/// The closed set of solids the visualizer can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShapeKind {
    TriangularPrism,
    RectangularPrism,
    Cube,
    Cylinder,
    Cone,
    Sphere,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::TriangularPrism,
        ShapeKind::RectangularPrism,
        ShapeKind::Cube,
        ShapeKind::Cylinder,
        ShapeKind::Cone,
        ShapeKind::Sphere,
    ];

    /// Identifier used on the wire and by the catalog
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::TriangularPrism => "triangularPrism",
            ShapeKind::RectangularPrism => "rectangularPrism",
            ShapeKind::Cube => "cube",
            ShapeKind::Cylinder => "cylinder",
            ShapeKind::Cone => "cone",
            ShapeKind::Sphere => "sphere",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ShapeKind::TriangularPrism => "Triangular Prism",
            ShapeKind::RectangularPrism => "Rectangular Prism",
            ShapeKind::Cube => "Cube",
            ShapeKind::Cylinder => "Cylinder",
            ShapeKind::Cone => "Cone",
            ShapeKind::Sphere => "Sphere",
        }
    }

    pub fn is_polyhedron(self) -> bool {
        matches!(
            self,
            ShapeKind::TriangularPrism | ShapeKind::RectangularPrism | ShapeKind::Cube
        )
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        ShapeKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().to_ascii_lowercase() == normalized)
            .ok_or_else(|| VizError::UnsupportedShape(s.to_string()))
    }
}

/// A labeled numeric dimension, flattened for display
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Dimension {
    pub label: &'static str,
    pub value: f64,
}

/// Type and dimensions of one solid.
///
/// Descriptors are plain values: once built they are never mutated, a new
/// shape always means a new descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ShapeDescriptor {
    /// Right-triangle base with legs `side1` and `side2`, extruded by `height`
    TriangularPrism { height: f64, side1: f64, side2: f64 },
    RectangularPrism { width: f64, height: f64, length: f64 },
    Cube { size: f64 },
    Cylinder {
        radius: f64,
        height: f64,
        #[serde(default = "radial_segments")]
        radius_segments: u32,
    },
    Cone {
        radius: f64,
        height: f64,
        #[serde(default = "radial_segments")]
        radius_segments: u32,
    },
    Sphere {
        radius: f64,
        #[serde(default = "sphere_width_segments")]
        width_segments: u32,
        #[serde(default = "sphere_height_segments")]
        height_segments: u32,
    },
}

fn radial_segments() -> u32 {
    DEFAULT_RADIAL_SEGMENTS
}

fn sphere_width_segments() -> u32 {
    DEFAULT_SPHERE_WIDTH_SEGMENTS
}

fn sphere_height_segments() -> u32 {
    DEFAULT_SPHERE_HEIGHT_SEGMENTS
}

impl ShapeDescriptor {
    pub fn triangular_prism(side1: f64, side2: f64, height: f64) -> Self {
        Self::TriangularPrism {
            height,
            side1,
            side2,
        }
    }

    pub fn rectangular_prism(width: f64, height: f64, length: f64) -> Self {
        Self::RectangularPrism {
            width,
            height,
            length,
        }
    }

    pub fn cube(size: f64) -> Self {
        Self::Cube { size }
    }

    pub fn cylinder(radius: f64, height: f64) -> Self {
        Self::Cylinder {
            radius,
            height,
            radius_segments: DEFAULT_RADIAL_SEGMENTS,
        }
    }

    pub fn cone(radius: f64, height: f64) -> Self {
        Self::Cone {
            radius,
            height,
            radius_segments: DEFAULT_RADIAL_SEGMENTS,
        }
    }

    pub fn sphere(radius: f64) -> Self {
        Self::Sphere {
            radius,
            width_segments: DEFAULT_SPHERE_WIDTH_SEGMENTS,
            height_segments: DEFAULT_SPHERE_HEIGHT_SEGMENTS,
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::TriangularPrism { .. } => ShapeKind::TriangularPrism,
            Self::RectangularPrism { .. } => ShapeKind::RectangularPrism,
            Self::Cube { .. } => ShapeKind::Cube,
            Self::Cylinder { .. } => ShapeKind::Cylinder,
            Self::Cone { .. } => ShapeKind::Cone,
            Self::Sphere { .. } => ShapeKind::Sphere,
        }
    }

    /// Size of the local axis-aligned bounding box as `[x, y, z]`.
    ///
    /// The triangular prism is rotated a quarter turn about Z when built,
    /// so its legs swap axes here.
    pub fn extents(&self) -> [f64; 3] {
        match *self {
            Self::TriangularPrism {
                height,
                side1,
                side2,
            } => [side2, side1, height],
            Self::RectangularPrism {
                width,
                height,
                length,
            } => [width, height, length],
            Self::Cube { size } => [size; 3],
            Self::Cylinder { radius, height, .. } | Self::Cone { radius, height, .. } => {
                [2.0 * radius, height, 2.0 * radius]
            }
            Self::Sphere { radius, .. } => [2.0 * radius; 3],
        }
    }

    /// Largest bounding dimension, used to size cameras and section offsets
    pub fn max_dimension(&self) -> f64 {
        self.extents().into_iter().fold(0.0, f64::max)
    }

    pub fn dimensions(&self) -> Vec<Dimension> {
        let dim = |label, value| Dimension { label, value };
        match *self {
            Self::TriangularPrism {
                height,
                side1,
                side2,
            } => vec![
                dim("height", height),
                dim("side1", side1),
                dim("side2", side2),
            ],
            Self::RectangularPrism {
                width,
                height,
                length,
            } => vec![
                dim("width", width),
                dim("height", height),
                dim("length", length),
            ],
            Self::Cube { size } => vec![dim("size", size)],
            Self::Cylinder { radius, height, .. } | Self::Cone { radius, height, .. } => {
                vec![dim("radius", radius), dim("height", height)]
            }
            Self::Sphere { radius, .. } => vec![dim("radius", radius)],
        }
    }

    /// Checks that every dimension can produce a renderable solid.
    pub fn validate(&self) -> Result<(), VizError> {
        for Dimension { label, value } in self.dimensions() {
            if !value.is_finite() || value <= 0.0 {
                return Err(VizError::degenerate(format!(
                    "{} {} must be a positive number, got {}",
                    self.kind(),
                    label,
                    value
                )));
            }
            if !(MIN_DIMENSION..=MAX_DIMENSION).contains(&value) {
                return Err(VizError::degenerate(format!(
                    "{} {} must be between {} and {}, got {}",
                    self.kind(),
                    label,
                    MIN_DIMENSION,
                    MAX_DIMENSION,
                    value
                )));
            }
        }

        let enough_segments = match *self {
            Self::Cylinder {
                radius_segments, ..
            }
            | Self::Cone {
                radius_segments, ..
            } => radius_segments >= 3,
            Self::Sphere {
                width_segments,
                height_segments,
                ..
            } => width_segments >= 3 && height_segments >= 2,
            _ => true,
        };
        if !enough_segments {
            return Err(VizError::degenerate(format!(
                "{} has too few segments to form a surface",
                self.kind()
            )));
        }

        let within_limits = match *self {
            Self::Cylinder {
                radius_segments, ..
            }
            | Self::Cone {
                radius_segments, ..
            } => radius_segments <= MAX_RADIAL_SEGMENTS,
            Self::Sphere {
                width_segments,
                height_segments,
                ..
            } => width_segments <= MAX_RADIAL_SEGMENTS && height_segments <= MAX_HEIGHT_SEGMENTS,
            _ => true,
        };
        if !within_limits {
            return Err(VizError::degenerate(format!(
                "{} segment counts are capped at {} around and {} high",
                self.kind(),
                MAX_RADIAL_SEGMENTS,
                MAX_HEIGHT_SEGMENTS
            )));
        }

        Ok(())
    }
}

/// Predefined shapes offered by the shape-select controls
pub mod catalog {
    use super::ShapeDescriptor;
    use crate::error::VizError;

    pub const IDS: [&str; 8] = [
        "triangularPrism1",
        "triangularPrism2",
        "triangularPrism3",
        "rectangularPrism",
        "cube",
        "cylinder",
        "cone",
        "sphere",
    ];

    /// Looks up a catalog identifier.
    pub fn lookup(id: &str) -> Result<ShapeDescriptor, VizError> {
        let descriptor = match id {
            "triangularPrism1" => ShapeDescriptor::triangular_prism(4.0, 5.0, 2.0),
            "triangularPrism2" => ShapeDescriptor::triangular_prism(1.0, 3.0, 4.0),
            "triangularPrism3" => ShapeDescriptor::triangular_prism(2.0, 6.0, 4.0),
            "rectangularPrism" => ShapeDescriptor::rectangular_prism(3.0, 2.0, 5.0),
            "cube" => ShapeDescriptor::cube(3.0),
            "cylinder" => ShapeDescriptor::cylinder(2.0, 4.0),
            "cone" => ShapeDescriptor::cone(2.0, 4.0),
            "sphere" => ShapeDescriptor::sphere(2.0),
            other => return Err(VizError::UnknownCatalogId(other.to_string())),
        };
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_entries_are_valid() {
        for id in catalog::IDS {
            let descriptor = catalog::lookup(id).unwrap();
            assert!(descriptor.validate().is_ok(), "{id}");
        }
    }

    #[test]
    fn test_catalog_unknown_id() {
        assert!(matches!(
            catalog::lookup("dodecahedron"),
            Err(VizError::UnknownCatalogId(_))
        ));
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            "triangular_prism".parse::<ShapeKind>().unwrap(),
            ShapeKind::TriangularPrism
        );
        assert_eq!("Cone".parse::<ShapeKind>().unwrap(), ShapeKind::Cone);
        assert!(matches!(
            "torus".parse::<ShapeKind>(),
            Err(VizError::UnsupportedShape(name)) if name == "torus"
        ));
    }

    #[test]
    fn test_max_dimension() {
        assert_eq!(ShapeDescriptor::cube(3.0).max_dimension(), 3.0);
        assert_eq!(ShapeDescriptor::cylinder(2.0, 3.0).max_dimension(), 4.0);
        assert_eq!(
            ShapeDescriptor::triangular_prism(4.0, 5.0, 2.0).max_dimension(),
            5.0
        );
    }

    #[test]
    fn test_validate_rejects_non_positive() {
        assert!(ShapeDescriptor::cube(0.0).validate().is_err());
        assert!(ShapeDescriptor::cylinder(2.0, f64::NAN).validate().is_err());
        let sliver = ShapeDescriptor::Cone {
            radius: 1.0,
            height: 1.0,
            radius_segments: 2,
        };
        assert!(sliver.validate().is_err());
        assert!(ShapeDescriptor::sphere(f64::INFINITY).validate().is_err());
        assert!(ShapeDescriptor::cube(MAX_DIMENSION * 2.0).validate().is_err());
        assert!(ShapeDescriptor::cube(MIN_DIMENSION / 2.0).validate().is_err());
        assert!(ShapeDescriptor::cube(MAX_DIMENSION).validate().is_ok());
    }

    #[test]
    fn test_validate_caps_segment_counts() {
        let huge = ShapeDescriptor::Sphere {
            radius: 1.0,
            width_segments: 70_000,
            height_segments: 70_000,
        };
        assert!(matches!(
            huge.validate(),
            Err(VizError::DegenerateShape { .. })
        ));
        let dense = ShapeDescriptor::Cylinder {
            radius: 1.0,
            height: 1.0,
            radius_segments: MAX_RADIAL_SEGMENTS + 1,
        };
        assert!(dense.validate().is_err());
        let at_limit = ShapeDescriptor::Sphere {
            radius: 1.0,
            width_segments: MAX_RADIAL_SEGMENTS,
            height_segments: MAX_HEIGHT_SEGMENTS,
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_descriptor_serializes_with_kind_tag() {
        let json = serde_json::to_value(ShapeDescriptor::cylinder(2.0, 4.0)).unwrap();
        assert_eq!(json["kind"], "cylinder");
        assert_eq!(json["radiusSegments"], 32);
    }

    #[test]
    fn test_descriptor_segments_default_when_omitted() {
        let sphere: ShapeDescriptor =
            serde_json::from_str(r#"{ "kind": "sphere", "radius": 2.5 }"#).unwrap();
        assert_eq!(sphere, ShapeDescriptor::sphere(2.5));
    }
}
