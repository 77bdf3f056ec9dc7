/// Volume, surface area and auxiliary measurements of each shape kind.
///
/// Everything here is a pure function of a [`ShapeDescriptor`]. Inputs are
/// assumed positive; validation happens where descriptors enter the
/// factory, not here.
use serde::Serialize;
use std::f64::consts::PI;

use crate::shape::{ShapeDescriptor, ShapeKind};

/// Face, edge and vertex counts shown next to Euler's formula
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub faces: u32,
    pub edges: u32,
    pub vertices: u32,
}

impl Topology {
    pub const fn new(faces: u32, edges: u32, vertices: u32) -> Self {
        Self {
            faces,
            edges,
            vertices,
        }
    }

    /// `V - E + F`
    pub fn euler_characteristic(&self) -> i64 {
        self.vertices as i64 - self.edges as i64 + self.faces as i64
    }

    /// Fixed counts per kind; curved solids use the curved-surface convention.
    pub fn of(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::TriangularPrism => Self::new(5, 9, 6),
            ShapeKind::RectangularPrism | ShapeKind::Cube => Self::new(6, 12, 8),
            ShapeKind::Cylinder => Self::new(3, 2, 0),
            ShapeKind::Cone => Self::new(2, 1, 1),
            ShapeKind::Sphere => Self::new(1, 0, 0),
        }
    }
}

/// Kind-specific measurements beyond volume and total area
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Auxiliary {
    TriangularPrism {
        /// Hypotenuse, assuming the two given sides meet at a right angle
        side3: f64,
        base_area: f64,
        base_perimeter: f64,
        lateral_area: f64,
    },
    RectangularPrism {
        base_area: f64,
        base_perimeter: f64,
        lateral_area: f64,
        /// Diagonals of the width×height, width×length and height×length faces
        face_diagonals: [f64; 3],
        space_diagonal: f64,
    },
    Cube {
        face_area: f64,
        face_diagonal: f64,
        space_diagonal: f64,
    },
    Cylinder {
        base_area: f64,
        circumference: f64,
        lateral_area: f64,
    },
    Cone {
        slant_height: f64,
        base_area: f64,
        lateral_area: f64,
        apex_angle_deg: f64,
    },
    Sphere {
        diameter: f64,
        circumference: f64,
        great_circle_area: f64,
    },
}

/// One line of a formula breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaLine {
    pub label: &'static str,
    pub formula: String,
    pub substituted: String,
    pub value: f64,
}

impl FormulaLine {
    fn new(label: &'static str, formula: &str, substituted: String, value: f64) -> Self {
        Self {
            label,
            formula: formula.to_string(),
            substituted,
            value,
        }
    }

    /// `formula = substituted = value`, value rounded for display
    pub fn render(&self) -> String {
        format!(
            "{} = {} = {}",
            self.formula,
            self.substituted,
            format_measure(self.value)
        )
    }
}

/// Everything derived from a descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMetrics {
    pub kind: ShapeKind,
    pub volume: f64,
    pub total_surface_area: f64,
    pub auxiliary: Auxiliary,
    pub topology: Topology,
    pub genus: u32,
    pub formulas: Vec<FormulaLine>,
}

/// Two-decimal rendering used for every displayed measurement
pub fn format_measure(value: f64) -> String {
    format!("{:.2}", value)
}

/// Inputs echoed inside substituted formulas: integers stay bare
fn operand(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e9 {
        format!("{}", value as i64)
    } else {
        format_measure(value)
    }
}

pub fn compute_metrics(descriptor: &ShapeDescriptor) -> DerivedMetrics {
    let kind = descriptor.kind();
    let (volume, total_surface_area, auxiliary, formulas) = match *descriptor {
        ShapeDescriptor::TriangularPrism {
            height,
            side1,
            side2,
        } => triangular_prism(side1, side2, height),
        ShapeDescriptor::RectangularPrism {
            width,
            height,
            length,
        } => rectangular_prism(width, height, length),
        ShapeDescriptor::Cube { size } => cube(size),
        ShapeDescriptor::Cylinder { radius, height, .. } => cylinder(radius, height),
        ShapeDescriptor::Cone { radius, height, .. } => cone(radius, height),
        ShapeDescriptor::Sphere { radius, .. } => sphere(radius),
    };

    DerivedMetrics {
        kind,
        volume,
        total_surface_area,
        auxiliary,
        topology: Topology::of(kind),
        genus: 0,
        formulas,
    }
}

type Breakdown = (f64, f64, Auxiliary, Vec<FormulaLine>);

fn triangular_prism(a: f64, b: f64, h: f64) -> Breakdown {
    let c = (a * a + b * b).sqrt();
    let base_area = a * b / 2.0;
    let volume = base_area * h;
    let base_perimeter = a + b + c;
    let lateral_area = base_perimeter * h;
    let total = 2.0 * base_area + lateral_area;

    let formulas = vec![
        FormulaLine::new(
            "Third side",
            "c = √(a² + b²)",
            format!("√({}² + {}²)", operand(a), operand(b)),
            c,
        ),
        FormulaLine::new(
            "Base area",
            "A = ½ × a × b",
            format!("½ × {} × {}", operand(a), operand(b)),
            base_area,
        ),
        FormulaLine::new(
            "Volume",
            "V = A × h",
            format!("{} × {}", format_measure(base_area), operand(h)),
            volume,
        ),
        FormulaLine::new(
            "Base perimeter",
            "P = a + b + c",
            format!("{} + {} + {}", operand(a), operand(b), format_measure(c)),
            base_perimeter,
        ),
        FormulaLine::new(
            "Lateral area",
            "L = P × h",
            format!("{} × {}", format_measure(base_perimeter), operand(h)),
            lateral_area,
        ),
        FormulaLine::new(
            "Surface area",
            "S = 2A + L",
            format!(
                "2 × {} + {}",
                format_measure(base_area),
                format_measure(lateral_area)
            ),
            total,
        ),
    ];

    let auxiliary = Auxiliary::TriangularPrism {
        side3: c,
        base_area,
        base_perimeter,
        lateral_area,
    };
    (volume, total, auxiliary, formulas)
}

fn box_volume_and_area(w: f64, h: f64, l: f64) -> (f64, f64) {
    (w * h * l, 2.0 * (w * l + w * h + h * l))
}

fn rectangular_prism(w: f64, h: f64, l: f64) -> Breakdown {
    let (volume, total) = box_volume_and_area(w, h, l);
    let base_area = w * l;
    let base_perimeter = 2.0 * (w + l);
    let lateral_area = base_perimeter * h;
    let space_diagonal = (w * w + h * h + l * l).sqrt();

    let formulas = vec![
        FormulaLine::new(
            "Volume",
            "V = w × h × l",
            format!("{} × {} × {}", operand(w), operand(h), operand(l)),
            volume,
        ),
        FormulaLine::new(
            "Surface area",
            "S = 2(wl + wh + hl)",
            format!(
                "2({}×{} + {}×{} + {}×{})",
                operand(w),
                operand(l),
                operand(w),
                operand(h),
                operand(h),
                operand(l)
            ),
            total,
        ),
        FormulaLine::new(
            "Space diagonal",
            "d = √(w² + h² + l²)",
            format!("√({}² + {}² + {}²)", operand(w), operand(h), operand(l)),
            space_diagonal,
        ),
    ];

    let auxiliary = Auxiliary::RectangularPrism {
        base_area,
        base_perimeter,
        lateral_area,
        face_diagonals: [
            (w * w + h * h).sqrt(),
            (w * w + l * l).sqrt(),
            (h * h + l * l).sqrt(),
        ],
        space_diagonal,
    };
    (volume, total, auxiliary, formulas)
}

fn cube(s: f64) -> Breakdown {
    // Same solid as a box with equal sides
    let (volume, total) = box_volume_and_area(s, s, s);
    let face_diagonal = s * 2f64.sqrt();
    let space_diagonal = s * 3f64.sqrt();

    let formulas = vec![
        FormulaLine::new("Volume", "V = s³", format!("{}³", operand(s)), volume),
        FormulaLine::new(
            "Surface area",
            "S = 6s²",
            format!("6 × {}²", operand(s)),
            total,
        ),
        FormulaLine::new(
            "Face diagonal",
            "d = s√2",
            format!("{}√2", operand(s)),
            face_diagonal,
        ),
        FormulaLine::new(
            "Space diagonal",
            "D = s√3",
            format!("{}√3", operand(s)),
            space_diagonal,
        ),
    ];

    let auxiliary = Auxiliary::Cube {
        face_area: s * s,
        face_diagonal,
        space_diagonal,
    };
    (volume, total, auxiliary, formulas)
}

fn cylinder(r: f64, h: f64) -> Breakdown {
    let base_area = PI * r * r;
    let volume = base_area * h;
    let lateral_area = 2.0 * PI * r * h;
    let total = lateral_area + 2.0 * base_area;

    let formulas = vec![
        FormulaLine::new(
            "Volume",
            "V = πr²h",
            format!("π × {}² × {}", operand(r), operand(h)),
            volume,
        ),
        FormulaLine::new(
            "Lateral area",
            "L = 2πrh",
            format!("2π × {} × {}", operand(r), operand(h)),
            lateral_area,
        ),
        FormulaLine::new(
            "Surface area",
            "S = 2πrh + 2πr²",
            format!(
                "{} + 2 × {}",
                format_measure(lateral_area),
                format_measure(base_area)
            ),
            total,
        ),
    ];

    let auxiliary = Auxiliary::Cylinder {
        base_area,
        circumference: 2.0 * PI * r,
        lateral_area,
    };
    (volume, total, auxiliary, formulas)
}

fn cone(r: f64, h: f64) -> Breakdown {
    let slant_height = (r * r + h * h).sqrt();
    let base_area = PI * r * r;
    let volume = base_area * h / 3.0;
    let lateral_area = PI * r * slant_height;
    let total = lateral_area + base_area;
    let apex_angle_deg = 2.0 * (r / h).atan().to_degrees();

    let formulas = vec![
        FormulaLine::new(
            "Slant height",
            "s = √(r² + h²)",
            format!("√({}² + {}²)", operand(r), operand(h)),
            slant_height,
        ),
        FormulaLine::new(
            "Volume",
            "V = ⅓πr²h",
            format!("⅓ × π × {}² × {}", operand(r), operand(h)),
            volume,
        ),
        FormulaLine::new(
            "Lateral area",
            "L = πrs",
            format!("π × {} × {}", operand(r), format_measure(slant_height)),
            lateral_area,
        ),
        FormulaLine::new(
            "Surface area",
            "S = πrs + πr²",
            format!(
                "{} + {}",
                format_measure(lateral_area),
                format_measure(base_area)
            ),
            total,
        ),
    ];

    let auxiliary = Auxiliary::Cone {
        slant_height,
        base_area,
        lateral_area,
        apex_angle_deg,
    };
    (volume, total, auxiliary, formulas)
}

fn sphere(r: f64) -> Breakdown {
    let volume = 4.0 / 3.0 * PI * r.powi(3);
    let total = 4.0 * PI * r * r;
    let great_circle_area = PI * r * r;

    let formulas = vec![
        FormulaLine::new(
            "Volume",
            "V = ⁴⁄₃πr³",
            format!("⁴⁄₃ × π × {}³", operand(r)),
            volume,
        ),
        FormulaLine::new(
            "Surface area",
            "S = 4πr²",
            format!("4π × {}²", operand(r)),
            total,
        ),
        FormulaLine::new(
            "Great circle area",
            "A = πr²",
            format!("π × {}²", operand(r)),
            great_circle_area,
        ),
    ];

    let auxiliary = Auxiliary::Sphere {
        diameter: 2.0 * r,
        circumference: 2.0 * PI * r,
        great_circle_area,
    };
    (volume, total, auxiliary, formulas)
}
