/// Tunable constants and host-overridable configuration
use serde::{Deserialize, Serialize};

use crate::error::VizError;

// -----------------------------------------------------------------------------
// Transition blend
// -----------------------------------------------------------------------------

/// Main-view opacity gain applied to the transition value.
pub const TRANSITION_OPACITY_GAIN: f32 = 0.9;

/// Main-view opacity never drops below this, even at a value of 0.
pub const TRANSITION_OPACITY_FLOOR: f32 = 0.2;

/// The wireframe is shown while the transition value is below this.
pub const WIREFRAME_VISIBLE_BELOW: f32 = 0.9;

/// Orthographic shrink per unit of transition value.
pub const ORTHO_SCALE_GAIN: f32 = 0.3;

/// Orthographic meshes never shrink below this scale.
pub const ORTHO_SCALE_FLOOR: f32 = 0.7;

// -----------------------------------------------------------------------------
// Views and cameras
// -----------------------------------------------------------------------------

/// Orthographic base view size as a multiple of the largest shape dimension.
pub const ORTHO_VIEW_FACTOR: f32 = 1.5;

/// Distance of every orthographic camera from the origin.
pub const ORTHO_CAMERA_DISTANCE: f32 = 20.0;

pub const PERSPECTIVE_FOV_DEG: f32 = 45.0;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;

/// Half extent of the fixed floor grid drawn in every scene.
pub const SCENE_GRID_EXTENT: f32 = 10.0;

/// Length of the axis helper drawn in every scene.
pub const SCENE_AXIS_LENGTH: f32 = 5.0;

// -----------------------------------------------------------------------------
// Camera animation
// -----------------------------------------------------------------------------

/// Fraction of the remaining distance covered per animation tick.
pub const ANIMATION_LERP: f32 = 0.05;

/// Squared distance at which an animation snaps to its target.
pub const ANIMATION_EPSILON_SQ: f32 = 0.01;

/// Distance used by every view preset.
pub const PRESET_DISTANCE: f32 = 12.0;

// -----------------------------------------------------------------------------
// Shape construction
// -----------------------------------------------------------------------------

pub const DEFAULT_RADIAL_SEGMENTS: u32 = 32;
pub const DEFAULT_SPHERE_WIDTH_SEGMENTS: u32 = 32;
pub const DEFAULT_SPHERE_HEIGHT_SEGMENTS: u32 = 16;

/// Dimensions outside this range are rejected before any geometry is built.
/// The unit grid overlay grows with the shape, so the upper bound also caps
/// the number of grid lines.
pub const MIN_DIMENSION: f64 = 0.001;
pub const MAX_DIMENSION: f64 = 1000.0;

/// Upper bounds on tessellation accepted from hosts.
pub const MAX_RADIAL_SEGMENTS: u32 = 512;
pub const MAX_HEIGHT_SEGMENTS: u32 = 256;

/// Faces meeting at less than this angle do not produce an outline edge.
pub const EDGE_THRESHOLD_DEG: f32 = 15.0;

/// Spacing of the unit grid overlay drawn on every shape.
pub const GRID_SPACING: f32 = 1.0;

/// Grid overlays sit slightly outside the surface to avoid z-fighting.
pub const GRID_SURFACE_OFFSET: f32 = 1.01;

/// Number of generator lines on cylinder and cone overlays.
pub const GRID_GENERATORS: u32 = 12;

/// Number of latitude rings on the sphere overlay.
pub const GRID_SPHERE_LATITUDES: u32 = 8;

/// Number of meridians on the sphere overlay.
pub const GRID_SPHERE_MERIDIANS: u32 = 12;

/// Radius of the corner markers placed on boxes.
pub const VERTEX_MARKER_RADIUS: f32 = 0.08;

/// Edge length of the square cross-section indicator.
pub const SECTION_INDICATOR_SIZE: f32 = 10.0;

pub const SECTION_INDICATOR_OPACITY: f32 = 0.25;

// -----------------------------------------------------------------------------
// Host-overridable configuration
// -----------------------------------------------------------------------------

/// RGB color in linear 0..1 components.
pub type Rgb = [f32; 3];

/// Colors used when materializing a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub surface: Rgb,
    pub edge: Rgb,
    pub grid: Rgb,
    pub marker: Rgb,
    pub wireframe: Rgb,
    pub section_fill: Rgb,
    pub section_plane: Rgb,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            surface: [0.27, 0.53, 0.95],
            edge: [0.0, 0.0, 0.0],
            grid: [0.55, 0.55, 0.55],
            marker: [0.9, 0.2, 0.2],
            wireframe: [0.1, 0.1, 0.1],
            section_fill: [1.0, 0.6, 0.1],
            section_plane: [0.95, 0.3, 0.3],
        }
    }
}

/// Settings a host may override when creating a visualizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualizerConfig {
    pub palette: Palette,
    pub ortho_view_factor: f32,
    pub animation_lerp: f32,
    pub animation_epsilon_sq: f32,
    pub edge_threshold_deg: f32,
    pub section_indicator_size: f32,
    /// Whether the mirrored mobile views start visible.
    pub mobile_visible: bool,
}

impl Default for VisualizerConfig {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            ortho_view_factor: ORTHO_VIEW_FACTOR,
            animation_lerp: ANIMATION_LERP,
            animation_epsilon_sq: ANIMATION_EPSILON_SQ,
            edge_threshold_deg: EDGE_THRESHOLD_DEG,
            section_indicator_size: SECTION_INDICATOR_SIZE,
            mobile_visible: false,
        }
    }
}

impl VisualizerConfig {
    /// Rejects tunables that would stall the animator or invert a frustum.
    pub fn validate(&self) -> Result<(), VizError> {
        let positive = |name: &str, value: f32| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(VizError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )))
            }
        };

        if !(self.animation_lerp > 0.0 && self.animation_lerp <= 1.0) {
            return Err(VizError::InvalidConfig(format!(
                "animation_lerp must be in (0, 1], got {}",
                self.animation_lerp
            )));
        }
        positive("animation_epsilon_sq", self.animation_epsilon_sq)?;
        positive("ortho_view_factor", self.ortho_view_factor)?;
        positive("section_indicator_size", self.section_indicator_size)?;
        if !(self.edge_threshold_deg.is_finite() && self.edge_threshold_deg >= 0.0) {
            return Err(VizError::InvalidConfig(format!(
                "edge_threshold_deg must not be negative, got {}",
                self.edge_threshold_deg
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: VisualizerConfig =
            serde_json::from_str(r#"{ "animation_lerp": 0.1 }"#).unwrap();
        assert_eq!(config.animation_lerp, 0.1);
        assert_eq!(config.ortho_view_factor, ORTHO_VIEW_FACTOR);
        assert_eq!(config.palette, Palette::default());
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(VisualizerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_stalling_or_inverted_tunables_are_rejected() {
        for lerp in [0.0, -0.5, 1.5, 2.0, f32::NAN] {
            let config = VisualizerConfig {
                animation_lerp: lerp,
                ..VisualizerConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(VizError::InvalidConfig(_))),
                "lerp {lerp}"
            );
        }
        let full_step = VisualizerConfig {
            animation_lerp: 1.0,
            ..VisualizerConfig::default()
        };
        assert!(full_step.validate().is_ok());

        let inverted = VisualizerConfig {
            ortho_view_factor: -1.5,
            ..VisualizerConfig::default()
        };
        assert!(inverted.validate().is_err());
        let no_snap = VisualizerConfig {
            animation_epsilon_sq: 0.0,
            ..VisualizerConfig::default()
        };
        assert!(no_snap.validate().is_err());
    }
}
