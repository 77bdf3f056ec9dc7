/// 2D/3D transition blend and cross-section clipping of the main view
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::config::{
    Palette, ORTHO_SCALE_FLOOR, ORTHO_SCALE_GAIN, SECTION_INDICATOR_OPACITY,
    TRANSITION_OPACITY_FLOOR, TRANSITION_OPACITY_GAIN, WIREFRAME_VISIBLE_BELOW,
};
use crate::error::VizError;
use crate::factory::{Material, RenderBundle, Side};
use crate::geometry::Mesh;
use crate::primitives;

/// Blend factor between outline-like (0) and fully solid (1)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TransitionState {
    value: f32,
}

impl TransitionState {
    pub fn new(value: f32) -> Self {
        let mut state = Self::default();
        state.set(value);
        state
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    /// Set the blend factor, clamped to `[0, 1]`
    pub fn set(&mut self, value: f32) {
        self.value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 1.0)
        };
    }

    pub fn main_opacity(&self) -> f32 {
        (self.value * TRANSITION_OPACITY_GAIN).max(TRANSITION_OPACITY_FLOOR)
    }

    pub fn wireframe_visible(&self) -> bool {
        self.value < WIREFRAME_VISIBLE_BELOW
    }

    pub fn wireframe_opacity(&self) -> f32 {
        1.0 - self.value
    }

    pub fn ortho_scale(&self) -> f32 {
        (1.0 - self.value * ORTHO_SCALE_GAIN).max(ORTHO_SCALE_FLOOR)
    }

    /// Push the blend into a bundle.
    ///
    /// The main view changes opacity and the orthographic copies only
    /// change scale; they stay solid at every value.
    pub fn apply(&self, bundle: &mut RenderBundle) {
        let opacity = self.main_opacity();
        for material in bundle.main.materials_mut() {
            material.opacity = opacity;
        }

        bundle.wireframe.material.visible = self.wireframe_visible();
        bundle.wireframe.material.opacity = self.wireframe_opacity();

        let scale = self.ortho_scale();
        for model in bundle.views.values_mut() {
            model.transform.scale = scale;
        }

        debug!(value = self.value, opacity, scale, "applied transition");
    }
}

/// Orientation of the cutting plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionPlane {
    #[default]
    Horizontal,
    Vertical,
    Angled,
}

impl SectionPlane {
    pub const ALL: [SectionPlane; 3] = [
        SectionPlane::Horizontal,
        SectionPlane::Vertical,
        SectionPlane::Angled,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SectionPlane::Horizontal => "horizontal",
            SectionPlane::Vertical => "vertical",
            SectionPlane::Angled => "angled",
        }
    }

    pub fn normal(self) -> Vector3<f32> {
        match self {
            SectionPlane::Horizontal => Vector3::y(),
            SectionPlane::Vertical => Vector3::x(),
            SectionPlane::Angled => Vector3::new(1.0, 1.0, 0.0).normalize(),
        }
    }

    /// The next plane in display order, wrapping around
    pub fn next(self) -> Self {
        match self {
            SectionPlane::Horizontal => SectionPlane::Vertical,
            SectionPlane::Vertical => SectionPlane::Angled,
            SectionPlane::Angled => SectionPlane::Horizontal,
        }
    }
}

impl fmt::Display for SectionPlane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SectionPlane {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionPlane::ALL
            .into_iter()
            .find(|plane| plane.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| VizError::UnknownSectionPlane(s.to_string()))
    }
}

/// Half-space `normal · p <= offset`; everything else is clipped away
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipPlane {
    pub normal: Vector3<f32>,
    pub offset: f32,
}

impl ClipPlane {
    pub fn signed_distance(&self, point: &Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    pub fn keeps(&self, point: &Point3<f32>) -> bool {
        self.signed_distance(point) <= 0.0
    }
}

/// User-controlled cross-section settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossSectionState {
    pub enabled: bool,
    pub plane: SectionPlane,
    /// Cut position across the shape, 0 at one side and 1 at the other
    pub position: f32,
}

impl Default for CrossSectionState {
    fn default() -> Self {
        Self {
            enabled: false,
            plane: SectionPlane::Horizontal,
            position: 0.5,
        }
    }
}

impl CrossSectionState {
    /// Signed distance of the cut from the origin for a shape whose largest
    /// bounding dimension is `max_dimension`.
    pub fn offset(&self, max_dimension: f32) -> f32 {
        (self.position - 0.5) * max_dimension
    }

    pub fn clip_plane(&self, max_dimension: f32) -> ClipPlane {
        ClipPlane {
            normal: self.plane.normal(),
            offset: self.offset(max_dimension),
        }
    }

    pub fn set_position(&mut self, position: f32) {
        self.position = if position.is_nan() {
            0.5
        } else {
            position.clamp(0.0, 1.0)
        };
    }
}

/// Highlighted copy of the main surface that shows the cut region
#[derive(Debug, Clone, PartialEq)]
pub struct SectionFill {
    pub surface: Mesh,
    pub material: Material,
}

/// Objects added to the main scene while a cross-section is shown
#[derive(Debug, Clone, PartialEq)]
pub struct SectionOverlay {
    pub plane: ClipPlane,
    pub indicator: Mesh,
    pub indicator_material: Material,
    pub fill: Option<SectionFill>,
}

impl SectionOverlay {
    pub fn object_count(&self) -> usize {
        1 + usize::from(self.fill.is_some())
    }
}

/// Rebuild the cross-section overlay of `bundle` from scratch.
///
/// Any previous indicator and fill are dropped and the main materials lose
/// their clip plane before the new state is applied. Clipping is visual
/// only: the surface keeps every face and the renderer discards the
/// fragments past the plane.
pub fn apply_cross_section(
    state: &CrossSectionState,
    transition: &TransitionState,
    bundle: &mut RenderBundle,
    palette: &Palette,
    indicator_size: f32,
) {
    bundle.section = None;
    for material in bundle.main.materials_mut() {
        material.clip = None;
    }

    if !state.enabled {
        debug!("cross-section cleared");
        return;
    }

    let plane = state.clip_plane(bundle.max_dimension());
    for material in bundle.main.materials_mut() {
        material.clip = Some(plane);
    }

    let indicator = primitives::plane_quad(&plane.normal, plane.offset, indicator_size);
    let indicator_material = Material {
        opacity: SECTION_INDICATOR_OPACITY,
        side: Side::Double,
        ..Material::surface(palette.section_plane)
    };

    let fill = (transition.value() > 0.0).then(|| SectionFill {
        surface: bundle.main.surface.clone(),
        material: Material {
            side: Side::Back,
            clip: Some(plane),
            ..Material::surface(palette.section_fill)
        },
    });

    debug!(
        plane = %state.plane,
        offset = plane.offset,
        filled = fill.is_some(),
        "cross-section applied"
    );

    bundle.section = Some(SectionOverlay {
        plane,
        indicator,
        indicator_material,
        fill,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::ShapeFactory;
    use crate::shape::ShapeDescriptor;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn bundle(descriptor: ShapeDescriptor) -> RenderBundle {
        ShapeFactory::default().build(&descriptor).unwrap()
    }

    #[test]
    fn test_transition_endpoints() {
        let zero = TransitionState::new(0.0);
        assert_relative_eq!(zero.main_opacity(), 0.2);
        assert_relative_eq!(zero.ortho_scale(), 1.0);
        assert!(zero.wireframe_visible());

        let one = TransitionState::new(1.0);
        assert_relative_eq!(one.main_opacity(), 0.9);
        assert_relative_eq!(one.ortho_scale(), 0.7);
        assert!(!one.wireframe_visible());
        assert_relative_eq!(one.wireframe_opacity(), 0.0);
    }

    #[test]
    fn test_transition_clamps_input() {
        assert_eq!(TransitionState::new(3.0).value(), 1.0);
        assert_eq!(TransitionState::new(-1.0).value(), 0.0);
        assert_eq!(TransitionState::new(f32::NAN).value(), 0.0);
    }

    #[test]
    fn test_apply_touches_main_opacity_and_ortho_scale_only() {
        let mut bundle = bundle(ShapeDescriptor::cube(3.0));
        TransitionState::new(0.5).apply(&mut bundle);

        assert_relative_eq!(bundle.main.surface_material.opacity, 0.45);
        assert_relative_eq!(bundle.main.marker_material.opacity, 0.45);
        assert!(bundle.wireframe.material.visible);
        for (_, model) in bundle.views.iter() {
            assert_relative_eq!(model.transform.scale, 0.85);
            assert_eq!(model.surface_material.opacity, 1.0);
            assert!(model.surface_material.visible);
        }
    }

    #[test]
    fn test_section_offset_is_zero_at_midpoint() {
        for plane in SectionPlane::ALL {
            let state = CrossSectionState {
                enabled: true,
                plane,
                position: 0.5,
            };
            assert_eq!(state.offset(7.3), 0.0);
        }
    }

    #[test]
    fn test_section_offset_for_cube_at_end() {
        let state = CrossSectionState {
            enabled: true,
            position: 1.0,
            ..Default::default()
        };
        assert_relative_eq!(state.offset(3.0), 1.5);
    }

    #[test]
    fn test_section_plane_names() {
        assert_eq!("Vertical".parse::<SectionPlane>().unwrap(), SectionPlane::Vertical);
        assert!(matches!(
            "diagonal".parse::<SectionPlane>(),
            Err(VizError::UnknownSectionPlane(name)) if name == "diagonal"
        ));
    }

    #[test]
    fn test_angled_normal_is_unit() {
        let normal = SectionPlane::Angled.normal();
        assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(normal.x, normal.y);
    }

    #[test]
    fn test_cross_section_overlay_and_clips() {
        let mut bundle = bundle(ShapeDescriptor::cube(3.0));
        let state = CrossSectionState {
            enabled: true,
            plane: SectionPlane::Horizontal,
            position: 1.0,
        };

        apply_cross_section(
            &state,
            &TransitionState::new(0.0),
            &mut bundle,
            &Palette::default(),
            10.0,
        );
        let overlay = bundle.section.as_ref().unwrap();
        assert!(overlay.fill.is_none());
        assert_relative_eq!(overlay.plane.offset, 1.5);
        assert_eq!(bundle.main.surface_material.clip, Some(overlay.plane));
        assert!(bundle.views.top.surface_material.clip.is_none());

        apply_cross_section(
            &state,
            &TransitionState::new(0.4),
            &mut bundle,
            &Palette::default(),
            10.0,
        );
        let overlay = bundle.section.as_ref().unwrap();
        assert_eq!(overlay.object_count(), 2);
        assert_eq!(overlay.fill.as_ref().unwrap().material.side, Side::Back);

        let disabled = CrossSectionState::default();
        apply_cross_section(
            &disabled,
            &TransitionState::new(0.4),
            &mut bundle,
            &Palette::default(),
            10.0,
        );
        assert!(bundle.section.is_none());
        assert!(bundle.main.edge_material.clip.is_none());
    }

    #[test]
    fn test_indicator_size_ignores_shape_scale() {
        let state = CrossSectionState {
            enabled: true,
            ..Default::default()
        };
        let mut small = bundle(ShapeDescriptor::cube(1.0));
        let mut large = bundle(ShapeDescriptor::cube(9.0));
        for b in [&mut small, &mut large] {
            apply_cross_section(
                &state,
                &TransitionState::default(),
                b,
                &Palette::default(),
                10.0,
            );
        }
        let size = |b: &RenderBundle| b.section.as_ref().unwrap().indicator.bounding_box().size();
        assert_eq!(size(&small), size(&large));
    }

    #[test]
    fn test_clip_plane_keeps_lower_side() {
        let plane = CrossSectionState::default().clip_plane(4.0);
        assert!(plane.keeps(&Point3::new(0.0, -1.0, 0.0)));
        assert!(!plane.keeps(&Point3::new(0.0, 1.0, 0.0)));
    }

    proptest! {
        #[test]
        fn prop_main_opacity_in_range_and_monotonic(a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo = TransitionState::new(lo);
            let hi = TransitionState::new(hi);
            prop_assert!((0.2..=0.9).contains(&lo.main_opacity()));
            prop_assert!((0.2..=0.9).contains(&hi.main_opacity()));
            prop_assert!(lo.main_opacity() <= hi.main_opacity());
        }

        #[test]
        fn prop_ortho_scale_in_range_and_monotonic(a in 0.0f32..=1.0, b in 0.0f32..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let lo = TransitionState::new(lo);
            let hi = TransitionState::new(hi);
            prop_assert!((0.7..=1.0).contains(&lo.ortho_scale()));
            prop_assert!(lo.ortho_scale() >= hi.ortho_scale());
        }

        #[test]
        fn prop_wireframe_visible_below_threshold(v in 0.0f32..=1.0) {
            prop_assert_eq!(TransitionState::new(v).wireframe_visible(), v < 0.9);
        }
    }
}
