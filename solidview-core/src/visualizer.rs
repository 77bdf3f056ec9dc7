/// The visualizer facade: shape lifecycle, controls and the frame tick
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::animator::{CameraAnimator, Spherical, ViewPreset};
use crate::config::VisualizerConfig;
use crate::error::VizError;
use crate::factory::{RenderBundle, ShapeFactory};
use crate::metrics::{compute_metrics, DerivedMetrics};
use crate::parser;
use crate::shape::{catalog, Dimension, ShapeDescriptor, ShapeKind};
use crate::transition::{apply_cross_section, CrossSectionState, SectionPlane, TransitionState};
use crate::views::{RenderSurface, ViewCoordinator, ViewId};

/// What the presentation layer shows about the current shape
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeSummary {
    pub kind: ShapeKind,
    pub display_name: &'static str,
    pub dimensions: Vec<Dimension>,
    pub metrics: DerivedMetrics,
}

impl ShapeSummary {
    pub fn new(descriptor: &ShapeDescriptor) -> Self {
        let kind = descriptor.kind();
        Self {
            kind,
            display_name: kind.display_name(),
            dimensions: descriptor.dimensions(),
            metrics: compute_metrics(descriptor),
        }
    }
}

/// Single owner of every piece of mutable visualizer state.
///
/// Hosts drive it from their event callbacks and call [`Visualizer::tick`]
/// once per frame.
pub struct Visualizer {
    config: VisualizerConfig,
    factory: ShapeFactory,
    views: ViewCoordinator,
    transition: TransitionState,
    section: CrossSectionState,
    animator: CameraAnimator,
    summary: Option<ShapeSummary>,
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::with_config(VisualizerConfig::default())
    }
}

impl Visualizer {
    /// Create a visualizer, rejecting tunables outside their usable range.
    pub fn new(config: VisualizerConfig) -> Result<Self, VizError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: VisualizerConfig) -> Self {
        Self {
            factory: ShapeFactory::new(config.clone()),
            views: ViewCoordinator::new(&config),
            transition: TransitionState::default(),
            section: CrossSectionState::default(),
            animator: CameraAnimator::new(config.animation_lerp, config.animation_epsilon_sq),
            summary: None,
            config,
        }
    }

    pub fn config(&self) -> &VisualizerConfig {
        &self.config
    }

    pub fn views(&self) -> &ViewCoordinator {
        &self.views
    }

    pub fn descriptor(&self) -> Option<&ShapeDescriptor> {
        self.views.bundle().map(|bundle| &bundle.descriptor)
    }

    pub fn summary(&self) -> Option<&ShapeSummary> {
        self.summary.as_ref()
    }

    pub fn metrics(&self) -> Option<&DerivedMetrics> {
        self.summary.as_ref().map(|summary| &summary.metrics)
    }

    /// Load a shape from the predefined catalog
    pub fn load_shape(&mut self, id: &str) -> Result<&ShapeSummary, VizError> {
        let descriptor = catalog::lookup(id).inspect_err(|err| warn!(%err, "catalog lookup failed"))?;
        self.create_shape(descriptor)
    }

    /// Create a shape from a free-text description
    pub fn parse_and_generate(&mut self, text: &str) -> Result<&ShapeSummary, VizError> {
        let descriptor = parser::parse(text).inspect_err(|failure| {
            warn!(reason = %failure.reason, "could not parse shape description");
        })?;
        self.create_shape(descriptor)
    }

    /// Replace the current shape.
    ///
    /// The new bundle is fully built and brought up to the current
    /// transition and cross-section state before the old one is detached,
    /// so a failed build leaves the previous shape on screen.
    pub fn create_shape(&mut self, descriptor: ShapeDescriptor) -> Result<&ShapeSummary, VizError> {
        let mut bundle = self.factory.build(&descriptor).inspect_err(|err| {
            error!(%err, kind = %descriptor.kind(), "shape build aborted");
        })?;
        self.prepare(&mut bundle);

        if let Some(previous) = self.views.attach(bundle) {
            debug!(kind = %previous.descriptor.kind(), "released previous shape");
        }
        info!(kind = %descriptor.kind(), "shape loaded");

        self.views.render();
        Ok(self.summary.insert(ShapeSummary::new(&descriptor)))
    }

    /// Remove the current shape from every view
    pub fn clear_shape(&mut self) {
        if self.views.detach().is_some() {
            info!("shape cleared");
        }
        self.summary = None;
        self.views.render();
    }

    fn prepare(&self, bundle: &mut RenderBundle) {
        self.transition.apply(bundle);
        self.apply_section_to(bundle);
    }

    fn apply_section_to(&self, bundle: &mut RenderBundle) {
        apply_cross_section(
            &self.section,
            &self.transition,
            bundle,
            &self.config.palette,
            self.config.section_indicator_size,
        );
    }

    pub fn transition(&self) -> TransitionState {
        self.transition
    }

    /// Set the 2D/3D blend factor in `[0, 1]`
    pub fn set_transition(&mut self, value: f32) {
        let had_value = self.transition.value() > 0.0;
        self.transition.set(value);

        let section = self.section;
        let transition = self.transition;
        if let Some(bundle) = self.views.bundle_mut() {
            transition.apply(bundle);
        }
        // The highlighted fill only exists above zero
        if section.enabled && had_value != (transition.value() > 0.0) {
            self.refresh_section();
        }
        self.views.render();
    }

    /// Set the blend from a slider position in `[0, 100]`
    pub fn set_transition_percent(&mut self, percent: f32) {
        self.set_transition(percent / 100.0);
    }

    pub fn cross_section(&self) -> CrossSectionState {
        self.section
    }

    pub fn set_cross_section(&mut self, state: CrossSectionState) {
        self.section = state;
        self.section.set_position(state.position);
        self.refresh_section();
        self.views.render();
    }

    pub fn set_cross_section_enabled(&mut self, enabled: bool) {
        let state = CrossSectionState {
            enabled,
            ..self.section
        };
        self.set_cross_section(state);
    }

    pub fn set_section_plane(&mut self, plane: SectionPlane) {
        let state = CrossSectionState {
            plane,
            ..self.section
        };
        self.set_cross_section(state);
    }

    pub fn set_section_position(&mut self, position: f32) {
        let state = CrossSectionState {
            position,
            ..self.section
        };
        self.set_cross_section(state);
    }

    fn refresh_section(&mut self) {
        let (section, transition) = (self.section, self.transition);
        let palette = self.config.palette;
        let size = self.config.section_indicator_size;
        if let Some(bundle) = self.views.bundle_mut() {
            apply_cross_section(&section, &transition, bundle, &palette, size);
        }
    }

    /// Animate the main camera to a preset. Ignored while dragging.
    pub fn apply_view_preset(&mut self, preset: ViewPreset) -> bool {
        self.animator.animate_to_preset(preset)
    }

    /// Animate back to the isometric starting position
    pub fn reset_camera(&mut self) -> bool {
        self.apply_view_preset(ViewPreset::Isometric)
    }

    /// Place the main camera directly from the angle/distance sliders
    pub fn set_camera_position(&mut self, horizontal_deg: f32, vertical_deg: f32, distance: f32) -> bool {
        let placement = Spherical::new(horizontal_deg, vertical_deg, distance);
        let moved = self
            .animator
            .set_position(self.views.main_camera_mut(), placement);
        if moved {
            self.views.render();
        }
        moved
    }

    /// Current main-camera placement, for syncing the sliders
    pub fn camera_placement(&self) -> Spherical {
        let camera = self.views.main_camera();
        Spherical::from_cartesian(&(camera.position - camera.target))
    }

    pub fn animator(&self) -> &CameraAnimator {
        &self.animator
    }

    pub fn begin_drag(&mut self) {
        self.animator.begin_drag();
    }

    pub fn drag_orbit(&mut self, dh_deg: f32, dv_deg: f32) {
        self.animator
            .orbit(self.views.main_camera_mut(), dh_deg, dv_deg);
    }

    pub fn drag_pan(&mut self, dx: f32, dy: f32) {
        self.animator.pan(self.views.main_camera_mut(), dx, dy);
    }

    pub fn end_drag(&mut self) {
        self.animator.end_drag(self.views.main_camera_mut());
    }

    /// One frame: advance the camera animation, then draw every view.
    /// Returns the number of views drawn.
    pub fn tick(&mut self) -> usize {
        self.animator.step(self.views.main_camera_mut());
        self.views.render()
    }

    pub fn render(&mut self) -> usize {
        self.views.render()
    }

    pub fn register_surface(&mut self, view: ViewId, surface: Box<dyn RenderSurface>) {
        self.views.register(view, surface);
    }

    pub fn unregister_surface(&mut self, view: ViewId) -> Option<Box<dyn RenderSurface>> {
        self.views.unregister(view)
    }

    pub fn resize(&mut self, view: ViewId, width: u32, height: u32) -> bool {
        self.views.resize(view, width, height)
    }

    pub fn set_mobile_visible(&mut self, visible: bool) {
        self.views.set_mobile_visible(visible);
        self.views.render();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_that_never_converges_is_rejected() {
        let stalled = VisualizerConfig {
            animation_lerp: 0.0,
            ..VisualizerConfig::default()
        };
        assert!(matches!(
            Visualizer::new(stalled),
            Err(VizError::InvalidConfig(_))
        ));

        let mut viz = Visualizer::new(VisualizerConfig {
            animation_lerp: 0.5,
            ..VisualizerConfig::default()
        })
        .unwrap();
        assert!(viz.apply_view_preset(ViewPreset::Front));
        let mut ticks = 0;
        while viz.animator().is_animating() && ticks < 1_000 {
            viz.tick();
            ticks += 1;
        }
        assert!(!viz.animator().is_animating());
    }

    #[test]
    fn test_load_catalog_shape() {
        let mut viz = Visualizer::default();
        let summary = viz.load_shape("cube").unwrap();
        assert_eq!(summary.kind, ShapeKind::Cube);
        assert_eq!(summary.metrics.volume, 27.0);
        assert_eq!(viz.descriptor(), Some(&ShapeDescriptor::cube(3.0)));
    }

    #[test]
    fn test_unknown_catalog_id_keeps_state() {
        let mut viz = Visualizer::default();
        viz.load_shape("cone").unwrap();
        assert!(matches!(
            viz.load_shape("dodecahedron"),
            Err(VizError::UnknownCatalogId(_))
        ));
        assert_eq!(viz.summary().unwrap().kind, ShapeKind::Cone);
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let mut viz = Visualizer::default();
        let err = viz.parse_and_generate("hello there").unwrap_err();
        assert!(matches!(err, VizError::Parse(_)));
        assert!(viz.summary().is_none());
    }

    #[test]
    fn test_new_shape_inherits_transition() {
        let mut viz = Visualizer::default();
        viz.set_transition_percent(100.0);
        viz.load_shape("sphere").unwrap();
        let bundle = viz.views().bundle().unwrap();
        assert!(!bundle.wireframe.material.visible);
        assert!((bundle.views.top.transform.scale - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_transition_crossing_zero_toggles_section_fill() {
        let mut viz = Visualizer::default();
        viz.load_shape("cube").unwrap();
        viz.set_cross_section_enabled(true);
        let fill = |viz: &Visualizer| {
            viz.views()
                .bundle()
                .and_then(|b| b.section.as_ref())
                .map(|s| s.fill.is_some())
        };
        assert_eq!(fill(&viz), Some(false));
        viz.set_transition(0.5);
        assert_eq!(fill(&viz), Some(true));
        viz.set_transition(0.0);
        assert_eq!(fill(&viz), Some(false));
    }

    #[test]
    fn test_tick_advances_preset_animation() {
        let mut viz = Visualizer::default();
        let start = viz.views().main_camera().position;
        assert!(viz.apply_view_preset(ViewPreset::Front));
        viz.tick();
        assert_ne!(viz.views().main_camera().position, start);
    }

    #[test]
    fn test_clear_shape() {
        let mut viz = Visualizer::default();
        viz.load_shape("cylinder").unwrap();
        viz.clear_shape();
        assert!(viz.descriptor().is_none());
        assert!(viz.metrics().is_none());
    }
}
