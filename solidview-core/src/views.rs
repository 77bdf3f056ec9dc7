/// View coordination: per-viewport scenes, cameras and render surfaces
use nalgebra::Matrix4;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::animator::ViewPreset;
use crate::config::{
    Palette, Rgb, VisualizerConfig, ORTHO_CAMERA_DISTANCE, SCENE_AXIS_LENGTH, SCENE_GRID_EXTENT,
};
use crate::error::VizError;
use crate::factory::{Material, RenderBundle, ShapeModel};
use crate::geometry::{LineSet, Mesh};
use crate::ortho::{OrthoSet, OrthoView};
use crate::overlay::{Light, SceneDecor};
use crate::projection::{container_aspect, Camera};

const AXIS_COLORS: [Rgb; 3] = [[0.9, 0.25, 0.25], [0.25, 0.8, 0.3], [0.25, 0.45, 0.95]];

/// One of the nine logical viewports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    Main,
    Ortho(OrthoView),
    /// Mirror of an orthographic view shown in the mobile panel
    Mobile(OrthoView),
}

impl ViewId {
    pub fn all() -> impl Iterator<Item = ViewId> {
        std::iter::once(ViewId::Main)
            .chain(OrthoView::ALL.into_iter().map(ViewId::Ortho))
            .chain(OrthoView::ALL.into_iter().map(ViewId::Mobile))
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewId::Main => f.write_str("main"),
            ViewId::Ortho(view) => write!(f, "{view}"),
            ViewId::Mobile(view) => write!(f, "mobile-{view}"),
        }
    }
}

impl FromStr for ViewId {
    type Err = VizError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if lower == "main" {
            return Ok(ViewId::Main);
        }
        let unknown = || VizError::UnknownView(s.to_string());
        match lower.strip_prefix("mobile-") {
            Some(rest) => rest.parse().map(ViewId::Mobile).map_err(|_| unknown()),
            None => lower.parse().map(ViewId::Ortho).map_err(|_| unknown()),
        }
    }
}

/// Something a view can be drawn onto, owned by the host
pub trait RenderSurface {
    /// Current pixel size of the container the surface lives in
    fn size(&self) -> (u32, u32);

    /// Resize the drawing buffer
    fn resize(&mut self, width: u32, height: u32) {
        let _ = (width, height);
    }

    fn present(&mut self, frame: &Frame<'_>);
}

#[derive(Debug, Clone, Copy)]
pub enum Primitive<'a> {
    Triangles(&'a Mesh),
    Lines(&'a LineSet),
}

/// A single object to draw, in world space after `model`
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    pub primitive: Primitive<'a>,
    pub material: Material,
    pub model: Matrix4<f32>,
}

/// Everything a surface needs to draw one view
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub view: ViewId,
    pub camera: &'a Camera,
    pub ambient: f32,
    pub lights: &'a [Light],
    pub items: Vec<DrawItem<'a>>,
}

impl Frame<'_> {
    pub fn triangle_count(&self) -> usize {
        self.items
            .iter()
            .map(|item| match item.primitive {
                Primitive::Triangles(mesh) => mesh.triangle_count(),
                Primitive::Lines(_) => 0,
            })
            .sum()
    }
}

/// The part of the current bundle a scene's mutable slot shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BundlePart {
    Main,
    Ortho(OrthoView),
}

impl BundlePart {
    fn of(view: ViewId) -> Self {
        match view {
            ViewId::Main => BundlePart::Main,
            ViewId::Ortho(v) | ViewId::Mobile(v) => BundlePart::Ortho(v),
        }
    }
}

/// Fixed decor plus one slot for the current shape
#[derive(Debug)]
struct Scene {
    decor: SceneDecor,
    grid_material: Material,
    axis_materials: [Material; 3],
    slot: Option<BundlePart>,
}

impl Scene {
    fn new(decor: SceneDecor, palette: &Palette) -> Self {
        Self {
            decor,
            grid_material: Material::line(palette.grid),
            axis_materials: AXIS_COLORS.map(Material::line),
            slot: None,
        }
    }

    fn child_count(&self, bundle: Option<&RenderBundle>) -> usize {
        let part = match (self.slot, bundle) {
            (Some(BundlePart::Main), Some(bundle)) => bundle.main_object_count(),
            (Some(BundlePart::Ortho(view)), Some(bundle)) => bundle.views.get(view).object_count(),
            _ => 0,
        };
        self.decor.child_count() + part
    }

    fn frame<'a>(
        &'a self,
        view: ViewId,
        camera: &'a Camera,
        bundle: Option<&'a RenderBundle>,
    ) -> Frame<'a> {
        let mut items = Vec::new();
        let identity = Matrix4::identity();
        items.push(DrawItem {
            primitive: Primitive::Lines(&self.decor.grid),
            material: self.grid_material,
            model: identity,
        });
        for (axis, material) in self.decor.axes.iter().zip(self.axis_materials) {
            items.push(DrawItem {
                primitive: Primitive::Lines(axis),
                material,
                model: identity,
            });
        }

        match (self.slot, bundle) {
            (Some(BundlePart::Main), Some(bundle)) => {
                push_model(&mut items, &bundle.main);
                let wireframe = &bundle.wireframe;
                items.push(DrawItem {
                    primitive: Primitive::Lines(&wireframe.edges),
                    material: wireframe.material,
                    model: wireframe.transform.matrix(),
                });
                if let Some(section) = &bundle.section {
                    if let Some(fill) = &section.fill {
                        items.push(DrawItem {
                            primitive: Primitive::Triangles(&fill.surface),
                            material: fill.material,
                            model: bundle.main.transform.matrix(),
                        });
                    }
                    items.push(DrawItem {
                        primitive: Primitive::Triangles(&section.indicator),
                        material: section.indicator_material,
                        model: identity,
                    });
                }
            }
            (Some(BundlePart::Ortho(v)), Some(bundle)) => push_model(&mut items, bundle.views.get(v)),
            _ => {}
        }

        items.retain(|item| item.material.visible);
        Frame {
            view,
            camera,
            ambient: self.decor.ambient,
            lights: &self.decor.lights,
            items,
        }
    }
}

fn push_model<'a>(items: &mut Vec<DrawItem<'a>>, model: &'a ShapeModel) {
    let matrix = model.transform.matrix();
    items.push(DrawItem {
        primitive: Primitive::Triangles(&model.surface),
        material: model.surface_material,
        model: matrix,
    });
    if let Some(markers) = &model.markers {
        items.push(DrawItem {
            primitive: Primitive::Triangles(markers),
            material: model.marker_material,
            model: matrix,
        });
    }
    items.push(DrawItem {
        primitive: Primitive::Lines(&model.edges),
        material: model.edge_material,
        model: matrix,
    });
    if let Some(grid) = &model.grid {
        items.push(DrawItem {
            primitive: Primitive::Lines(grid),
            material: model.grid_material,
            model: matrix,
        });
    }
}

/// A registered orthographic or mobile viewport
struct ViewState {
    camera: Camera,
    scene: Scene,
    surface: Box<dyn RenderSurface>,
    size: (u32, u32),
}

/// Owns the current bundle and every viewport that shows it.
///
/// The main view always has a camera and a scene; its surface and every
/// orthographic or mobile view exist only once the host registers them.
pub struct ViewCoordinator {
    current: Option<RenderBundle>,
    palette: Palette,
    ortho_view_factor: f32,
    fitted_dimension: Option<f32>,
    main_camera: Camera,
    main_scene: Scene,
    main_surface: Option<Box<dyn RenderSurface>>,
    main_size: (u32, u32),
    ortho: OrthoSet<Option<ViewState>>,
    mobile: OrthoSet<Option<ViewState>>,
    mobile_visible: bool,
}

impl ViewCoordinator {
    pub fn new(config: &VisualizerConfig) -> Self {
        let main_camera = Camera {
            position: ViewPreset::Isometric.spherical().to_cartesian(),
            ..Camera::default()
        };

        Self {
            current: None,
            palette: config.palette,
            ortho_view_factor: config.ortho_view_factor,
            fitted_dimension: None,
            main_camera,
            main_scene: Scene::new(
                SceneDecor::perspective(SCENE_GRID_EXTENT, SCENE_AXIS_LENGTH),
                &config.palette,
            ),
            main_surface: None,
            main_size: (0, 0),
            ortho: OrthoSet::default(),
            mobile: OrthoSet::default(),
            mobile_visible: config.mobile_visible,
        }
    }

    pub fn bundle(&self) -> Option<&RenderBundle> {
        self.current.as_ref()
    }

    pub fn bundle_mut(&mut self) -> Option<&mut RenderBundle> {
        self.current.as_mut()
    }

    pub fn main_camera(&self) -> &Camera {
        &self.main_camera
    }

    pub fn main_camera_mut(&mut self) -> &mut Camera {
        &mut self.main_camera
    }

    pub fn camera(&self, view: ViewId) -> Option<&Camera> {
        match view {
            ViewId::Main => Some(&self.main_camera),
            _ => self.state(view).map(|state| &state.camera),
        }
    }

    pub fn mobile_visible(&self) -> bool {
        self.mobile_visible
    }

    fn state(&self, view: ViewId) -> Option<&ViewState> {
        match view {
            ViewId::Main => None,
            ViewId::Ortho(v) => self.ortho.get(v).as_ref(),
            ViewId::Mobile(v) => self.mobile.get(v).as_ref(),
        }
    }

    fn state_mut(&mut self, view: ViewId) -> Option<&mut ViewState> {
        match view {
            ViewId::Main => None,
            ViewId::Ortho(v) => self.ortho.get_mut(v).as_mut(),
            ViewId::Mobile(v) => self.mobile.get_mut(v).as_mut(),
        }
    }

    fn slot_mut(&mut self, view: ViewId) -> Option<&mut Option<ViewState>> {
        match view {
            ViewId::Main => None,
            ViewId::Ortho(v) => Some(self.ortho.get_mut(v)),
            ViewId::Mobile(v) => Some(self.mobile.get_mut(v)),
        }
    }

    /// Bind a host surface to a viewport, returning the one it replaces
    pub fn register(
        &mut self,
        view: ViewId,
        surface: Box<dyn RenderSurface>,
    ) -> Option<Box<dyn RenderSurface>> {
        let size = surface.size();
        info!(%view, width = size.0, height = size.1, "view registered");

        if view == ViewId::Main {
            self.main_size = size;
            self.main_camera.set_aspect(container_aspect(size.0, size.1));
            return self.main_surface.replace(surface);
        }

        let mut scene = Scene::new(
            SceneDecor::orthographic(SCENE_GRID_EXTENT, SCENE_AXIS_LENGTH),
            &self.palette,
        );
        scene.slot = self.current.as_ref().map(|_| BundlePart::of(view));

        let mut camera = Camera::orthographic(ORTHO_CAMERA_DISTANCE, SCENE_GRID_EXTENT);
        if let Some(dimension) = self.fitted_dimension {
            camera.fit_orthographic(
                dimension * self.ortho_view_factor,
                container_aspect(size.0, size.1),
            );
        }

        let state = ViewState {
            camera,
            scene,
            surface,
            size,
        };
        self.slot_mut(view)?
            .replace(state)
            .map(|previous| previous.surface)
    }

    pub fn unregister(&mut self, view: ViewId) -> Option<Box<dyn RenderSurface>> {
        debug!(%view, "view unregistered");
        match view {
            ViewId::Main => self.main_surface.take(),
            _ => self.slot_mut(view)?.take().map(|state| state.surface),
        }
    }

    /// Swap in a new bundle everywhere at once and refit the cameras.
    /// Returns the previous bundle, already detached from every scene.
    pub fn attach(&mut self, bundle: RenderBundle) -> Option<RenderBundle> {
        let dimension = bundle.max_dimension();
        let previous = self.current.replace(bundle);

        self.main_scene.slot = Some(BundlePart::Main);
        for (view, slot) in self.ortho.iter_mut() {
            if let Some(state) = slot {
                state.scene.slot = Some(BundlePart::Ortho(view));
            }
        }
        for (view, slot) in self.mobile.iter_mut() {
            if let Some(state) = slot {
                state.scene.slot = Some(BundlePart::Ortho(view));
            }
        }
        self.fit_cameras(dimension);

        if let Some(previous) = &previous {
            debug!(kind = %previous.descriptor.kind(), "previous bundle detached");
        }
        previous
    }

    /// Empty every scene's shape slot
    pub fn detach(&mut self) -> Option<RenderBundle> {
        self.main_scene.slot = None;
        for slot in self.ortho.values_mut().chain(self.mobile.values_mut()) {
            if let Some(state) = slot {
                state.scene.slot = None;
            }
        }
        self.current.take()
    }

    /// Size every orthographic frustum so a shape whose largest dimension
    /// is `bounding_dimension` fits with square grid cells.
    pub fn fit_cameras(&mut self, bounding_dimension: f32) {
        self.fitted_dimension = Some(bounding_dimension);
        let base = bounding_dimension * self.ortho_view_factor;
        for slot in self.ortho.values_mut().chain(self.mobile.values_mut()) {
            if let Some(state) = slot {
                let (width, height) = state.size;
                state.camera.fit_orthographic(base, container_aspect(width, height));
            }
        }
        debug!(bounding_dimension, base, "cameras fitted");
    }

    /// Apply a new container size. Returns `false` when the view is not
    /// available or, for a hidden mobile view, the resize is deferred.
    pub fn resize(&mut self, view: ViewId, width: u32, height: u32) -> bool {
        match view {
            ViewId::Main => {
                self.main_size = (width, height);
                self.main_camera.set_aspect(container_aspect(width, height));
                match self.main_surface.as_mut() {
                    Some(surface) => {
                        surface.resize(width, height);
                        true
                    }
                    None => {
                        warn!(%view, "view unavailable, resize kept for later");
                        false
                    }
                }
            }
            ViewId::Mobile(_) if !self.mobile_visible => {
                debug!(%view, "mobile view hidden, resize deferred");
                false
            }
            _ => {
                let base = self.fitted_dimension.map(|d| d * self.ortho_view_factor);
                let Some(state) = self.state_mut(view) else {
                    warn!(%view, "view unavailable, resize ignored");
                    return false;
                };
                state.resize(width, height, base);
                true
            }
        }
    }

    /// Show or hide the mobile panel; showing it measures and resizes
    /// every mobile view.
    pub fn set_mobile_visible(&mut self, visible: bool) {
        if self.mobile_visible == visible {
            return;
        }
        self.mobile_visible = visible;
        info!(visible, "mobile views visibility changed");
        if !visible {
            return;
        }

        let base = self.fitted_dimension.map(|d| d * self.ortho_view_factor);
        for state in self.mobile.values_mut().flatten() {
            let (width, height) = state.surface.size();
            state.resize(width, height, base);
        }
    }

    /// Number of objects in a view's scene, `None` if the view does not exist
    pub fn scene_child_count(&self, view: ViewId) -> Option<usize> {
        let bundle = self.current.as_ref();
        match view {
            ViewId::Main => Some(self.main_scene.child_count(bundle)),
            _ => self.state(view).map(|state| state.scene.child_count(bundle)),
        }
    }

    /// Build the frame a view would present, without drawing it
    pub fn frame(&self, view: ViewId) -> Option<Frame<'_>> {
        let bundle = self.current.as_ref();
        match view {
            ViewId::Main => Some(self.main_scene.frame(view, &self.main_camera, bundle)),
            _ => self
                .state(view)
                .map(|state| state.scene.frame(view, &state.camera, bundle)),
        }
    }

    /// Draw every available view. Views that are not registered yet, and
    /// mobile views while hidden, are skipped. Returns the number drawn.
    pub fn render(&mut self) -> usize {
        let bundle = self.current.as_ref();
        let mut rendered = 0;

        if let Some(surface) = self.main_surface.as_mut() {
            let frame = self.main_scene.frame(ViewId::Main, &self.main_camera, bundle);
            surface.present(&frame);
            rendered += 1;
        }

        for (view, slot) in self.ortho.iter_mut() {
            if let Some(state) = slot {
                state.present(ViewId::Ortho(view), bundle);
                rendered += 1;
            }
        }

        if self.mobile_visible {
            for (view, slot) in self.mobile.iter_mut() {
                if let Some(state) = slot {
                    state.present(ViewId::Mobile(view), bundle);
                    rendered += 1;
                }
            }
        }

        rendered
    }
}

impl ViewState {
    fn resize(&mut self, width: u32, height: u32, base_view_size: Option<f32>) {
        self.size = (width, height);
        self.surface.resize(width, height);
        if let Some(base) = base_view_size {
            self.camera
                .fit_orthographic(base, container_aspect(width, height));
        }
    }

    fn present(&mut self, view: ViewId, bundle: Option<&RenderBundle>) {
        let frame = self.scene.frame(view, &self.camera, bundle);
        self.surface.present(&frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::ShapeFactory;
    use crate::shape::ShapeDescriptor;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Log {
        presented: Vec<(ViewId, usize)>,
        resized: Vec<(u32, u32)>,
    }

    struct TestSurface {
        size: (u32, u32),
        log: Rc<RefCell<Log>>,
    }

    impl RenderSurface for TestSurface {
        fn size(&self) -> (u32, u32) {
            self.size
        }

        fn resize(&mut self, width: u32, height: u32) {
            self.log.borrow_mut().resized.push((width, height));
        }

        fn present(&mut self, frame: &Frame<'_>) {
            self.log
                .borrow_mut()
                .presented
                .push((frame.view, frame.items.len()));
        }
    }

    fn surface(size: (u32, u32), log: &Rc<RefCell<Log>>) -> Box<dyn RenderSurface> {
        Box::new(TestSurface {
            size,
            log: Rc::clone(log),
        })
    }

    fn bundle(descriptor: ShapeDescriptor) -> RenderBundle {
        ShapeFactory::default().build(&descriptor).unwrap()
    }

    #[test]
    fn test_view_id_names() {
        assert_eq!(ViewId::all().count(), 9);
        for view in ViewId::all() {
            assert_eq!(view.to_string().parse::<ViewId>().unwrap(), view);
        }
        assert!("mobile-bottom".parse::<ViewId>().is_err());
    }

    #[test]
    fn test_render_tolerates_missing_views() {
        let mut views = ViewCoordinator::new(&VisualizerConfig::default());
        assert_eq!(views.render(), 0);

        let log = Rc::new(RefCell::new(Log::default()));
        views.register(ViewId::Ortho(OrthoView::Front), surface((200, 100), &log));
        assert_eq!(views.render(), 1);
        assert!(!views.resize(ViewId::Ortho(OrthoView::Top), 10, 10));
    }

    #[test]
    fn test_attach_fills_registered_and_late_views() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut views = ViewCoordinator::new(&VisualizerConfig::default());
        views.register(ViewId::Main, surface((800, 600), &log));
        views.register(ViewId::Ortho(OrthoView::Top), surface((100, 100), &log));

        assert!(views.attach(bundle(ShapeDescriptor::cube(3.0))).is_none());
        views.register(ViewId::Ortho(OrthoView::Left), surface((100, 100), &log));

        let decor = 5;
        assert_eq!(views.scene_child_count(ViewId::Main), Some(decor + 5));
        assert_eq!(views.scene_child_count(ViewId::Ortho(OrthoView::Top)), Some(decor + 2));
        assert_eq!(views.scene_child_count(ViewId::Ortho(OrthoView::Left)), Some(decor + 2));
        assert_eq!(views.scene_child_count(ViewId::Ortho(OrthoView::Right)), None);
    }

    #[test]
    fn test_fit_uses_container_aspect() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut views = ViewCoordinator::new(&VisualizerConfig::default());
        views.register(ViewId::Ortho(OrthoView::Front), surface((200, 100), &log));
        views.attach(bundle(ShapeDescriptor::cube(3.0)));

        let camera = views.camera(ViewId::Ortho(OrthoView::Front)).unwrap();
        assert_eq!(camera.half_extents(), Some((9.0, 4.5)));

        views.resize(ViewId::Ortho(OrthoView::Front), 100, 200);
        let camera = views.camera(ViewId::Ortho(OrthoView::Front)).unwrap();
        assert_eq!(camera.half_extents(), Some((4.5, 9.0)));
    }

    #[test]
    fn test_mobile_resize_waits_until_visible() {
        let log = Rc::new(RefCell::new(Log::default()));
        let mut views = ViewCoordinator::new(&VisualizerConfig::default());
        let mobile = ViewId::Mobile(OrthoView::Right);
        views.register(mobile, surface((120, 80), &log));
        views.attach(bundle(ShapeDescriptor::sphere(1.0)));

        assert!(!views.resize(mobile, 300, 300));
        assert!(log.borrow().resized.is_empty());
        assert_eq!(views.render(), 0);

        views.set_mobile_visible(true);
        assert_eq!(log.borrow().resized, vec![(120, 80)]);
        assert_eq!(views.render(), 1);
        assert!(views.resize(mobile, 300, 300));
    }

    #[test]
    fn test_detach_empties_slots() {
        let mut views = ViewCoordinator::new(&VisualizerConfig::default());
        views.attach(bundle(ShapeDescriptor::cone(1.0, 2.0)));
        let before = views.scene_child_count(ViewId::Main);
        assert!(views.detach().is_some());
        assert!(views.bundle().is_none());
        assert!(views.scene_child_count(ViewId::Main) < before);
        assert!(views.frame(ViewId::Main).unwrap().triangle_count() == 0);
    }

    #[test]
    fn test_hidden_wireframe_is_not_drawn() {
        let mut views = ViewCoordinator::new(&VisualizerConfig::default());
        let mut shape = bundle(ShapeDescriptor::cube(2.0));
        let drawn = |views: &ViewCoordinator| views.frame(ViewId::Main).unwrap().items.len();

        views.attach(shape.clone());
        let with_wireframe = drawn(&views);

        shape.wireframe.material.visible = false;
        views.attach(shape);
        assert_eq!(drawn(&views), with_wireframe - 1);
    }
}
