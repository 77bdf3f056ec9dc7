/// WebAssembly bindings for the Solidview visualizer.
///
/// The page owns the containers and the GL drawing; this crate owns every
/// piece of visualizer state and hands back a plain snapshot per view.
///
/// ## Example
///
/// ```js
/// import init, { WebVisualizer } from 'solidview-web';
///
/// await init();
/// const viz = new WebVisualizer({ mobile_visible: false });
/// viz.attachDefaultContainers();
/// viz.loadShape('cube');
///
/// function frame() {
///   viz.tick();
///   drawView(viz.frame('main'));
///   requestAnimationFrame(frame);
/// }
/// ```
use std::collections::HashMap;
use std::io;
use std::str::FromStr;

use serde::Serialize;
use solidview_core::{
    catalog, CrossSectionState, SectionPlane, ShapeDescriptor, ShapeKind, ViewId, ViewPreset,
    Visualizer, VisualizerConfig, VizError,
};
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlCanvasElement, WebGl2RenderingContext};

pub mod snapshot;
pub mod surface;

pub use snapshot::{FrameSnapshot, ItemSnapshot};
pub use surface::{container_id, ContainerSurface, FrameSlot};

/// Install the panic hook and route tracing output to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    // `try_init` so a second module instance on the page is harmless
    let _ = tracing_subscriber::fmt()
        .with_writer(|| ConsoleWriter)
        .with_ansi(false)
        .without_time()
        .try_init();
}

struct ConsoleWriter;

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line = String::from_utf8_lossy(buf);
        web_sys::console::log_1(&JsValue::from_str(line.trim_end()));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsError::new(&format!("Serialization failed: {}", e)))
}

fn parse_view(name: &str) -> Result<ViewId, JsError> {
    Ok(ViewId::from_str(name)?)
}

fn document() -> Result<Document, VizError> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| VizError::RendererUnavailable("no document to render into".into()))
}

/// Fail early when the browser cannot give us a WebGL2 context at all
fn ensure_webgl2(document: &Document) -> Result<(), VizError> {
    let unavailable = || VizError::RendererUnavailable("WebGL2 is not supported".into());
    let canvas = document
        .create_element("canvas")
        .ok()
        .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok())
        .ok_or_else(unavailable)?;

    match canvas.get_context("webgl2") {
        Ok(Some(context)) if context.clone().dyn_into::<WebGl2RenderingContext>().is_ok() => Ok(()),
        _ => Err(unavailable()),
    }
}

struct Container {
    element: web_sys::Element,
    latest: FrameSlot,
}

/// The visualizer as seen from JavaScript.
#[wasm_bindgen]
pub struct WebVisualizer {
    visualizer: Visualizer,
    document: Document,
    containers: HashMap<ViewId, Container>,
}

impl WebVisualizer {
    fn attach(&mut self, view: ViewId, element_id: &str) -> bool {
        let Some(element) = self.document.get_element_by_id(element_id) else {
            warn!(%view, element_id, "container not found, view skipped");
            return false;
        };
        let (surface, latest) = ContainerSurface::new(element.clone());
        self.visualizer.register_surface(view, Box::new(surface));
        self.containers.insert(view, Container { element, latest });
        true
    }
}

#[wasm_bindgen]
impl WebVisualizer {
    /// Create a visualizer. `config` may be omitted or partial; missing
    /// fields keep their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<WebVisualizer, JsError> {
        let config: VisualizerConfig = if config.is_undefined() || config.is_null() {
            VisualizerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsError::new(&format!("Invalid config: {}", e)))?
        };

        let visualizer = Visualizer::new(config)?;
        let document = document()?;
        ensure_webgl2(&document)?;

        info!("web visualizer created");
        Ok(Self {
            visualizer,
            document,
            containers: HashMap::new(),
        })
    }

    /// Get the version of the bindings.
    #[wasm_bindgen(js_name = version)]
    pub fn version() -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    /// Ids accepted by `loadShape`.
    #[wasm_bindgen(js_name = catalogIds)]
    pub fn catalog_ids() -> js_sys::Array {
        catalog::IDS.iter().map(|id| JsValue::from_str(id)).collect()
    }

    /// Bind a view to the element with `element_id`. Returns false, and
    /// logs, when the page has no such element.
    #[wasm_bindgen(js_name = attachContainer)]
    pub fn attach_container(&mut self, view: &str, element_id: &str) -> Result<bool, JsError> {
        let view = parse_view(view)?;
        Ok(self.attach(view, element_id))
    }

    /// Bind every view to its conventional `<view>-view` element, skipping
    /// those the page leaves out. Returns the number bound.
    #[wasm_bindgen(js_name = attachDefaultContainers)]
    pub fn attach_default_containers(&mut self) -> usize {
        ViewId::all()
            .filter(|&view| self.attach(view, &container_id(view)))
            .count()
    }

    #[wasm_bindgen(js_name = detachContainer)]
    pub fn detach_container(&mut self, view: &str) -> Result<bool, JsError> {
        let view = parse_view(view)?;
        self.containers.remove(&view);
        Ok(self.visualizer.unregister_surface(view).is_some())
    }

    /// Load a catalog shape and return its summary.
    #[wasm_bindgen(js_name = loadShape)]
    pub fn load_shape(&mut self, id: &str) -> Result<JsValue, JsError> {
        let summary = self.visualizer.load_shape(id)?;
        to_js(summary)
    }

    /// Build a shape from a plain-language description.
    #[wasm_bindgen(js_name = parseAndGenerate)]
    pub fn parse_and_generate(&mut self, text: &str) -> Result<JsValue, JsError> {
        let summary = self.visualizer.parse_and_generate(text)?;
        to_js(summary)
    }

    /// Build a shape from a JSON descriptor such as
    /// `{"kind": "cylinder", "radius": 2, "height": 4}`.
    #[wasm_bindgen(js_name = createShape)]
    pub fn create_shape(&mut self, json: &str) -> Result<JsValue, JsError> {
        let mut value: serde_json::Value =
            serde_json::from_str(json).map_err(|e| JsError::new(&format!("Invalid JSON: {}", e)))?;

        let name = value
            .get("kind")
            .and_then(|kind| kind.as_str())
            .unwrap_or_default();
        let kind = ShapeKind::from_str(name)?;
        value["kind"] = kind.as_str().into();

        let descriptor: ShapeDescriptor = serde_json::from_value(value)
            .map_err(|e| JsError::new(&format!("Invalid {} descriptor: {}", kind, e)))?;
        let summary = self.visualizer.create_shape(descriptor)?;
        to_js(summary)
    }

    #[wasm_bindgen(js_name = clearShape)]
    pub fn clear_shape(&mut self) {
        self.visualizer.clear_shape();
    }

    /// Summary of the current shape, or `null`.
    pub fn summary(&self) -> Result<JsValue, JsError> {
        match self.visualizer.summary() {
            Some(summary) => to_js(summary),
            None => Ok(JsValue::NULL),
        }
    }

    /// Blend from the slider position in `[0, 100]`.
    #[wasm_bindgen(js_name = setTransition)]
    pub fn set_transition(&mut self, percent: f32) {
        self.visualizer.set_transition_percent(percent);
    }

    #[wasm_bindgen(js_name = transitionValue)]
    pub fn transition_value(&self) -> f32 {
        self.visualizer.transition().value()
    }

    #[wasm_bindgen(js_name = setCrossSection)]
    pub fn set_cross_section(
        &mut self,
        enabled: bool,
        plane: &str,
        position: f32,
    ) -> Result<(), JsError> {
        let plane = SectionPlane::from_str(plane)?;
        self.visualizer.set_cross_section(CrossSectionState {
            enabled,
            plane,
            position,
        });
        Ok(())
    }

    #[wasm_bindgen(js_name = setSectionEnabled)]
    pub fn set_section_enabled(&mut self, enabled: bool) {
        self.visualizer.set_cross_section_enabled(enabled);
    }

    #[wasm_bindgen(js_name = setSectionPlane)]
    pub fn set_section_plane(&mut self, plane: &str) -> Result<(), JsError> {
        let plane = SectionPlane::from_str(plane)?;
        self.visualizer.set_section_plane(plane);
        Ok(())
    }

    /// Cut position in `[0, 1]` along the plane normal.
    #[wasm_bindgen(js_name = setSectionPosition)]
    pub fn set_section_position(&mut self, position: f32) {
        self.visualizer.set_section_position(position);
    }

    #[wasm_bindgen(js_name = crossSection)]
    pub fn cross_section(&self) -> Result<JsValue, JsError> {
        to_js(&self.visualizer.cross_section())
    }

    /// Animate the main camera to a named preset. Returns false while the
    /// user is dragging.
    #[wasm_bindgen(js_name = applyViewPreset)]
    pub fn apply_view_preset(&mut self, preset: &str) -> Result<bool, JsError> {
        let preset = ViewPreset::from_str(preset)?;
        Ok(self.visualizer.apply_view_preset(preset))
    }

    #[wasm_bindgen(js_name = resetCamera)]
    pub fn reset_camera(&mut self) -> bool {
        self.visualizer.reset_camera()
    }

    #[wasm_bindgen(js_name = setCameraPosition)]
    pub fn set_camera_position(&mut self, horizontal_deg: f32, vertical_deg: f32, distance: f32) -> bool {
        self.visualizer
            .set_camera_position(horizontal_deg, vertical_deg, distance)
    }

    #[wasm_bindgen(js_name = cameraPlacement)]
    pub fn camera_placement(&self) -> Result<JsValue, JsError> {
        to_js(&self.visualizer.camera_placement())
    }

    #[wasm_bindgen(js_name = beginDrag)]
    pub fn begin_drag(&mut self) {
        self.visualizer.begin_drag();
    }

    #[wasm_bindgen(js_name = dragOrbit)]
    pub fn drag_orbit(&mut self, dh_deg: f32, dv_deg: f32) {
        self.visualizer.drag_orbit(dh_deg, dv_deg);
    }

    #[wasm_bindgen(js_name = dragPan)]
    pub fn drag_pan(&mut self, dx: f32, dy: f32) {
        self.visualizer.drag_pan(dx, dy);
    }

    #[wasm_bindgen(js_name = endDrag)]
    pub fn end_drag(&mut self) {
        self.visualizer.end_drag();
    }

    /// Advance the camera animation and redraw. Call once per animation
    /// frame; returns the number of views drawn.
    pub fn tick(&mut self) -> usize {
        self.visualizer.tick()
    }

    /// Resize one view to explicit pixel dimensions.
    pub fn resize(&mut self, view: &str, width: u32, height: u32) -> Result<bool, JsError> {
        let view = parse_view(view)?;
        Ok(self.visualizer.resize(view, width, height))
    }

    /// Re-measure every bound container, e.g. from a window resize handler.
    #[wasm_bindgen(js_name = resizeAll)]
    pub fn resize_all(&mut self) {
        for (view, container) in &self.containers {
            let width = container.element.client_width().max(0) as u32;
            let height = container.element.client_height().max(0) as u32;
            self.visualizer.resize(*view, width, height);
        }
    }

    #[wasm_bindgen(js_name = setMobileVisible)]
    pub fn set_mobile_visible(&mut self, visible: bool) {
        self.visualizer.set_mobile_visible(visible);
    }

    /// The frame a view presented on its last draw, or `null` if it has
    /// not been drawn yet.
    pub fn frame(&self, view: &str) -> Result<JsValue, JsError> {
        let view = parse_view(view)?;
        match self
            .containers
            .get(&view)
            .and_then(|container| container.latest.borrow().clone())
        {
            Some(snapshot) => to_js(&snapshot),
            None => Ok(JsValue::NULL),
        }
    }
}
