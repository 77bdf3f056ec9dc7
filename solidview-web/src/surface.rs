/// Render surfaces bound to DOM containers
use std::cell::RefCell;
use std::rc::Rc;

use solidview_core::{Frame, RenderSurface, ViewId};
use web_sys::Element;

use crate::snapshot::FrameSnapshot;

/// Slot the surface writes its last presented frame into
pub type FrameSlot = Rc<RefCell<Option<FrameSnapshot>>>;

/// Element id looked up for a view when the host does not name one
pub fn container_id(view: ViewId) -> String {
    format!("{view}-view")
}

/// A view drawn into a page element. The element's client box is the
/// viewport size; presented frames are kept for the page's GL code.
pub struct ContainerSurface {
    element: Element,
    latest: FrameSlot,
}

impl ContainerSurface {
    pub fn new(element: Element) -> (Self, FrameSlot) {
        let latest = FrameSlot::default();
        let surface = Self {
            element,
            latest: Rc::clone(&latest),
        };
        (surface, latest)
    }
}

impl RenderSurface for ContainerSurface {
    fn size(&self) -> (u32, u32) {
        (
            self.element.client_width().max(0) as u32,
            self.element.client_height().max(0) as u32,
        )
    }

    fn present(&mut self, frame: &Frame<'_>) {
        *self.latest.borrow_mut() = Some(FrameSnapshot::new(frame));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solidview_core::OrthoView;

    #[test]
    fn test_container_ids() {
        assert_eq!(container_id(ViewId::Main), "main-view");
        assert_eq!(container_id(ViewId::Ortho(OrthoView::Front)), "front-view");
        assert_eq!(
            container_id(ViewId::Mobile(OrthoView::Top)),
            "mobile-top-view"
        );
    }
}
