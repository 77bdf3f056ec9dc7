/// End-to-end shape lifecycle against recording render surfaces
use std::cell::RefCell;
use std::rc::Rc;

use approx::assert_relative_eq;
use solidview_core::{
    catalog, CrossSectionState, Frame, OrthoView, Primitive, RenderSurface, SectionPlane,
    ShapeDescriptor, ShapeKind, ViewId, ViewPreset, Visualizer, VizError,
};

#[derive(Debug, Default)]
struct Recorded {
    frames: Vec<(ViewId, usize, usize)>,
}

struct RecordingSurface {
    size: (u32, u32),
    log: Rc<RefCell<Recorded>>,
}

impl RenderSurface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn present(&mut self, frame: &Frame<'_>) {
        let lines = frame
            .items
            .iter()
            .filter(|item| matches!(item.primitive, Primitive::Lines(_)))
            .count();
        self.log
            .borrow_mut()
            .frames
            .push((frame.view, frame.triangle_count(), lines));
    }
}

fn visualizer_with_views() -> (Visualizer, Rc<RefCell<Recorded>>) {
    let log = Rc::new(RefCell::new(Recorded::default()));
    let mut viz = Visualizer::default();
    let views = [ViewId::Main]
        .into_iter()
        .chain(OrthoView::ALL.into_iter().map(ViewId::Ortho));
    for view in views {
        viz.register_surface(
            view,
            Box::new(RecordingSurface {
                size: (320, 240),
                log: Rc::clone(&log),
            }),
        );
    }
    (viz, log)
}

#[test]
fn test_swaps_do_not_accumulate_scene_children() {
    let (mut viz, _log) = visualizer_with_views();
    viz.load_shape("cube").unwrap();

    let counts = |viz: &Visualizer| -> Vec<Option<usize>> {
        ViewId::all()
            .map(|view| viz.views().scene_child_count(view))
            .collect()
    };
    let first = counts(&viz);

    for _ in 0..10 {
        viz.load_shape("rectangularPrism").unwrap();
        viz.load_shape("cube").unwrap();
    }
    assert_eq!(counts(&viz), first);
}

#[test]
fn test_every_registered_view_renders_each_load() {
    let (mut viz, log) = visualizer_with_views();
    viz.load_shape("cylinder").unwrap();

    let frames = &log.borrow().frames;
    assert_eq!(frames.len(), 5);
    for (view, triangles, _) in frames {
        assert!(*triangles > 0, "{view} drew no surface");
    }
}

#[test]
fn test_failed_build_keeps_previous_shape() {
    let (mut viz, log) = visualizer_with_views();
    viz.load_shape("sphere").unwrap();
    let rendered = log.borrow().frames.len();

    let err = viz.create_shape(ShapeDescriptor::cylinder(-1.0, 4.0)).unwrap_err();
    assert!(matches!(err, VizError::DegenerateShape { .. }));
    assert_eq!(viz.summary().unwrap().kind, ShapeKind::Sphere);
    assert_eq!(log.borrow().frames.len(), rendered);
}

#[test]
fn test_parser_scenarios_drive_the_views() {
    let (mut viz, _log) = visualizer_with_views();

    let summary = viz
        .parse_and_generate("Cylinder 4 units high with radius 2")
        .unwrap();
    assert_eq!(summary.kind, ShapeKind::Cylinder);
    assert_eq!(viz.descriptor(), Some(&ShapeDescriptor::cylinder(2.0, 4.0)));

    viz.parse_and_generate("cube with all sides equal 5").unwrap();
    assert_eq!(viz.descriptor(), Some(&ShapeDescriptor::cube(5.0)));

    assert!(matches!(
        viz.parse_and_generate("please draw something nice"),
        Err(VizError::Parse(_))
    ));
    assert_eq!(viz.descriptor(), Some(&ShapeDescriptor::cube(5.0)));
}

#[test]
fn test_section_offset_follows_current_shape() {
    let (mut viz, _log) = visualizer_with_views();
    viz.load_shape("cube").unwrap();
    viz.set_cross_section(CrossSectionState {
        enabled: true,
        plane: SectionPlane::Vertical,
        position: 1.0,
    });

    let plane = viz.views().bundle().unwrap().section.as_ref().unwrap().plane;
    assert_relative_eq!(plane.offset, 1.5);

    viz.set_section_position(0.5);
    for plane_kind in SectionPlane::ALL {
        viz.set_section_plane(plane_kind);
        let plane = viz.views().bundle().unwrap().section.as_ref().unwrap().plane;
        assert_eq!(plane.offset, 0.0);
    }

    // A new shape picks up the active cross-section
    viz.load_shape("sphere").unwrap();
    assert!(viz.views().bundle().unwrap().section.is_some());
}

#[test]
fn test_transition_scales_ortho_views_independently_of_main() {
    let (mut viz, _log) = visualizer_with_views();
    viz.load_shape("triangularPrism1").unwrap();
    viz.set_transition_percent(50.0);

    let bundle = viz.views().bundle().unwrap();
    assert_relative_eq!(bundle.main.surface_material.opacity, 0.45);
    for (_, model) in bundle.views.iter() {
        assert_relative_eq!(model.transform.scale, 0.85);
        assert_eq!(model.surface_material.opacity, 1.0);
    }
}

#[test]
fn test_preset_animation_and_drag_priority() {
    let (mut viz, _log) = visualizer_with_views();
    viz.load_shape("cone").unwrap();

    assert!(viz.apply_view_preset(ViewPreset::Side));
    for _ in 0..400 {
        viz.tick();
    }
    let placement = viz.camera_placement();
    assert_relative_eq!(placement.horizontal_deg, 90.0, epsilon = 1e-3);
    assert_relative_eq!(placement.distance, 12.0, epsilon = 1e-3);

    viz.begin_drag();
    assert!(!viz.reset_camera());
    viz.drag_pan(0.5, 0.0);
    viz.end_drag();
    assert_eq!(viz.views().main_camera().target, nalgebra::Point3::origin());
    assert!(viz.reset_camera());
}

#[test]
fn test_late_ortho_registration_shows_current_shape() {
    let log = Rc::new(RefCell::new(Recorded::default()));
    let mut viz = Visualizer::default();
    viz.load_shape(catalog::IDS[3]).unwrap();
    assert_eq!(viz.render(), 0);

    viz.register_surface(
        ViewId::Ortho(OrthoView::Top),
        Box::new(RecordingSurface {
            size: (100, 100),
            log: Rc::clone(&log),
        }),
    );
    assert_eq!(viz.render(), 1);
    let frames = &log.borrow().frames;
    assert!(frames[0].1 > 0);
}
