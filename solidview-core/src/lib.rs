/// Solidview Core Library - shape generation and multi-view synchronization
///
/// This library holds everything that does not depend on a platform:
/// shape metrics, the free-text parser, mesh and overlay generation, view
/// coordination, the transition and cross-section controller and the
/// camera animator. Hosts supply render surfaces and drive the frame tick.

pub mod animator;
pub mod config;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod metrics;
pub mod ortho;
pub mod overlay;
pub mod parser;
pub mod primitives;
pub mod projection;
pub mod shape;
pub mod transform;
pub mod transition;
pub mod views;
pub mod visualizer;

// Re-export commonly used types
pub use animator::{CameraAnimator, CameraMotion, Spherical, ViewPreset};
pub use config::VisualizerConfig;
pub use error::VizError;
pub use factory::{Material, RenderBundle, ShapeFactory, ShapeModel, Side};
pub use geometry::{LineSet, Mesh, Triangle, Vertex};
pub use metrics::{compute_metrics, DerivedMetrics};
pub use ortho::{OrthoSet, OrthoView};
pub use parser::{parse, ParseFailure};
pub use projection::{Camera, Projection};
pub use shape::{catalog, ShapeDescriptor, ShapeKind};
pub use transform::{ModelTransform, Transform};
pub use transition::{ClipPlane, CrossSectionState, SectionPlane, TransitionState};
pub use views::{DrawItem, Frame, Primitive, RenderSurface, ViewCoordinator, ViewId};
pub use visualizer::{ShapeSummary, Visualizer};
