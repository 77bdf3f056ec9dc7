/// Error types shared by the core and its hosts
use thiserror::Error;

use crate::parser::ParseFailure;

/// Errors surfaced by visualizer operations.
#[derive(Debug, Error)]
pub enum VizError {
    /// A shape kind name that the factory does not know how to build
    #[error("unsupported shape kind: {0}")]
    UnsupportedShape(String),

    /// A catalog identifier with no predefined descriptor
    #[error("unknown catalog shape: {0}")]
    UnknownCatalogId(String),

    /// Dimensions that cannot produce a renderable solid
    #[error("degenerate shape: {message}")]
    DegenerateShape { message: String },

    /// Free text from which no shape could be derived
    #[error(transparent)]
    Parse(#[from] ParseFailure),

    /// A view name that is not one of the known viewports
    #[error("unknown view: {0}")]
    UnknownView(String),

    /// A cross-section plane name other than horizontal, vertical or angled
    #[error("unknown section plane: {0}")]
    UnknownSectionPlane(String),

    /// Host-supplied tunables outside their usable range
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The host cannot provide the rendering capability at all
    #[error("renderer unavailable: {0}")]
    RendererUnavailable(String),
}

impl VizError {
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateShape {
            message: message.into(),
        }
    }
}
