//! Error types with rich diagnostics using miette
//!
//! Attribute-level errors carry the attribute text as source so reports point at
//! the offending character.

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::Rule;

/// Convert a pest failure location into a span over the parsed text.
pub(crate) fn pest_span(err: &pest::error::Error<Rule>) -> SourceSpan {
    match err.location {
        pest::error::InputLocation::Pos(pos) => SourceSpan::from((pos, 0)),
        pest::error::InputLocation::Span((start, end)) => SourceSpan::from((start, end - start)),
    }
}

// ============================================================================
// Path data
// ============================================================================

/// Errors from the path-data parser.
#[derive(Error, Diagnostic, Debug)]
pub enum PathError {
    #[error("malformed path data: {message}")]
    #[diagnostic(code(taep::path::malformed))]
    Malformed {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
    },
}

impl PathError {
    pub(crate) fn malformed(data: &str, span: SourceSpan, message: impl Into<String>) -> Self {
        PathError::Malformed {
            message: message.into(),
            src: NamedSource::new("d", data.to_string()),
            span,
        }
    }
}

// ============================================================================
// Transforms
// ============================================================================

/// Errors from the transform-list parser.
///
/// A transform that cannot be parsed means the geometry of every node beneath it
/// is unknown, so this is fatal for a locator pass.
#[derive(Error, Diagnostic, Debug)]
pub enum TransformError {
    #[error("unknown transform: {message}")]
    #[diagnostic(
        code(taep::transform::unknown),
        help("supported functions: matrix, translate, scale, rotate, skewX, skewY")
    )]
    Unknown {
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("cannot parse from here")]
        span: SourceSpan,
    },
}

impl TransformError {
    pub(crate) fn unknown(text: &str, span: SourceSpan, message: impl Into<String>) -> Self {
        TransformError::Unknown {
            message: message.into(),
            src: NamedSource::new("transform", text.to_string()),
            span,
        }
    }
}

// ============================================================================
// Locator
// ============================================================================

/// Why a sentinel-colored path was not accepted as a tape.
///
/// These never abort a pass; the locator records them and moves on.
#[derive(Error, Diagnostic, Debug)]
pub enum RejectReason {
    #[error("has sentinel color, but its path data is malformed")]
    #[diagnostic(code(taep::locate::malformed_path))]
    MalformedPath(#[source] PathError),

    #[error("has sentinel color, but has {count} nodes instead of two")]
    #[diagnostic(code(taep::locate::not_two_point))]
    NotTwoPointPath { count: usize },

    #[error("has sentinel color, but has a curve")]
    #[diagnostic(code(taep::locate::not_straight))]
    NotAStraightLine,

    #[error("has sentinel color, but does not start with a move command")]
    #[diagnostic(code(taep::locate::missing_move_to))]
    MissingMoveTo,

    #[error("has sentinel color, but has (almost) zero length")]
    #[diagnostic(code(taep::locate::degenerate))]
    DegenerateSegment,

    #[error("has sentinel color, but has no defined stroke width")]
    #[diagnostic(code(taep::locate::missing_stroke_width))]
    MissingStrokeWidth,
}

/// Fatal errors that abort a whole locator pass.
#[derive(Error, Diagnostic, Debug)]
pub enum LocateError {
    #[error("cannot resolve transforms for path {path_id}")]
    #[diagnostic(code(taep::locate::transform))]
    Transform {
        path_id: String,
        #[source]
        #[diagnostic_source]
        source: TransformError,
    },
}

// ============================================================================
// Documents
// ============================================================================

/// Errors reading, writing or restructuring a document.
#[derive(Error, Diagnostic, Debug)]
pub enum DocumentError {
    #[error("XML error: {message}")]
    #[diagnostic(code(taep::document::xml))]
    Xml { message: String },

    #[error("document is empty")]
    #[diagnostic(code(taep::document::empty))]
    Empty,

    #[error("malformed document: {message}")]
    #[diagnostic(code(taep::document::malformed))]
    MalformedDocument { message: String },

    #[error("I/O error")]
    #[diagnostic(code(taep::document::io))]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    pub(crate) fn xml(err: impl std::fmt::Display) -> Self {
        DocumentError::Xml {
            message: err.to_string(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        DocumentError::MalformedDocument {
            message: message.into(),
        }
    }
}

// ============================================================================
// Rasterization
// ============================================================================

/// Errors from a rasterizer backend.
#[derive(Error, Diagnostic, Debug)]
pub enum RasterError {
    #[error("invalid raster size {width}x{height}")]
    #[diagnostic(code(taep::raster::invalid_size))]
    InvalidSize { width: u32, height: u32 },

    #[error("rasterizer failed: {message}")]
    #[diagnostic(code(taep::raster::backend))]
    Backend { message: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Document(#[from] DocumentError),
}
