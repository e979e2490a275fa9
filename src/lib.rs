//! Split vector drawings into tape strips for thermal label printers.
//!
//! A drawing marks each strip of tape with a straight path stroked in a
//! sentinel color: the path runs along the tape and its stroke width is the
//! tape width. [`Locator`] finds those paths and measures them in root
//! units, [`Reprojector`] turns each one into a standalone document cut to
//! the tape, and a [`Rasterizer`] renders that document at printer
//! resolution.
//!
//! ```no_run
//! let source = std::fs::read_to_string("drawing.svg").unwrap();
//! let extraction = taep::extract_tapes(&source, &taep::Config::default()).unwrap();
//! for tape in &extraction.tapes {
//!     println!("{}", tape.document.to_svg_string().unwrap());
//! }
//! ```

use pest_derive::Parser;

pub mod config;
pub mod document;
pub mod errors;
pub mod locate;
pub mod log;
pub mod path;
pub mod preview;
pub mod raster;
pub mod reproject;
pub mod transform;
pub mod types;

pub use config::{Config, MarkerRemoval};
pub use document::{Document, Element, NodeId, NodeKind};
pub use errors::{
    DocumentError, LocateError, PathError, RasterError, RejectReason, TransformError,
};
pub use locate::{Located, Locator, Rejection, TapeSegment};
pub use path::{PathCommand, PathData, parse_path};
pub use preview::{PreviewStyle, compose_preview};
pub use raster::{RasterImage, RasterSize, Rasterizer};
#[cfg(feature = "resvg")]
pub use raster::{ResvgRasterizer, normalize_svg};
pub use reproject::{Placement, Reprojector, Tape};
pub use transform::Transform;
pub use types::{Length, Page, Unit, ViewBox};

/// Parser for the attribute micro-syntaxes: path data, transform lists,
/// lengths and view boxes.
#[derive(Parser)]
#[grammar = "svg_data.pest"]
pub struct SvgDataParser;

/// Everything found in one drawing.
#[derive(Debug)]
pub struct Extraction {
    pub located: Located,
    /// One re-projected document per located segment, in the same order.
    pub tapes: Vec<Tape>,
}

/// A rendered tape image and where it goes.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedTape {
    /// 1-based position in document order.
    pub index: usize,
    pub placement: Placement,
    pub image: RasterImage,
}

/// Parse a drawing, locate its tapes and re-project each one.
///
/// Returns an error with diagnostics if the document cannot be read, a
/// transform on a marker's chain is broken, or a tape cannot be re-projected.
pub fn extract_tapes(source: &str, config: &Config) -> Result<Extraction, miette::Report> {
    let doc = Document::parse(source)?;
    extract_from_document(&doc, config)
}

/// Same as [`extract_tapes`] for an already parsed document.
pub fn extract_from_document(doc: &Document, config: &Config) -> Result<Extraction, miette::Report> {
    let located = Locator::from_config(config).locate(doc)?;
    let reprojector = Reprojector::from_config(config);
    let tapes = located
        .segments
        .iter()
        .map(|segment| reprojector.reproject(doc, segment))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Extraction { located, tapes })
}

/// Rasterize every extracted tape at printer resolution.
pub fn render_tapes(
    extraction: &Extraction,
    rasterizer: &dyn Rasterizer,
    config: &Config,
) -> Result<Vec<RenderedTape>, miette::Report> {
    extraction
        .located
        .segments
        .iter()
        .zip(&extraction.tapes)
        .enumerate()
        .map(|(i, (segment, tape))| {
            let size = RasterSize::for_tape(segment, config);
            let image = rasterizer.rasterize(&tape.document, size)?;
            Ok::<_, miette::Report>(RenderedTape {
                index: i + 1,
                placement: tape.placement,
                image,
            })
        })
        .collect()
}
