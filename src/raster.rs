//! Rasterizing tape documents.
//!
//! The core never renders anything itself. A [`Rasterizer`] is handed in by
//! the caller; with the `resvg` feature an in-process backend is available.

use crate::config::Config;
use crate::document::Document;
use crate::errors::RasterError;
use crate::locate::TapeSegment;
use crate::types::MILLIMETERS_PER_INCH;

/// Target pixel size of a tape image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterSize {
    pub width: u32,
    pub height: u32,
}

impl RasterSize {
    /// Pixels along the tape at the printer resolution, by the printer's
    /// fixed pixel height.
    pub fn for_tape(segment: &TapeSegment, config: &Config) -> RasterSize {
        let width = (segment.length_mm / MILLIMETERS_PER_INCH * config.printer_dpi).round();
        RasterSize {
            width: width.max(0.0) as u32,
            height: config.pixel_height,
        }
    }
}

/// An encoded PNG and its dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Renders a document to exactly `size` pixels, stretching its page box.
pub trait Rasterizer {
    fn rasterize(&self, document: &Document, size: RasterSize) -> Result<RasterImage, RasterError>;
}

#[cfg(feature = "resvg")]
pub use backend::{ResvgRasterizer, normalize_svg};

#[cfg(feature = "resvg")]
mod backend {
    use super::{RasterImage, RasterSize, Rasterizer};
    use crate::document::Document;
    use crate::errors::RasterError;
    use crate::log::debug;

    fn backend_error(err: impl std::fmt::Display) -> RasterError {
        RasterError::Backend {
            message: err.to_string(),
        }
    }

    /// In-process renderer on a white background.
    #[derive(Default)]
    pub struct ResvgRasterizer {
        options: usvg::Options<'static>,
    }

    impl ResvgRasterizer {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl Rasterizer for ResvgRasterizer {
        fn rasterize(
            &self,
            document: &Document,
            size: RasterSize,
        ) -> Result<RasterImage, RasterError> {
            let invalid = RasterError::InvalidSize {
                width: size.width,
                height: size.height,
            };
            if size.width == 0 || size.height == 0 {
                return Err(invalid);
            }

            let svg = document.to_svg_string()?;
            let tree = usvg::Tree::from_str(&svg, &self.options).map_err(backend_error)?;
            let mut pixmap = tiny_skia::Pixmap::new(size.width, size.height).ok_or(invalid)?;
            pixmap.fill(tiny_skia::Color::WHITE);

            let tree_size = tree.size();
            let transform = tiny_skia::Transform::from_scale(
                size.width as f32 / tree_size.width(),
                size.height as f32 / tree_size.height(),
            );
            debug!(width = size.width, height = size.height, "rendering tape");
            resvg::render(&tree, transform, &mut pixmap.as_mut());

            Ok(RasterImage {
                width: size.width,
                height: size.height,
                png: pixmap.encode_png().map_err(backend_error)?,
            })
        }
    }

    /// Run the usvg simplifier over a drawing.
    ///
    /// Styles and CSS end up as plain presentation attributes and `<use>` is
    /// expanded, which is the shape the locator expects its input in.
    pub fn normalize_svg(source: &str) -> Result<String, RasterError> {
        let tree = usvg::Tree::from_str(source, &usvg::Options::default()).map_err(backend_error)?;
        Ok(tree.to_string(&usvg::WriteOptions::default()))
    }
}
