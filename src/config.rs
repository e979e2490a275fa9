//! Run configuration.

/// Default settings for a tape printer run.
pub mod defaults {
    /// Stroke color that marks a tape segment.
    pub const SENTINEL_COLOR: &str = "#cc0301";
    /// Printer resolution along the tape.
    pub const PRINTER_DPI: f64 = 180.0;
    /// Printable height of the tape in pixels.
    pub const PIXEL_HEIGHT: u32 = 127;
    /// Resolution of unitless and `px` lengths in source documents.
    pub const SOURCE_DPI: f64 = 96.0;
}

/// What to remove from a re-projected copy so the marker is not printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MarkerRemoval {
    /// Remove the marker's enclosing `<g>`, which in prepared drawings also
    /// holds the tape outline. Falls back to the path alone when the marker
    /// sits directly under the root.
    #[default]
    ContainingGroup,
    /// Remove only the marker path.
    PathOnly,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub sentinel_color: String,
    pub printer_dpi: f64,
    pub pixel_height: u32,
    pub source_dpi: f64,
    pub marker_removal: MarkerRemoval,
    /// Also drop every other sentinel-stroked path from each re-projected
    /// copy, so overlapping tapes do not print each other's markers.
    pub strip_other_markers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sentinel_color: defaults::SENTINEL_COLOR.to_string(),
            printer_dpi: defaults::PRINTER_DPI,
            pixel_height: defaults::PIXEL_HEIGHT,
            source_dpi: defaults::SOURCE_DPI,
            marker_removal: MarkerRemoval::default(),
            strip_other_markers: false,
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_sentinel_color(mut self, color: impl Into<String>) -> Self {
        self.sentinel_color = color.into();
        self
    }

    #[must_use]
    pub fn with_printer_dpi(mut self, dpi: f64) -> Self {
        self.printer_dpi = dpi;
        self
    }

    #[must_use]
    pub fn with_pixel_height(mut self, height: u32) -> Self {
        self.pixel_height = height;
        self
    }

    #[must_use]
    pub fn with_source_dpi(mut self, dpi: f64) -> Self {
        self.source_dpi = dpi;
        self
    }

    #[must_use]
    pub fn with_marker_removal(mut self, removal: MarkerRemoval) -> Self {
        self.marker_removal = removal;
        self
    }

    #[must_use]
    pub fn with_strip_other_markers(mut self, strip: bool) -> Self {
        self.strip_other_markers = strip;
        self
    }
}
