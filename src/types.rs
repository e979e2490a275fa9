//! Lengths, units and page metadata.
//!
//! Geometry inside the engine is done in root user units. These types only exist
//! to turn user units into millimeters for the printer and back.

use std::fmt;

use glam::{DVec2, dvec2};
use pest::Parser;

use crate::document::Document;
use crate::log::warn;
use crate::{Rule, SvgDataParser};

pub const MILLIMETERS_PER_INCH: f64 = 25.4;

/// Absolute length units understood on the root element.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    Px,
    Mm,
    Cm,
    In,
    Pt,
    Pc,
}

impl Unit {
    fn from_suffix(suffix: &str) -> Option<Unit> {
        match suffix {
            "px" => Some(Unit::Px),
            "mm" => Some(Unit::Mm),
            "cm" => Some(Unit::Cm),
            "in" => Some(Unit::In),
            "pt" => Some(Unit::Pt),
            "pc" => Some(Unit::Pc),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Px => "px",
            Unit::Mm => "mm",
            Unit::Cm => "cm",
            Unit::In => "in",
            Unit::Pt => "pt",
            Unit::Pc => "pc",
        }
    }

    /// Millimeters per one of this unit. Pixels depend on the source DPI.
    fn in_mm(self, source_dpi: f64) -> f64 {
        match self {
            Unit::Px => MILLIMETERS_PER_INCH / source_dpi,
            Unit::Mm => 1.0,
            Unit::Cm => 10.0,
            Unit::In => MILLIMETERS_PER_INCH,
            Unit::Pt => MILLIMETERS_PER_INCH / 72.0,
            Unit::Pc => MILLIMETERS_PER_INCH / 6.0,
        }
    }
}

/// A number with an absolute unit, e.g. a root `width="210mm"`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Length {
    pub value: f64,
    pub unit: Unit,
}

impl Length {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn mm(value: f64) -> Self {
        Self::new(value, Unit::Mm)
    }

    /// Parse a length attribute. Unitless values are pixels.
    pub fn parse(text: &str) -> Option<Length> {
        let pair = SvgDataParser::parse(Rule::length, text).ok()?.next()?;
        let mut value = None;
        let mut unit = Unit::Px;
        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::number => value = inner.as_str().parse().ok(),
                Rule::unit => unit = Unit::from_suffix(inner.as_str())?,
                _ => {}
            }
        }
        Some(Length::new(value?, unit))
    }

    pub fn to_mm(self, source_dpi: f64) -> f64 {
        self.value * self.unit.in_mm(source_dpi)
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Convert device pixels at `dpi` into millimeters.
pub fn px_to_mm(px: f64, dpi: f64) -> f64 {
    px / dpi * MILLIMETERS_PER_INCH
}

/// Parse the leading number of an attribute, ignoring whatever follows.
///
/// `"24px"` and `"24"` both give 24.
pub fn leading_number(text: &str) -> Option<f64> {
    let pair = SvgDataParser::parse(Rule::leading_number, text).ok()?.next()?;
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::number)
        .and_then(|p| p.as_str().parse().ok())
}

/// The root `viewBox`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewBox {
    pub min_x: f64,
    pub min_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ViewBox {
    pub fn new(min_x: f64, min_y: f64, width: f64, height: f64) -> Self {
        Self {
            min_x,
            min_y,
            width,
            height,
        }
    }

    pub fn parse(text: &str) -> Option<ViewBox> {
        let pair = SvgDataParser::parse(Rule::view_box, text).ok()?.next()?;
        let nums: Vec<f64> = pair
            .into_inner()
            .filter(|p| p.as_rule() == Rule::number)
            .map(|p| p.as_str().parse())
            .collect::<Result<_, _>>()
            .ok()?;
        match nums[..] {
            [min_x, min_y, width, height] => Some(ViewBox::new(min_x, min_y, width, height)),
            _ => None,
        }
    }
}

impl fmt::Display for ViewBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.min_x, self.min_y, self.width, self.height
        )
    }
}

/// Page metadata of a document root.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Page {
    pub view_box: Option<ViewBox>,
    pub width: Option<Length>,
    pub height: Option<Length>,
}

impl Page {
    /// Read page metadata from the root element. Unparseable values are
    /// logged and treated as absent.
    pub fn from_document(doc: &Document) -> Page {
        let root = doc.root();
        let read = |name: &str| doc.attribute(root, name);

        let view_box = read("viewBox").and_then(|text| {
            let parsed = ViewBox::parse(text);
            if parsed.is_none() {
                warn!(view_box = text, "ignoring malformed viewBox");
            }
            parsed
        });
        let length = |name: &str| {
            read(name).and_then(|text| {
                let parsed = Length::parse(text);
                if parsed.is_none() {
                    warn!(attribute = name, value = text, "ignoring unsupported page length");
                }
                parsed
            })
        };

        Page {
            view_box,
            width: length("width"),
            height: length("height"),
        }
    }

    /// Millimeters per root user unit along each axis.
    ///
    /// A missing width/height falls back to the view box size in pixels; a
    /// missing view box makes one user unit one pixel.
    pub fn mm_per_unit(&self, source_dpi: f64) -> DVec2 {
        let px_mm = MILLIMETERS_PER_INCH / source_dpi;
        let Some(vb) = self.view_box else {
            return DVec2::splat(px_mm);
        };
        let axis = |declared: Option<Length>, extent: f64| match declared {
            Some(len) if extent.abs() > f64::EPSILON => len.to_mm(source_dpi) / extent,
            _ => px_mm,
        };
        dvec2(axis(self.width, vb.width), axis(self.height, vb.height))
    }
}
