//! Finding tape segments in a document.
//!
//! A tape segment is a straight two-point path stroked in the sentinel
//! color. The locator walks every path in document order, resolves the
//! transform chain from the path up to the root, and measures the segment in
//! root units. Paths that carry the sentinel color but are not usable are
//! recorded as [`Rejection`]s and skipped.

use std::fmt;

use glam::DVec2;

use crate::config::Config;
use crate::document::{Document, Element, NodeId};
use crate::errors::{LocateError, RejectReason, TransformError};
use crate::log::{self, debug};
use crate::path::{PathCommand, parse_path};
use crate::transform::Transform;
use crate::types::leading_number;

/// Endpoints this close or closer in root units make a segment unusable.
pub const DEGENERATE_LENGTH: f64 = 1e-3;

/// Placeholder used in diagnostics for paths without an `id`.
pub const NO_ID: &str = "<no id>";

/// Geometry of one accepted tape segment, in root units.
#[derive(Clone, Debug, PartialEq)]
pub struct TapeSegment {
    /// The marker path in the located document.
    pub node: NodeId,
    pub path_id: String,
    /// Transformed start point.
    pub start: DVec2,
    /// Transformed end point.
    pub end: DVec2,
    pub length: f64,
    /// Direction of `start -> end` in radians, `atan2(dy, dx)`.
    pub angle: f64,
    /// Physical stroke width, rounded to three decimals.
    pub width: f64,
    /// Root transform of the marker path.
    pub transform: Transform,
    pub length_mm: f64,
    pub width_mm: f64,
}

impl TapeSegment {
    pub fn angle_degrees(&self) -> f64 {
        self.angle.to_degrees()
    }
}

impl fmt::Display for TapeSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Identified tape from path \"{}\", length {:.2} mm, angle {:.1} deg with physical stroke width {:.2} mm from ({:.2}, {:.2}) to ({:.2}, {:.2})",
            self.path_id,
            self.length_mm,
            self.angle_degrees(),
            self.width_mm,
            self.start.x,
            self.start.y,
            self.end.x,
            self.end.y,
        )
    }
}

/// A sentinel-colored path that was skipped.
#[derive(Debug)]
pub struct Rejection {
    pub node: NodeId,
    pub path_id: String,
    pub reason: RejectReason,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path {} {}. Ignoring.", self.path_id, self.reason)
    }
}

/// Result of a locator pass. Both lists are in document order.
#[derive(Debug, Default)]
pub struct Located {
    pub segments: Vec<TapeSegment>,
    pub rejections: Vec<Rejection>,
}

#[derive(Clone, Debug)]
pub struct Locator {
    sentinel: String,
    source_dpi: f64,
}

impl Locator {
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
            source_dpi: crate::config::defaults::SOURCE_DPI,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sentinel_color.clone()).with_source_dpi(config.source_dpi)
    }

    #[must_use]
    pub fn with_source_dpi(mut self, dpi: f64) -> Self {
        self.source_dpi = dpi;
        self
    }

    pub(crate) fn is_sentinel(&self, el: &Element) -> bool {
        el.local_name() == "path"
            && el
                .attribute("stroke")
                .is_some_and(|stroke| stroke.eq_ignore_ascii_case(&self.sentinel))
    }

    /// Scan `doc` for tape segments.
    ///
    /// Fails only when the transform chain of a candidate cannot be parsed;
    /// every other problem is a per-path [`Rejection`].
    pub fn locate(&self, doc: &Document) -> Result<Located, LocateError> {
        let mm_scale = doc.page().mm_per_unit(self.source_dpi);
        let mut located = Located::default();

        for node in doc.descendants(doc.root()) {
            let Some(el) = doc.element(node) else {
                continue;
            };
            if !self.is_sentinel(el) {
                continue;
            }
            let path_id = el.id().unwrap_or(NO_ID).to_string();

            let outcome = match endpoints(el) {
                Ok((p1, p2)) => {
                    let xf = root_transform(doc, node).map_err(|source| {
                        LocateError::Transform {
                            path_id: path_id.clone(),
                            source,
                        }
                    })?;
                    measure(node, &path_id, el, (p1, p2), xf, mm_scale)
                }
                Err(reason) => Err(reason),
            };

            match outcome {
                Ok(segment) => {
                    log::tape_identified(&segment);
                    located.segments.push(segment);
                }
                Err(reason) => {
                    let rejection = Rejection {
                        node,
                        path_id,
                        reason,
                    };
                    log::candidate_rejected(&rejection);
                    located.rejections.push(rejection);
                }
            }
        }

        Ok(located)
    }
}

/// Local endpoints of a move-then-line path.
fn endpoints(el: &Element) -> Result<(DVec2, DVec2), RejectReason> {
    let commands = parse_path(el.attribute("d").unwrap_or_default())
        .map_err(RejectReason::MalformedPath)?;
    if commands.len() != 2 {
        return Err(RejectReason::NotTwoPointPath {
            count: commands.len(),
        });
    }
    let PathCommand::LineTo(end) = commands[1] else {
        return Err(RejectReason::NotAStraightLine);
    };
    let PathCommand::MoveTo(start) = commands[0] else {
        return Err(RejectReason::MissingMoveTo);
    };
    Ok((start, end))
}

/// The node's own transform composed with every ancestor's, outermost first.
pub fn root_transform(doc: &Document, node: NodeId) -> Result<Transform, TransformError> {
    let own = |id: NodeId| match doc.attribute(id, "transform") {
        Some(text) => Transform::parse(text),
        None => Ok(Transform::IDENTITY),
    };
    let mut xf = own(node)?;
    for ancestor in doc.ancestors(node) {
        xf = own(ancestor)? * xf;
    }
    debug!(node = node.index(), transform = %xf, "resolved transform chain");
    Ok(xf)
}

fn measure(
    node: NodeId,
    path_id: &str,
    el: &Element,
    (p1, p2): (DVec2, DVec2),
    xf: Transform,
    mm_scale: DVec2,
) -> Result<TapeSegment, RejectReason> {
    let start = xf.apply(p1);
    let end = xf.apply(p2);
    let length = start.distance(end);
    if length <= DEGENERATE_LENGTH {
        return Err(RejectReason::DegenerateSegment);
    }

    let nominal = el
        .attribute("stroke-width")
        .and_then(leading_number)
        .ok_or(RejectReason::MissingStrokeWidth)?;

    let delta = end - start;
    let angle = delta.y.atan2(delta.x);

    // Offset across the untransformed segment, then measure after transforming.
    let normal = (p2 - p1).normalize().perp() * (nominal / 2.0);
    let edge_a = xf.apply(p1 + normal);
    let edge_b = xf.apply(p1 - normal);
    let width = round3(edge_a.distance(edge_b));

    let length_mm = (start * mm_scale).distance(end * mm_scale);
    let width_mm = round3((edge_a * mm_scale).distance(edge_b * mm_scale));

    Ok(TapeSegment {
        node,
        path_id: path_id.to_string(),
        start,
        end,
        length,
        angle,
        width,
        transform: xf,
        length_mm,
        width_mm,
    })
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Shorthand for `Locator::from_config(config).locate(doc)`.
pub fn locate(doc: &Document, config: &Config) -> Result<Located, LocateError> {
    Locator::from_config(config).locate(doc)
}
