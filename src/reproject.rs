//! Re-projecting a document onto one tape.
//!
//! The output is a copy of the source in which all content sits in a single
//! group that maps the tape's start point to the left edge, its direction to
//! +x and its stroke center to half the tape width. A `transform` on the root
//! element moves into that group, since the segment was measured through it.
//! The page box is cut down to the tape itself.

use glam::{DVec2, dvec2};

use crate::config::{Config, MarkerRemoval};
use crate::document::{Document, Element, NodeId};
use crate::errors::DocumentError;
use crate::locate::{Locator, TapeSegment};
use crate::log::debug;
use crate::transform::Transform;
use crate::types::ViewBox;

/// `id` of the group that wraps the re-projected content.
pub const WRAPPER_ID: &str = "tape-transform";

/// Where a tape sits in the source drawing, in root units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub origin: DVec2,
    pub angle: f64,
    pub width: f64,
    pub length: f64,
}

impl Placement {
    pub fn from_segment(segment: &TapeSegment) -> Self {
        Self {
            origin: segment.start,
            angle: segment.angle,
            width: segment.width,
            length: segment.length,
        }
    }

    /// Maps the tape frame `(0, 0)..(length, width)` back into the source.
    ///
    /// This is the inverse of [`Reprojector::canonical_transform`].
    pub fn transform(&self) -> Transform {
        Transform::translate(self.origin.x, self.origin.y)
            * Transform::rotate(self.angle)
            * Transform::translate(0.0, -self.width / 2.0)
    }
}

/// A single-tape document and where it came from.
#[derive(Clone, Debug)]
pub struct Tape {
    pub document: Document,
    pub placement: Placement,
}

#[derive(Clone, Debug, Default)]
pub struct Reprojector {
    marker_removal: MarkerRemoval,
    /// Matches the markers of other tapes, when those are stripped too.
    other_markers: Option<Locator>,
}

impl Reprojector {
    pub fn new(marker_removal: MarkerRemoval) -> Self {
        Self {
            marker_removal,
            other_markers: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let reprojector = Self::new(config.marker_removal);
        if config.strip_other_markers {
            reprojector.with_other_markers_stripped(config.sentinel_color.clone())
        } else {
            reprojector
        }
    }

    /// Remove every path stroked in `sentinel` from the copy, not only the
    /// marker of the tape being re-projected. Other markers go alone; their
    /// groups stay.
    #[must_use]
    pub fn with_other_markers_stripped(mut self, sentinel: impl Into<String>) -> Self {
        self.other_markers = Some(Locator::new(sentinel));
        self
    }

    /// `translate(0, w/2) * rotate(-angle) * translate(-x1, -y1)`.
    pub fn canonical_transform(segment: &TapeSegment) -> Transform {
        Transform::translate(0.0, segment.width / 2.0)
            * Transform::rotate(-segment.angle)
            * Transform::translate(-segment.start.x, -segment.start.y)
    }

    /// Build the document for one tape.
    ///
    /// `source` must be the document the segment was located in. It is not
    /// modified.
    pub fn reproject(&self, source: &Document, segment: &TapeSegment) -> Result<Tape, DocumentError> {
        let root = source.root();
        match source.element(root) {
            Some(el) if el.local_name() == "svg" => {}
            _ => return Err(DocumentError::malformed("root element is not <svg>")),
        }
        if source.page().view_box.is_none() {
            return Err(DocumentError::malformed("root element has no usable viewBox"));
        }
        if !source.element(segment.node).is_some_and(|_| source.is_attached(segment.node)) {
            return Err(DocumentError::malformed(format!(
                "marker path {} is not part of this document",
                segment.path_id
            )));
        }

        let mut doc = source.clone();
        let root_xf = match doc.remove_attribute(root, "transform") {
            Some(text) => Transform::parse(&text).map_err(|e| {
                DocumentError::malformed(format!("root transform is unusable: {e}"))
            })?,
            None => Transform::IDENTITY,
        };
        let placed = Self::canonical_transform(segment) * root_xf;
        let wrapper = doc.wrap_children(
            root,
            Element::new("g")
                .with_attribute("id", WRAPPER_ID)
                .with_attribute("transform", placed.to_string()),
        );
        self.remove_marker(&mut doc, segment.node, wrapper);
        if let Some(locator) = &self.other_markers {
            let others: Vec<_> = doc
                .descendants(root)
                .filter(|&n| doc.element(n).is_some_and(|el| locator.is_sentinel(el)))
                .collect();
            for node in others {
                debug!(marker = node.index(), "removing other marker");
                doc.detach(node);
            }
        }

        let page = ViewBox::new(0.0, 0.0, segment.length, segment.width);
        doc.set_attribute(root, "viewBox", page.to_string());
        doc.set_attribute(root, "width", format!("{}mm", segment.length_mm));
        doc.set_attribute(root, "height", format!("{}mm", segment.width_mm));

        Ok(Tape {
            document: doc,
            placement: Placement::from_segment(segment),
        })
    }

    /// Detach the marker, or its enclosing group.
    fn remove_marker(&self, doc: &mut Document, marker: NodeId, wrapper: NodeId) {
        let target = match (self.marker_removal, doc.parent(marker)) {
            (MarkerRemoval::ContainingGroup, Some(parent))
                if parent != wrapper
                    && parent != doc.root()
                    && doc.element(parent).is_some_and(|el| el.local_name() == "g") =>
            {
                parent
            }
            _ => marker,
        };
        debug!(marker = marker.index(), detached = target.index(), "removing marker");
        doc.detach(target);
    }
}

/// Shorthand for `Reprojector::from_config(config).reproject(source, segment)`.
pub fn reproject(source: &Document, segment: &TapeSegment, config: &Config) -> Result<Tape, DocumentError> {
    Reprojector::from_config(config).reproject(source, segment)
}

/// The tape's end points in the re-projected frame: `(0, w/2)` and `(L, w/2)`.
pub fn canonical_endpoints(segment: &TapeSegment) -> (DVec2, DVec2) {
    let mid = segment.width / 2.0;
    (dvec2(0.0, mid), dvec2(segment.length, mid))
}
