//! Affine transforms and the SVG `transform` attribute.
//!
//! A [`Transform`] holds the six coefficients `(a, b, c, d, e, f)` that map
//! `(x, y)` to `(a*x + c*y + e, b*x + d*y + f)`. `outer * inner` applies
//! `inner` first, which is how a parent's transform wraps a child's.

use std::fmt;
use std::ops::{Mul, MulAssign};

use glam::{DAffine2, DMat2, DVec2, dvec2};
use pest::Parser;
use pest::iterators::Pair;

use crate::errors::{TransformError, pest_span};
use crate::{Rule, SvgDataParser};

/// A 2D affine transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform(DAffine2);

impl Transform {
    pub const IDENTITY: Transform = Transform(DAffine2::IDENTITY);

    /// Construct from `(a, b, c, d, e, f)`.
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Transform {
        Transform(DAffine2::from_cols_array(&[a, b, c, d, e, f]))
    }

    /// Same as [`Transform::new`], named after the SVG function.
    pub fn matrix(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Transform {
        Transform::new(a, b, c, d, e, f)
    }

    pub fn translate(x: f64, y: f64) -> Transform {
        Transform(DAffine2::from_translation(dvec2(x, y)))
    }

    pub fn scale(x: f64, y: f64) -> Transform {
        Transform(DAffine2::from_scale(dvec2(x, y)))
    }

    pub fn uniform_scale(s: f64) -> Transform {
        Transform::scale(s, s)
    }

    /// Rotation by `angle` radians about the origin.
    pub fn rotate(angle: f64) -> Transform {
        Transform(DAffine2::from_angle(angle))
    }

    /// Rotation by `angle` radians about `(cx, cy)`.
    pub fn rotate_about(angle: f64, cx: f64, cy: f64) -> Transform {
        Transform::translate(cx, cy) * Transform::rotate(angle) * Transform::translate(-cx, -cy)
    }

    pub fn skew_x(angle: f64) -> Transform {
        Transform(DAffine2::from_mat2(DMat2::from_cols_array(&[
            1.0,
            0.0,
            angle.tan(),
            1.0,
        ])))
    }

    pub fn skew_y(angle: f64) -> Transform {
        Transform(DAffine2::from_mat2(DMat2::from_cols_array(&[
            1.0,
            angle.tan(),
            0.0,
            1.0,
        ])))
    }

    /// The coefficients `[a, b, c, d, e, f]`.
    pub fn coefficients(&self) -> [f64; 6] {
        self.0.to_cols_array()
    }

    /// `self * inner`: apply `inner`, then `self`.
    #[must_use]
    pub fn compose(self, inner: Transform) -> Transform {
        Transform(self.0 * inner.0)
    }

    pub fn apply(&self, point: DVec2) -> DVec2 {
        self.0.transform_point2(point)
    }

    pub fn abs_diff_eq(&self, other: &Transform, max_abs_diff: f64) -> bool {
        self.0.abs_diff_eq(other.0, max_abs_diff)
    }

    /// Parse an SVG transform list.
    ///
    /// Functions compose in textual order: `"translate(10) scale(2)"` scales
    /// first and then translates, like nested groups would. Anything left
    /// over after the last recognized function is an error.
    pub fn parse(text: &str) -> Result<Transform, TransformError> {
        let pairs = SvgDataParser::parse(Rule::transform_list, text)
            .map_err(|e| TransformError::unknown(text, pest_span(&e), "unrecognized text"))?;

        let mut running = Transform::IDENTITY;
        for pair in pairs.flat_map(|p| p.into_inner()) {
            if pair.as_rule() == Rule::transform_fn {
                running *= parse_function(text, pair)?;
            }
        }
        Ok(running)
    }
}

fn parse_function(text: &str, pair: Pair<'_, Rule>) -> Result<Transform, TransformError> {
    let span = pair.as_span();
    let source_span = (span.start(), span.end() - span.start());
    let mut inner = pair.into_inner();
    let name = inner.next().map(|p| p.as_str()).unwrap_or_default();

    let args = inner
        .flat_map(|p| p.into_inner())
        .map(|n| n.as_str().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| TransformError::unknown(text, source_span.into(), "invalid number"))?;

    let xf = match (name, args.as_slice()) {
        ("matrix", &[a, b, c, d, e, f]) => Transform::matrix(a, b, c, d, e, f),
        ("translate", &[x]) => Transform::translate(x, 0.0),
        ("translate", &[x, y]) => Transform::translate(x, y),
        ("scale", &[s]) => Transform::uniform_scale(s),
        ("scale", &[x, y]) => Transform::scale(x, y),
        ("rotate", &[a]) => Transform::rotate(a.to_radians()),
        ("rotate", &[a, cx, cy]) => Transform::rotate_about(a.to_radians(), cx, cy),
        ("skewX", &[a]) => Transform::skew_x(a.to_radians()),
        ("skewY", &[a]) => Transform::skew_y(a.to_radians()),
        _ => {
            return Err(TransformError::unknown(
                text,
                source_span.into(),
                format!("{name} does not take {} arguments", args.len()),
            ));
        }
    };
    Ok(xf)
}

impl Default for Transform {
    fn default() -> Transform {
        Transform::IDENTITY
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, other: Transform) -> Transform {
        self.compose(other)
    }
}

impl MulAssign for Transform {
    fn mul_assign(&mut self, other: Transform) {
        *self = *self * other;
    }
}

impl Mul<DVec2> for Transform {
    type Output = DVec2;

    fn mul(self, point: DVec2) -> DVec2 {
        self.apply(point)
    }
}

/// Serializes as a single `matrix(a b c d e f)` function.
impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.coefficients();
        write!(f, "matrix({a} {b} {c} {d} {e} {g})")
    }
}
