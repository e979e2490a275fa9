//! Path data parsing.
//!
//! Parsing happens in two stages. The grammar splits the `d` attribute into
//! command letters with flat parameter lists, validating that every letter is
//! known and that each list holds a whole number of parameter groups. The
//! [`Commands`] iterator then lazily decodes those groups into absolute
//! [`PathCommand`]s, tracking the cursor and subpath start.

use glam::{DVec2, dvec2};
use miette::SourceSpan;
use pest::Parser;

use crate::errors::{PathError, pest_span};
use crate::{Rule, SvgDataParser};

/// Cursor distance below which a close-path is considered already closed.
pub const CLOSE_TOLERANCE: f64 = 1e-3;

/// A drawing command with absolute coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
    MoveTo(DVec2),
    LineTo(DVec2),
    CubicTo(DVec2, DVec2, DVec2),
    SmoothCubicTo(DVec2, DVec2),
    QuadTo(DVec2, DVec2),
    SmoothQuadTo(DVec2),
    ArcTo {
        radii: DVec2,
        x_axis_rotation: f64,
        large_arc: bool,
        sweep: bool,
        to: DVec2,
    },
}

impl PathCommand {
    /// The point the cursor ends up on.
    pub fn end_point(&self) -> DVec2 {
        match *self {
            PathCommand::MoveTo(p)
            | PathCommand::LineTo(p)
            | PathCommand::CubicTo(_, _, p)
            | PathCommand::SmoothCubicTo(_, p)
            | PathCommand::QuadTo(_, p)
            | PathCommand::SmoothQuadTo(p)
            | PathCommand::ArcTo { to: p, .. } => p,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Kind {
    Move,
    Line,
    Horizontal,
    Vertical,
    Cubic,
    SmoothCubic,
    Quad,
    SmoothQuad,
    Arc,
    Close,
}

impl Kind {
    fn from_letter(letter: char) -> Option<Kind> {
        Some(match letter.to_ascii_uppercase() {
            'M' => Kind::Move,
            'L' => Kind::Line,
            'H' => Kind::Horizontal,
            'V' => Kind::Vertical,
            'C' => Kind::Cubic,
            'S' => Kind::SmoothCubic,
            'Q' => Kind::Quad,
            'T' => Kind::SmoothQuad,
            'A' => Kind::Arc,
            'Z' => Kind::Close,
            _ => return None,
        })
    }

    /// Parameters consumed per repetition.
    fn arity(self) -> usize {
        match self {
            Kind::Move | Kind::Line | Kind::SmoothQuad => 2,
            Kind::Horizontal | Kind::Vertical => 1,
            Kind::Cubic => 6,
            Kind::SmoothCubic | Kind::Quad => 4,
            Kind::Arc => 7,
            Kind::Close => 0,
        }
    }
}

/// One command letter with its flat parameter buffer.
#[derive(Clone, Debug)]
struct Segment {
    kind: Kind,
    relative: bool,
    params: Vec<f64>,
}

/// Tokenized, validated path data.
///
/// Decoding is deferred to [`PathData::commands`], which can be called any
/// number of times.
#[derive(Clone, Debug, Default)]
pub struct PathData {
    segments: Vec<Segment>,
}

impl PathData {
    /// Parse a `d` attribute.
    pub fn parse(data: &str) -> Result<PathData, PathError> {
        let pairs = SvgDataParser::parse(Rule::path_data, data)
            .map_err(|e| PathError::malformed(data, pest_span(&e), "unexpected character"))?;

        let mut segments = Vec::new();
        for pair in pairs.flat_map(|p| p.into_inner()) {
            if pair.as_rule() != Rule::segment {
                continue;
            }
            let span = pair.as_span();
            let source_span = SourceSpan::from((span.start(), span.end() - span.start()));

            let mut letter = None;
            let mut params = Vec::new();
            for token in pair.into_inner().flatten() {
                match token.as_rule() {
                    Rule::command => letter = token.as_str().chars().next(),
                    Rule::number | Rule::flag => {
                        let value = token.as_str().parse::<f64>().map_err(|_| {
                            PathError::malformed(data, source_span, "invalid number")
                        })?;
                        params.push(value);
                    }
                    _ => {}
                }
            }
            let Some(letter) = letter else {
                continue;
            };
            let kind = Kind::from_letter(letter).ok_or_else(|| {
                PathError::malformed(data, source_span, format!("unknown command '{letter}'"))
            })?;

            let arity = kind.arity();
            if arity == 0 && !params.is_empty() {
                return Err(PathError::malformed(
                    data,
                    source_span,
                    format!("'{letter}' takes no parameters"),
                ));
            }
            if arity > 0 && (params.is_empty() || params.len() % arity != 0) {
                return Err(PathError::malformed(
                    data,
                    source_span,
                    format!(
                        "'{letter}' takes groups of {arity} parameters, got {}",
                        params.len()
                    ),
                ));
            }

            segments.push(Segment {
                kind,
                relative: letter.is_ascii_lowercase(),
                params,
            });
        }

        Ok(PathData { segments })
    }

    /// Decode into absolute commands.
    pub fn commands(&self) -> Commands<'_> {
        Commands {
            segments: &self.segments,
            segment: 0,
            offset: 0,
            cursor: DVec2::ZERO,
            subpath_start: DVec2::ZERO,
        }
    }
}

/// Lazy decoder over [`PathData`].
///
/// State: the current segment, the offset into its parameter buffer, the
/// cursor and the subpath start.
///
/// A close-path yields no command of its own. It becomes a `LineTo` back to
/// the subpath start when the cursor is more than [`CLOSE_TOLERANCE`] away,
/// and nothing otherwise.
#[derive(Clone, Debug)]
pub struct Commands<'a> {
    segments: &'a [Segment],
    segment: usize,
    offset: usize,
    cursor: DVec2,
    subpath_start: DVec2,
}

impl Commands<'_> {
    fn decode(&mut self, kind: Kind, relative: bool, p: &[f64], first: bool) -> Option<PathCommand> {
        let origin = if relative { self.cursor } else { DVec2::ZERO };
        let pt = |x: f64, y: f64| origin + dvec2(x, y);

        let cmd = match kind {
            // Extra pairs after a move are implicit line-tos.
            Kind::Move if first => PathCommand::MoveTo(pt(p[0], p[1])),
            Kind::Move | Kind::Line => PathCommand::LineTo(pt(p[0], p[1])),
            Kind::Horizontal => {
                let y = if relative { 0.0 } else { self.cursor.y };
                PathCommand::LineTo(pt(p[0], y))
            }
            Kind::Vertical => {
                let x = if relative { 0.0 } else { self.cursor.x };
                PathCommand::LineTo(pt(x, p[0]))
            }
            Kind::Cubic => PathCommand::CubicTo(pt(p[0], p[1]), pt(p[2], p[3]), pt(p[4], p[5])),
            Kind::SmoothCubic => PathCommand::SmoothCubicTo(pt(p[0], p[1]), pt(p[2], p[3])),
            Kind::Quad => PathCommand::QuadTo(pt(p[0], p[1]), pt(p[2], p[3])),
            Kind::SmoothQuad => PathCommand::SmoothQuadTo(pt(p[0], p[1])),
            Kind::Arc => PathCommand::ArcTo {
                radii: dvec2(p[0], p[1]),
                x_axis_rotation: p[2],
                large_arc: p[3] != 0.0,
                sweep: p[4] != 0.0,
                to: pt(p[5], p[6]),
            },
            Kind::Close => {
                let start = self.subpath_start;
                let open = self.cursor.distance(start) > CLOSE_TOLERANCE;
                self.cursor = start;
                return open.then_some(PathCommand::LineTo(start));
            }
        };

        if let PathCommand::MoveTo(p) = cmd {
            self.subpath_start = p;
        }
        self.cursor = cmd.end_point();
        Some(cmd)
    }
}

impl Iterator for Commands<'_> {
    type Item = PathCommand;

    fn next(&mut self) -> Option<PathCommand> {
        let segments = self.segments;
        loop {
            let segment = segments.get(self.segment)?;
            let arity = segment.kind.arity();
            let first = self.offset == 0;
            let params = &segment.params[self.offset..self.offset + arity];
            let cmd = self.decode(segment.kind, segment.relative, params, first);

            self.offset += arity;
            if self.offset >= segment.params.len() {
                self.segment += 1;
                self.offset = 0;
            }
            if cmd.is_some() {
                return cmd;
            }
        }
    }
}

/// Parse and decode in one step.
pub fn parse_path(data: &str) -> Result<Vec<PathCommand>, PathError> {
    Ok(PathData::parse(data)?.commands().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use PathCommand::*;

    #[test]
    fn close_synthesizes_line_back_to_start() {
        let cmds = parse_path("M 0 0 L 10 0 L 10 10 Z").unwrap();
        assert_eq!(
            cmds,
            vec![
                MoveTo(dvec2(0.0, 0.0)),
                LineTo(dvec2(10.0, 0.0)),
                LineTo(dvec2(10.0, 10.0)),
                LineTo(dvec2(0.0, 0.0)),
            ]
        );
    }

    #[test]
    fn close_at_start_adds_nothing() {
        let cmds = parse_path("M 5 5 L 10 5 L 5.0005 5 z").unwrap();
        assert_eq!(
            cmds,
            vec![
                MoveTo(dvec2(5.0, 5.0)),
                LineTo(dvec2(10.0, 5.0)),
                LineTo(dvec2(5.0005, 5.0)),
            ]
        );
        assert_eq!(parse_path("M 0 0 Z").unwrap(), vec![MoveTo(dvec2(0.0, 0.0))]);
    }

    #[test]
    fn close_just_past_tolerance_draws_back() {
        let cmds = parse_path("M 0 0 L 0.0011 0 Z").unwrap();
        assert_eq!(cmds.last(), Some(&LineTo(dvec2(0.0, 0.0))));
        assert_eq!(cmds.len(), 3);
    }

    #[test]
    fn relative_commands_follow_cursor() {
        let cmds = parse_path("m 10 20 l 5 5 h 10 v -5 z l 1 1").unwrap();
        assert_eq!(
            cmds,
            vec![
                MoveTo(dvec2(10.0, 20.0)),
                LineTo(dvec2(15.0, 25.0)),
                LineTo(dvec2(25.0, 25.0)),
                LineTo(dvec2(25.0, 20.0)),
                LineTo(dvec2(10.0, 20.0)),
                LineTo(dvec2(11.0, 21.0)),
            ]
        );
    }

    #[test]
    fn absolute_horizontal_vertical_keep_other_axis() {
        let cmds = parse_path("M 3 4 H 10 V 7").unwrap();
        assert_eq!(cmds[1], LineTo(dvec2(10.0, 4.0)));
        assert_eq!(cmds[2], LineTo(dvec2(10.0, 7.0)));
    }

    #[test]
    fn repeated_groups_expand() {
        let cmds = parse_path("M0,0 10,0 10,10 L 0 10 0 0").unwrap();
        assert_eq!(
            cmds,
            vec![
                MoveTo(dvec2(0.0, 0.0)),
                LineTo(dvec2(10.0, 0.0)),
                LineTo(dvec2(10.0, 10.0)),
                LineTo(dvec2(0.0, 10.0)),
                LineTo(dvec2(0.0, 0.0)),
            ]
        );
    }

    #[test]
    fn relative_curve_controls_use_command_start() {
        let cmds = parse_path("M 10 10 c 1 1 2 2 3 3 s 1 0 2 0 q 1 1 2 2 t 1 1").unwrap();
        assert_eq!(
            cmds[1],
            CubicTo(dvec2(11.0, 11.0), dvec2(12.0, 12.0), dvec2(13.0, 13.0))
        );
        assert_eq!(cmds[2], SmoothCubicTo(dvec2(14.0, 13.0), dvec2(15.0, 13.0)));
        assert_eq!(cmds[3], QuadTo(dvec2(16.0, 14.0), dvec2(17.0, 15.0)));
        assert_eq!(cmds[4], SmoothQuadTo(dvec2(18.0, 16.0)));
    }

    #[test]
    fn relative_arc_only_offsets_endpoint() {
        let cmds = parse_path("M 10 10 a 5 6 30 1 0 4 0").unwrap();
        assert_eq!(
            cmds[1],
            ArcTo {
                radii: dvec2(5.0, 6.0),
                x_axis_rotation: 30.0,
                large_arc: true,
                sweep: false,
                to: dvec2(14.0, 10.0),
            }
        );
    }

    #[test]
    fn arc_flags_may_run_together() {
        let cmds = parse_path("M 0 0 a5 5 0 0110 10").unwrap();
        assert_eq!(
            cmds[1],
            ArcTo {
                radii: dvec2(5.0, 5.0),
                x_axis_rotation: 0.0,
                large_arc: false,
                sweep: true,
                to: dvec2(10.0, 10.0),
            }
        );

        let cmds = parse_path("M 0 0 A 5 5 0 1 1 10 0 5 5 0 0 0 20 0").unwrap();
        assert_eq!(cmds.len(), 3);
        assert_eq!(cmds[2].end_point(), dvec2(20.0, 0.0));
    }

    #[test]
    fn arc_with_partial_group_reports_count() {
        let err = parse_path("M 0 0 a 5 5 0 0 1 10 10 3").unwrap_err();
        assert!(err.to_string().contains("groups of 7 parameters, got 8"), "{err}");
    }

    #[test]
    fn compact_numbers() {
        let cmds = parse_path("M10-5L.5.5").unwrap();
        assert_eq!(cmds, vec![MoveTo(dvec2(10.0, -5.0)), LineTo(dvec2(0.5, 0.5))]);
    }

    #[test]
    fn decoding_is_restartable() {
        let data = PathData::parse("M 0 0 L 1 1").unwrap();
        let first: Vec<_> = data.commands().collect();
        let second: Vec<_> = data.commands().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn sequence_may_start_without_move() {
        let cmds = parse_path("L 4 4 L 8 8").unwrap();
        assert_eq!(cmds[0], LineTo(dvec2(4.0, 4.0)));
    }

    #[test]
    fn empty_data_has_no_commands() {
        assert!(parse_path("").unwrap().is_empty());
        assert!(parse_path("   ").unwrap().is_empty());
    }

    #[test]
    fn rejects_unknown_letter() {
        let err = parse_path("M 0 0 X 1 1").unwrap_err();
        assert!(err.to_string().contains("unknown command 'X'"), "{err}");
    }

    #[test]
    fn rejects_parameters_on_close() {
        let err = parse_path("M 0 0 L 1 1 Z 3").unwrap_err();
        assert!(err.to_string().contains("takes no parameters"), "{err}");
    }

    #[test]
    fn rejects_incomplete_groups() {
        assert!(parse_path("M 0 0 L 1").is_err());
        assert!(parse_path("M 0 0 C 1 2 3 4 5").is_err());
        assert!(parse_path("M 0 0 L").is_err());
    }

    #[test]
    fn rejects_garbage() {
        insta::assert_snapshot!(
            parse_path("M 0 0 L 1 1 #").unwrap_err(),
            @"malformed path data: unexpected character"
        );
    }
}
