//! Lateral boundary descriptions of AIP airspace tables.
//!
//! A boundary is either wholly a circle
//!
//! ```text
//! A circle, radius 3000 M, centred on 481012N 0170854E
//! ```
//!
//! or a ring of segments separated by ` - `, each segment being coordinate
//! pairs, an arc, or a stretch along the state border:
//!
//! ```text
//! 480000N 0170000E - 481000N 0170000E
//!   - clockwise arc radius 5 NM centred on 480500N 0170000E to 480000N 0171000E
//!   - along the state border - 480000N 0170000E
//! ```

use std::ops::Range;

use geo::{Bearing as _, Distance as _, Geodesic, LineString, Point, Polygon};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::config::Config;
use crate::coordinate::find_points;
use crate::distance::{Distance, DISTANCE_PATTERN};
use crate::error::{Error, Result};
use crate::geometry::{
    ArcRasterizer, ArcSpec, BorderPolyline, BorderSplicer, Direction, SpliceOrder,
};
use crate::DegMinSecExt as _;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Boundary {
    /// At least three distinct points in source order, not closed.
    Ring(Vec<Point>),
    Circle { center: Point, radius: Distance },
}

impl Boundary {
    /// The boundary as a closed polygon, circles rasterized.
    pub fn to_polygon(&self, rasterizer: &ArcRasterizer) -> Polygon {
        let exterior = match self {
            Boundary::Ring(points) => points.clone(),
            Boundary::Circle { center, radius } => rasterizer.full_circle(*center, radius),
        };
        Polygon::new(LineString::from(exterior), vec![])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum ArcEnd {
    Bearings { start: f64, end: f64 },
    /// Runs from the previous vertex to this point.
    Point(Point),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ArcSegment {
    pub center: Point,
    pub radius: Distance,
    pub direction: Direction,
    pub end: ArcEnd,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Segment {
    Vertex(Point),
    Arc(ArcSegment),
    /// Splice points left out take the neighbouring vertices.
    BorderArc {
        from: Option<Point>,
        to: Option<Point>,
    },
}

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static GLUED_HYPHEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([NSEWnsew])\s*-\s*(\d)").unwrap());
static SEPARATOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+-\s+|\s*[–—]\s*").unwrap());
static FILLER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:[\s,.;:()]|\bthen(?:ce)?\b|\band\b)*$").unwrap());
static ARC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\barc\b").unwrap());
static RADIUS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        concat!(
            r"(?i)\bradius\s*[:=]?\s*(?:of\s+)?(?P<a>{distance})",
            r"|\b(?P<b>{distance})\s+radius\b",
        ),
        distance = DISTANCE_PATTERN
    ))
    .unwrap()
});
static CENTRE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bcent(?:re|er)d?\b").unwrap());
static COUNTER_CLOCKWISE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:counter|anti)[-\s]?clockwise\b").unwrap());
static BEARINGS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\bfrom\s+(\d{1,3}(?:[.,]\d+)?)\s*°?\s*(?:T\s+)?",
        r"to\s+(\d{1,3}(?:[.,]\d+)?)\s*(?:°|deg)",
    ))
    .unwrap()
});
static TO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bto\b").unwrap());

type PointMatch = (Range<usize>, Point);

fn radius(text: &str) -> Option<Distance> {
    let captures = RADIUS_RE.captures(text)?;
    Distance::parse(captures.name("a").or(captures.name("b"))?.as_str())
}

/// The first pair after a centre keyword, or the first pair at all.
fn centre(text: &str, points: &[PointMatch]) -> Option<PointMatch> {
    let at = CENTRE_RE.find(text).map_or(0, |m| m.end());
    points.iter().find(|(span, _)| span.start >= at).cloned()
}

fn bearing(text: &str) -> Option<f64> {
    text.replace(',', ".")
        .parse()
        .ok()
        .filter(|b| (0.0..=360.0).contains(b))
}

/// Text of `chunk` outside the matched coordinate pairs.
fn remainder(chunk: &str, points: &[PointMatch]) -> String {
    let mut rest = String::new();
    let mut at = 0;
    for (span, _) in points {
        rest.push_str(&chunk[at..span.start]);
        at = span.end;
    }
    rest.push_str(&chunk[at..]);
    rest
}

fn push_point(ring: &mut Vec<Point>, point: Point) {
    if ring.last() != Some(&point) {
        ring.push(point);
    }
}

/// Order of a border run that continues from `anchor`: the run end nearer to
/// the anchor comes first, ties keep index order.
fn continuity_order(run: &[Point], anchor: Point) -> SpliceOrder {
    match (run.first(), run.last()) {
        (Some(first), Some(last))
            if Geodesic.distance(anchor, *last) < Geodesic.distance(anchor, *first) =>
        {
            SpliceOrder::Descending
        }
        _ => SpliceOrder::Ascending,
    }
}

/// Turns boundary text into a [`Boundary`]. Built once from a [`Config`] and
/// shared read-only by all rows.
#[derive(Clone, Debug)]
pub struct BoundaryGrammar {
    circle_prefix: String,
    border_re: Option<Regex>,
    rasterizer: ArcRasterizer,
    splicer: BorderSplicer,
    tolerance: f64,
}

impl BoundaryGrammar {
    pub fn new(config: &Config) -> Result<Self> {
        let phrases = config
            .border_phrases
            .iter()
            .map(|phrase| phrase.trim())
            .filter(|phrase| !phrase.is_empty())
            .map(|phrase| regex::escape(phrase).replace(' ', r"\s+"))
            .join("|");
        let border_re = if phrases.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"(?i)\b(?:{phrases})\b"))?)
        };
        if config.circle_prefix.trim().is_empty() {
            return Err(Error::Config("empty circle prefix".to_string()));
        }

        Ok(Self {
            circle_prefix: config.circle_prefix.trim().to_string(),
            border_re,
            rasterizer: ArcRasterizer::new(config.arc_step),
            splicer: BorderSplicer::new(config.splice_tolerance),
            tolerance: config.splice_tolerance,
        })
    }

    pub fn rasterizer(&self) -> &ArcRasterizer {
        &self.rasterizer
    }

    fn normalise(text: &str) -> String {
        let text = WHITESPACE_RE.replace_all(text.trim(), " ");
        GLUED_HYPHEN_RE.replace_all(&text, "$1 - $2").into_owned()
    }

    fn circle_remainder<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(..self.circle_prefix.len())
            .filter(|head| head.eq_ignore_ascii_case(&self.circle_prefix))
            .map(|_| &text[self.circle_prefix.len()..])
    }

    /// Parses a boundary cell. `border` is needed by boundaries that follow
    /// the state border; `designator` identifies the airspace in errors.
    pub fn parse(
        &self,
        text: &str,
        border: Option<&BorderPolyline>,
        designator: &str,
    ) -> Result<Boundary> {
        let text = Self::normalise(text);

        if let Some(rest) = self.circle_remainder(&text) {
            let boundary = self.parse_circle(&text, rest, designator)?;
            debug!("{designator}: circle boundary {boundary:?}");
            return Ok(boundary);
        }

        let segments = self.segments(&text, designator)?;
        let ring = self.build_ring(&segments, border, designator)?;
        let distinct = ring
            .iter()
            .unique_by(|p| (p.x().to_bits(), p.y().to_bits()))
            .count();
        if distinct < 3 {
            return Err(Error::degenerate(
                designator,
                format!("{distinct} distinct vertices"),
            ));
        }

        debug!(
            "{designator}: ring boundary of {} vertices from {} segments",
            ring.len(),
            segments.len()
        );
        Ok(Boundary::Ring(ring))
    }

    fn parse_circle(&self, text: &str, rest: &str, designator: &str) -> Result<Boundary> {
        let points = find_points(rest, designator)?;
        let radius =
            radius(rest).ok_or_else(|| Error::segment(designator, text, "circle without radius"))?;
        let (_, center) = centre(rest, &points)
            .ok_or_else(|| Error::segment(designator, text, "circle without centre"))?;
        if radius.magnitude <= 0.0 {
            return Err(Error::degenerate(designator, format!("circle radius {radius}")));
        }
        Ok(Boundary::Circle { center, radius })
    }

    /// Classifies ring text into its segments, in source order.
    pub fn segments(&self, text: &str, designator: &str) -> Result<Vec<Segment>> {
        let text = Self::normalise(text);
        let mut segments = vec![];
        for chunk in SEPARATOR_RE.split(&text) {
            let chunk =
                chunk.trim_matches(|c: char| c.is_whitespace() || matches!(c, '.' | ',' | ';'));
            if chunk.is_empty() {
                continue;
            }
            for segment in self.classify(chunk, designator)? {
                trace!("{designator}: {chunk:?} -> {segment:?}");
                segments.push(segment);
            }
        }
        Ok(segments)
    }

    fn classify(&self, chunk: &str, designator: &str) -> Result<Vec<Segment>> {
        let points = find_points(chunk, designator)?;

        if self.border_re.as_ref().is_some_and(|re| re.is_match(chunk)) {
            let (from, to) = match points.as_slice() {
                [] => (None, None),
                [(_, to)] => (None, Some(*to)),
                [(_, from), (_, to)] => (Some(*from), Some(*to)),
                _ => {
                    return Err(Error::segment(
                        designator,
                        chunk,
                        "more than two splice points",
                    ))
                }
            };
            return Ok(vec![Segment::BorderArc { from, to }]);
        }

        if ARC_RE.is_match(chunk) {
            return self
                .classify_arc(chunk, &points, designator)
                .map(|arc| vec![Segment::Arc(arc)]);
        }

        if !points.is_empty() && FILLER_RE.is_match(&remainder(chunk, &points)) {
            return Ok(points.into_iter().map(|(_, p)| Segment::Vertex(p)).collect());
        }

        Err(Error::segment(
            designator,
            chunk,
            "neither coordinates, an arc nor a border directive",
        ))
    }

    fn classify_arc(
        &self,
        chunk: &str,
        points: &[PointMatch],
        designator: &str,
    ) -> Result<ArcSegment> {
        let radius =
            radius(chunk).ok_or_else(|| Error::segment(designator, chunk, "arc without radius"))?;
        if radius.magnitude <= 0.0 {
            return Err(Error::degenerate(designator, format!("arc radius {radius}")));
        }
        let (centre_span, center) = centre(chunk, points)
            .ok_or_else(|| Error::segment(designator, chunk, "arc without centre"))?;
        let direction = if COUNTER_CLOCKWISE_RE.is_match(chunk) {
            Direction::CounterClockwise
        } else {
            Direction::Clockwise
        };

        let end = if let Some(captures) = BEARINGS_RE.captures(chunk) {
            match (bearing(&captures[1]), bearing(&captures[2])) {
                (Some(start), Some(end)) => ArcEnd::Bearings { start, end },
                _ => return Err(Error::segment(designator, chunk, "arc bearing out of range")),
            }
        } else {
            let to_at = TO_RE.find_iter(chunk).last().map_or(0, |m| m.end());
            let others = points
                .iter()
                .filter(|(span, _)| *span != centre_span)
                .collect::<Vec<_>>();
            let (_, end) = others
                .iter()
                .find(|(span, _)| span.start >= to_at)
                .or(others.first())
                .ok_or_else(|| {
                    Error::segment(designator, chunk, "arc without end point or bearings")
                })?;
            ArcEnd::Point(*end)
        };

        Ok(ArcSegment {
            center,
            radius,
            direction,
            end,
        })
    }

    fn arc_points(
        &self,
        arc: &ArcSegment,
        previous: Option<Point>,
        designator: &str,
    ) -> Result<Vec<Point>> {
        let (start_bearing, end_bearing) = match arc.end {
            ArcEnd::Bearings { start, end } => (start, end),
            ArcEnd::Point(end) => {
                let start = previous.ok_or_else(|| {
                    Error::segment(designator, &end.aip_fmt(), "arc without a start vertex")
                })?;
                (
                    Geodesic.bearing(arc.center, start),
                    Geodesic.bearing(arc.center, end),
                )
            }
        };

        let points = self.rasterizer.rasterize(&ArcSpec {
            center: arc.center,
            radius: arc.radius,
            start_bearing,
            end_bearing,
            direction: arc.direction,
        });

        if let (ArcEnd::Point(end), Some(last)) = (arc.end, points.last()) {
            let miss = Geodesic.distance(*last, end);
            if miss > self.tolerance {
                warn!(
                    "{designator}: arc around {} ends {miss:.0} m from its stated end point {}",
                    arc.center.aip_fmt(),
                    end.aip_fmt()
                );
            }
        }
        Ok(points)
    }

    /// Folds the segments into the vertex sequence of the ring.
    fn build_ring(
        &self,
        segments: &[Segment],
        border: Option<&BorderPolyline>,
        designator: &str,
    ) -> Result<Vec<Point>> {
        let vertices = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Vertex(p) => Some(*p),
                _ => None,
            })
            .collect::<Vec<_>>();

        let mut ring: Vec<Point> = vec![];
        for (i, segment) in segments.iter().enumerate() {
            match segment {
                Segment::Vertex(p) => push_point(&mut ring, *p),
                Segment::Arc(arc) => {
                    // a leading arc starts where the ring closes
                    let previous = ring.last().or(vertices.last()).copied();
                    for p in self.arc_points(arc, previous, designator)? {
                        push_point(&mut ring, p);
                    }
                }
                Segment::BorderArc { from, to } => {
                    let border = border.ok_or_else(|| Error::MissingBorderData {
                        designator: designator.to_string(),
                    })?;
                    let from = from
                        .or(ring.last().copied())
                        .or(vertices.last().copied())
                        .ok_or_else(|| {
                            Error::segment(designator, "border", "no vertex before the border")
                        })?;
                    let to = to
                        .or_else(|| {
                            segments[i + 1..].iter().find_map(|segment| match segment {
                                Segment::Vertex(p) => Some(*p),
                                _ => None,
                            })
                        })
                        .or(vertices.first().copied())
                        .ok_or_else(|| {
                            Error::segment(designator, "border", "no vertex after the border")
                        })?;

                    let mut run =
                        self.splicer
                            .splice(border, from, to, SpliceOrder::Ascending, designator)?;
                    let anchor = ring.last().copied().unwrap_or(from);
                    if continuity_order(&run, anchor) == SpliceOrder::Descending {
                        run.reverse();
                    }
                    trace!(
                        "{designator}: {} border vertices from {} to {}",
                        run.len(),
                        from.aip_fmt(),
                        to.aip_fmt()
                    );
                    for p in run {
                        push_point(&mut ring, p);
                    }
                }
            }
        }
        Ok(ring)
    }
}
