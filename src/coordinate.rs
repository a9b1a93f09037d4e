//! Coordinate tokens as they appear in AIP boundary tables.
//!
//! Accepted notations for one axis:
//! - compact, positional: `473058N`, `0185110E`, `4730N`, `473058.25N`
//! - symbol separated: `47°30'58"N`, `18° 51′ 10.5″ E`
//! - hemisphere prefixed: `N047.30.58.000`
//! - decimal: `47.5161N`, `-18.8528`

use std::ops::Range;

use geo::Point;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::{dms_to_decimal, DegMinSec};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

// Alternatives: compact, symbol separated, hemisphere prefixed, short decimal.
const LAT_TOKEN: &str = concat!(
    r"\d{2,6}(?:[.,]\d+)?\s?[NS]\b",
    r#"|\d{1,2}\s*°\s*\d{1,2}\s*['′]\s*\d{1,2}(?:[.,]\d+)?\s*(?:"|″|'')?\s*[NS]\b"#,
    r"|[NS]\s?\d{1,3}[.\s]\d{1,2}[.\s]\d{1,2}(?:[.,]\d+)?\b",
    r"|\d[.,]\d+\s?[NS]\b",
);
const LON_TOKEN: &str = concat!(
    r"\d{3,7}(?:[.,]\d+)?\s?[EW]\b",
    r#"|\d{1,3}\s*°\s*\d{1,2}\s*['′]\s*\d{1,2}(?:[.,]\d+)?\s*(?:"|″|'')?\s*[EW]\b"#,
    r"|[EW]\s?\d{1,3}[.\s]\d{1,2}[.\s]\d{1,2}(?:[.,]\d+)?\b",
    r"|\d{1,2}[.,]\d+\s?[EW]\b",
);

static PAIR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?P<lat>{LAT_TOKEN})\s*[,/]?\s*(?P<lon>{LON_TOKEN})"
    ))
    .unwrap()
});

static COMPACT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([+-])?(\d+)(?:[.,](\d+))?\s?([NSEW])?$").unwrap());

static SEPARATED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        concat!(
            r"^([+-])?(\d{1,3})(?:\s*°\s*|[\s:]+)(\d{1,2})(?:\s*['′]\s*|[\s:]+)",
            r#"(\d{1,2}(?:[.,]\d+)?)(?:\s*(?:"|″|''))?\s*([NSEW])?$"#,
        ),
    )
    .unwrap()
});

static PREFIXED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([NSEW])\s?(\d{1,3})[.\s](\d{1,2})[.\s](\d{1,2}(?:[.,]\d+)?)$").unwrap()
});

fn hemisphere(letter: &str) -> (Axis, bool) {
    match letter {
        "N" => (Axis::Latitude, false),
        "S" => (Axis::Latitude, true),
        "E" => (Axis::Longitude, false),
        _ => (Axis::Longitude, true),
    }
}

fn number(digits: &str) -> f64 {
    // callers only pass regex-validated digit runs
    digits.replace(',', ".").parse().unwrap_or(f64::NAN)
}

/// Splits the integer digits of a compact token into degree, minute and
/// second fields, the optional fraction belonging to the last field.
fn split_compact(
    token: &str,
    digits: &str,
    fraction: Option<&str>,
    axis: Axis,
    designator: &str,
) -> Result<DegMinSec> {
    let normalised = match (axis, digits.len()) {
        (Axis::Latitude, 3 | 5 | 7) if digits.starts_with('0') => &digits[1..],
        (Axis::Longitude, 4 | 6) => {
            return split_compact(token, &format!("0{digits}"), fraction, axis, designator);
        }
        _ => digits,
    };
    let deg_width = match axis {
        Axis::Latitude => 2,
        Axis::Longitude => 3,
    };
    let with_fraction = |field: &str| match fraction {
        Some(fraction) => number(&format!("{field}.{fraction}")),
        None => number(field),
    };

    match normalised.len() {
        n if n <= deg_width => Ok((with_fraction(normalised), 0.0, 0.0)),
        n if n == deg_width + 2 => Ok((
            number(&normalised[..deg_width]),
            with_fraction(&normalised[deg_width..]),
            0.0,
        )),
        n if n == deg_width + 4 => Ok((
            number(&normalised[..deg_width]),
            number(&normalised[deg_width..deg_width + 2]),
            with_fraction(&normalised[deg_width + 2..]),
        )),
        n => Err(Error::coordinate(
            designator,
            token,
            format!("{n} digits do not split into degrees/minutes/seconds"),
        )),
    }
}

fn validate(
    token: &str,
    (deg, min, sec): DegMinSec,
    axis: Option<Axis>,
    designator: &str,
) -> Result<()> {
    if !(0.0..60.0).contains(&min) {
        return Err(Error::coordinate(designator, token, format!("minutes {min} out of range")));
    }
    if !(0.0..60.0).contains(&sec) {
        return Err(Error::coordinate(designator, token, format!("seconds {sec} out of range")));
    }
    let max = match axis {
        Some(Axis::Latitude) => 90.0,
        _ => 180.0,
    };
    if dms_to_decimal((deg, min, sec), false) > max {
        return Err(Error::coordinate(designator, token, format!("degrees {deg} exceed {max}")));
    }
    Ok(())
}

/// Parses a single coordinate token, returning the signed decimal degrees
/// and the axis when the token names a hemisphere.
pub fn parse_axis(token: &str, designator: &str) -> Result<(f64, Option<Axis>)> {
    let token = token.trim();

    let (dms, negative, axis) = if let Some(captures) = PREFIXED_RE.captures(token) {
        let (axis, negative) = hemisphere(&captures[1]);
        let dms = (number(&captures[2]), number(&captures[3]), number(&captures[4]));
        (dms, negative, Some(axis))
    } else if let Some(captures) = SEPARATED_RE.captures(token) {
        let hemi = captures.get(5).map(|m| hemisphere(m.as_str()));
        let negative = hemi.map_or(captures.get(1).is_some_and(|s| s.as_str() == "-"), |h| h.1);
        let dms = (number(&captures[2]), number(&captures[3]), number(&captures[4]));
        (dms, negative, hemi.map(|h| h.0))
    } else if let Some(captures) = COMPACT_RE.captures(token) {
        let hemi = captures.get(4).map(|m| hemisphere(m.as_str()));
        let negative = hemi.map_or(captures.get(1).is_some_and(|s| s.as_str() == "-"), |h| h.1);
        let digits = &captures[2];
        let width_axis = hemi.map_or(
            if digits.len() % 2 == 0 {
                Axis::Latitude
            } else {
                Axis::Longitude
            },
            |h| h.0,
        );
        let dms = split_compact(
            token,
            digits,
            captures.get(3).map(|m| m.as_str()),
            width_axis,
            designator,
        )?;
        (dms, negative, hemi.map(|h| h.0))
    } else {
        return Err(Error::coordinate(designator, token, "not a coordinate"));
    };

    validate(token, dms, axis, designator)?;
    Ok((dms_to_decimal(dms, negative), axis))
}

/// Parses a single coordinate token into signed decimal degrees.
pub fn parse_coordinate(token: &str, designator: &str) -> Result<f64> {
    parse_axis(token, designator).map(|(decimal, _)| decimal)
}

/// Parses a latitude/longitude token pair.
pub fn parse_point(lat: &str, lng: &str, designator: &str) -> Result<Point> {
    let (y, lat_axis) = parse_axis(lat, designator)?;
    if lat_axis == Some(Axis::Longitude) {
        return Err(Error::coordinate(designator, lat, "expected a latitude"));
    }
    let (x, lng_axis) = parse_axis(lng, designator)?;
    if lng_axis == Some(Axis::Latitude) {
        return Err(Error::coordinate(designator, lng, "expected a longitude"));
    }
    Ok(Point::new(x, y))
}

/// Finds every coordinate pair in free text, in order of appearance.
pub fn find_points(text: &str, designator: &str) -> Result<Vec<(Range<usize>, Point)>> {
    PAIR_RE
        .captures_iter(text)
        .map(|captures| {
            let span = captures.get(0).map_or(0..0, |m| m.range());
            parse_point(&captures["lat"], &captures["lon"], designator).map(|p| (span, p))
        })
        .collect()
}
