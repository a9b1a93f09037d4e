use std::io;
use std::path::Path;

use bevy_derive::Deref;
use geo::{Distance as _, Geodesic, Point};
use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;
use tracing::trace;

use crate::coordinate::{find_points, parse_point};
use crate::error::{self, Result};
use crate::{read_to_string, DegMinSecExt as _};

#[derive(Error, Debug)]
pub enum BorderError {
    #[error("failed to read border file: {0}")]
    FileRead(#[from] io::Error),
    #[error("failed to parse border file: {0}")]
    Parse(#[from] error::Error),
}

/// A national border segment. Read-only once loaded, so it can be shared by
/// any number of concurrent row parses.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deref)]
pub struct BorderPolyline(Vec<Point>);

impl BorderPolyline {
    pub fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Reads one coordinate pair per line. Blank lines and `#` comments are
    /// skipped.
    pub fn parse(content: &[u8], name: &str) -> std::result::Result<Self, BorderError> {
        let text = read_to_string(content)?;
        let points = text
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default().trim())
            .filter(|line| !line.is_empty())
            .map(|line| Self::parse_line(line, name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(points))
    }

    pub fn from_path(path: impl AsRef<Path>) -> std::result::Result<Self, BorderError> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map_or_else(String::new, |stem| stem.to_string_lossy().to_string());
        Self::parse(&fs_err::read(path)?, &name)
    }

    fn parse_line(line: &str, name: &str) -> Result<Point> {
        let mut found = find_points(line, name)?;
        if found.len() == 1 {
            return Ok(found.remove(0).1);
        }
        match line.split_whitespace().collect_tuple() {
            Some((lat, lng)) if found.is_empty() => parse_point(lat, lng, name),
            _ => Err(error::Error::coordinate(
                name,
                line,
                "expected exactly one coordinate pair",
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpliceOrder {
    Ascending,
    Descending,
}

/// Cuts the part of a [`BorderPolyline`] that lies between two splice points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BorderSplicer {
    tolerance: f64,
}

impl BorderSplicer {
    /// `tolerance` is the largest accepted distance, in metres, between a
    /// splice point and its nearest border vertex.
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Index of the border vertex nearest to `point` by geodesic distance.
    pub fn nearest(
        &self,
        border: &BorderPolyline,
        point: Point,
        designator: &str,
    ) -> Result<usize> {
        let not_found = |distance| error::Error::SpliceNotFound {
            designator: designator.to_string(),
            point: point.aip_fmt(),
            distance,
        };

        let index = border
            .iter()
            .map(|vertex| Geodesic.distance(*vertex, point))
            .position_min_by(f64::total_cmp)
            .ok_or_else(|| not_found(f64::INFINITY))?;
        let distance = Geodesic.distance(border[index], point);
        if distance > self.tolerance {
            return Err(not_found(distance));
        }

        trace!(
            "{designator}: splice point {} -> border vertex {index} ({distance:.0} m)",
            point.aip_fmt()
        );
        Ok(index)
    }

    /// The inclusive border run between the vertices nearest to `from` and
    /// `to`, in the requested index order.
    pub fn splice(
        &self,
        border: &BorderPolyline,
        from: Point,
        to: Point,
        order: SpliceOrder,
        designator: &str,
    ) -> Result<Vec<Point>> {
        let i = self.nearest(border, from, designator)?;
        let j = self.nearest(border, to, designator)?;
        let (lo, hi) = if i <= j { (i, j) } else { (j, i) };

        let run = border[lo..=hi].iter().copied();
        Ok(match order {
            SpliceOrder::Ascending => run.collect(),
            SpliceOrder::Descending => run.rev().collect(),
        })
    }
}
