use std::io;

use geo::Point;
use tracing::warn;

pub mod airspace;
pub mod boundary;
pub mod config;
pub mod coordinate;
pub mod distance;
pub mod elevation;
pub mod encoder;
pub mod error;
pub mod fields;
pub mod geometry;

pub use airspace::{Airspace, AirspaceRow};
pub use boundary::{Boundary, BoundaryGrammar, Segment};
pub use config::{Config, ConfigError};
pub use distance::{Distance, DistanceUnit};
pub use elevation::{Elevation, ElevationReference, ElevationUnit};
pub use encoder::{AxisOrder, BoundaryEncoder, CircleStrategy, EncodeError, EncodedGeometry};
pub use error::{Error, Result};
pub use fields::TrailingFields;
pub use geometry::{
    ArcRasterizer, ArcSpec, BorderError, BorderPolyline, BorderSplicer, Direction, SpliceOrder,
};

fn read_to_string(contents: &[u8]) -> std::result::Result<String, io::Error> {
    String::from_utf8(contents.to_vec()).or_else(|_| {
        let (string, _, errors) = encoding_rs::WINDOWS_1252.decode(contents);
        if errors {
            warn!("errors while decoding win-1252");
        }
        Ok(string.to_string())
    })
}

/// Unsigned degrees, minutes and seconds of one axis.
type DegMinSec = (f64, f64, f64);

fn dms_to_decimal((deg, min, sec): DegMinSec, negative: bool) -> f64 {
    let decimal = deg + min / 60.0 + sec / 3600.0;
    if negative {
        -decimal
    } else {
        decimal
    }
}

/// Rounds to whole seconds, carrying into minutes and degrees.
fn decimal_to_dms(decimal: f64) -> (u32, u32, u32) {
    let total = (decimal.abs() * 3600.0).round() as u32;
    (total / 3600, total / 60 % 60, total % 60)
}

/// Formatting in the compact notation used by AIP boundary tables
/// (`473058N 0185110E`).
pub trait DegMinSecExt {
    fn lat_aip_fmt(&self) -> String;
    fn lng_aip_fmt(&self) -> String;
    fn aip_fmt(&self) -> String {
        format!("{} {}", self.lat_aip_fmt(), self.lng_aip_fmt())
    }
}

impl DegMinSecExt for Point {
    fn lat_aip_fmt(&self) -> String {
        let (deg, min, sec) = decimal_to_dms(self.y());
        let hemi = if self.y() < 0.0 { 'S' } else { 'N' };
        format!("{deg:02}{min:02}{sec:02}{hemi}")
    }

    fn lng_aip_fmt(&self) -> String {
        let (deg, min, sec) = decimal_to_dms(self.x());
        let hemi = if self.x() < 0.0 { 'W' } else { 'E' };
        format!("{deg:03}{min:02}{sec:02}{hemi}")
    }
}

#[cfg(test)]
mod test {
    use geo::point;

    use crate::{dms_to_decimal, read_to_string, DegMinSecExt as _};

    #[test]
    fn test_dms_roundtrip() {
        let lat = dms_to_decimal((48., 40., 0.), false);
        let expected = 48.666_666_666_666_666;
        assert!(
            (lat - expected).abs() < 1e-12,
            "left: {lat:?} not equal right: {expected:?}"
        );
        let lng = dms_to_decimal((10., 58., 0.5), true);
        let expected = -10.966_805_555_555_556;
        assert!(
            (lng - expected).abs() < 1e-12,
            "left: {lng:?} not equal right: {expected:?}"
        );
        assert_eq!(point! { x: lng, y: lat }.aip_fmt(), "484000N 0105801W");
    }

    #[test]
    fn test_seconds_carry() {
        let p = point! { x: 18.999_999_9, y: -47.516_111 };
        assert_eq!(p.aip_fmt(), "473058S 0190000E");
    }

    #[test]
    fn test_win1252_fallback() {
        assert_eq!(read_to_string(b"Ko\xdfice").unwrap(), "Koßice");
    }
}
