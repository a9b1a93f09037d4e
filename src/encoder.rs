//! GML 3.2 geometry as used by AIXM 5.1 airspace volumes.
//!
//! The encoder only writes the geometry fragment (`gml:Ring`) and the
//! vertical limit elements. The surrounding feature, time slice and message
//! envelope belong to the caller's writer.

use std::io::{self, Write};
use std::string::FromUtf8Error;

use geo::Point;
use itertools::Itertools;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::airspace::Airspace;
use crate::boundary::Boundary;
use crate::config::Config;
use crate::distance::Distance;
use crate::elevation::{Elevation, ElevationReference, ElevationUnit};
use crate::geometry::ArcRasterizer;

pub const SRS_NAME: &str = "urn:ogc:def:crs:EPSG::4326";

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("failed to write GML: {0}")]
    Io(#[from] io::Error),
    #[error("failed to write GML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("GML is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),
}

/// Order of the two values of every emitted position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisOrder {
    /// Latitude first, as EPSG:4326 defines it.
    #[default]
    LatLon,
    LonLat,
}

impl AxisOrder {
    pub fn position(self, point: Point) -> [f64; 2] {
        match self {
            AxisOrder::LatLon => [point.y(), point.x()],
            AxisOrder::LonLat => [point.x(), point.y()],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CircleStrategy {
    /// `gml:CircleByCenterPoint` with the published radius.
    #[default]
    Native,
    /// A closed ring of points on the circle.
    Rasterized,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum EncodedGeometry {
    /// Always closed: the last position repeats the first.
    Ring(Vec<[f64; 2]>),
    Circle { center: [f64; 2], radius: Distance },
}

fn pos_list(positions: &[[f64; 2]]) -> String {
    positions
        .iter()
        .map(|[first, second]| format!("{first} {second}"))
        .join(" ")
}

fn start<W: Write>(writer: &mut Writer<W>, tag: &str) -> Result<(), EncodeError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    Ok(())
}

fn end<W: Write>(writer: &mut Writer<W>, tag: &str) -> Result<(), EncodeError> {
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn text_element<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    attributes: &[(&str, &str)],
    text: &str,
) -> Result<(), EncodeError> {
    writer.write_event(Event::Start(
        BytesStart::new(tag).with_attributes(attributes.iter().copied()),
    ))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    end(writer, tag)
}

/// AIXM value, unit of measurement and vertical reference of a limit.
fn limit_codes(elevation: &Elevation) -> (String, &'static str, &'static str) {
    if elevation.is_unlimited() {
        return ("UNL".to_string(), "OTHER", "STD");
    }
    if elevation.is_ground() {
        return ("GND".to_string(), "OTHER", "SFC");
    }
    let uom = match elevation.unit {
        ElevationUnit::FlightLevel => "FL",
        ElevationUnit::Foot => "FT",
        ElevationUnit::Metre => "M",
    };
    let reference = match (elevation.unit, elevation.reference) {
        (ElevationUnit::FlightLevel, _) => "STD",
        (_, ElevationReference::MeanSeaLevel) => "MSL",
        (_, ElevationReference::Unlimited) => "STD",
        (_, ElevationReference::AboveGroundLevel | ElevationReference::Surface) => "SFC",
    };
    (elevation.value.to_string(), uom, reference)
}

/// Turns a [`Boundary`] into GML geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryEncoder {
    axis_order: AxisOrder,
    circle_strategy: CircleStrategy,
    rasterizer: ArcRasterizer,
}

impl Default for BoundaryEncoder {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl BoundaryEncoder {
    pub fn new(config: &Config) -> Self {
        Self {
            axis_order: config.axis_order,
            circle_strategy: config.circle_strategy,
            rasterizer: ArcRasterizer::new(config.arc_step),
        }
    }

    fn closed_ring(&self, points: &[Point]) -> Vec<[f64; 2]> {
        let mut ring = points
            .iter()
            .map(|p| self.axis_order.position(*p))
            .collect::<Vec<_>>();
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last()) {
            if first != *last {
                ring.push(first);
            }
        }
        ring
    }

    pub fn encode(&self, boundary: &Boundary) -> EncodedGeometry {
        match (boundary, self.circle_strategy) {
            (Boundary::Ring(points), _) => EncodedGeometry::Ring(self.closed_ring(points)),
            (Boundary::Circle { center, radius }, CircleStrategy::Native) => {
                EncodedGeometry::Circle {
                    center: self.axis_order.position(*center),
                    radius: *radius,
                }
            }
            (Boundary::Circle { center, radius }, CircleStrategy::Rasterized) => {
                EncodedGeometry::Ring(
                    self.closed_ring(&self.rasterizer.full_circle(*center, radius)),
                )
            }
        }
    }

    /// Writes the boundary as a `gml:Ring` element.
    pub fn write_gml<W: Write>(
        &self,
        boundary: &Boundary,
        writer: &mut Writer<W>,
    ) -> Result<(), EncodeError> {
        start(writer, "gml:Ring")?;
        start(writer, "gml:curveMember")?;
        writer.write_event(Event::Start(
            BytesStart::new("gml:Curve").with_attributes([("srsName", SRS_NAME)]),
        ))?;
        start(writer, "gml:segments")?;

        match self.encode(boundary) {
            EncodedGeometry::Ring(positions) => {
                trace!("writing ring of {} positions", positions.len());
                start(writer, "gml:GeodesicString")?;
                text_element(writer, "gml:posList", &[], &pos_list(&positions))?;
                end(writer, "gml:GeodesicString")?;
            }
            EncodedGeometry::Circle { center, radius } => {
                trace!("writing circle of radius {radius}");
                writer.write_event(Event::Start(
                    BytesStart::new("gml:CircleByCenterPoint").with_attributes([("numArc", "1")]),
                ))?;
                text_element(writer, "gml:pos", &[], &pos_list(&[center]))?;
                text_element(
                    writer,
                    "gml:radius",
                    &[("uom", radius.unit.uom())],
                    &radius.magnitude.to_string(),
                )?;
                end(writer, "gml:CircleByCenterPoint")?;
            }
        }

        end(writer, "gml:segments")?;
        end(writer, "gml:Curve")?;
        end(writer, "gml:curveMember")?;
        end(writer, "gml:Ring")
    }

    pub fn to_gml(&self, boundary: &Boundary) -> Result<String, EncodeError> {
        let mut writer = Writer::new(Vec::new());
        self.write_gml(boundary, &mut writer)?;
        Ok(String::from_utf8(writer.into_inner())?)
    }

    /// Writes the upper and lower limit elements of an airspace volume.
    pub fn write_limits<W: Write>(
        &self,
        airspace: &Airspace,
        writer: &mut Writer<W>,
    ) -> Result<(), EncodeError> {
        for (prefix, elevation) in [
            ("upper", &airspace.upper_limit),
            ("lower", &airspace.lower_limit),
        ] {
            let (value, uom, reference) = limit_codes(elevation);
            text_element(
                writer,
                &format!("aixm:{prefix}Limit"),
                &[("uom", uom)],
                &value,
            )?;
            text_element(
                writer,
                &format!("aixm:{prefix}LimitReference"),
                &[],
                reference,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use geo::{point, Distance as _, Geodesic, Point};
    use pretty_assertions_sorted::assert_eq_sorted;
    use quick_xml::Writer;

    use crate::boundary::Boundary;
    use crate::{
        Airspace, AxisOrder, BoundaryEncoder, CircleStrategy, Config, Distance, DistanceUnit,
        Elevation, EncodedGeometry,
    };

    fn twelve() -> Boundary {
        Boundary::Ring(
            (0..12)
                .map(|i| {
                    let angle = f64::from(i) * 30.0_f64.to_radians();
                    point! { x: 17.0 + 0.1 * angle.sin(), y: 48.0 + 0.1 * angle.cos() }
                })
                .collect(),
        )
    }

    fn circle() -> Boundary {
        Boundary::Circle {
            center: point! { x: 17.148_333, y: 48.17 },
            radius: Distance::new(3000.0, DistanceUnit::Metre),
        }
    }

    #[test]
    fn test_ring_closure() {
        let EncodedGeometry::Ring(ring) = BoundaryEncoder::default().encode(&twelve()) else {
            panic!("expected ring");
        };
        assert_eq!(ring.len(), 13);
        assert_eq!(ring[0], ring[12]);

        // a ring that already repeats its start is not closed twice
        let Boundary::Ring(mut points) = twelve() else {
            unreachable!()
        };
        points.push(points[0]);
        let EncodedGeometry::Ring(ring) = BoundaryEncoder::default().encode(&Boundary::Ring(points))
        else {
            panic!("expected ring");
        };
        assert_eq!(ring.len(), 13);
    }

    #[test]
    fn test_axis_order() {
        let boundary = Boundary::Ring(vec![
            point! { x: 17.0, y: 48.0 },
            point! { x: 17.5, y: 48.0 },
            point! { x: 17.5, y: 48.5 },
        ]);
        let EncodedGeometry::Ring(ring) = BoundaryEncoder::default().encode(&boundary) else {
            panic!("expected ring");
        };
        assert_eq!(ring[1], [48.0, 17.5]);

        let encoder = BoundaryEncoder::new(&Config {
            axis_order: AxisOrder::LonLat,
            ..Config::default()
        });
        let EncodedGeometry::Ring(ring) = encoder.encode(&boundary) else {
            panic!("expected ring");
        };
        assert_eq!(ring[1], [17.5, 48.0]);
    }

    #[test]
    fn test_rasterized_circle() {
        let encoder = BoundaryEncoder::new(&Config {
            circle_strategy: CircleStrategy::Rasterized,
            ..Config::default()
        });
        let EncodedGeometry::Ring(ring) = encoder.encode(&circle()) else {
            panic!("expected ring");
        };
        assert_eq!(ring.len(), 73);
        assert_eq!(ring[0], ring[72]);

        let center = point! { x: 17.148_333, y: 48.17 };
        for [lat, lon] in ring {
            let distance = Geodesic.distance(center, Point::new(lon, lat));
            assert!((distance - 3000.0).abs() < 1.0, "{distance}");
        }
    }

    #[test]
    fn test_native_circle_gml() {
        assert_eq!(
            BoundaryEncoder::default().to_gml(&circle()).unwrap(),
            concat!(
                r#"<gml:Ring><gml:curveMember><gml:Curve srsName="urn:ogc:def:crs:EPSG::4326">"#,
                r#"<gml:segments><gml:CircleByCenterPoint numArc="1">"#,
                r#"<gml:pos>48.17 17.148333</gml:pos><gml:radius uom="M">3000</gml:radius>"#,
                "</gml:CircleByCenterPoint></gml:segments>",
                "</gml:Curve></gml:curveMember></gml:Ring>",
            )
        );
    }

    #[test]
    fn test_ring_gml() {
        let boundary = Boundary::Ring(vec![
            point! { x: 17.0, y: 48.0 },
            point! { x: 17.5, y: 48.0 },
            point! { x: 17.5, y: 48.5 },
        ]);
        let gml = BoundaryEncoder::default().to_gml(&boundary).unwrap();
        assert!(gml.contains(concat!(
            "<gml:GeodesicString><gml:posList>48 17 48 17.5 48.5 17.5 48 17</gml:posList>",
            "</gml:GeodesicString>",
        )));
    }

    #[test]
    fn test_write_limits() {
        let airspace = Airspace {
            designator: "LZR1".to_string(),
            name: "BRATISLAVA CTR".to_string(),
            type_code: "CTR".to_string(),
            boundary: circle(),
            upper_limit: Elevation::flight_level(95),
            lower_limit: Elevation::GROUND,
            operator: None,
            active_time: None,
            remarks: None,
            airspace_class: None,
        };
        let mut writer = Writer::new(Vec::new());
        BoundaryEncoder::default()
            .write_limits(&airspace, &mut writer)
            .unwrap();
        assert_eq_sorted!(
            String::from_utf8(writer.into_inner()).unwrap(),
            concat!(
                r#"<aixm:upperLimit uom="FL">95</aixm:upperLimit>"#,
                "<aixm:upperLimitReference>STD</aixm:upperLimitReference>",
                r#"<aixm:lowerLimit uom="OTHER">GND</aixm:lowerLimit>"#,
                "<aixm:lowerLimitReference>SFC</aixm:lowerLimitReference>",
            )
        );

        let mut writer = Writer::new(Vec::new());
        let airspace = Airspace {
            upper_limit: Elevation::UNLIMITED,
            lower_limit: Elevation::parse("300 M AGL", "X").unwrap(),
            ..airspace
        };
        BoundaryEncoder::default()
            .write_limits(&airspace, &mut writer)
            .unwrap();
        let xml = String::from_utf8(writer.into_inner()).unwrap();
        assert!(xml.contains(r#"<aixm:upperLimit uom="OTHER">UNL</aixm:upperLimit>"#));
        assert!(xml.contains(r#"<aixm:lowerLimit uom="M">300</aixm:lowerLimit>"#));
        assert!(xml.contains("<aixm:lowerLimitReference>SFC</aixm:lowerLimitReference>"));
    }
}
