use std::fmt::{self, Display};

use once_cell::sync::Lazy;
use phf::phf_map;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;
use uom::si::length::{foot, kilometer, meter, nautical_mile};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum DistanceUnit {
    Metre,
    Foot,
    NauticalMile,
    Kilometre,
}

static UNITS: phf::Map<&'static str, DistanceUnit> = phf_map! {
    "M" => DistanceUnit::Metre,
    "METRE" => DistanceUnit::Metre,
    "METRES" => DistanceUnit::Metre,
    "METER" => DistanceUnit::Metre,
    "METERS" => DistanceUnit::Metre,
    "FT" => DistanceUnit::Foot,
    "FEET" => DistanceUnit::Foot,
    "NM" => DistanceUnit::NauticalMile,
    "KM" => DistanceUnit::Kilometre,
};

/// Number and unit of a distance, longest unit spellings first.
pub(crate) const DISTANCE_PATTERN: &str =
    r"\d+(?:[.,]\d+)?\s*(?:METRES?|METERS?|FEET|FT|NM|KM|M)\b";

static DISTANCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d+(?:[.,]\d+)?)\s*(METRES?|METERS?|FEET|FT|NM|KM|M)$").unwrap()
});

impl DistanceUnit {
    pub(crate) fn from_abbreviation(abbreviation: &str) -> Option<Self> {
        UNITS.get(abbreviation.to_uppercase().as_str()).copied()
    }

    /// Unit of measurement code of the AIXM `UomDistanceType`.
    pub fn uom(self) -> &'static str {
        match self {
            DistanceUnit::Metre => "M",
            DistanceUnit::Foot => "FT",
            DistanceUnit::NauticalMile => "NM",
            DistanceUnit::Kilometre => "KM",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct Distance {
    pub magnitude: f64,
    pub unit: DistanceUnit,
}

impl Distance {
    pub fn new(magnitude: f64, unit: DistanceUnit) -> Self {
        Self { magnitude, unit }
    }

    /// Parses `3000 M`, `5NM`, `2,5 km` and the like.
    pub fn parse(text: &str) -> Option<Self> {
        let captures = DISTANCE_RE.captures(text.trim())?;
        let magnitude = captures[1].replace(',', ".").parse().ok()?;
        let unit = DistanceUnit::from_abbreviation(&captures[2])?;
        Some(Self { magnitude, unit })
    }

    pub fn length(&self) -> Length {
        match self.unit {
            DistanceUnit::Metre => Length::new::<meter>(self.magnitude),
            DistanceUnit::Foot => Length::new::<foot>(self.magnitude),
            DistanceUnit::NauticalMile => Length::new::<nautical_mile>(self.magnitude),
            DistanceUnit::Kilometre => Length::new::<kilometer>(self.magnitude),
        }
    }

    pub fn metres(&self) -> f64 {
        self.length().get::<meter>()
    }
}

impl Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.unit.uom())
    }
}

#[cfg(test)]
mod test {
    use crate::{Distance, DistanceUnit};

    #[test]
    fn test_parse() {
        assert_eq!(
            Distance::parse("3000 M"),
            Some(Distance::new(3000.0, DistanceUnit::Metre))
        );
        assert_eq!(
            Distance::parse("5NM"),
            Some(Distance::new(5.0, DistanceUnit::NauticalMile))
        );
        assert_eq!(
            Distance::parse("2,5 km"),
            Some(Distance::new(2.5, DistanceUnit::Kilometre))
        );
        assert_eq!(
            Distance::parse("1000 feet"),
            Some(Distance::new(1000.0, DistanceUnit::Foot))
        );
        assert_eq!(Distance::parse("3000"), None);
        assert_eq!(Distance::parse("three NM"), None);
    }

    #[test]
    fn test_metres() {
        assert!((Distance::new(1.0, DistanceUnit::NauticalMile).metres() - 1852.0).abs() < 1e-9);
        assert!((Distance::new(1000.0, DistanceUnit::Foot).metres() - 304.8).abs() < 1e-9);
        assert!((Distance::new(2.5, DistanceUnit::Kilometre).metres() - 2500.0).abs() < 1e-9);
        assert_eq!(Distance::new(3000.0, DistanceUnit::Metre).to_string(), "3000 M");
    }
}
