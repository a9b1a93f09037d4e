use std::fmt::{self, Display};

use bevy_reflect::Reflect;
use pest::{iterators::Pair, Parser};
use pest_derive::Parser;
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;
use uom::si::length::{foot, meter};

use crate::error::{Error, Result};

#[derive(Parser)]
#[grammar = "pest/elevation.pest"]
pub struct ElevationParser;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect, Deserialize, Serialize)]
pub enum ElevationUnit {
    Foot,
    Metre,
    FlightLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect, Deserialize, Serialize)]
pub enum ElevationReference {
    Surface,
    MeanSeaLevel,
    AboveGroundLevel,
    Unlimited,
}

/// Vertical limit of an airspace.
///
/// Flight levels always refer to the standard pressure datum and are stored
/// with [`ElevationReference::MeanSeaLevel`]. The unlimited sentinel has an
/// infinite value.
#[derive(Clone, Copy, Debug, PartialEq, Reflect, Deserialize, Serialize)]
pub struct Elevation {
    pub value: f64,
    pub unit: ElevationUnit,
    pub reference: ElevationReference,
}

impl Elevation {
    pub const GROUND: Self = Self {
        value: 0.0,
        unit: ElevationUnit::Foot,
        reference: ElevationReference::Surface,
    };

    pub const UNLIMITED: Self = Self {
        value: f64::INFINITY,
        unit: ElevationUnit::Foot,
        reference: ElevationReference::Unlimited,
    };

    pub fn flight_level(level: u32) -> Self {
        Self {
            value: f64::from(level),
            unit: ElevationUnit::FlightLevel,
            reference: ElevationReference::MeanSeaLevel,
        }
    }

    pub fn is_unlimited(&self) -> bool {
        self.reference == ElevationReference::Unlimited
    }

    pub fn is_ground(&self) -> bool {
        self.reference == ElevationReference::Surface && self.value == 0.0
    }

    /// Value in feet, flight levels taken as standard pressure altitude.
    pub fn feet(&self) -> f64 {
        match self.unit {
            _ if self.is_unlimited() => f64::INFINITY,
            ElevationUnit::Foot => self.value,
            ElevationUnit::Metre => Length::new::<meter>(self.value).get::<foot>(),
            ElevationUnit::FlightLevel => self.value * 100.0,
        }
    }

    /// Parses an elevation cell such as `GND`, `FL195`, `3500 FT MSL` or
    /// `300 M AGL`. `name` identifies the owning airspace in errors.
    pub fn parse(expression: &str, name: &str) -> Result<Self> {
        let malformed = |reason: String| Error::MalformedElevation {
            name: name.to_string(),
            expression: expression.to_string(),
            reason,
        };

        let pair = ElevationParser::parse(Rule::elevation, expression.trim())
            .map_err(|e| malformed(e.variant.message().to_string()))?
            .next()
            .ok_or_else(|| malformed("empty expression".to_string()))?;

        match pair.as_rule() {
            Rule::unlimited => Ok(Self::UNLIMITED),
            Rule::ground => Ok(Self::GROUND),
            Rule::flight_level => {
                let level = pair
                    .into_inner()
                    .next()
                    .map(|integer| integer.as_str())
                    .unwrap_or_default();
                level
                    .parse()
                    .map(Self::flight_level)
                    .map_err(|e| malformed(format!("flight level {level:?}: {e}")))
            }
            Rule::altitude => Self::parse_altitude(pair).map_err(malformed),
            rule => Err(malformed(format!("unexpected {rule:?}"))),
        }
    }

    fn parse_altitude(pair: Pair<Rule>) -> std::result::Result<Self, String> {
        let mut altitude = pair.into_inner();
        let number = altitude
            .next()
            .map(|number| number.as_str().replace(',', "."))
            .unwrap_or_default();
        let value: f64 = number
            .parse()
            .map_err(|e| format!("number {number:?}: {e}"))?;
        if !value.is_finite() || value < 0.0 {
            return Err(format!("{value} is not a valid non-negative number"));
        }
        let unit = match altitude.next().map(|unit| unit.as_rule()) {
            Some(Rule::metres) => ElevationUnit::Metre,
            _ => ElevationUnit::Foot,
        };
        let reference = match altitude.next().map(|reference| reference.as_rule()) {
            Some(Rule::agl) => ElevationReference::AboveGroundLevel,
            _ => ElevationReference::MeanSeaLevel,
        };

        Ok(Self {
            value,
            unit,
            reference,
        })
    }
}

impl Display for Elevation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unlimited() {
            return write!(f, "UNL");
        }
        if self.is_ground() {
            return write!(f, "GND");
        }
        let reference = match self.reference {
            ElevationReference::AboveGroundLevel | ElevationReference::Surface => "AGL",
            _ => "MSL",
        };
        match self.unit {
            ElevationUnit::FlightLevel => write!(f, "FL{}", self.value),
            ElevationUnit::Foot => write!(f, "{} FT {reference}", self.value),
            ElevationUnit::Metre => write!(f, "{} M {reference}", self.value),
        }
    }
}
