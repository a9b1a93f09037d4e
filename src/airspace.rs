use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::boundary::{Boundary, BoundaryGrammar};
use crate::elevation::Elevation;
use crate::error::Result;
use crate::fields::TrailingFields;
use crate::geometry::BorderPolyline;

/// Raw cell texts of one airspace table row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AirspaceRow {
    pub designator: String,
    pub name: String,
    pub type_code: String,
    pub boundary: String,
    pub upper: String,
    pub lower: String,
    #[serde(default)]
    pub operator: Option<String>,
    /// Active time, remarks and class cells, whichever the table has.
    #[serde(default)]
    pub trailing: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Airspace {
    pub designator: String,
    pub name: String,
    pub type_code: String,
    pub boundary: Boundary,
    pub upper_limit: Elevation,
    pub lower_limit: Elevation,
    pub operator: Option<String>,
    pub active_time: Option<String>,
    pub remarks: Option<String>,
    pub airspace_class: Option<String>,
}

impl Airspace {
    /// Builds the airspace of one row. Errors concern this row only.
    pub fn from_row(
        row: &AirspaceRow,
        grammar: &BoundaryGrammar,
        border: Option<&BorderPolyline>,
    ) -> Result<Self> {
        let designator = row.designator.trim();
        let name = row.name.trim();

        let boundary = grammar.parse(&row.boundary, border, designator)?;
        let upper_limit = Elevation::parse(&row.upper, name)?;
        let lower_limit = Elevation::parse(&row.lower, name)?;
        if lower_limit.unit == upper_limit.unit
            && lower_limit.reference == upper_limit.reference
            && lower_limit.value > upper_limit.value
        {
            warn!("{designator}: lower limit {lower_limit} above upper limit {upper_limit}");
        }

        let TrailingFields {
            active_time,
            remarks,
            airspace_class,
        } = TrailingFields::assign(&row.trailing);
        let operator = row
            .operator
            .as_deref()
            .map(str::trim)
            .filter(|operator| !operator.is_empty())
            .map(ToString::to_string);

        debug!("{designator}: {name} {lower_limit} - {upper_limit}");
        Ok(Self {
            designator: designator.to_string(),
            name: name.to_string(),
            type_code: row.type_code.trim().to_string(),
            boundary,
            upper_limit,
            lower_limit,
            operator,
            active_time,
            remarks,
            airspace_class,
        })
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions_sorted::assert_eq_sorted;

    use crate::{
        Airspace, AirspaceRow, Boundary, BoundaryGrammar, Config, Distance, DistanceUnit,
        Elevation, ElevationReference, ElevationUnit, Error,
    };

    fn row() -> AirspaceRow {
        AirspaceRow {
            designator: "LZR1 ".to_string(),
            name: "BRATISLAVA CTR".to_string(),
            type_code: "CTR".to_string(),
            boundary: "A circle, radius 3000 M, centred on 481012N 0170854E".to_string(),
            upper: "3500 FT MSL".to_string(),
            lower: "GND".to_string(),
            operator: Some(" ".to_string()),
            trailing: vec!["H24".to_string(), String::new(), "Class D".to_string()],
        }
    }

    #[test]
    fn test_from_row() {
        let grammar = BoundaryGrammar::new(&Config::default()).unwrap();
        let airspace = Airspace::from_row(&row(), &grammar, None).unwrap();

        let Boundary::Circle { center, .. } = airspace.boundary else {
            panic!("expected circle");
        };
        assert_eq_sorted!(
            airspace,
            Airspace {
                designator: "LZR1".to_string(),
                name: "BRATISLAVA CTR".to_string(),
                type_code: "CTR".to_string(),
                boundary: Boundary::Circle {
                    center,
                    radius: Distance::new(3000.0, DistanceUnit::Metre),
                },
                upper_limit: Elevation {
                    value: 3500.0,
                    unit: ElevationUnit::Foot,
                    reference: ElevationReference::MeanSeaLevel,
                },
                lower_limit: Elevation::GROUND,
                operator: None,
                active_time: Some("H24".to_string()),
                remarks: None,
                airspace_class: Some("D".to_string()),
            }
        );
    }

    #[test]
    fn test_inverted_limits_accepted() {
        let grammar = BoundaryGrammar::new(&Config::default()).unwrap();
        let row = AirspaceRow {
            upper: "FL65".to_string(),
            lower: "FL95".to_string(),
            ..row()
        };
        let airspace = Airspace::from_row(&row, &grammar, None).unwrap();
        assert_eq!(airspace.lower_limit, Elevation::flight_level(95));
    }

    #[test]
    fn test_row_errors() {
        let grammar = BoundaryGrammar::new(&Config::default()).unwrap();

        let err = Airspace::from_row(
            &AirspaceRow {
                upper: "very high".to_string(),
                ..row()
            },
            &grammar,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedElevation { .. }));
        assert_eq!(err.owner(), Some("BRATISLAVA CTR"));

        let err = Airspace::from_row(
            &AirspaceRow {
                boundary: "481000N 0170000E - along the state border".to_string(),
                ..row()
            },
            &grammar,
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::MissingBorderData {
                designator: "LZR1".to_string()
            }
        );
    }

    #[test]
    fn test_row_json() {
        let row: AirspaceRow = serde_json::from_str(
            r#"{"designator": "LZR1", "name": "BRATISLAVA CTR", "type_code": "CTR",
                "boundary": "", "upper": "FL95", "lower": "GND"}"#,
        )
        .unwrap();
        assert_eq!(row.operator, None);
        assert!(row.trailing.is_empty());
    }
}
