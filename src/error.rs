use thiserror::Error;

/// Row-scoped parse failure. Every variant carries the designator (or name)
/// of the airspace it belongs to.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{designator}: malformed coordinate {token:?}: {reason}")]
    MalformedCoordinate {
        designator: String,
        token: String,
        reason: String,
    },
    #[error("{name}: malformed elevation {expression:?}: {reason}")]
    MalformedElevation {
        name: String,
        expression: String,
        reason: String,
    },
    #[error("{designator}: unrecognized boundary segment {segment:?}: {reason}")]
    UnrecognizedSegment {
        designator: String,
        segment: String,
        reason: String,
    },
    #[error("{designator}: degenerate boundary: {reason}")]
    DegenerateBoundary { designator: String, reason: String },
    #[error("{designator}: no border vertex within tolerance of {point} (nearest {distance:.0} m)")]
    SpliceNotFound {
        designator: String,
        point: String,
        distance: f64,
    },
    #[error("{designator}: boundary follows a border but no border polyline was supplied")]
    MissingBorderData { designator: String },
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn coordinate(designator: &str, token: &str, reason: impl Into<String>) -> Self {
        Self::MalformedCoordinate {
            designator: designator.to_string(),
            token: token.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn segment(designator: &str, segment: &str, reason: impl Into<String>) -> Self {
        Self::UnrecognizedSegment {
            designator: designator.to_string(),
            segment: segment.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn degenerate(designator: &str, reason: impl Into<String>) -> Self {
        Self::DegenerateBoundary {
            designator: designator.to_string(),
            reason: reason.into(),
        }
    }

    /// The designator or name of the airspace row this error belongs to.
    pub fn owner(&self) -> Option<&str> {
        match self {
            Self::MalformedCoordinate { designator, .. }
            | Self::UnrecognizedSegment { designator, .. }
            | Self::DegenerateBoundary { designator, .. }
            | Self::SpliceNotFound { designator, .. }
            | Self::MissingBorderData { designator } => Some(designator),
            Self::MalformedElevation { name, .. } => Some(name),
            Self::Config(_) => None,
        }
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Self::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
