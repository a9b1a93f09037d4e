use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::encoder::{AxisOrder, CircleStrategy};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    FileRead(#[from] io::Error),
    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Publication-format constants, injected into [`crate::BoundaryGrammar`] and
/// [`crate::BoundaryEncoder`] at construction.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Leading phrase that makes a whole boundary a circle.
    pub circle_prefix: String,
    /// Phrases announcing that the boundary follows the border polyline.
    pub border_phrases: Vec<String>,
    /// Angular step of arc rasterization, degrees.
    pub arc_step: f64,
    /// Maximum distance from a splice point to its border vertex, metres.
    pub splice_tolerance: f64,
    pub axis_order: AxisOrder,
    pub circle_strategy: CircleStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            circle_prefix: "A circle".to_string(),
            border_phrases: vec![
                "along the state border".to_string(),
                "along state border".to_string(),
                "along the border".to_string(),
            ],
            arc_step: 5.0,
            splice_tolerance: 1000.0,
            axis_order: AxisOrder::default(),
            circle_strategy: CircleStrategy::default(),
        }
    }
}

impl Config {
    pub fn from_json(content: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_json::from_slice(content)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&fs_err::read(path)?)
    }
}
