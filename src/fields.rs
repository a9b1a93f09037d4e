use bevy_reflect::Reflect;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static CLASS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^class\s+([A-G])\b").unwrap());

/// Optional cells at the end of an airspace row. Tables leave out trailing
/// cells freely, so only their position from the right tells them apart.
#[derive(Clone, Debug, Default, PartialEq, Eq, Reflect, Serialize)]
pub struct TrailingFields {
    pub active_time: Option<String>,
    pub remarks: Option<String>,
    pub airspace_class: Option<String>,
}

fn class(field: &str) -> Option<String> {
    CLASS_RE
        .captures(field)
        .map(|captures| captures[1].to_ascii_uppercase())
}

impl TrailingFields {
    /// Assigns the trailing cells, earliest first. Blank cells count as
    /// absent.
    pub fn assign<S: AsRef<str>>(fields: &[S]) -> Self {
        let present = fields
            .iter()
            .map(|field| field.as_ref().trim())
            .filter(|field| !field.is_empty())
            .collect::<Vec<_>>();
        Self::assign_present(&present)
    }

    fn assign_present(fields: &[&str]) -> Self {
        match fields {
            [rest @ .., last] if class(last).is_some() => Self {
                airspace_class: class(last),
                ..Self::assign_positional(rest)
            },
            _ => Self::assign_positional(fields),
        }
    }

    /// Active time and remarks. A class marker here is ordinary text.
    fn assign_positional(fields: &[&str]) -> Self {
        match fields {
            [] => Self::default(),
            [active_time] => Self {
                active_time: Some((*active_time).to_string()),
                ..Self::default()
            },
            [active_time, remarks @ ..] => Self {
                active_time: Some((*active_time).to_string()),
                remarks: Some(remarks.iter().join(" ")),
                airspace_class: None,
            },
        }
    }
}
