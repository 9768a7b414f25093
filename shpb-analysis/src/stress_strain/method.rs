use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The stress-strain reduction applied to a pulse set.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum AnalysisMethod {
    /// Stress from the transmitted pulse, strain rate from the reflected pulse.
    #[serde(rename = "1-wave")]
    #[strum(serialize = "1-wave")]
    OneWave,
    /// Stress from the incident and reflected pulses at the front face.
    #[serde(rename = "2-wave")]
    #[strum(serialize = "2-wave")]
    TwoWave,
    /// Strain rate from all three pulses.
    #[serde(rename = "3-wave")]
    #[strum(serialize = "3-wave")]
    ThreeWave,
}

impl AnalysisMethod {
    /// Parses a method tag such as `"2-wave"`.
    pub fn from_tag(tag: &str) -> ValidationResult<Self> {
        Self::from_str(tag).map_err(|_| ValidationError::UnknownMethod(tag.to_owned()))
    }
}
