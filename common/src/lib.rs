pub mod metrics;
pub mod tracer;

use serde::{Deserialize, Serialize};

pub type Real = f64;

/// Time between consecutive samples, in the caller's time unit.
pub type SampleInterval = Real;

/// The sign convention of a stress wave as recorded on a gauge.
#[derive(
    Default,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Polarity {
    #[default]
    Compressive,
    Tensile,
}

impl Polarity {
    /// The sign a sample takes when it agrees with this polarity.
    pub fn sign(self) -> Real {
        match self {
            Polarity::Compressive => -1.0,
            Polarity::Tensile => 1.0,
        }
    }

    pub fn agrees_with(self, value: Real) -> bool {
        value * self.sign() >= 0.0
    }
}

/// The three stress waves recorded during a test.
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
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PulseRole {
    Incident,
    Transmitted,
    Reflected,
}

impl PulseRole {
    /// The polarity a role carries when the striker loads the specimen in compression.
    pub fn loading_polarity(self) -> Polarity {
        match self {
            PulseRole::Incident | PulseRole::Transmitted => Polarity::Compressive,
            PulseRole::Reflected => Polarity::Tensile,
        }
    }
}
