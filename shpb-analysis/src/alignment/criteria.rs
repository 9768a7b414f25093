use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use shpb_common::Real;
use tracing::warn;

const WEIGHT_SUM_TOLERANCE: Real = 1e-3;

/// Weights of the four alignment criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct EquilibriumCriteria {
    /// Correlation between the incident and the transmitted-minus-reflected pulse.
    pub corr: Real,
    /// Agreement of the 1-wave and 2-wave bar face terms.
    pub u: Real,
    /// Agreement of the 1-wave and 3-wave strain rates.
    pub sr: Real,
    /// Agreement of the 1-wave and 3-wave strains.
    pub e: Real,
}

impl Default for EquilibriumCriteria {
    fn default() -> Self {
        Self {
            corr: 0.3,
            u: 0.3,
            sr: 0.2,
            e: 0.2,
        }
    }
}

impl EquilibriumCriteria {
    pub fn sum(&self) -> Real {
        self.corr + self.u + self.sr + self.e
    }

    /// Rejects negative or non-finite weights. A sum away from one is
    /// accepted with a warning.
    pub fn validate(&self) -> ValidationResult<()> {
        for (name, weight) in [
            ("corr weight", self.corr),
            ("u weight", self.u),
            ("sr weight", self.sr),
            ("e weight", self.e),
        ] {
            if !(weight.is_finite() && weight >= 0.0) {
                return Err(ValidationError::OutOfRange {
                    name,
                    requirement: "finite and non-negative",
                    value: weight,
                });
            }
        }
        if (self.sum() - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            warn!("Criterion weights sum to {}, expected 1.0", self.sum());
        }
        Ok(())
    }

    pub(crate) fn combine(&self, corr: Real, u: Real, sr: Real, e: Real) -> Real {
        self.corr * corr + self.u * u + self.sr * sr + self.e * e
    }
}
