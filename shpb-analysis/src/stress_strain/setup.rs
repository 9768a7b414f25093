use crate::error::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use shpb_common::Real;

/// Bar and specimen constants, in consistent SI units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BarSetup {
    /// Cross-section area of the incident and transmitted bars (m²).
    pub bar_area: Real,
    /// Elastic wave speed of the bars (m/s).
    pub wave_speed: Real,
    /// Young's modulus of the bars (Pa).
    pub elastic_modulus: Real,
    /// Cross-section area of the specimen (m²).
    pub specimen_area: Real,
    /// Initial length of the specimen (m).
    pub specimen_length: Real,
    /// Converts recorded gauge units to dimensionless strain.
    pub strain_scale: Real,
}

impl Default for BarSetup {
    fn default() -> Self {
        Self {
            bar_area: 3.14e-4,
            wave_speed: 5000.0,
            elastic_modulus: 200e9,
            specimen_area: 7.85e-5,
            specimen_length: 0.005,
            strain_scale: 1.0,
        }
    }
}

impl BarSetup {
    pub fn validate(&self) -> ValidationResult<()> {
        for (name, value) in [
            ("bar area", self.bar_area),
            ("wave speed", self.wave_speed),
            ("elastic modulus", self.elastic_modulus),
            ("specimen area", self.specimen_area),
            ("specimen length", self.specimen_length),
            ("strain scale", self.strain_scale),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ValidationError::OutOfRange {
                    name,
                    requirement: "finite and positive",
                    value,
                });
            }
        }
        Ok(())
    }

    /// Converts bar strain to specimen stress: `(A_bar / A_specimen) · E`.
    pub(crate) fn stress_factor(&self) -> Real {
        self.bar_area / self.specimen_area * self.elastic_modulus
    }

    /// Converts bar strain to bar force: `E · A_bar`.
    pub(crate) fn force_factor(&self) -> Real {
        self.elastic_modulus * self.bar_area
    }

    pub(crate) fn rate_factor(&self) -> Real {
        self.wave_speed / self.specimen_length
    }
}
