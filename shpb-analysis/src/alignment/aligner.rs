use super::{
    cancellation::Cancellation,
    criteria::EquilibriumCriteria,
    fitness::{FitnessBreakdown, FitnessContext},
    linear_region::linear_region,
    optimiser::{OptimiserConfig, differential_evolution},
};
use crate::{
    error::{AlignmentError, ValidationError, ValidationResult},
    numeric::shift_zero_padded,
    signal::PulseSet,
};
use serde::{Deserialize, Serialize};
use shpb_common::Real;
use std::ops::RangeInclusive;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AlignerConfig {
    /// Elastic wave speed of the bars (m/s).
    pub wave_speed: Real,
    /// Initial specimen length (m).
    pub specimen_length: Real,
    /// Fraction of the steepest incident slope bounding the linear region.
    pub k_linear: Real,
    pub criteria: EquilibriumCriteria,
    pub optimiser: OptimiserConfig,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            wave_speed: 5000.0,
            specimen_length: 0.005,
            k_linear: 0.35,
            criteria: EquilibriumCriteria::default(),
            optimiser: OptimiserConfig::default(),
        }
    }
}

/// Inclusive integer shift ranges searched for each pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ShiftBounds {
    pub transmitted: (i64, i64),
    pub reflected: (i64, i64),
}

impl ShiftBounds {
    /// `-len/2..=len/2` for both pulses.
    pub fn symmetric(len: usize) -> Self {
        let half = (len / 2) as i64;
        Self {
            transmitted: (-half, half),
            reflected: (-half, half),
        }
    }

    fn validate(&self) -> ValidationResult<()> {
        for (name, (lower, upper)) in [
            ("transmitted shift", self.transmitted),
            ("reflected shift", self.reflected),
        ] {
            if lower > upper {
                return Err(ValidationError::InvertedBounds { name, lower, upper });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AlignmentResult {
    /// The incident pulse unchanged, with the shifted transmitted and reflected pulses.
    pub pulses: PulseSet,
    pub shift_transmitted: i64,
    pub shift_reflected: i64,
    pub fitness: FitnessBreakdown,
    pub generations: usize,
    pub evaluations: usize,
    pub converged: bool,
}

#[derive(Debug, Clone)]
pub struct PulseAligner {
    config: AlignerConfig,
}

impl PulseAligner {
    pub fn new(config: AlignerConfig) -> ValidationResult<Self> {
        for (name, value) in [
            ("wave speed", config.wave_speed),
            ("specimen length", config.specimen_length),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ValidationError::OutOfRange {
                    name,
                    requirement: "finite and positive",
                    value,
                });
            }
        }
        if !(config.k_linear > 0.0 && config.k_linear <= 1.0) {
            return Err(ValidationError::OutOfRange {
                name: "k_linear",
                requirement: "within (0, 1]",
                value: config.k_linear,
            });
        }
        config.criteria.validate()?;
        config.optimiser.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    pub fn linear_region(&self, incident: &[Real]) -> RangeInclusive<usize> {
        linear_region(incident, self.config.k_linear)
    }

    fn context<'a>(&'a self, pulses: &'a PulseSet) -> FitnessContext<'a> {
        FitnessContext {
            pulses,
            region: self.linear_region(pulses.incident()),
            wave_speed: self.config.wave_speed,
            specimen_length: self.config.specimen_length,
            criteria: &self.config.criteria,
        }
    }

    /// Evaluates the alignment criteria for one pair of shifts.
    pub fn fitness(
        &self,
        pulses: &PulseSet,
        shift_transmitted: i64,
        shift_reflected: i64,
    ) -> FitnessBreakdown {
        self.context(pulses)
            .evaluate(shift_transmitted, shift_reflected)
    }

    pub fn align(
        &self,
        incident: &[Real],
        transmitted: &[Real],
        reflected: &[Real],
        time: &[Real],
        bounds: Option<ShiftBounds>,
    ) -> Result<AlignmentResult, AlignmentError> {
        self.align_with_cancellation(
            incident,
            transmitted,
            reflected,
            time,
            bounds,
            &Cancellation::new(),
        )
    }

    pub fn align_with_cancellation(
        &self,
        incident: &[Real],
        transmitted: &[Real],
        reflected: &[Real],
        time: &[Real],
        bounds: Option<ShiftBounds>,
        cancellation: &Cancellation,
    ) -> Result<AlignmentResult, AlignmentError> {
        let pulses = PulseSet::with_time(
            incident.to_vec(),
            transmitted.to_vec(),
            reflected.to_vec(),
            time.to_vec(),
        )?;
        self.align_set_with_cancellation(&pulses, bounds, cancellation)
    }

    pub fn align_set(
        &self,
        pulses: &PulseSet,
        bounds: Option<ShiftBounds>,
    ) -> Result<AlignmentResult, AlignmentError> {
        self.align_set_with_cancellation(pulses, bounds, &Cancellation::new())
    }

    /// Searches `bounds`, or `±len/2` when none are given, for the shifts
    /// maximising the weighted equilibrium fitness.
    #[tracing::instrument(skip_all, level = "debug", fields(len = pulses.len()))]
    pub fn align_set_with_cancellation(
        &self,
        pulses: &PulseSet,
        bounds: Option<ShiftBounds>,
        cancellation: &Cancellation,
    ) -> Result<AlignmentResult, AlignmentError> {
        let bounds = bounds.unwrap_or_else(|| ShiftBounds::symmetric(pulses.len()));
        bounds.validate()?;

        let context = self.context(pulses);
        let outcome = differential_evolution(
            |shifts| context.objective(shifts),
            &[bounds.transmitted, bounds.reflected],
            &self.config.optimiser,
            cancellation,
        )?;
        let [shift_transmitted, shift_reflected] = shift_pair(&outcome.best)?;
        let fitness = context.evaluate(shift_transmitted, shift_reflected);
        info!(
            "Aligned with shifts transmitted {shift_transmitted}, reflected {shift_reflected}: fitness {}",
            fitness.total
        );

        let aligned = PulseSet::with_time(
            pulses.incident().to_vec(),
            shift_zero_padded(pulses.transmitted(), shift_transmitted),
            shift_zero_padded(pulses.reflected(), shift_reflected),
            pulses.time().to_vec(),
        )?;
        Ok(AlignmentResult {
            pulses: aligned,
            shift_transmitted,
            shift_reflected,
            fitness,
            generations: outcome.generations,
            evaluations: outcome.evaluations,
            converged: outcome.converged,
        })
    }
}

/// The transmitted and reflected shifts of a two-dimensional solution.
fn shift_pair(solution: &[i64]) -> ValidationResult<[i64; 2]> {
    <[i64; 2]>::try_from(solution).map_err(|_| ValidationError::LengthMismatch {
        name: "alignment solution",
        expected: 2,
        actual: solution.len(),
    })
}
