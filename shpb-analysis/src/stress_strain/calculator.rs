use super::{
    curve::StressStrainCurve,
    equilibrium::{EquilibriumInputs, EquilibriumMetrics},
    method::AnalysisMethod,
    setup::BarSetup,
};
use crate::{
    error::ValidationResult,
    numeric::cumulative_trapezoid,
    signal::PulseSet,
};
use shpb_common::Real;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use tracing::debug;

/// Bar strains of one pulse set after applying the strain scale.
struct ScaledPulses {
    incident: Vec<Real>,
    transmitted: Vec<Real>,
    reflected: Vec<Real>,
}

#[derive(Debug, Clone)]
pub struct StressStrainCalculator {
    setup: BarSetup,
}

impl StressStrainCalculator {
    pub fn new(setup: BarSetup) -> ValidationResult<Self> {
        setup.validate()?;
        Ok(Self { setup })
    }

    pub fn setup(&self) -> &BarSetup {
        &self.setup
    }

    fn scaled(&self, pulses: &PulseSet) -> ScaledPulses {
        let scale = |x: &[Real]| x.iter().map(|v| v * self.setup.strain_scale).collect();
        ScaledPulses {
            incident: scale(pulses.incident()),
            transmitted: scale(pulses.transmitted()),
            reflected: scale(pulses.reflected()),
        }
    }

    fn one_wave_rate(&self, strains: &ScaledPulses) -> Vec<Real> {
        let factor = -2.0 * self.setup.rate_factor();
        strains.reflected.iter().map(|r| factor * r).collect()
    }

    fn three_wave_rate(&self, strains: &ScaledPulses) -> Vec<Real> {
        let factor = self.setup.rate_factor();
        strains
            .incident
            .iter()
            .zip(&strains.reflected)
            .zip(&strains.transmitted)
            .map(|((i, r), t)| factor * (i - r - t))
            .collect()
    }

    /// Validates the series against each other before reducing them.
    pub fn calculate(
        &self,
        incident: &[Real],
        transmitted: &[Real],
        reflected: &[Real],
        time: &[Real],
        method: AnalysisMethod,
    ) -> ValidationResult<StressStrainCurve> {
        let pulses = PulseSet::with_time(
            incident.to_vec(),
            transmitted.to_vec(),
            reflected.to_vec(),
            time.to_vec(),
        )?;
        Ok(self.calculate_set(&pulses, method))
    }

    pub fn calculate_set(&self, pulses: &PulseSet, method: AnalysisMethod) -> StressStrainCurve {
        let strains = self.scaled(pulses);
        let stress_factor = self.setup.stress_factor();
        let stress: Vec<Real> = match method {
            AnalysisMethod::OneWave | AnalysisMethod::ThreeWave => strains
                .transmitted
                .iter()
                .map(|t| stress_factor * t)
                .collect(),
            AnalysisMethod::TwoWave => strains
                .incident
                .iter()
                .zip(&strains.reflected)
                .map(|(i, r)| stress_factor * (i + r))
                .collect(),
        };
        let strain_rate = match method {
            AnalysisMethod::OneWave | AnalysisMethod::TwoWave => self.one_wave_rate(&strains),
            AnalysisMethod::ThreeWave => self.three_wave_rate(&strains),
        };
        let strain = cumulative_trapezoid(&strain_rate, pulses.time());

        let magnitude = |x: Vec<Real>| x.into_iter().map(Real::abs).collect::<Vec<_>>();
        let curve = StressStrainCurve::new(
            method,
            pulses.time().to_vec(),
            magnitude(stress),
            magnitude(strain),
            magnitude(strain_rate),
        );
        debug!(
            "{method}: peak stress {}, final strain {}",
            curve.stress.iter().copied().fold(0.0, Real::max),
            curve.strain.last().copied().unwrap_or_default()
        );
        curve
    }

    pub fn calculate_all_methods(
        &self,
        pulses: &PulseSet,
    ) -> BTreeMap<AnalysisMethod, StressStrainCurve> {
        AnalysisMethod::iter()
            .map(|method| (method, self.calculate_set(pulses, method)))
            .collect()
    }

    /// Compares the front face force `E·A_bar·(incident + reflected)` with
    /// the back face force `E·A_bar·transmitted`, and the 1-wave with the
    /// 3-wave strain rate.
    pub fn calculate_equilibrium_metrics(&self, pulses: &PulseSet) -> EquilibriumMetrics {
        let strains = self.scaled(pulses);
        let force_factor = self.setup.force_factor();
        let front_force: Vec<Real> = strains
            .incident
            .iter()
            .zip(&strains.reflected)
            .map(|(i, r)| force_factor * (i + r))
            .collect();
        let back_force: Vec<Real> = strains
            .transmitted
            .iter()
            .map(|t| force_factor * t)
            .collect();
        let one_wave_stress: Vec<Real> = strains
            .transmitted
            .iter()
            .map(|t| self.setup.stress_factor() * t)
            .collect();
        EquilibriumInputs {
            front_force: &front_force,
            back_force: &back_force,
            one_wave_rate: &self.one_wave_rate(&strains),
            three_wave_rate: &self.three_wave_rate(&strains),
            one_wave_stress: &one_wave_stress,
            time: pulses.time(),
        }
        .metrics()
    }
}
