use super::criteria::EquilibriumCriteria;
use crate::{
    numeric::{cumulative_trapezoid, pearson, rmse, shift_zero_padded},
    signal::PulseSet,
};
use serde::Serialize;
use shpb_common::{Real, metrics::names};
use std::ops::RangeInclusive;

/// Objective value used in place of a non-finite fitness.
pub const PENALTY: Real = 1e6;

/// The four alignment criteria at one pair of shifts, and their weighted sum.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FitnessBreakdown {
    /// Pearson correlation of incident against transmitted minus reflected.
    pub correlation: Real,
    /// `1 / (1 + rmse)` of the 1-wave and 2-wave bar face terms.
    pub displacement: Real,
    /// `1 / (1 + rmse)` of the 1-wave and 3-wave strain rates.
    pub strain_rate: Real,
    /// `1 / (1 + rmse)` of the integrated strain rates.
    pub strain: Real,
    pub total: Real,
}

impl FitnessBreakdown {
    pub fn is_finite(&self) -> bool {
        self.total.is_finite()
    }
}

/// Pearson correlation, taking identical sequences as perfectly correlated
/// even when they have no variance.
fn correlation(a: &[Real], b: &[Real]) -> Real {
    let r = pearson(a, b);
    if r.is_nan() && a.len() > 1 && a == b {
        1.0
    } else {
        r
    }
}

fn similarity(a: &[Real], b: &[Real]) -> Real {
    1.0 / (1.0 + rmse(a, b))
}

/// Everything the objective needs, borrowed for the duration of one search.
pub(crate) struct FitnessContext<'a> {
    pub(crate) pulses: &'a PulseSet,
    pub(crate) region: RangeInclusive<usize>,
    pub(crate) wave_speed: Real,
    pub(crate) specimen_length: Real,
    pub(crate) criteria: &'a EquilibriumCriteria,
}

impl FitnessContext<'_> {
    pub(crate) fn evaluate(&self, shift_transmitted: i64, shift_reflected: i64) -> FitnessBreakdown {
        let transmitted = shift_zero_padded(self.pulses.transmitted(), shift_transmitted);
        let reflected = shift_zero_padded(self.pulses.reflected(), shift_reflected);

        let region = self.region.clone();
        let incident = &self.pulses.incident()[region.clone()];
        let time = &self.pulses.time()[region.clone()];
        let transmitted = &transmitted[region.clone()];
        let reflected = &reflected[region];

        let c = self.wave_speed;
        let c_over_l = c / self.specimen_length;

        let difference: Vec<Real> = transmitted.iter().zip(reflected).map(|(t, r)| t - r).collect();
        let correlation = correlation(incident, &difference);

        let one_wave_face: Vec<Real> = transmitted.iter().map(|t| c * t).collect();
        let two_wave_face: Vec<Real> = incident
            .iter()
            .zip(reflected)
            .map(|(i, r)| c * (i + r))
            .collect();
        let displacement = similarity(&one_wave_face, &two_wave_face);

        let one_wave_rate: Vec<Real> = reflected.iter().map(|r| -2.0 * c_over_l * r).collect();
        let three_wave_rate: Vec<Real> = incident
            .iter()
            .zip(reflected)
            .zip(transmitted)
            .map(|((i, r), t)| c_over_l * (i - r - t))
            .collect();
        let strain_rate = similarity(&one_wave_rate, &three_wave_rate);

        let strain = similarity(
            &cumulative_trapezoid(&one_wave_rate, time),
            &cumulative_trapezoid(&three_wave_rate, time),
        );

        FitnessBreakdown {
            correlation,
            displacement,
            strain_rate,
            strain,
            total: self
                .criteria
                .combine(correlation, displacement, strain_rate, strain),
        }
    }

    /// The value minimised by the optimiser: the negated fitness, or
    /// [`PENALTY`] when the fitness is not finite.
    pub(crate) fn objective(&self, shifts: &[i64]) -> Real {
        let (shift_transmitted, shift_reflected) = match shifts {
            [t, r, ..] => (*t, *r),
            _ => return PENALTY,
        };
        let fitness = self.evaluate(shift_transmitted, shift_reflected);
        if fitness.is_finite() {
            -fitness.total
        } else {
            metrics::counter!(names::DEGENERATE_FITNESS).increment(1);
            PENALTY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::time_base;
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::PI;

    fn equilibrium_set(n: usize) -> PulseSet {
        let shape: Vec<Real> = (0..n)
            .map(|i| {
                let x = i as Real / (n - 1) as Real;
                (PI * x).sin()
            })
            .collect();
        let incident: Vec<Real> = shape.iter().map(|s| -s).collect();
        let transmitted: Vec<Real> = shape.iter().map(|s| -0.4 * s.powf(1.5)).collect();
        let reflected: Vec<Real> = incident
            .iter()
            .zip(&transmitted)
            .map(|(i, t)| t - i)
            .collect();
        PulseSet::with_time(incident, transmitted, reflected, time_base(n, 1e-7))
            .expect("set should be valid")
    }

    #[test]
    fn perfect_equilibrium_scores_one() {
        let pulses = equilibrium_set(101);
        let criteria = EquilibriumCriteria::default();
        let context = FitnessContext {
            pulses: &pulses,
            region: 0..=100,
            wave_speed: 5000.0,
            specimen_length: 0.005,
            criteria: &criteria,
        };
        let fitness = context.evaluate(0, 0);
        assert_approx_eq!(fitness.correlation, 1.0, 1e-12);
        assert_approx_eq!(fitness.displacement, 1.0, 1e-9);
        assert_approx_eq!(fitness.strain_rate, 1.0, 1e-6);
        assert_approx_eq!(fitness.strain, 1.0, 1e-9);
        assert_approx_eq!(fitness.total, 1.0, 1e-6);
        assert_approx_eq!(context.objective(&[0, 0]), -fitness.total);

        let shifted = context.evaluate(5, -3);
        assert!(shifted.total < fitness.total);
    }

    fn constant_set(incident: Real) -> PulseSet {
        PulseSet::new(vec![incident; 32], vec![0.0; 32], vec![0.0; 32], 1.0)
            .expect("set should be valid")
    }

    #[test]
    fn zero_signals_score_maximum() {
        let pulses = constant_set(0.0);
        let criteria = EquilibriumCriteria::default();
        let context = FitnessContext {
            pulses: &pulses,
            region: 0..=31,
            wave_speed: 1.0,
            specimen_length: 1.0,
            criteria: &criteria,
        };
        let fitness = context.evaluate(0, 0);
        assert_approx_eq!(fitness.correlation, 1.0);
        assert_approx_eq!(fitness.displacement, 1.0);
        assert_approx_eq!(fitness.strain_rate, 1.0);
        assert_approx_eq!(fitness.strain, 1.0);
        assert_approx_eq!(fitness.total, 1.0);
        assert_approx_eq!(context.objective(&[4, -4]), -1.0);
    }

    #[test]
    fn undefined_correlation_is_penalised() {
        let pulses = constant_set(1.0);
        let criteria = EquilibriumCriteria::default();
        let context = FitnessContext {
            pulses: &pulses,
            region: 0..=31,
            wave_speed: 1.0,
            specimen_length: 1.0,
            criteria: &criteria,
        };
        assert!(context.evaluate(0, 0).correlation.is_nan());
        assert_eq!(context.objective(&[0, 0]), PENALTY);
        assert_eq!(context.objective(&[4, -4]), PENALTY);
    }
}
