use crate::numeric::{argmax, max_abs, rmse, trapezoid};
use serde::Serialize;
use shpb_common::Real;
use std::{collections::BTreeMap, ops::RangeInclusive};

/// Fraction of the mean force peak above which a sample counts towards SEQI.
const SEQI_SIGNIFICANCE: Real = 0.1;
/// Relative force difference within which a sample is in equilibrium.
const SEQI_TOLERANCE: Real = 0.1;
/// Fraction of the peak 1-wave stress delimiting the loaded part of the record.
const SIGNIFICANT_FRACTION: Real = 0.05;
/// Fraction of the peak 1-wave stress delimiting the plateau.
const PLATEAU_FRACTION: Real = 0.9;

/// Sub-ranges of the loaded record.
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
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Phase {
    Loading,
    Plateau,
    Unloading,
}

/// The four equilibrium indicators over one range of samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSet {
    /// Force balance coefficient, 1 for identical front and back forces.
    pub fbc: Real,
    /// Stress equilibrium quality index, the fraction of significant samples in equilibrium.
    pub seqi: Real,
    /// Strain-rate offset index, 0 when the 1-wave and 3-wave rates agree.
    pub soi: Real,
    /// Dynamic stress uniformity factor, the ratio of the two force impulses.
    pub dsuf: Real,
}

impl MetricSet {
    fn named(&self) -> [(&'static str, Real); 4] {
        [
            ("FBC", self.fbc),
            ("SEQI", self.seqi),
            ("SOI", self.soi),
            ("DSUF", self.dsuf),
        ]
    }

    pub fn assess(&self) -> QualityAssessment {
        let fbc = Quality::at_least(self.fbc, 0.95, 0.85);
        let seqi = Quality::at_least(self.seqi, 0.90, 0.75);
        let soi = Quality::at_most(self.soi, 0.05, 0.15);
        let dsuf = Quality::at_least(self.dsuf, 0.98, 0.90);
        QualityAssessment {
            fbc,
            seqi,
            soi,
            dsuf,
            overall: fbc.max(seqi).max(soi).max(dsuf),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, strum::Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Quality {
    Good,
    Acceptable,
    Poor,
}

impl Quality {
    fn at_least(value: Real, good: Real, acceptable: Real) -> Self {
        if value > good {
            Quality::Good
        } else if value > acceptable {
            Quality::Acceptable
        } else {
            Quality::Poor
        }
    }

    fn at_most(value: Real, good: Real, acceptable: Real) -> Self {
        if value < good {
            Quality::Good
        } else if value < acceptable {
            Quality::Acceptable
        } else {
            Quality::Poor
        }
    }
}

/// Per-indicator quality, with the worst of the four as `overall`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityAssessment {
    pub fbc: Quality,
    pub seqi: Quality,
    pub soi: Quality,
    pub dsuf: Quality,
    pub overall: Quality,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquilibriumMetrics {
    pub overall: MetricSet,
    pub loading: Option<MetricSet>,
    pub plateau: Option<MetricSet>,
    pub unloading: Option<MetricSet>,
}

impl EquilibriumMetrics {
    pub fn phase(&self, phase: Phase) -> Option<&MetricSet> {
        match phase {
            Phase::Loading => self.loading.as_ref(),
            Phase::Plateau => self.plateau.as_ref(),
            Phase::Unloading => self.unloading.as_ref(),
        }
    }

    /// The metrics keyed `"FBC"`, `"SEQI"`, ... for the whole record and
    /// `"FBC_loading"`, `"SOI_plateau"`, ... for each available phase.
    pub fn named(&self) -> BTreeMap<String, Real> {
        let mut named: BTreeMap<String, Real> = self
            .overall
            .named()
            .into_iter()
            .map(|(name, value)| (name.to_owned(), value))
            .collect();
        for (phase, set) in [
            (Phase::Loading, &self.loading),
            (Phase::Plateau, &self.plateau),
            (Phase::Unloading, &self.unloading),
        ] {
            if let Some(set) = set {
                named.extend(
                    set.named()
                        .into_iter()
                        .map(|(name, value)| (format!("{name}_{phase}"), value)),
                );
            }
        }
        named
    }

    pub fn assess(&self) -> QualityAssessment {
        self.overall.assess()
    }
}

/// Signals the metrics are computed from, all of one length.
pub(crate) struct EquilibriumInputs<'a> {
    pub(crate) front_force: &'a [Real],
    pub(crate) back_force: &'a [Real],
    pub(crate) one_wave_rate: &'a [Real],
    pub(crate) three_wave_rate: &'a [Real],
    pub(crate) one_wave_stress: &'a [Real],
    pub(crate) time: &'a [Real],
}

impl EquilibriumInputs<'_> {
    pub(crate) fn metrics(&self) -> EquilibriumMetrics {
        let whole = 0..=self.time.len().saturating_sub(1);
        let phases = phase_windows(self.one_wave_stress);
        let in_phase = |range: Option<RangeInclusive<usize>>| {
            range
                .filter(|range| range.end() > range.start())
                .map(|range| self.metric_set(range))
        };
        EquilibriumMetrics {
            overall: self.metric_set(whole),
            loading: in_phase(phases.as_ref().map(|p| p.loading.clone())),
            plateau: in_phase(phases.as_ref().map(|p| p.plateau.clone())),
            unloading: in_phase(phases.as_ref().map(|p| p.unloading.clone())),
        }
    }

    fn metric_set(&self, range: RangeInclusive<usize>) -> MetricSet {
        let front = &self.front_force[range.clone()];
        let back = &self.back_force[range.clone()];
        let time = &self.time[range.clone()];
        MetricSet {
            fbc: force_balance(front, back),
            seqi: stress_equilibrium(front, back),
            soi: strain_rate_offset(
                &self.one_wave_rate[range.clone()],
                &self.three_wave_rate[range],
            ),
            dsuf: stress_uniformity(front, back, time),
        }
    }
}

fn ratio(numerator: Real, denominator: Real) -> Real {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        Real::NAN
    }
}

fn force_balance(front: &[Real], back: &[Real]) -> Real {
    let (difference, scale) = front
        .iter()
        .zip(back)
        .fold((0.0, 0.0), |(difference, scale), (f, b)| {
            (difference + (f - b).abs(), scale + f.abs().max(b.abs()))
        });
    (1.0 - ratio(difference, scale)).clamp(0.0, 1.0)
}

fn stress_equilibrium(front: &[Real], back: &[Real]) -> Real {
    let mean_force: Vec<Real> = front
        .iter()
        .zip(back)
        .map(|(f, b)| 0.5 * (f.abs() + b.abs()))
        .collect();
    let threshold = SEQI_SIGNIFICANCE * max_abs(&mean_force);
    let (significant, balanced) = front
        .iter()
        .zip(back)
        .zip(&mean_force)
        .filter(|(_, mean)| threshold > 0.0 && **mean >= threshold)
        .fold((0_usize, 0_usize), |(significant, balanced), ((f, b), mean)| {
            let within = (f - b).abs() / mean <= SEQI_TOLERANCE;
            (significant + 1, balanced + usize::from(within))
        });
    ratio(balanced as Real, significant as Real)
}

fn strain_rate_offset(one_wave: &[Real], three_wave: &[Real]) -> Real {
    ratio(rmse(one_wave, three_wave), max_abs(one_wave))
}

fn stress_uniformity(front: &[Real], back: &[Real], time: &[Real]) -> Real {
    let impulse = |force: &[Real]| {
        trapezoid(&force.iter().map(|f| f.abs()).collect::<Vec<_>>(), time)
    };
    let (front, back) = (impulse(front), impulse(back));
    ratio(front.min(back), front.max(back))
}

#[derive(Debug, Clone, PartialEq)]
struct PhaseWindows {
    loading: RangeInclusive<usize>,
    plateau: RangeInclusive<usize>,
    unloading: RangeInclusive<usize>,
}

/// Splits the loaded part of a stress history at the plateau around its peak.
fn phase_windows(stress: &[Real]) -> Option<PhaseWindows> {
    let magnitude: Vec<Real> = stress.iter().map(|s| s.abs()).collect();
    let (peak_index, peak) = argmax(&magnitude)?;
    if !(peak > 0.0) {
        return None;
    }
    let significant = SIGNIFICANT_FRACTION * peak;
    let first = magnitude.iter().position(|&s| s >= significant)?;
    let last = magnitude.iter().rposition(|&s| s >= significant)?;

    let plateau = PLATEAU_FRACTION * peak;
    let mut plateau_start = peak_index;
    while plateau_start > first && magnitude[plateau_start - 1] >= plateau {
        plateau_start -= 1;
    }
    let mut plateau_end = peak_index;
    while plateau_end < last && magnitude[plateau_end + 1] >= plateau {
        plateau_end += 1;
    }
    Some(PhaseWindows {
        loading: first..=plateau_start,
        plateau: plateau_start..=plateau_end,
        unloading: plateau_end..=last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn balanced_forces() {
        let force = [0.0, 1.0, 3.0, 4.0, 3.0, 1.0, 0.0];
        assert_approx_eq!(force_balance(&force, &force), 1.0);
        assert_approx_eq!(stress_equilibrium(&force, &force), 1.0);
        let time = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        assert_approx_eq!(stress_uniformity(&force, &force, &time), 1.0);
    }

    #[test]
    fn unbalanced_forces() {
        let front = [2.0, 2.0, 2.0, 2.0];
        let back = [1.0, 1.0, 1.0, 1.0];
        assert_approx_eq!(force_balance(&front, &back), 0.5);
        // 2 |2 - 1| / 3 exceeds the tolerance everywhere
        assert_approx_eq!(stress_equilibrium(&front, &back), 0.0);
        let time = [0.0, 1.0, 2.0, 3.0];
        assert_approx_eq!(stress_uniformity(&front, &back, &time), 0.5);
    }

    #[test]
    fn zero_forces_are_undefined() {
        let zeros = [0.0; 4];
        assert!(stress_equilibrium(&zeros, &zeros).is_nan());
        assert!(strain_rate_offset(&zeros, &zeros).is_nan());
        assert!(stress_uniformity(&zeros, &zeros, &[0.0, 1.0, 2.0, 3.0]).is_nan());
        assert!(force_balance(&zeros, &zeros).is_nan());
    }

    #[test]
    fn strain_rate_offset_scale() {
        let one = [0.0, 2.0, 4.0, 2.0];
        let three = [1.0, 3.0, 5.0, 3.0];
        assert_approx_eq!(strain_rate_offset(&one, &three), 0.25);
    }

    #[test]
    fn phases_of_trapezoidal_history() {
        let stress = [0.0, 0.0, 1.0, 5.0, 9.5, 10.0, 9.8, 6.0, 2.0, 0.2, 0.0];
        let phases = phase_windows(&stress).expect("history has a peak");
        assert_eq!(phases.loading, 2..=4);
        assert_eq!(phases.plateau, 4..=6);
        assert_eq!(phases.unloading, 6..=8);
        assert!(phase_windows(&[0.0; 5]).is_none());
    }

    #[test]
    fn quality_thresholds() {
        let good = MetricSet {
            fbc: 0.99,
            seqi: 0.95,
            soi: 0.01,
            dsuf: 0.99,
        };
        assert_eq!(good.assess().overall, Quality::Good);
        let acceptable = MetricSet { soi: 0.1, ..good };
        assert_eq!(acceptable.assess().soi, Quality::Acceptable);
        assert_eq!(acceptable.assess().overall, Quality::Acceptable);
        let poor = MetricSet {
            fbc: Real::NAN,
            ..good
        };
        assert_eq!(poor.assess().fbc, Quality::Poor);
        assert_eq!(poor.assess().overall, Quality::Poor);
    }

    #[test]
    fn named_metrics() {
        let set = MetricSet {
            fbc: 1.0,
            seqi: 1.0,
            soi: 0.0,
            dsuf: 1.0,
        };
        let metrics = EquilibriumMetrics {
            overall: set,
            loading: Some(set),
            plateau: None,
            unloading: Some(set),
        };
        let named = metrics.named();
        assert_eq!(named.len(), 12);
        assert_eq!(named["FBC"], 1.0);
        assert_eq!(named["SOI_loading"], 0.0);
        assert!(named.contains_key("DSUF_unloading"));
        assert!(!named.contains_key("FBC_plateau"));
    }
}
