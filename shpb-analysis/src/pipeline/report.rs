use crate::{
    alignment::{AlignmentResult, FitnessBreakdown},
    signal::{PulseSet, PulseWindow},
    stress_strain::{AnalysisMethod, EquilibriumMetrics, QualityAssessment, StressStrainCurve},
};
use serde::Serialize;
use shpb_common::{PulseRole, Real};
use std::collections::BTreeMap;

/// Where one pulse was found and how many detection attempts it took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Extraction {
    pub window: PulseWindow,
    pub attempts: usize,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AnalysisReport {
    pub extractions: BTreeMap<PulseRole, Extraction>,
    pub shift_transmitted: i64,
    pub shift_reflected: i64,
    pub fitness: FitnessBreakdown,
    pub generations: usize,
    pub converged: bool,
    /// 10% to 90% rise time of the incident pulse, when it could be measured.
    pub incident_rise_time: Option<Real>,
    /// The aligned, and optionally tapered, pulses the curves were computed from.
    pub pulses: PulseSet,
    /// All curve series keyed `"<method>/<series>"`.
    pub series: BTreeMap<String, Vec<Real>>,
    /// Equilibrium metrics keyed `"FBC"`, `"FBC_loading"`, ...
    pub metrics: BTreeMap<String, Real>,
    pub quality: QualityAssessment,
}

impl AnalysisReport {
    pub(crate) fn new(
        extractions: BTreeMap<PulseRole, Extraction>,
        alignment: AlignmentResult,
        pulses: PulseSet,
        incident_rise_time: Option<Real>,
        curves: &BTreeMap<AnalysisMethod, StressStrainCurve>,
        equilibrium: &EquilibriumMetrics,
    ) -> Self {
        Self {
            extractions,
            shift_transmitted: alignment.shift_transmitted,
            shift_reflected: alignment.shift_reflected,
            fitness: alignment.fitness,
            generations: alignment.generations,
            converged: alignment.converged,
            incident_rise_time,
            pulses,
            series: curves
                .values()
                .flat_map(StressStrainCurve::named_series)
                .collect(),
            metrics: equilibrium.named(),
            quality: equilibrium.assess(),
        }
    }

    pub fn window(&self, role: PulseRole) -> Option<PulseWindow> {
        self.extractions.get(&role).map(|extraction| extraction.window)
    }

    pub fn series_for(&self, method: AnalysisMethod, name: &str) -> Option<&[Real]> {
        self.series
            .get(&format!("{method}/{name}"))
            .map(Vec::as_slice)
    }
}
