//! End-to-end analysis of one test: detection, segmentation, alignment,
//! optional tapering and stress-strain reduction.
//!
//! The incident and reflected pulses are taken from the incident bar signal
//! and the transmitted pulse from the transmitted bar signal. The three
//! detections are independent and run on the rayon thread pool.

mod report;
mod retry;

pub use report::{AnalysisReport, Extraction};
pub use retry::RetryPolicy;

use crate::{
    alignment::{AlignerConfig, Cancellation, PulseAligner, ShiftBounds},
    error::{PipelineError, ValidationError, ValidationResult},
    pulse_detection::{AmplitudeMetric, DetectorConfig, PulseDetector},
    signal::{PulseSet, PulseWindow, RawSignal},
    stress_strain::{BarSetup, StressStrainCalculator},
    taper::TaperWindow,
};
use rayon::prelude::*;
use retry::SearchBounds;
use serde::{Deserialize, Serialize};
use shpb_common::{Polarity, PulseRole, Real, SampleInterval};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Relative difference tolerated between the sample intervals of the two bars.
const SAMPLE_INTERVAL_TOLERANCE: Real = 1e-9;

/// Detection settings for one pulse role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RoleConfig {
    pub detector: DetectorConfig,
    /// Earliest sample a window may start at.
    pub lower_bound: Option<usize>,
    /// Latest sample a window may end at.
    pub upper_bound: Option<usize>,
    pub metric: AmplitudeMetric,
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self::with_polarity(Polarity::Compressive)
    }
}

impl RoleConfig {
    pub fn with_polarity(polarity: Polarity) -> Self {
        Self {
            detector: DetectorConfig {
                polarity,
                ..Default::default()
            },
            lower_bound: None,
            upper_bound: None,
            metric: AmplitudeMetric::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SegmentationConfig {
    /// Length of every segment in the pulse set.
    pub n_points: usize,
    /// Samples of the wrong sign below this fraction of the peak are zeroed.
    pub thresh_ratio: Real,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            n_points: 2048,
            thresh_ratio: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PipelineConfig {
    pub incident: RoleConfig,
    pub transmitted: RoleConfig,
    pub reflected: RoleConfig,
    pub segmentation: SegmentationConfig,
    pub retry: RetryPolicy,
    pub aligner: AlignerConfig,
    /// Shift search ranges, `±n_points/2` when unset.
    pub shift_bounds: Option<ShiftBounds>,
    pub bar: BarSetup,
    /// Tukey taper applied to the aligned pulses, none when unset.
    pub taper_alpha: Option<Real>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            incident: RoleConfig::with_polarity(PulseRole::Incident.loading_polarity()),
            transmitted: RoleConfig::with_polarity(PulseRole::Transmitted.loading_polarity()),
            reflected: RoleConfig::with_polarity(PulseRole::Reflected.loading_polarity()),
            segmentation: SegmentationConfig::default(),
            retry: RetryPolicy::default(),
            aligner: AlignerConfig::default(),
            shift_bounds: None,
            bar: BarSetup::default(),
            taper_alpha: None,
        }
    }
}

impl PipelineConfig {
    pub fn role(&self, role: PulseRole) -> &RoleConfig {
        match role {
            PulseRole::Incident => &self.incident,
            PulseRole::Transmitted => &self.transmitted,
            PulseRole::Reflected => &self.reflected,
        }
    }
}

/// The raw gauge signals of one test.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSignals {
    incident_bar: RawSignal,
    transmitted_bar: RawSignal,
}

impl BarSignals {
    pub fn new(incident_bar: RawSignal, transmitted_bar: RawSignal) -> ValidationResult<Self> {
        let (first, second) = (
            incident_bar.sample_interval(),
            transmitted_bar.sample_interval(),
        );
        if (first - second).abs() > SAMPLE_INTERVAL_TOLERANCE * first.max(second) {
            return Err(ValidationError::SampleIntervalMismatch { first, second });
        }
        Ok(Self {
            incident_bar,
            transmitted_bar,
        })
    }

    /// The signal the pulse of `role` is recorded in.
    pub fn signal(&self, role: PulseRole) -> &RawSignal {
        match role {
            PulseRole::Incident | PulseRole::Reflected => &self.incident_bar,
            PulseRole::Transmitted => &self.transmitted_bar,
        }
    }

    pub fn sample_interval(&self) -> SampleInterval {
        self.incident_bar.sample_interval()
    }
}

struct RoleStage {
    detector: PulseDetector,
    bounds: SearchBounds,
    metric: AmplitudeMetric,
}

/// One detection stage per pulse role.
struct RoleStages {
    incident: RoleStage,
    transmitted: RoleStage,
    reflected: RoleStage,
}

impl RoleStages {
    fn new(config: &PipelineConfig) -> ValidationResult<Self> {
        Ok(Self {
            incident: RoleStage::new(config.role(PulseRole::Incident))?,
            transmitted: RoleStage::new(config.role(PulseRole::Transmitted))?,
            reflected: RoleStage::new(config.role(PulseRole::Reflected))?,
        })
    }

    fn stage(&self, role: PulseRole) -> &RoleStage {
        match role {
            PulseRole::Incident => &self.incident,
            PulseRole::Transmitted => &self.transmitted,
            PulseRole::Reflected => &self.reflected,
        }
    }
}

impl RoleStage {
    fn new(role_config: &RoleConfig) -> ValidationResult<Self> {
        if let (Some(lower), Some(upper)) = (role_config.lower_bound, role_config.upper_bound) {
            if lower > upper {
                return Err(ValidationError::InvertedBounds {
                    name: "detection",
                    lower: lower as i64,
                    upper: upper as i64,
                });
            }
        }
        Ok(Self {
            detector: PulseDetector::new(role_config.detector.clone())?,
            bounds: SearchBounds {
                lower: role_config.lower_bound,
                upper: role_config.upper_bound,
            },
            metric: role_config.metric,
        })
    }
}

struct Segment {
    extraction: Extraction,
    samples: Vec<Real>,
}

pub struct Pipeline {
    config: PipelineConfig,
    stages: RoleStages,
    aligner: PulseAligner,
    calculator: StressStrainCalculator,
    taper: Option<TaperWindow>,
}

impl Pipeline {
    /// Validates `config` and builds every stage.
    pub fn new(config: PipelineConfig) -> ValidationResult<Self> {
        let stages = RoleStages::new(&config)?;

        let segmentation = &config.segmentation;
        if segmentation.n_points == 0 {
            return Err(ValidationError::OutOfRange {
                name: "segment length",
                requirement: "positive",
                value: 0.0,
            });
        }
        if !(0.0..=1.0).contains(&segmentation.thresh_ratio) {
            return Err(ValidationError::OutOfRange {
                name: "threshold ratio",
                requirement: "within [0, 1]",
                value: segmentation.thresh_ratio,
            });
        }
        config.retry.validate()?;

        Ok(Self {
            stages,
            aligner: PulseAligner::new(config.aligner.clone())?,
            calculator: StressStrainCalculator::new(config.bar.clone())?,
            taper: config.taper_alpha.map(TaperWindow::new).transpose()?,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Finds and segments the pulse of `role`, widening the search bounds
    /// according to the retry policy.
    #[tracing::instrument(skip_all, fields(%role))]
    fn extract(&self, role: PulseRole, signals: &BarSignals) -> Result<Segment, PipelineError> {
        let stage = self.stages.stage(role);
        let signal = signals.signal(role).samples();
        let (window, attempts) = self.config.retry.run(role, stage.bounds, |bounds| {
            stage
                .detector
                .find_window(signal, bounds.lower, bounds.upper, stage.metric)
        })?;
        let samples = stage
            .detector
            .segment_and_center(
                signal,
                &window,
                self.config.segmentation.n_points,
                self.config.segmentation.thresh_ratio,
            )
            .map_err(|source| PipelineError::Detection {
                role,
                source: source.into(),
            })?;
        Ok(Segment {
            extraction: Extraction { window, attempts },
            samples,
        })
    }

    /// Runs every stage on `signals`. The alignment search checks
    /// `cancellation` once per generation.
    #[tracing::instrument(skip_all, fields(
        incident_len = signals.incident_bar.len(),
        transmitted_len = signals.transmitted_bar.len(),
    ))]
    pub fn run(
        &self,
        signals: &BarSignals,
        cancellation: &Cancellation,
    ) -> Result<AnalysisReport, PipelineError> {
        let (incident, (transmitted, reflected)) = rayon::join(
            || self.extract(PulseRole::Incident, signals),
            || {
                rayon::join(
                    || self.extract(PulseRole::Transmitted, signals),
                    || self.extract(PulseRole::Reflected, signals),
                )
            },
        );
        let (incident, transmitted, reflected) = (incident?, transmitted?, reflected?);

        let extractions = BTreeMap::from([
            (PulseRole::Incident, incident.extraction),
            (PulseRole::Transmitted, transmitted.extraction),
            (PulseRole::Reflected, reflected.extraction),
        ]);
        let pulses = PulseSet::new(
            incident.samples,
            transmitted.samples,
            reflected.samples,
            signals.sample_interval(),
        )?;

        let alignment = self.aligner.align_set_with_cancellation(
            &pulses,
            self.config.shift_bounds,
            cancellation,
        )?;
        let aligned = match &self.taper {
            Some(taper) => taper.apply_to_set(&alignment.pulses),
            None => alignment.pulses.clone(),
        };

        let incident_rise_time = match self.stages.incident.detector.calculate_rise_time(
            aligned.incident(),
            aligned.time(),
            0.1,
            0.9,
        ) {
            Ok(rise_time) => Some(rise_time),
            Err(e) => {
                warn!("Incident rise time unavailable: {e}");
                None
            }
        };

        let curves = self.calculator.calculate_all_methods(&aligned);
        let equilibrium = self.calculator.calculate_equilibrium_metrics(&aligned);
        let report = AnalysisReport::new(
            extractions,
            alignment,
            aligned,
            incident_rise_time,
            &curves,
            &equilibrium,
        );
        info!(
            "Analysis complete: shifts ({}, {}), equilibrium quality {}",
            report.shift_transmitted, report.shift_reflected, report.quality.overall
        );
        Ok(report)
    }

    /// The window each role would be extracted from, without running the
    /// later stages.
    pub fn detect(
        &self,
        signals: &BarSignals,
    ) -> Result<BTreeMap<PulseRole, PulseWindow>, PipelineError> {
        [
            PulseRole::Incident,
            PulseRole::Transmitted,
            PulseRole::Reflected,
        ]
        .par_iter()
        .map(|&role| {
            self.extract(role, signals)
                .map(|segment| (role, segment.extraction.window))
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_interval_mismatch() {
        let a = RawSignal::new(vec![0.0; 4], 1e-7, Polarity::Compressive)
            .expect("signal should be valid");
        let b = RawSignal::new(vec![0.0; 4], 2e-7, Polarity::Compressive)
            .expect("signal should be valid");
        assert!(matches!(
            BarSignals::new(a.clone(), b),
            Err(ValidationError::SampleIntervalMismatch { .. })
        ));
        let signals = BarSignals::new(a.clone(), a).expect("intervals match");
        assert_eq!(signals.sample_interval(), 1e-7);
    }

    #[test]
    fn invalid_config() {
        let config = PipelineConfig {
            taper_alpha: Some(2.0),
            ..Default::default()
        };
        assert!(Pipeline::new(config).is_err());

        let mut config = PipelineConfig::default();
        config.reflected.lower_bound = Some(5000);
        config.reflected.upper_bound = Some(4000);
        assert!(matches!(
            Pipeline::new(config),
            Err(ValidationError::InvertedBounds { .. })
        ));

        let config = PipelineConfig {
            retry: RetryPolicy {
                max_attempts: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(Pipeline::new(config).is_err());
    }

    #[test]
    fn partial_json_config() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"taper-alpha": 0.2, "reflected": {"lower-bound": 100}}"#)
                .expect("partial config should parse");
        assert_eq!(config.taper_alpha, Some(0.2));
        assert_eq!(config.reflected.lower_bound, Some(100));
        assert_eq!(config.reflected.upper_bound, None);
        assert_eq!(config.aligner, AlignerConfig::default());
        assert_eq!(config.incident, PipelineConfig::default().incident);
        assert!(Pipeline::new(config).is_ok());
    }

    #[test]
    fn stages_follow_role_config() {
        let mut config = PipelineConfig::default();
        config.incident.upper_bound = Some(3000);
        config.transmitted.lower_bound = Some(10);
        config.transmitted.upper_bound = Some(20);
        config.reflected.lower_bound = Some(4000);
        let pipeline = Pipeline::new(config).expect("config should be valid");
        let bounds = |role| pipeline.stages.stage(role).bounds;
        assert_eq!(
            bounds(PulseRole::Incident),
            SearchBounds {
                lower: None,
                upper: Some(3000)
            }
        );
        assert_eq!(
            bounds(PulseRole::Transmitted),
            SearchBounds {
                lower: Some(10),
                upper: Some(20)
            }
        );
        assert_eq!(
            bounds(PulseRole::Reflected),
            SearchBounds {
                lower: Some(4000),
                upper: None
            }
        );
    }
}
