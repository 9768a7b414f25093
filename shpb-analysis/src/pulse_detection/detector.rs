use super::{
    peaks::find_peaks, rise_time::calculate_rise_time, segment::segment_and_center,
    template::WindowTemplate,
};
use crate::{
    error::{DetectionError, ValidationError, ValidationResult},
    numeric::{max_abs, median, std_dev},
    signal::PulseWindow,
};
use serde::{Deserialize, Serialize};
use shpb_common::{
    Polarity, Real,
    metrics::{detection_failures, names},
};
use tracing::{debug, trace};

/// Detection settings, fixed for the lifetime of a [`PulseDetector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DetectorConfig {
    /// Nominal pulse length in samples, also the template length.
    pub pulse_points: usize,
    /// Threshold multipliers of the noise level, strictest first.
    pub k_trials: Vec<Real>,
    pub polarity: Polarity,
    /// Minimum distance between accepted peaks, defaults to 80% of `pulse_points`.
    pub min_separation: Option<usize>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            pulse_points: 1000,
            k_trials: vec![8.0, 6.0, 4.0, 3.0, 2.0],
            polarity: Polarity::Compressive,
            min_separation: None,
        }
    }
}

/// How candidate windows are ranked.
#[derive(
    Default,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AmplitudeMetric {
    /// Median absolute value within the window.
    Median,
    /// Largest absolute value within the window.
    #[default]
    Peak,
}

impl AmplitudeMetric {
    fn measure(self, values: &[Real]) -> Real {
        match self {
            AmplitudeMetric::Median => {
                median(&values.iter().map(|v| v.abs()).collect::<Vec<_>>())
            }
            AmplitudeMetric::Peak => max_abs(values),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PulseDetector {
    config: DetectorConfig,
    min_separation: usize,
    template: WindowTemplate,
}

impl PulseDetector {
    pub fn new(config: DetectorConfig) -> ValidationResult<Self> {
        if config.k_trials.is_empty() {
            return Err(ValidationError::Empty("threshold trials"));
        }
        if let Some(&k) = config.k_trials.iter().find(|k| !(k.is_finite() && **k >= 0.0)) {
            return Err(ValidationError::OutOfRange {
                name: "threshold trial",
                requirement: "finite and non-negative",
                value: k,
            });
        }
        let template = WindowTemplate::half_sine(config.pulse_points, config.polarity)?;
        let min_separation = config
            .min_separation
            .unwrap_or((0.8 * config.pulse_points as Real) as usize)
            .max(1);
        Ok(Self {
            config,
            min_separation,
            template,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn template(&self) -> &WindowTemplate {
        &self.template
    }

    pub fn polarity(&self) -> Polarity {
        self.config.polarity
    }

    pub fn min_separation(&self) -> usize {
        self.min_separation
    }

    /// Locates the window of the strongest pulse matching the template.
    ///
    /// Every threshold trial contributes its candidate windows; candidates
    /// starting before `lower_bound` or ending after `upper_bound` are
    /// discarded and the one scoring highest under `metric` is returned.
    #[tracing::instrument(skip_all, level = "debug", fields(
        len = signal.len(),
        pulse_points = self.config.pulse_points,
        polarity = %self.config.polarity,
    ))]
    pub fn find_window(
        &self,
        signal: &[Real],
        lower_bound: Option<usize>,
        upper_bound: Option<usize>,
        metric: AmplitudeMetric,
    ) -> Result<PulseWindow, DetectionError> {
        if signal.is_empty() {
            return Err(ValidationError::Empty("signal").into());
        }
        if let (Some(lower), Some(upper)) = (lower_bound, upper_bound) {
            if lower > upper {
                return Err(ValidationError::InvertedBounds {
                    name: "detection",
                    lower: lower as i64,
                    upper: upper as i64,
                }
                .into());
            }
        }

        let response = self.template.matched_filter(signal);
        let noise_len = (response.len() / 10).max(1);
        let noise = std_dev(&response[..noise_len]);
        let half_width = self.config.pulse_points / 2;

        let mut candidates = Vec::<PulseWindow>::new();
        for &k in &self.config.k_trials {
            let threshold = k * noise;
            let peaks = find_peaks(&response, threshold, self.min_separation);
            trace!("Trial k = {k}: threshold {threshold}, {} peak(s)", peaks.len());
            candidates.extend(peaks.into_iter().filter_map(|peak| {
                let start = peak.saturating_sub(half_width);
                let end = (peak + half_width).min(signal.len());
                PulseWindow::new(start, end, signal.len()).ok()
            }));
        }

        let best = candidates
            .into_iter()
            .filter(|w| lower_bound.is_none_or(|lower| w.start() >= lower))
            .filter(|w| upper_bound.is_none_or(|upper| w.end() <= upper))
            .map(|w| (metric.measure(w.slice(signal)), w))
            .fold(None::<(Real, PulseWindow)>, |best, (score, w)| match best {
                Some((best_score, _)) if !(score > best_score) => best,
                _ => Some((score, w)),
            });

        match best {
            Some((score, window)) => {
                debug!(
                    "Window [{}, {}) selected with {metric} amplitude {score}",
                    window.start(),
                    window.end()
                );
                metrics::counter!(names::DETECTIONS).increment(1);
                Ok(window)
            }
            None => {
                metrics::counter!(
                    names::DETECTION_FAILURES,
                    &[detection_failures::get_label(
                        detection_failures::FailureKind::NoWindow
                    )]
                )
                .increment(1);
                Err(DetectionError::NoWindow {
                    trials: self.config.k_trials.len(),
                    lower: lower_bound,
                    upper: upper_bound,
                })
            }
        }
    }

    /// Extracts a centred, de-noised segment of `n_points` samples using this
    /// detector's polarity.
    pub fn segment_and_center(
        &self,
        signal: &[Real],
        window: &PulseWindow,
        n_points: usize,
        thresh_ratio: Real,
    ) -> ValidationResult<Vec<Real>> {
        segment_and_center(signal, window, n_points, self.config.polarity, thresh_ratio)
    }

    pub fn calculate_rise_time(
        &self,
        pulse: &[Real],
        time: &[Real],
        low_pct: Real,
        high_pct: Real,
    ) -> Result<Real, DetectionError> {
        calculate_rise_time(pulse, time, low_pct, high_pct)
    }
}
