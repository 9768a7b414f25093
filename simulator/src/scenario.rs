use crate::noise::{Noise, NoiseSource};
use rand::Rng;
use rand_distr::NormalError;
use serde::{Deserialize, Serialize};
use shpb_analysis::{
    BarSignals, PipelineConfig, Polarity, RawSignal, Real, ShiftBounds, ValidationError,
};
use std::f64::consts::PI;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    #[error("Invalid Noise Source: {0}")]
    Noise(#[from] NormalError),
    #[error("Invalid Signal: {0}")]
    Signal(#[from] ValidationError),
    #[error("Pulse at {centre} of width {width} does not fit in {len} samples")]
    PulseOutOfRange {
        centre: usize,
        width: usize,
        len: usize,
    },
}

/// Unit-height shape of each simulated pulse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "pulse-type")]
pub(crate) enum PulseShape {
    HalfSine,
    /// Linear ramps of `rise` samples either side of a flat top.
    Trapezoid { rise: usize },
}

impl PulseShape {
    /// Value at sample `i` of a pulse `width` samples long.
    fn value(&self, i: usize, width: usize) -> Real {
        match self {
            PulseShape::HalfSine => (PI * i as Real / (width - 1) as Real).sin(),
            PulseShape::Trapezoid { rise } => {
                let rise = (*rise).clamp(1, width / 2);
                let from_edge = i.min(width - 1 - i);
                (from_edge as Real / rise as Real).min(1.0)
            }
        }
    }
}

/// A synthetic test: one incident pulse on the incident bar with its
/// reflection, and the transmitted pulse on the transmitted bar, in exact
/// force equilibrium before noise is added.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub(crate) struct Scenario {
    pub(crate) sample_interval: Real,
    /// Samples in each bar signal.
    pub(crate) len: usize,
    /// Pulse length in samples.
    pub(crate) pulse_width: usize,
    pub(crate) shape: PulseShape,
    /// Peak incident gauge signal, in volts.
    pub(crate) amplitude: Real,
    /// Fraction of the incident amplitude reaching the transmitted bar.
    pub(crate) transmission: Real,
    pub(crate) incident_centre: usize,
    pub(crate) transmitted_centre: usize,
    pub(crate) reflected_centre: usize,
    pub(crate) noise: Option<NoiseSource>,
    pub(crate) analysis: PipelineConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        let mut analysis = PipelineConfig::default();
        analysis.incident.upper_bound = Some(3500);
        analysis.reflected.lower_bound = Some(3500);
        analysis.bar.bar_area = 4.0 * analysis.bar.specimen_area;
        analysis.bar.strain_scale = 2e-3;
        analysis.shift_bounds = Some(ShiftBounds {
            transmitted: (-100, 100),
            reflected: (-100, 100),
        });
        Self {
            sample_interval: 1e-7,
            len: 8000,
            pulse_width: 1000,
            shape: PulseShape::HalfSine,
            amplitude: 0.5,
            transmission: 0.4,
            incident_centre: 1500,
            transmitted_centre: 3500,
            reflected_centre: 5500,
            noise: Some(NoiseSource::gaussian(1e-4)),
            analysis,
        }
    }
}

/// Simulated traces, as written by the `traces` command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct SimulatedTraces {
    pub(crate) sample_interval: Real,
    pub(crate) incident_bar: Vec<Real>,
    pub(crate) transmitted_bar: Vec<Real>,
}

impl Scenario {
    /// The unit shape placed at `centre`, zero elsewhere.
    fn placed(&self, centre: usize) -> Result<Vec<Real>, ScenarioError> {
        let width = self.pulse_width;
        let out_of_range = ScenarioError::PulseOutOfRange {
            centre,
            width,
            len: self.len,
        };
        if width < 2 {
            return Err(out_of_range);
        }
        let Some(start) = centre.checked_sub(width / 2) else {
            return Err(out_of_range);
        };
        if start + width > self.len {
            return Err(out_of_range);
        }
        Ok((0..self.len)
            .map(|i| {
                if (start..start + width).contains(&i) {
                    self.shape.value(i - start, width)
                } else {
                    0.0
                }
            })
            .collect())
    }

    pub(crate) fn traces<R: Rng>(&self, rng: &mut R) -> Result<SimulatedTraces, ScenarioError> {
        let (a, rho) = (self.amplitude, self.transmission);
        let incident = self.placed(self.incident_centre)?;
        let reflected = self.placed(self.reflected_centre)?;
        let transmitted = self.placed(self.transmitted_centre)?;

        // transmitted = incident + reflected, pulse by pulse
        let mut incident_bar: Vec<Real> = incident
            .iter()
            .zip(&reflected)
            .map(|(i, r)| -a * i + a * r - rho * a * r.powf(1.5))
            .collect();
        let mut transmitted_bar: Vec<Real> = transmitted
            .iter()
            .map(|t| -rho * a * t.powf(1.5))
            .collect();

        if let Some(source) = &self.noise {
            for trace in [&mut incident_bar, &mut transmitted_bar] {
                let mut noise = Noise::new(source)?;
                trace
                    .iter_mut()
                    .for_each(|v| *v = noise.noisify(*v, rng));
            }
        }
        Ok(SimulatedTraces {
            sample_interval: self.sample_interval,
            incident_bar,
            transmitted_bar,
        })
    }

    pub(crate) fn bar_signals<R: Rng>(&self, rng: &mut R) -> Result<BarSignals, ScenarioError> {
        let traces = self.traces(rng)?;
        Ok(BarSignals::new(
            RawSignal::new(
                traces.incident_bar,
                traces.sample_interval,
                Polarity::Compressive,
            )?,
            RawSignal::new(
                traces.transmitted_bar,
                traces.sample_interval,
                Polarity::Compressive,
            )?,
        )?)
    }
}
