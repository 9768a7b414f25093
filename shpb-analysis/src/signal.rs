use crate::{
    error::{ValidationError, ValidationResult},
    numeric::time_base,
};
use serde::{Deserialize, Serialize};
use shpb_common::{Polarity, PulseRole, Real, SampleInterval};

/// A single gauge channel as supplied by the host application.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSignal {
    samples: Vec<Real>,
    sample_interval: SampleInterval,
    polarity: Polarity,
}

impl RawSignal {
    pub fn new(
        samples: Vec<Real>,
        sample_interval: SampleInterval,
        polarity: Polarity,
    ) -> ValidationResult<Self> {
        if samples.is_empty() {
            return Err(ValidationError::Empty("raw signal"));
        }
        if !(sample_interval.is_finite() && sample_interval > 0.0) {
            return Err(ValidationError::OutOfRange {
                name: "sample interval",
                requirement: "finite and positive",
                value: sample_interval,
            });
        }
        Ok(Self {
            samples,
            sample_interval,
            polarity,
        })
    }

    pub fn samples(&self) -> &[Real] {
        &self.samples
    }

    pub fn sample_interval(&self) -> SampleInterval {
        self.sample_interval
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn time_base(&self) -> Vec<Real> {
        time_base(self.samples.len(), self.sample_interval)
    }
}

/// Half-open range `[start, end)` of sample indices containing one pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds")]
pub struct PulseWindow {
    start: usize,
    end: usize,
}

#[derive(Deserialize)]
struct WindowBounds {
    start: usize,
    end: usize,
}

impl TryFrom<WindowBounds> for PulseWindow {
    type Error = ValidationError;

    fn try_from(WindowBounds { start, end }: WindowBounds) -> ValidationResult<Self> {
        Self::new(start, end, end)
    }
}

impl PulseWindow {
    /// Creates a window into a signal of `len` samples.
    pub fn new(start: usize, end: usize, len: usize) -> ValidationResult<Self> {
        if end <= start || end > len {
            Err(ValidationError::InvalidWindow { start, end, len })
        } else {
            Ok(Self { start, end })
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    pub fn midpoint(&self) -> usize {
        (self.start + self.end) / 2
    }

    pub(crate) fn slice<'a>(&self, signal: &'a [Real]) -> &'a [Real] {
        &signal[self.start..self.end.min(signal.len())]
    }
}

/// The three equal-length pulse segments of one test on a shared time base.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PulseSet {
    incident: Vec<Real>,
    transmitted: Vec<Real>,
    reflected: Vec<Real>,
    time: Vec<Real>,
}

impl PulseSet {
    /// Builds the set with the time base `i * sample_interval`.
    pub fn new(
        incident: Vec<Real>,
        transmitted: Vec<Real>,
        reflected: Vec<Real>,
        sample_interval: SampleInterval,
    ) -> ValidationResult<Self> {
        if !(sample_interval.is_finite() && sample_interval > 0.0) {
            return Err(ValidationError::OutOfRange {
                name: "sample interval",
                requirement: "finite and positive",
                value: sample_interval,
            });
        }
        let time = time_base(incident.len(), sample_interval);
        Self::with_time(incident, transmitted, reflected, time)
    }

    pub fn with_time(
        incident: Vec<Real>,
        transmitted: Vec<Real>,
        reflected: Vec<Real>,
        time: Vec<Real>,
    ) -> ValidationResult<Self> {
        if incident.is_empty() {
            return Err(ValidationError::Empty("incident pulse"));
        }
        let expected = incident.len();
        for (name, len) in [
            ("transmitted pulse", transmitted.len()),
            ("reflected pulse", reflected.len()),
            ("time base", time.len()),
        ] {
            if len != expected {
                return Err(ValidationError::LengthMismatch {
                    name,
                    expected,
                    actual: len,
                });
            }
        }
        Ok(Self {
            incident,
            transmitted,
            reflected,
            time,
        })
    }

    pub fn get(&self, role: PulseRole) -> &[Real] {
        match role {
            PulseRole::Incident => &self.incident,
            PulseRole::Transmitted => &self.transmitted,
            PulseRole::Reflected => &self.reflected,
        }
    }

    pub fn incident(&self) -> &[Real] {
        &self.incident
    }

    pub fn transmitted(&self) -> &[Real] {
        &self.transmitted
    }

    pub fn reflected(&self) -> &[Real] {
        &self.reflected
    }

    pub fn time(&self) -> &[Real] {
        &self.time
    }

    pub fn len(&self) -> usize {
        self.incident.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incident.is_empty()
    }

    /// Applies `f` to each of the three pulses, keeping the time base.
    pub(crate) fn map_pulses<F>(&self, f: F) -> Self
    where
        F: Fn(&[Real]) -> Vec<Real>,
    {
        Self {
            incident: f(&self.incident),
            transmitted: f(&self.transmitted),
            reflected: f(&self.reflected),
            time: self.time.clone(),
        }
    }
}
