use crate::error::{DetectionError, PipelineError, ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use shpb_common::{
    PulseRole,
    metrics::{detection_failures, names},
};
use tracing::{debug, warn};

/// How often, and how far, a failed detection is repeated with widened
/// search bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: usize,
    /// Samples added to each side of the bounds per retry.
    pub margin_step: usize,
    /// Largest margin ever added.
    pub max_margin: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            margin_step: 500,
            max_margin: 2000,
        }
    }
}

/// Search bounds of one detection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SearchBounds {
    pub(crate) lower: Option<usize>,
    pub(crate) upper: Option<usize>,
}

impl SearchBounds {
    fn widened(&self, margin: usize) -> Self {
        Self {
            lower: self.lower.map(|lower| lower.saturating_sub(margin)),
            upper: self.upper.map(|upper| upper.saturating_add(margin)),
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> ValidationResult<()> {
        if self.max_attempts == 0 {
            return Err(ValidationError::OutOfRange {
                name: "max attempts",
                requirement: "at least 1",
                value: 0.0,
            });
        }
        Ok(())
    }

    fn margin(&self, attempt: usize) -> usize {
        attempt
            .saturating_mul(self.margin_step)
            .min(self.max_margin)
    }

    /// Calls `detect` with `bounds`, widening them after every
    /// [`DetectionError::NoWindow`] until an attempt succeeds, the attempts
    /// run out, or the bounds can no longer grow. Returns the result and the
    /// number of attempts made.
    pub(crate) fn run<T, F>(
        &self,
        role: PulseRole,
        bounds: SearchBounds,
        mut detect: F,
    ) -> Result<(T, usize), PipelineError>
    where
        F: FnMut(SearchBounds) -> Result<T, DetectionError>,
    {
        let mut previous = None;
        let mut attempts = 0;
        while attempts < self.max_attempts {
            let current = bounds.widened(self.margin(attempts));
            if previous == Some(current) {
                break;
            }
            if attempts > 0 {
                debug!("Retrying {role} detection with bounds {current:?}");
                metrics::counter!(names::DETECTION_RETRIES).increment(1);
            }
            attempts += 1;
            match detect(current) {
                Ok(value) => return Ok((value, attempts)),
                Err(DetectionError::NoWindow { .. }) => previous = Some(current),
                Err(source) => return Err(PipelineError::Detection { role, source }),
            }
        }
        warn!("No {role} pulse found after {attempts} attempt(s)");
        metrics::counter!(
            names::DETECTION_FAILURES,
            &[detection_failures::get_label(
                detection_failures::FailureKind::RetriesExhausted
            )]
        )
        .increment(1);
        Err(PipelineError::ExtractionExhausted { role, attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_window() -> DetectionError {
        DetectionError::NoWindow {
            trials: 1,
            lower: None,
            upper: None,
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            margin_step: 100,
            max_margin: 250,
        }
    }

    #[test]
    fn first_attempt_succeeds() {
        let bounds = SearchBounds {
            lower: Some(1000),
            upper: Some(2000),
        };
        let result = policy().run(PulseRole::Incident, bounds, |b| Ok::<_, DetectionError>(b));
        assert_eq!(result, Ok((bounds, 1)));
    }

    #[test]
    fn widens_until_found() {
        let bounds = SearchBounds {
            lower: Some(1000),
            upper: Some(2000),
        };
        let result = policy().run(PulseRole::Reflected, bounds, |b| {
            if b.lower.is_some_and(|lower| lower <= 850) {
                Ok(b)
            } else {
                Err(no_window())
            }
        });
        let expected = SearchBounds {
            lower: Some(800),
            upper: Some(2200),
        };
        assert_eq!(result, Ok((expected, 3)));
    }

    #[test]
    fn stops_at_margin_cap() {
        let bounds = SearchBounds {
            lower: Some(1000),
            upper: Some(2000),
        };
        let mut seen = Vec::new();
        let result: Result<((), usize), _> = policy().run(PulseRole::Transmitted, bounds, |b| {
            seen.push(b);
            Err(no_window())
        });
        // margins 0, 100, 200, 250; a fifth attempt would repeat the cap
        assert_eq!(
            result,
            Err(PipelineError::ExtractionExhausted {
                role: PulseRole::Transmitted,
                attempts: 4
            })
        );
        assert_eq!(seen.last().and_then(|b| b.lower), Some(750));
    }

    #[test]
    fn unbounded_search_is_not_repeated() {
        let bounds = SearchBounds {
            lower: None,
            upper: None,
        };
        let result: Result<((), usize), _> =
            policy().run(PulseRole::Incident, bounds, |_| Err(no_window()));
        assert_eq!(
            result,
            Err(PipelineError::ExtractionExhausted {
                role: PulseRole::Incident,
                attempts: 1
            })
        );
    }

    #[test]
    fn other_errors_are_not_retried() {
        let bounds = SearchBounds {
            lower: None,
            upper: None,
        };
        let mut calls = 0;
        let result: Result<((), usize), _> = policy().run(PulseRole::Incident, bounds, |_| {
            calls += 1;
            Err(DetectionError::Validation(ValidationError::Empty("signal")))
        });
        assert_eq!(calls, 1);
        assert!(matches!(result, Err(PipelineError::Detection { .. })));
    }
}
