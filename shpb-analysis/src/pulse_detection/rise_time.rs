use crate::error::{DetectionError, ValidationError};
use shpb_common::{
    Real,
    metrics::{detection_failures, names},
};

/// Time taken by a pulse to rise from `low_pct` to `high_pct` of its peak.
///
/// The peak is whichever extremum has the larger magnitude, so compressive
/// and tensile pulses are both handled. Percentages are fractions of the
/// peak, `0 < low_pct < high_pct <= 1`.
pub fn calculate_rise_time(
    pulse: &[Real],
    time: &[Real],
    low_pct: Real,
    high_pct: Real,
) -> Result<Real, DetectionError> {
    if pulse.len() != time.len() {
        return Err(ValidationError::LengthMismatch {
            name: "time base",
            expected: pulse.len(),
            actual: time.len(),
        }
        .into());
    }
    if !(low_pct > 0.0 && low_pct < high_pct && high_pct <= 1.0) {
        return Err(ValidationError::OutOfRange {
            name: "rise time fractions",
            requirement: "0 < low < high <= 1",
            value: low_pct,
        }
        .into());
    }

    let (min, max) = pulse
        .iter()
        .fold((0.0, 0.0), |(min, max): (Real, Real), &v| (min.min(v), max.max(v)));
    let peak = if min.abs() > max.abs() { min } else { max };
    let sign = peak.signum();
    let magnitude = peak.abs();

    let first_crossing = |fraction: Real| {
        pulse
            .iter()
            .position(|&v| magnitude > 0.0 && v * sign >= fraction * magnitude)
            .ok_or(DetectionError::ThresholdNotCrossed { fraction })
    };
    match (first_crossing(low_pct), first_crossing(high_pct)) {
        (Ok(low), Ok(high)) => Ok(time[high] - time[low]),
        (Err(e), _) | (_, Err(e)) => {
            metrics::counter!(
                names::DETECTION_FAILURES,
                &[detection_failures::get_label(
                    detection_failures::FailureKind::ThresholdNotCrossed
                )]
            )
            .increment(1);
            Err(e)
        }
    }
}
