use crate::{
    error::{ValidationError, ValidationResult},
    numeric::{max_abs, roll},
    signal::PulseWindow,
};
use shpb_common::{Polarity, Real};
use tracing::trace;

/// Energy-weighted centroid index `sum(i * x^2) / sum(x^2)`, if the segment
/// carries any energy.
pub(crate) fn energy_centroid(segment: &[Real]) -> Option<Real> {
    let (weighted, energy) = segment
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(weighted, energy), (i, x)| {
            let e = x * x;
            (weighted + i as Real * e, energy + e)
        });
    (energy > 0.0).then(|| weighted / energy)
}

/// Extracts `n_points` samples around `window`, centres them on their energy
/// centroid and removes low-level samples of the wrong sign.
///
/// The segment is taken symmetrically about the window centre, padded with
/// trailing zeros where the trace runs out. Samples whose magnitude is below
/// `thresh_ratio * max|segment|` and whose sign disagrees with `polarity` are
/// set to zero, and the result is rolled circularly so its centroid lands on
/// `n_points / 2`. Thresholding only depends on `max|segment|`, which the roll
/// preserves, so the function is a fixed point on its own output.
pub fn segment_and_center(
    signal: &[Real],
    window: &PulseWindow,
    n_points: usize,
    polarity: Polarity,
    thresh_ratio: Real,
) -> ValidationResult<Vec<Real>> {
    if n_points == 0 {
        return Err(ValidationError::OutOfRange {
            name: "segment length",
            requirement: "positive",
            value: 0.0,
        });
    }
    if !(0.0..=1.0).contains(&thresh_ratio) {
        return Err(ValidationError::OutOfRange {
            name: "threshold ratio",
            requirement: "within [0, 1]",
            value: thresh_ratio,
        });
    }
    if window.end() > signal.len() {
        return Err(ValidationError::InvalidWindow {
            start: window.start(),
            end: window.end(),
            len: signal.len(),
        });
    }

    let start = window.midpoint().saturating_sub(n_points / 2);
    let mut segment: Vec<Real> = (start..start + n_points)
        .map(|i| signal.get(i).copied().unwrap_or_default())
        .collect();

    let limit = thresh_ratio * max_abs(&segment);
    for x in segment.iter_mut() {
        if x.abs() < limit && !polarity.agrees_with(*x) {
            *x = 0.0;
        }
    }

    Ok(match energy_centroid(&segment) {
        Some(centroid) => {
            let shift = (n_points / 2) as i64 - centroid.round() as i64;
            trace!("Centroid {centroid}, rolling by {shift}");
            roll(&segment, shift)
        }
        None => segment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, Normal};
    use std::f64::consts::PI;

    /// Symmetric compressive pulse of `width` samples (odd) centred on `centre`.
    fn pulse_at(len: usize, centre: usize, width: usize) -> Vec<Real> {
        let half = width / 2;
        (0..len)
            .map(|i| {
                if i + half >= centre && i <= centre + half {
                    let phase = (i + half - centre) as Real / (width - 1) as Real;
                    -(PI * phase).sin()
                } else {
                    0.0
                }
            })
            .collect()
    }

    #[test]
    fn output_has_requested_length() {
        let signal = pulse_at(500, 450, 41);
        let window = PulseWindow::new(430, 470, signal.len()).expect("window should be valid");
        let segment = segment_and_center(&signal, &window, 256, Polarity::Compressive, 0.05)
            .expect("segment should build");
        assert_eq!(segment.len(), 256);
    }

    #[test]
    fn centroid_moves_to_middle() {
        let signal = pulse_at(1000, 300, 41);
        // window deliberately off-centre
        let window = PulseWindow::new(250, 330, signal.len()).expect("window should be valid");
        let segment = segment_and_center(&signal, &window, 128, Polarity::Compressive, 0.0)
            .expect("segment should build");
        let centroid = energy_centroid(&segment).expect("segment has energy");
        assert_approx_eq!(centroid, 64.0, 1e-9);
    }

    #[test]
    fn wrong_sign_noise_is_removed() {
        let mut signal = pulse_at(400, 200, 41);
        signal[150] = 0.01;
        signal[160] = -0.01;
        let window = PulseWindow::new(180, 220, signal.len()).expect("window should be valid");
        let segment = segment_and_center(&signal, &window, 128, Polarity::Compressive, 0.05)
            .expect("segment should build");
        assert!(segment.iter().all(|&x| x <= 0.0));
        assert_eq!(segment.iter().filter(|&&x| x == -0.01).count(), 1);
    }

    #[test]
    fn idempotent_on_centred_segment() {
        let signal = pulse_at(2000, 700, 61);
        let window = PulseWindow::new(650, 750, signal.len()).expect("window should be valid");
        let first = segment_and_center(&signal, &window, 256, Polarity::Compressive, 0.05)
            .expect("segment should build");
        let whole = PulseWindow::new(0, first.len(), first.len()).expect("window should be valid");
        let second = segment_and_center(&first, &whole, 256, Polarity::Compressive, 0.05)
            .expect("segment should build");
        for (a, b) in first.iter().zip(&second) {
            assert_approx_eq!(*a, *b, 1e-12);
        }
    }

    #[test]
    fn idempotent_on_noisy_pulse() {
        let noise = Normal::new(0.0, 0.01).expect("noise should be valid");
        for seed in 0..5 {
            let mut rng = StdRng::seed_from_u64(seed);
            let signal: Vec<Real> = pulse_at(2400, 1150, 401)
                .into_iter()
                .map(|x| -x.abs().powi(3) + noise.sample(&mut rng))
                .collect();
            let window =
                PulseWindow::new(950, 1350, signal.len()).expect("window should be valid");
            let first = segment_and_center(&signal, &window, 1024, Polarity::Compressive, 0.05)
                .expect("segment should build");
            let whole =
                PulseWindow::new(0, first.len(), first.len()).expect("window should be valid");
            let second = segment_and_center(&first, &whole, 1024, Polarity::Compressive, 0.05)
                .expect("segment should build");
            for (a, b) in first.iter().zip(&second) {
                assert_approx_eq!(*a, *b, 1e-12);
            }
        }
    }

    #[test]
    fn pads_when_trace_runs_out() {
        let signal = pulse_at(100, 90, 11);
        let window = PulseWindow::new(80, 100, signal.len()).expect("window should be valid");
        let segment = segment_and_center(&signal, &window, 64, Polarity::Compressive, 0.0)
            .expect("segment should build");
        assert_eq!(segment.len(), 64);
        let energy: Real = segment.iter().map(|x| x * x).sum();
        let source: Real = signal.iter().map(|x| x * x).sum();
        assert_approx_eq!(energy, source, 1e-12);
    }

    #[test]
    fn invalid_parameters() {
        let signal = vec![0.0; 10];
        let window = PulseWindow::new(0, 10, 10).expect("window should be valid");
        assert!(segment_and_center(&signal, &window, 0, Polarity::Tensile, 0.1).is_err());
        assert!(segment_and_center(&signal, &window, 8, Polarity::Tensile, 1.5).is_err());
        assert!(segment_and_center(&signal[..5], &window, 8, Polarity::Tensile, 0.1).is_err());
    }
}
