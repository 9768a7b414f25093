use crate::{
    error::{ValidationError, ValidationResult},
    numeric::convolve_same,
};
use shpb_common::{Polarity, Real};
use std::f64::consts::PI;

/// Unit-energy half-sine matched filter template.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowTemplate {
    samples: Vec<Real>,
    polarity: Polarity,
}

impl WindowTemplate {
    /// Builds `sin(pi * i / (pulse_points - 1))`, negated for compressive
    /// polarity and scaled to unit L2 norm.
    pub fn half_sine(pulse_points: usize, polarity: Polarity) -> ValidationResult<Self> {
        if pulse_points < 2 {
            return Err(ValidationError::OutOfRange {
                name: "pulse points",
                requirement: "at least 2",
                value: pulse_points as Real,
            });
        }
        let span = (pulse_points - 1) as Real;
        let shape: Vec<Real> = (0..pulse_points)
            .map(|i| polarity.sign() * (PI * i as Real / span).sin())
            .collect();
        let norm = shape.iter().map(|v| v * v).sum::<Real>().sqrt();
        Ok(Self {
            samples: shape.into_iter().map(|v| v / norm).collect(),
            polarity,
        })
    }

    pub fn samples(&self) -> &[Real] {
        &self.samples
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

    /// Convolves the signal with the time-reversed template, giving a trace
    /// the length of `signal` that peaks where the signal matches the template.
    pub fn matched_filter(&self, signal: &[Real]) -> Vec<Real> {
        let reversed: Vec<Real> = self.samples.iter().rev().copied().collect();
        convolve_same(signal, &reversed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::argmax;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn unit_energy_and_sign() {
        let compressive = WindowTemplate::half_sine(51, Polarity::Compressive)
            .expect("template should build");
        let energy: Real = compressive.samples().iter().map(|v| v * v).sum();
        assert_approx_eq!(energy, 1.0, 1e-12);
        assert!(compressive.samples()[25] < 0.0);

        let tensile =
            WindowTemplate::half_sine(51, Polarity::Tensile).expect("template should build");
        assert_approx_eq!(tensile.samples()[25], -compressive.samples()[25], 1e-15);
    }

    #[test]
    fn too_short() {
        assert!(WindowTemplate::half_sine(1, Polarity::Tensile).is_err());
    }

    #[test]
    fn matched_filter_peaks_at_pulse_centre() {
        let template =
            WindowTemplate::half_sine(21, Polarity::Compressive).expect("template should build");
        let mut signal = vec![0.0; 200];
        for (i, v) in template.samples().iter().enumerate() {
            signal[90 + i] = 3.0 * v;
        }
        let response = template.matched_filter(&signal);
        assert_eq!(response.len(), signal.len());
        let (peak, value) = argmax(&response).expect("response should not be empty");
        assert_eq!(peak, 100);
        assert_approx_eq!(value, 3.0, 1e-9);
    }
}
