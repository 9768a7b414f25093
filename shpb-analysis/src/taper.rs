//! Tukey (tapered cosine) weighting of pulse segments.
//!
//! A fraction `alpha` of the window is given to the two cosine lobes and the
//! rest is a flat plateau at one: `alpha = 0` is the rectangular window and
//! `alpha = 1` the symmetric Hann window.
//!
//! ```text
//! w(x) = 0.5 * (1 - cos(2*pi*x / alpha))   for x < alpha / 2
//!      = 1                                 on the plateau
//!      = w(1 - x)                          for x > 1 - alpha / 2
//! ```
//! where `x = i / (n - 1)`.

use crate::{
    error::{ValidationError, ValidationResult},
    signal::PulseSet,
};
use shpb_common::Real;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaperWindow {
    alpha: Real,
}

impl TaperWindow {
    pub fn new(alpha: Real) -> ValidationResult<Self> {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(ValidationError::OutOfRange {
                name: "taper alpha",
                requirement: "within [0, 1]",
                value: alpha,
            });
        }
        Ok(Self { alpha })
    }

    pub fn alpha(&self) -> Real {
        self.alpha
    }

    pub fn generate(&self, len: usize) -> Vec<Real> {
        if len <= 1 {
            return vec![1.0; len];
        }
        let last = (len - 1) as Real;
        (0..len)
            .map(|i| {
                // evaluate on the left half so the window is exactly symmetric
                let x = i.min(len - 1 - i) as Real / last;
                if x < self.alpha / 2.0 {
                    0.5 * (1.0 - (2.0 * PI * x / self.alpha).cos())
                } else {
                    1.0
                }
            })
            .collect()
    }

    pub fn apply(&self, segment: &[Real]) -> Vec<Real> {
        segment
            .iter()
            .zip(self.generate(segment.len()))
            .map(|(x, w)| x * w)
            .collect()
    }

    /// Tapers the three pulses of `pulses`, keeping its time base.
    pub fn apply_to_set(&self, pulses: &PulseSet) -> PulseSet {
        let window = self.generate(pulses.len());
        pulses.map_pulses(|pulse| pulse.iter().zip(&window).map(|(x, w)| x * w).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn alpha_range() {
        assert!(TaperWindow::new(-0.1).is_err());
        assert!(TaperWindow::new(1.1).is_err());
        assert!(TaperWindow::new(Real::NAN).is_err());
        assert!(TaperWindow::new(0.0).is_ok());
        assert!(TaperWindow::new(1.0).is_ok());
    }

    #[test]
    fn degenerate_lengths() {
        let taper = TaperWindow::new(0.5).expect("alpha should be valid");
        assert!(taper.generate(0).is_empty());
        assert_eq!(taper.generate(1), vec![1.0]);
    }

    #[test]
    fn rectangular() {
        let window = TaperWindow::new(0.0).expect("alpha should be valid").generate(17);
        assert!(window.iter().all(|w| *w == 1.0));
    }

    #[test]
    fn hann() {
        let n = 33;
        let window = TaperWindow::new(1.0).expect("alpha should be valid").generate(n);
        for (i, w) in window.iter().enumerate() {
            let expected = 0.5 * (1.0 - (2.0 * PI * i as Real / (n - 1) as Real).cos());
            assert_approx_eq!(w, expected, 1e-12);
        }
    }

    #[test]
    fn symmetric_plateau_and_continuous() {
        let n = 101;
        let window = TaperWindow::new(0.4).expect("alpha should be valid").generate(n);
        for i in 0..n {
            assert_eq!(window[i], window[n - 1 - i]);
        }
        // x = i / 100, plateau for 0.2 <= x <= 0.8
        assert!(window[20..=80].iter().all(|w| *w == 1.0));
        assert_eq!(window[0], 0.0);
        let max_step = window
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).abs())
            .fold(0.0, Real::max);
        // the lobe rises by at most pi / 40 per sample
        assert!(max_step < 0.1);
        assert!(window[19] < 1.0 && window[19] > 0.99);
    }

    #[test]
    fn taper_set() {
        let pulses = PulseSet::new(vec![2.0; 11], vec![-1.0; 11], vec![1.0; 11], 0.1)
            .expect("set should be valid");
        let taper = TaperWindow::new(1.0).expect("alpha should be valid");
        let tapered = taper.apply_to_set(&pulses);
        assert_eq!(tapered.incident(), taper.apply(pulses.incident()).as_slice());
        assert_approx_eq!(tapered.transmitted()[5], -1.0);
        assert_approx_eq!(tapered.reflected()[0], 0.0);
        assert_eq!(tapered.time(), pulses.time());
    }
}
