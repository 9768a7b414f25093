//! Numeric helpers shared by the detection, alignment and stress-strain stages.
//!
//! All functions operate on plain slices of [`Real`] and allocate their output.
//! Functions taking two sequences use the shorter length when the inputs differ;
//! callers validate lengths before reaching for these.

pub(crate) mod calculus;
pub(crate) mod shift;
pub(crate) mod spectral;
pub(crate) mod stats;

pub use calculus::{cumulative_trapezoid, gradient, trapezoid};
pub use shift::{roll, shift_zero_padded};
pub use spectral::{convolve_full, convolve_same};
pub use stats::{argmax, argmin, max_abs, mean, median, pearson, rmse, std_dev};

use shpb_common::Real;

/// Builds the time base `i * sample_interval` for `len` samples.
pub fn time_base(len: usize, sample_interval: Real) -> Vec<Real> {
    (0..len).map(|i| i as Real * sample_interval).collect()
}
