use crate::numeric::{argmin, gradient};
use shpb_common::Real;
use std::ops::RangeInclusive;

/// The inclusive index range of the incident loading edge used for
/// alignment fitness.
///
/// Starting at the steepest negative gradient, the range extends in both
/// directions until the gradient first rises above `k_linear` times that
/// steepest value; those first points are included. A pulse with no
/// negative slope yields the whole record.
pub fn linear_region(incident: &[Real], k_linear: Real) -> RangeInclusive<usize> {
    let n = incident.len();
    let whole = 0..=n.saturating_sub(1);
    let grad = gradient(incident);
    let Some((steepest, min_slope)) = argmin(&grad) else {
        return whole;
    };
    if !(min_slope < 0.0) {
        return whole;
    }
    let threshold = k_linear * min_slope;

    let mut start = steepest;
    while start > 0 && grad[start] <= threshold {
        start -= 1;
    }
    let mut end = steepest;
    while end + 1 < n && grad[end] <= threshold {
        end += 1;
    }
    start..=end
}
