use itertools::Itertools;
use shpb_common::Real;

/// Discrete gradient with unit spacing.
///
/// Interior points use central differences, the end points one-sided
/// differences.
pub fn gradient(x: &[Real]) -> Vec<Real> {
    let n = x.len();
    if n < 2 {
        return vec![0.0; n];
    }
    (0..n)
        .map(|i| match i {
            0 => x[1] - x[0],
            i if i == n - 1 => x[n - 1] - x[n - 2],
            i => (x[i + 1] - x[i - 1]) / 2.0,
        })
        .collect()
}

/// Trapezoid rule integral of `y` over the abscissae `x`.
pub fn trapezoid(y: &[Real], x: &[Real]) -> Real {
    y.iter()
        .zip(x)
        .tuple_windows()
        .map(|((y0, x0), (y1, x1))| (x1 - x0) * (y0 + y1) / 2.0)
        .sum()
}

/// Running trapezoid integral, starting from zero.
/// The output has the same length as the input.
pub fn cumulative_trapezoid(y: &[Real], x: &[Real]) -> Vec<Real> {
    if y.is_empty() || x.is_empty() {
        return Vec::new();
    }
    std::iter::once(0.0)
        .chain(
            y.iter()
                .zip(x)
                .tuple_windows()
                .scan(0.0, |total, ((y0, x0), (y1, x1))| {
                    *total += (x1 - x0) * (y0 + y1) / 2.0;
                    Some(*total)
                }),
        )
        .collect()
}
