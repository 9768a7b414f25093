use shpb_common::Real;

pub fn mean(x: &[Real]) -> Real {
    if x.is_empty() {
        Real::NAN
    } else {
        x.iter().sum::<Real>() / x.len() as Real
    }
}

/// Population standard deviation.
pub fn std_dev(x: &[Real]) -> Real {
    let mu = mean(x);
    (x.iter().map(|v| (v - mu).powi(2)).sum::<Real>() / x.len() as Real).sqrt()
}

/// Median of the values, NaN for an empty slice.
pub fn median(x: &[Real]) -> Real {
    if x.is_empty() {
        return Real::NAN;
    }
    let mut sorted = x.to_vec();
    sorted.sort_by(Real::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Pearson correlation coefficient.
/// NaN when either input has zero variance, so callers can detect degeneracy.
pub fn pearson(a: &[Real], b: &[Real]) -> Real {
    let n = a.len().min(b.len());
    if n < 2 {
        return Real::NAN;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (mu_a, mu_b) = (mean(a), mean(b));
    let (mut cov, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (x, y) in a.iter().zip(b) {
        let (dx, dy) = (x - mu_a, y - mu_b);
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let denominator = (var_a * var_b).sqrt();
    if denominator == 0.0 {
        Real::NAN
    } else {
        cov / denominator
    }
}

/// Root-mean-square error between two sequences.
pub fn rmse(a: &[Real], b: &[Real]) -> Real {
    let n = a.len().min(b.len());
    if n == 0 {
        return Real::NAN;
    }
    (a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<Real>()
        / n as Real)
        .sqrt()
}

pub fn max_abs(x: &[Real]) -> Real {
    x.iter().fold(0.0, |acc: Real, v| acc.max(v.abs()))
}

/// Index and value of the first minimum.
pub fn argmin(x: &[Real]) -> Option<(usize, Real)> {
    x.iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if v >= b => best,
            _ => Some((i, v)),
        })
}

/// Index and value of the first maximum.
pub fn argmax(x: &[Real]) -> Option<(usize, Real)> {
    x.iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn basic_moments() {
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_approx_eq!(mean(&data), 5.0);
        assert_approx_eq!(std_dev(&data), 2.0);
        assert_approx_eq!(median(&data), 4.5);
        assert_approx_eq!(median(&[3.0, -1.0, 2.0]), 2.0);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn pearson_of_linear_relations() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [2.0, 4.0, 6.0, 8.0];
        let c = [4.0, 3.0, 2.0, 1.0];
        assert_approx_eq!(pearson(&a, &b), 1.0);
        assert_approx_eq!(pearson(&a, &c), -1.0);
    }

    #[test]
    fn pearson_of_constant_is_nan() {
        assert!(pearson(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_nan());
        assert!(pearson(&[0.0; 5], &[0.0; 5]).is_nan());
    }

    #[test]
    fn rmse_and_extremes() {
        assert_approx_eq!(rmse(&[1.0, 2.0], &[1.0, 4.0]), 2.0_f64.sqrt());
        assert_approx_eq!(max_abs(&[0.5, -3.0, 2.0]), 3.0);
        assert_eq!(argmin(&[3.0, -1.0, -1.0, 2.0]), Some((1, -1.0)));
        assert_eq!(argmax(&[3.0, -1.0, 3.0]), Some((0, 3.0)));
        assert_eq!(argmin(&[]), None);
    }
}
