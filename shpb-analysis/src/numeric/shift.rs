use shpb_common::Real;

/// Shifts `x` by `shift` samples, filling the vacated samples with zero.
/// A positive shift moves the signal later in time: `out[i] = x[i - shift]`.
/// The output has the same length as the input.
pub fn shift_zero_padded(x: &[Real], shift: i64) -> Vec<Real> {
    let n = x.len();
    let mut out = vec![0.0; n];
    let magnitude = usize::try_from(shift.unsigned_abs()).unwrap_or(usize::MAX);
    if magnitude < n {
        if shift >= 0 {
            out[magnitude..].copy_from_slice(&x[..n - magnitude]);
        } else {
            out[..n - magnitude].copy_from_slice(&x[magnitude..]);
        }
    }
    out
}

/// Circular shift with the same direction convention as [`shift_zero_padded`].
pub fn roll(x: &[Real], shift: i64) -> Vec<Real> {
    let mut out = x.to_vec();
    if let Ok(n) = i64::try_from(x.len()) {
        if n > 0 {
            out.rotate_right(shift.rem_euclid(n) as usize);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_forward_and_back() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(shift_zero_padded(&x, 2), vec![0.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(shift_zero_padded(&x, -2), vec![3.0, 4.0, 5.0, 0.0, 0.0]);
        assert_eq!(shift_zero_padded(&x, 0), x.to_vec());
        assert_eq!(shift_zero_padded(&x, 9), vec![0.0; 5]);
        assert_eq!(shift_zero_padded(&x, -9), vec![0.0; 5]);
    }

    #[test]
    fn shift_then_unshift_keeps_interior() {
        let x: Vec<Real> = (1..=20).map(|i| i as Real).collect();
        for s in [-7_i64, -1, 1, 3, 7] {
            let restored = shift_zero_padded(&shift_zero_padded(&x, s), -s);
            let padded = s.unsigned_abs() as usize;
            let differing = restored.iter().zip(&x).filter(|(a, b)| a != b).count();
            assert!(differing <= padded);
            if s > 0 {
                assert_eq!(restored[..x.len() - padded], x[..x.len() - padded]);
            } else {
                assert_eq!(restored[padded..], x[padded..]);
            }
        }
    }

    #[test]
    fn roll_wraps() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(roll(&x, 1), vec![4.0, 1.0, 2.0, 3.0]);
        assert_eq!(roll(&x, -1), vec![2.0, 3.0, 4.0, 1.0]);
        assert_eq!(roll(&x, 8), x.to_vec());
        assert!(roll(&[], 3).is_empty());
    }
}
