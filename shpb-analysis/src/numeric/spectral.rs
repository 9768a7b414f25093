use rustfft::{FftPlanner, num_complex::Complex};
use shpb_common::Real;

fn zero_padded_spectrum(values: &[Real], fft_len: usize) -> Vec<Complex<Real>> {
    values
        .iter()
        .map(|&v| Complex::new(v, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(fft_len)
        .collect()
}

/// Full linear convolution computed through the FFT.
/// The output has `signal.len() + kernel.len() - 1` samples.
pub fn convolve_full(signal: &[Real], kernel: &[Real]) -> Vec<Real> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }
    let full_len = signal.len() + kernel.len() - 1;
    let fft_len = full_len.next_power_of_two();

    let mut planner = FftPlanner::<Real>::new();
    let forward = planner.plan_fft_forward(fft_len);
    let inverse = planner.plan_fft_inverse(fft_len);

    let mut signal_spectrum = zero_padded_spectrum(signal, fft_len);
    let mut kernel_spectrum = zero_padded_spectrum(kernel, fft_len);
    forward.process(&mut signal_spectrum);
    forward.process(&mut kernel_spectrum);

    for (s, k) in signal_spectrum.iter_mut().zip(&kernel_spectrum) {
        *s *= *k;
    }
    inverse.process(&mut signal_spectrum);

    let scale = 1.0 / fft_len as Real;
    signal_spectrum
        .into_iter()
        .take(full_len)
        .map(|c| c.re * scale)
        .collect()
}

/// Convolution trimmed to the length of `signal`, centred on the full
/// convolution (offset `(kernel.len() - 1) / 2`).
pub fn convolve_same(signal: &[Real], kernel: &[Real]) -> Vec<Real> {
    if kernel.is_empty() {
        return vec![0.0; signal.len()];
    }
    let offset = (kernel.len() - 1) / 2;
    convolve_full(signal, kernel)
        .into_iter()
        .skip(offset)
        .take(signal.len())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn direct_convolution(signal: &[Real], kernel: &[Real]) -> Vec<Real> {
        let mut out = vec![0.0; signal.len() + kernel.len() - 1];
        for (i, s) in signal.iter().enumerate() {
            for (j, k) in kernel.iter().enumerate() {
                out[i + j] += s * k;
            }
        }
        out
    }

    #[test]
    fn full_matches_direct() {
        let signal = [1.0, -2.0, 3.5, 0.0, 4.0, -1.0, 0.25];
        let kernel = [0.5, 1.0, -0.75];
        let expected = direct_convolution(&signal, &kernel);
        let actual = convolve_full(&signal, &kernel);
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(&expected) {
            assert_approx_eq!(*a, *e, 1e-12);
        }
    }

    #[test]
    fn same_is_centred() {
        let actual = convolve_same(&[1.0, 2.0, 3.0], &[0.0, 1.0, 0.5]);
        assert_eq!(actual.len(), 3);
        assert_approx_eq!(actual[0], 1.0, 1e-12);
        assert_approx_eq!(actual[1], 2.5, 1e-12);
        assert_approx_eq!(actual[2], 4.0, 1e-12);
    }

    #[test]
    fn same_with_even_kernel() {
        // full = [1, 3, 5, 3], offset (2 - 1) / 2 = 0
        let actual = convolve_same(&[1.0, 2.0, 3.0], &[1.0, 1.0]);
        assert_approx_eq!(actual[0], 1.0, 1e-12);
        assert_approx_eq!(actual[1], 3.0, 1e-12);
        assert_approx_eq!(actual[2], 5.0, 1e-12);
    }

    #[test]
    fn empty_inputs() {
        assert!(convolve_full(&[], &[1.0]).is_empty());
        assert_eq!(convolve_same(&[1.0, 2.0], &[]), vec![0.0, 0.0]);
    }
}
