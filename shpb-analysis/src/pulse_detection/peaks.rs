use shpb_common::Real;

/// Finds local maxima of `trace` strictly above `height`, thinned so that
/// the surviving peaks are at least `min_separation` samples apart.
/// Higher peaks take precedence; flat-topped maxima report their middle sample.
/// Indices are returned in ascending order.
pub(crate) fn find_peaks(trace: &[Real], height: Real, min_separation: usize) -> Vec<usize> {
    let n = trace.len();
    let mut candidates = Vec::new();
    let mut i = 1;
    while i + 1 < n {
        if trace[i - 1] < trace[i] {
            let mut plateau_end = i;
            while plateau_end + 1 < n && trace[plateau_end + 1] == trace[i] {
                plateau_end += 1;
            }
            if plateau_end + 1 < n && trace[plateau_end + 1] < trace[i] {
                candidates.push((i + plateau_end) / 2);
            }
            i = plateau_end + 1;
        } else {
            i += 1;
        }
    }
    candidates.retain(|&p| trace[p] > height);

    let mut by_height: Vec<usize> = (0..candidates.len()).collect();
    by_height.sort_by(|&a, &b| trace[candidates[b]].total_cmp(&trace[candidates[a]]));

    let mut keep = vec![true; candidates.len()];
    for &k in &by_height {
        if !keep[k] {
            continue;
        }
        let peak = candidates[k];
        for (other, flag) in keep.iter_mut().enumerate() {
            if other != k && candidates[other].abs_diff(peak) < min_separation {
                *flag = false;
            }
        }
    }
    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_data() {
        assert!(find_peaks(&[], 0.0, 1).is_empty());
        assert!(find_peaks(&[1.0, 2.0], 0.0, 1).is_empty());
    }

    #[test]
    fn simple_peaks() {
        let data = [0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 0.0];
        assert_eq!(find_peaks(&data, 0.5, 1), vec![1, 3, 5]);
        assert_eq!(find_peaks(&data, 1.5, 1), vec![3, 5]);
    }

    #[test]
    fn separation_keeps_highest() {
        let data = [0.0, 1.0, 0.0, 3.0, 0.0, 2.0, 0.0];
        assert_eq!(find_peaks(&data, 0.5, 3), vec![3]);
        assert_eq!(find_peaks(&data, 0.5, 4), vec![3]);
        assert_eq!(find_peaks(&[0.0, 1.0, 0.0, 0.0, 0.0, 2.0, 0.0], 0.5, 4), vec![1, 5]);
    }

    #[test]
    fn plateau_reports_middle() {
        let data = [0.0, 2.0, 2.0, 2.0, 0.0];
        assert_eq!(find_peaks(&data, 1.0, 1), vec![2]);
        // a rising edge into the end of the trace is not a peak
        assert!(find_peaks(&[0.0, 1.0, 2.0, 2.0], 0.0, 1).is_empty());
    }
}
