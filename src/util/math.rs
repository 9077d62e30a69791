//! Index and reduction helpers shared by the kernels.

/// Maps a possibly out-of-range index onto `0..len` using reflect-101
/// (`dcb|abcdefgh|gfe`), the edge pixel is not repeated.
///
/// Indices more than one period away from the axis fold repeatedly, so
/// windows wider than the image are still valid.
#[inline]
pub(crate) fn reflect_101(index: isize, len: usize) -> usize {
    if len == 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let mut i = index.rem_euclid(period);
    if i >= len as isize {
        i = period - i;
    }
    i as usize
}

/// Arithmetic mean of a field accumulated in `f64`.
pub(crate) fn mean_f64(field: &[f32]) -> f64 {
    if field.is_empty() {
        return 0.0;
    }
    let sum: f64 = field.iter().map(|&v| f64::from(v)).sum();
    sum / field.len() as f64
}

#[cfg(test)]
mod tests {
    use super::{mean_f64, reflect_101};

    #[test]
    fn reflect_101_mirrors_without_repeating_edges() {
        let got: Vec<usize> = (-3..8).map(|i| reflect_101(i, 5)).collect();
        assert_eq!(got, vec![3, 2, 1, 0, 1, 2, 3, 4, 3, 2, 1]);
    }

    #[test]
    fn reflect_101_folds_far_indices() {
        assert_eq!(reflect_101(-5, 2), 1);
        assert_eq!(reflect_101(5, 2), 1);
        assert_eq!(reflect_101(4, 2), 0);
        assert_eq!(reflect_101(-7, 1), 0);
    }

    #[test]
    fn mean_f64_handles_empty() {
        assert_eq!(mean_f64(&[]), 0.0);
        assert!((mean_f64(&[1.0, 2.0, 3.0]) - 2.0).abs() < 1e-12);
    }
}
