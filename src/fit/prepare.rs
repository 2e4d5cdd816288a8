//! Input preprocessing: length checks, histogram bin edges, range restriction.

use crate::domain::{DataRange, Samples};
use crate::error::{FitError, Result};

/// Turn raw arrays into the samples that are actually fitted.
///
/// - `x.len() == y.len() + 1` is read as histogram bin edges and replaced by
///   bin centres.
/// - With a `range`, only points with `lo < x < hi` are kept (weights follow).
pub fn prepare_samples(
    x: &[f64],
    y: &[f64],
    weights: Option<&[f64]>,
    range: Option<DataRange>,
) -> Result<Samples> {
    let x = if x.len() == y.len() + 1 {
        bin_centers(x)
    } else if x.len() == y.len() {
        x.to_vec()
    } else {
        return Err(FitError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    };

    if let Some(w) = weights {
        if w.len() != y.len() {
            return Err(FitError::WeightLengthMismatch {
                weights: w.len(),
                y: y.len(),
            });
        }
    }

    let samples = Samples {
        x,
        y: y.to_vec(),
        weights: weights.map(<[f64]>::to_vec),
    };

    let samples = match range {
        Some(range) => restrict_range(samples, range)?,
        None => samples,
    };

    if samples.is_empty() {
        return Err(FitError::NoData);
    }
    Ok(samples)
}

/// Midpoints of consecutive bin edges.
pub fn bin_centers(edges: &[f64]) -> Vec<f64> {
    edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
}

/// Keep the points strictly inside `range`.
pub fn restrict_range(samples: Samples, range: DataRange) -> Result<Samples> {
    if !(range.lo < range.hi) {
        return Err(FitError::InvalidRange {
            lo: range.lo,
            hi: range.hi,
        });
    }

    let keep: Vec<usize> = (0..samples.len()).filter(|&i| range.contains(samples.x[i])).collect();
    let pick = |values: &[f64]| keep.iter().map(|&i| values[i]).collect::<Vec<f64>>();

    Ok(Samples {
        x: pick(&samples.x),
        y: pick(&samples.y),
        weights: samples.weights.as_deref().map(pick),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_edges_become_midpoints() {
        let edges = [0.0, 1.0, 3.0, 6.0];
        let counts = [5.0, 7.0, 2.0];
        let s = prepare_samples(&edges, &counts, None, None).unwrap();
        assert_eq!(s.x, vec![0.5, 2.0, 4.5]);
        assert_eq!(s.y, counts.to_vec());
    }

    #[test]
    fn other_length_mismatches_are_rejected() {
        let err = prepare_samples(&[0.0, 1.0, 2.0, 3.0], &[1.0, 2.0], None, None).unwrap_err();
        assert!(matches!(err, FitError::LengthMismatch { x: 4, y: 2 }));
        let err = prepare_samples(&[0.0], &[1.0, 2.0], None, None).unwrap_err();
        assert!(matches!(err, FitError::LengthMismatch { x: 1, y: 2 }));
    }

    #[test]
    fn range_is_strict_and_slices_weights() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [10.0, 11.0, 12.0, 13.0, 14.0];
        let w = [1.0, 2.0, 3.0, 4.0, 5.0];
        let s = prepare_samples(&x, &y, Some(&w), Some(DataRange::new(1.0, 4.0))).unwrap();
        assert_eq!(s.x, vec![2.0, 3.0]);
        assert_eq!(s.y, vec![12.0, 13.0]);
        assert_eq!(s.weights, Some(vec![3.0, 4.0]));
    }

    #[test]
    fn histogram_correction_happens_before_range_restriction() {
        // Centres are 0.5, 1.5, 2.5; the range keeps only 1.5.
        let s = prepare_samples(&[0.0, 1.0, 2.0, 3.0], &[1.0, 2.0, 3.0], None, Some(DataRange::new(1.0, 2.0)))
            .unwrap();
        assert_eq!(s.x, vec![1.5]);
        assert_eq!(s.y, vec![2.0]);
    }

    #[test]
    fn empty_selection_is_no_data() {
        let err = prepare_samples(&[0.0, 1.0], &[0.0, 1.0], None, Some(DataRange::new(5.0, 6.0))).unwrap_err();
        assert!(matches!(err, FitError::NoData));
        let err = prepare_samples(&[], &[], None, None).unwrap_err();
        assert!(matches!(err, FitError::NoData));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = prepare_samples(&[0.0, 1.0], &[0.0, 1.0], None, Some(DataRange::new(2.0, 1.0))).unwrap_err();
        assert!(matches!(err, FitError::InvalidRange { .. }));
    }

    #[test]
    fn weight_length_must_match_y() {
        let err = prepare_samples(&[0.0, 1.0, 2.0], &[0.0, 1.0], Some(&[1.0, 1.0, 1.0]), None).unwrap_err();
        assert!(matches!(err, FitError::WeightLengthMismatch { weights: 3, y: 2 }));
    }
}
