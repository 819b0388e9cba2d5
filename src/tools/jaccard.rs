//! Agreement of categorical vectors.

use ndarray::ArrayView1;

/// Fraction of coordinates where the 2 vectors differ.
/// For categorical attributes encoded as numbers, similarity is obtained by 1. - jaccard.
/// Returns 0. for empty vectors.
pub(crate) fn jaccard_distance<T: PartialEq>(v1: &ArrayView1<T>, v2: &ArrayView1<T>) -> f64 {
    assert_eq!(v1.len(), v2.len());
    if v1.is_empty() {
        return 0.;
    }
    let common = v1.iter().zip(v2.iter()).filter(|(a, b)| a == b).count();
    1. - (common as f64) / (v1.len() as f64)
} // end of jaccard_distance

#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::arr1;

    #[test]
    fn test_jaccard_distance() {
        let v1 = arr1(&[1., 0., 2., 2.]);
        let v2 = arr1(&[1., 1., 2., 0.]);
        assert!((jaccard_distance(&v1.view(), &v2.view()) - 0.5).abs() < 1.0E-12);
        assert_eq!(jaccard_distance(&v1.view(), &v1.view()), 0.);
        let empty = arr1::<f64>(&[]);
        assert_eq!(jaccard_distance(&empty.view(), &empty.view()), 0.);
    }
} // end of mod tests
