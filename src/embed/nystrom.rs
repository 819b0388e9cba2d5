//! Factorization of the landmark similarity matrix.
//!
//! Noting W the (k,k) similarity matrix between landmarks and C the (n,k) similarity between nodes and landmarks,
//! the Nystrom approximation of the whole similarity matrix is $C W^{+} C^{t}$.
//! With $F = (W^{+})^{1/2}$ it is $U U^{t}$ where $U = C F$, so the rows of U are the embedded nodes.
//!
//! F is obtained from the symetric eigen decomposition $W = V \Lambda V^{t}$ as $V \Lambda^{-1/2} V^{t}$,
//! null (relatively to the largest) eigenvalues being discarded.

use nalgebra::DMatrix;
use ndarray::Array2;

use crate::error::{AlignError, Result};
use crate::tools::orderingf::{decreasing_sort_nans_first, IndexedValue};

/// The factor $(W^{+})^{1/2}$ and some information on its computation.
#[derive(Clone, Debug)]
pub struct LandmarkFactor {
    /// (k,k) symetric factor
    factor: Array2<f64>,
    /// eigenvalues of the factorized matrix in decreasing order
    eigenvalues: Vec<f64>,
    /// number of eigenvalues kept
    rank: usize,
    /// ridge added to the diagonal, 0. if none
    ridge: f64,
} // end of struct LandmarkFactor

impl LandmarkFactor {
    pub fn get_factor(&self) -> &Array2<f64> {
        &self.factor
    }

    /// eigenvalues in decreasing order
    pub fn get_eigenvalues(&self) -> &[f64] {
        &self.eigenvalues
    }

    pub fn get_rank(&self) -> usize {
        self.rank
    }

    /// true if the factor was obtained with a ridge
    pub fn is_regularized(&self) -> bool {
        self.ridge > 0.
    }

    pub fn get_ridge(&self) -> f64 {
        self.ridge
    }
} // end of impl LandmarkFactor

// eigen pairs of the symetrized matrix, sorted by decreasing eigenvalues
fn sorted_symetric_eigen(w: &Array2<f64>) -> (Vec<IndexedValue<f64>>, DMatrix<f64>) {
    let k = w.nrows();
    let mat = DMatrix::<f64>::from_fn(k, k, |i, j| 0.5 * (w[[i, j]] + w[[j, i]]));
    let eigen = mat.symmetric_eigen();
    let mut eigenvalues: Vec<IndexedValue<f64>> = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .map(|(i, v)| IndexedValue(i, *v))
        .collect();
    eigenvalues.sort_unstable_by(decreasing_sort_nans_first);
    (eigenvalues, eigen.eigenvectors)
} // end of sorted_symetric_eigen

// builds V diag(lambda^-1/2) V^t from eigen pairs above threshold
fn assemble_factor(eigenvalues: &[IndexedValue<f64>], eigenvectors: &DMatrix<f64>, threshold: f64) -> (Array2<f64>, usize) {
    let k = eigenvectors.nrows();
    let mut factor = Array2::<f64>::zeros((k, k));
    let mut rank = 0;
    for IndexedValue(col, lambda) in eigenvalues {
        if !(*lambda > threshold) {
            continue;
        }
        rank += 1;
        let scale = 1. / lambda.sqrt();
        let v = eigenvectors.column(*col);
        for i in 0..k {
            for j in 0..k {
                factor[[i, j]] += scale * v[i] * v[j];
            }
        }
    }
    (factor, rank)
} // end of assemble_factor

#[cfg_attr(doc, katexit::katexit)]
/// Computes $(W^{+})^{1/2}$.
/// Returns [AlignError::SingularApproximation] if an eigenvalue of W is not above tolerance * largest eigenvalue,
/// the caller can then use [regularized_pseudo_inverse_sqrt].
pub fn pseudo_inverse_sqrt(w: &Array2<f64>, tolerance: f64) -> Result<LandmarkFactor> {
    let k = w.nrows();
    if k != w.ncols() {
        return Err(AlignError::DimensionMismatch {
            what: "landmark matrix columns",
            expected: k,
            got: w.ncols(),
        });
    }
    let (eigenvalues, eigenvectors) = sorted_symetric_eigen(w);
    let lambda_max = eigenvalues.first().map(|v| v.1).unwrap_or(0.);
    log::debug!(
        "landmark matrix eigenvalues : {:?}",
        eigenvalues.iter().map(|v| v.1).collect::<Vec<f64>>()
    );
    if !(lambda_max > 0.) {
        log::error!("landmark matrix has no positive eigenvalue");
        return Err(AlignError::SingularApproximation {
            rank: 0,
            nb_landmarks: k,
        });
    }
    let threshold = tolerance * lambda_max;
    let rank = eigenvalues.iter().filter(|v| v.1 > threshold).count();
    if rank < k {
        log::debug!("landmark matrix has rank {} for {} landmarks", rank, k);
        return Err(AlignError::SingularApproximation {
            rank,
            nb_landmarks: k,
        });
    }
    let (factor, rank) = assemble_factor(&eigenvalues, &eigenvectors, threshold);
    if let Some(last) = eigenvalues.last() {
        log::info!("last eigen value to first : {:.3e}", last.1 / lambda_max);
    }
    Ok(LandmarkFactor {
        factor,
        eigenvalues: eigenvalues.iter().map(|v| v.1).collect(),
        rank,
        ridge: 0.,
    })
} // end of pseudo_inverse_sqrt

#[cfg_attr(doc, katexit::katexit)]
/// Computes $((W + r I)^{+})^{1/2}$ with r = ridge * mean of W diagonal (ridge itself if the mean is not positive).
/// Eigenvalues under tolerance * largest eigenvalue are discarded.
pub fn regularized_pseudo_inverse_sqrt(w: &Array2<f64>, tolerance: f64, ridge: f64) -> LandmarkFactor {
    let k = w.nrows();
    let mean_diag = if k > 0 { w.diag().sum() / k as f64 } else { 0. };
    let r = if mean_diag > 0. { ridge * mean_diag } else { ridge };
    let mut regularized = w.clone();
    for i in 0..k {
        regularized[[i, i]] += r;
    }
    let (eigenvalues, eigenvectors) = sorted_symetric_eigen(&regularized);
    let lambda_max = eigenvalues.first().map(|v| v.1).unwrap_or(0.).max(0.);
    let (factor, rank) = assemble_factor(&eigenvalues, &eigenvectors, tolerance * lambda_max);
    log::info!(
        "regularized landmark factor, ridge : {:.3e}, rank : {} for {} landmarks",
        r,
        rank,
        k
    );
    LandmarkFactor {
        factor,
        eigenvalues: eigenvalues.iter().map(|v| v.1).collect(),
        rank,
        ridge: r,
    }
} // end of regularized_pseudo_inverse_sqrt

#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::arr2;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_factor_inverts() {
        log_init_test();
        let w = arr2(&[[2., 1., 0.], [1., 3., 1.], [0., 1., 4.]]);
        let f = pseudo_inverse_sqrt(&w, 1.0E-8).unwrap();
        assert_eq!(f.get_rank(), 3);
        assert!(!f.is_regularized());
        let eigenvalues = f.get_eigenvalues();
        assert!(eigenvalues.windows(2).all(|v| v[0] >= v[1]));
        // F W F = I and W F F W = W
        let fwf = f.get_factor().dot(&w).dot(f.get_factor());
        let wffw = w.dot(f.get_factor()).dot(f.get_factor()).dot(&w);
        for i in 0..3 {
            for j in 0..3 {
                let id = if i == j { 1. } else { 0. };
                assert!((fwf[[i, j]] - id).abs() < 1.0E-10);
                assert!((wffw[[i, j]] - w[[i, j]]).abs() < 1.0E-10);
            }
        }
    } // end of test_factor_inverts

    #[test]
    fn test_singular_then_ridge() {
        log_init_test();
        // rank one matrix as given by structurally identical landmarks
        let w = Array2::<f64>::ones((4, 4));
        let res = pseudo_inverse_sqrt(&w, 1.0E-8);
        assert_eq!(
            res.err(),
            Some(AlignError::SingularApproximation {
                rank: 1,
                nb_landmarks: 4
            })
        );
        let f = regularized_pseudo_inverse_sqrt(&w, 1.0E-8, 1.0E-3);
        assert!(f.is_regularized());
        assert!((f.get_ridge() - 1.0E-3).abs() < 1.0E-15);
        assert_eq!(f.get_rank(), 4);
        assert!(f.get_factor().iter().all(|x| x.is_finite()));
        // reconstruction of W within the ridge
        let wffw = w.dot(f.get_factor()).dot(f.get_factor()).dot(&w);
        for x in wffw.iter() {
            assert!((x - 1.).abs() <= 1.0E-3);
        }
        // null matrix
        let zero = Array2::<f64>::zeros((2, 2));
        assert!(matches!(
            pseudo_inverse_sqrt(&zero, 1.0E-8),
            Err(AlignError::SingularApproximation { rank: 0, .. })
        ));
    } // end of test_singular_then_ridge
} // end of mod tests
