//! Extraction of the alignment between the 2 graphs from the embedding of the combined graph.
//!
//! The embedded vectors are split at the boundary : rows 0..boundary (U1) belong to the first graph,
//! rows boundary..n (U2) to the second. Each node of the first graph is scored against nodes of the second.
//!
//! - In dense mode (numtop = 0) all scores are kept in a (n1, n2) array.
//! - In top-k mode only the numtop best candidates of each node are kept in a csr matrix.
//!   Equal scores are ordered by increasing rank of the candidate.
//!   With [NeighbourSearch::Exact] and the distance based score, candidates come from a kd-tree built on
//!   the second graph vectors, the inner product score is searched by a full scan. Both are exact, so for given
//!   parameters and graphs a run always gives the same matrix. [NeighbourSearch::Hnsw] is approximate and
//!   its results can change between runs.
//!
//! Scores are raw similarities, non negative, not normalized.

pub mod params;

mod hnsw;

use ndarray::{s, Array2, ArrayView1, ArrayView2, Axis};
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use sprs::{CsMat, TriMat};

use std::time::SystemTime;
use cpu_time::ProcessTime;

use crate::embedding::{EmbeddedT, Embedded};
use crate::error::{AlignError, Result};
use crate::tools::kdtree::{squared_distance, KdTree};
use crate::tools::orderingf::{top_candidates, IndexedValue};

use self::hnsw::{hnsw_top_candidates, HnswSearch};
use self::params::{AlignParams, NeighbourSearch, SimilarityMeasure};

/// score of a pair of embedded vectors
pub fn score(measure: SimilarityMeasure, u: &ArrayView1<f64>, v: &ArrayView1<f64>) -> f64 {
    match measure {
        SimilarityMeasure::ExpDistance => (-squared_distance(u, v).sqrt()).exp(),
        SimilarityMeasure::InnerProduct => u.dot(v).max(0.),
    }
} // end of score

/// The alignment matrix, rows are nodes of first graph, columns nodes of second graph (ranks shifted by the boundary)
#[derive(Clone, Debug)]
pub enum AlignmentMatrix {
    Dense(Array2<f64>),
    Sparse(CsMat<f64>),
} // end of AlignmentMatrix

impl AlignmentMatrix {
    /// (nb nodes of first graph, nb nodes of second graph)
    pub fn shape(&self) -> (usize, usize) {
        match self {
            AlignmentMatrix::Dense(mat) => mat.dim(),
            AlignmentMatrix::Sparse(mat) => mat.shape(),
        }
    }

    /// score of (i,j), 0. if not stored
    pub fn get(&self, i: usize, j: usize) -> f64 {
        match self {
            AlignmentMatrix::Dense(mat) => mat[[i, j]],
            AlignmentMatrix::Sparse(mat) => mat.get(i, j).copied().unwrap_or(0.),
        }
    }

    /// number of stored entries
    pub fn nnz(&self) -> usize {
        match self {
            AlignmentMatrix::Dense(mat) => mat.len(),
            AlignmentMatrix::Sparse(mat) => mat.nnz(),
        }
    }

    /// candidates of row i as (rank in second graph, score), by decreasing score then increasing rank
    pub fn row_candidates(&self, i: usize) -> Vec<(usize, f64)> {
        let candidates: Vec<IndexedValue<f64>> = match self {
            AlignmentMatrix::Dense(mat) => mat
                .row(i)
                .iter()
                .enumerate()
                .map(|(j, v)| IndexedValue(j, *v))
                .collect(),
            AlignmentMatrix::Sparse(mat) => match mat.outer_view(i) {
                Some(row) => row.iter().map(|(j, v)| IndexedValue(j, *v)).collect(),
                None => Vec::new(),
            },
        };
        let nb = candidates.len();
        top_candidates(candidates, nb)
            .into_iter()
            .map(|c| (c.0, c.1))
            .collect()
    } // end of row_candidates

    /// dense copy of the matrix, missing entries are 0.
    pub fn to_dense(&self) -> Array2<f64> {
        match self {
            AlignmentMatrix::Dense(mat) => mat.clone(),
            AlignmentMatrix::Sparse(mat) => mat.to_dense(),
        }
    }
} // end of impl AlignmentMatrix

/// splits embedded vectors at boundary, returning the first and second graph parts.
pub fn split_embedding(embedded: &Array2<f64>, boundary: usize) -> Result<(ArrayView2<f64>, ArrayView2<f64>)> {
    let nb_nodes = embedded.nrows();
    if boundary == 0 || boundary >= nb_nodes {
        log::error!("boundary {} is not inside node range 1..{}", boundary, nb_nodes);
        return Err(AlignError::DimensionMismatch {
            what: "partition boundary (must be in 1..nb_nodes)",
            expected: nb_nodes,
            got: boundary,
        });
    }
    Ok((
        embedded.slice(s![0..boundary, ..]),
        embedded.slice(s![boundary.., ..]),
    ))
} // end of split_embedding

/// Extracts the alignment matrix from an embedding
pub struct AlignmentExtractor {
    params: AlignParams,
} // end of struct AlignmentExtractor

impl AlignmentExtractor {
    pub fn new(params: AlignParams) -> Self {
        AlignmentExtractor { params }
    }

    pub fn get_params(&self) -> &AlignParams {
        &self.params
    }

    /// computes the alignment matrix between nodes 0..boundary and nodes boundary..n
    pub fn extract(&self, embedded: &Embedded<f64>, boundary: usize) -> Result<AlignmentMatrix> {
        self.params.check()?;
        //
        let cpu_start = ProcessTime::now();
        let sys_start = SystemTime::now();
        //
        let (u1, u2) = split_embedding(embedded.get_embedded(), boundary)?;
        log::info!(
            "extracting alignment, nb nodes first graph : {}, second graph : {}, dimension : {}, numtop : {}",
            u1.nrows(),
            u2.nrows(),
            embedded.get_dimension(),
            self.params.get_numtop()
        );
        let matrix = if self.params.is_dense() {
            AlignmentMatrix::Dense(self.dense_scores(&u1, &u2))
        } else {
            let candidates = match self.params.get_search() {
                NeighbourSearch::Exact => self.exact_top_candidates(&u1, &u2),
                NeighbourSearch::Hnsw {
                    max_nb_connection,
                    ef_construction,
                    ef_search,
                } => {
                    let search = HnswSearch {
                        max_nb_connection,
                        ef_construction,
                        ef_search,
                    };
                    hnsw_top_candidates(
                        &u1,
                        &u2,
                        self.params.get_numtop(),
                        search,
                        self.params.get_measure(),
                        self.params.get_parallel(),
                    )
                }
            };
            AlignmentMatrix::Sparse(to_csr(&candidates, u2.nrows()))
        };
        log::info!(
            "alignment extracted, nb entries : {}, sys time(ms) {:?} cpu time(ms) {:?}",
            matrix.nnz(),
            sys_start.elapsed().map(|d| d.as_millis()).unwrap_or(0),
            cpu_start.elapsed().as_millis()
        );
        Ok(matrix)
    } // end of extract

    // all scores, each row computed independently
    fn dense_scores(&self, u1: &ArrayView2<f64>, u2: &ArrayView2<f64>) -> Array2<f64> {
        let measure = self.params.get_measure();
        let mut scores = Array2::<f64>::zeros((u1.nrows(), u2.nrows()));
        let fill_row = |i: usize, mut row: ndarray::ArrayViewMut1<f64>| {
            let ui = u1.row(i);
            for (j, x) in row.iter_mut().enumerate() {
                *x = score(measure, &ui, &u2.row(j));
            }
        };
        if self.params.get_parallel() {
            scores
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .enumerate()
                .for_each(|(i, row)| fill_row(i, row));
        } else {
            for (i, row) in scores.axis_iter_mut(Axis(0)).enumerate() {
                fill_row(i, row);
            }
        }
        scores
    } // end of dense_scores

    // exact candidates, kd-tree search when the score decreases with the L2 distance
    fn exact_top_candidates(&self, u1: &ArrayView2<f64>, u2: &ArrayView2<f64>) -> Vec<Vec<IndexedValue<f64>>> {
        match self.params.get_measure() {
            SimilarityMeasure::ExpDistance => self.kdtree_top_candidates(u1, u2),
            SimilarityMeasure::InnerProduct => self.scan_top_candidates(u1, u2),
        }
    }

    fn kdtree_top_candidates(&self, u1: &ArrayView2<f64>, u2: &ArrayView2<f64>) -> Vec<Vec<IndexedValue<f64>>> {
        let numtop = self.params.get_numtop();
        let tree = KdTree::new(u2.view());
        let query = |i: usize| -> Vec<IndexedValue<f64>> {
            let candidates: Vec<IndexedValue<f64>> = tree
                .nearest(&u1.row(i), numtop)
                .into_iter()
                .map(|(j, dist2)| IndexedValue(j, (-dist2.sqrt()).exp()))
                .collect();
            top_candidates(candidates, numtop)
        };
        if self.params.get_parallel() {
            (0..u1.nrows()).into_par_iter().map(query).collect()
        } else {
            (0..u1.nrows()).map(query).collect()
        }
    } // end of kdtree_top_candidates

    // full scan of u2 for each row of u1
    fn scan_top_candidates(&self, u1: &ArrayView2<f64>, u2: &ArrayView2<f64>) -> Vec<Vec<IndexedValue<f64>>> {
        let measure = self.params.get_measure();
        let numtop = self.params.get_numtop();
        let query = |i: usize| -> Vec<IndexedValue<f64>> {
            let ui = u1.row(i);
            let candidates: Vec<IndexedValue<f64>> = u2
                .outer_iter()
                .enumerate()
                .map(|(j, uj)| IndexedValue(j, score(measure, &ui, &uj)))
                .collect();
            top_candidates(candidates, numtop)
        };
        if self.params.get_parallel() {
            (0..u1.nrows()).into_par_iter().map(query).collect()
        } else {
            (0..u1.nrows()).map(query).collect()
        }
    } // end of scan_top_candidates
} // end of impl AlignmentExtractor

// assembles candidates rows in a csr matrix
fn to_csr(candidates: &[Vec<IndexedValue<f64>>], nb_cols: usize) -> CsMat<f64> {
    let nnz = candidates.iter().map(|c| c.len()).sum();
    let mut trimat = TriMat::<f64>::with_capacity((candidates.len(), nb_cols), nnz);
    for (i, row) in candidates.iter().enumerate() {
        for IndexedValue(j, v) in row {
            trimat.add_triplet(i, *j, *v);
        }
    }
    trimat.to_csr()
} // end of to_csr

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;
    use crate::embedding::l2_distance;
    use ndarray::arr2;
    use rand::distributions::{Distribution, Uniform};
    use rand_xoshiro::rand_core::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // 3 nodes in first graph, 4 in second. node 2 has 2 equally good candidates 1 and 3
    fn small_embedding() -> Embedded<f64> {
        let data = arr2(&[
            [0., 0.],
            [5., 5.],
            [1., 0.],
            // second graph
            [0., 0.1],
            [1., 1.],
            [5., 5.],
            [1., 2.],
        ]);
        Embedded::new(data, l2_distance)
    }

    #[test]
    fn test_split() {
        log_init_test();
        let embedded = small_embedding();
        let (u1, u2) = split_embedding(embedded.get_embedded(), 3).unwrap();
        assert_eq!(u1.nrows(), 3);
        assert_eq!(u2.nrows(), 4);
        assert_eq!(u2.row(0).to_vec(), vec![0., 0.1]);
        assert!(matches!(
            split_embedding(embedded.get_embedded(), 0),
            Err(AlignError::DimensionMismatch { .. })
        ));
        assert!(split_embedding(embedded.get_embedded(), 7).is_err());
        assert!(split_embedding(embedded.get_embedded(), 12).is_err());
    } // end of test_split

    #[test]
    fn test_exact_top_k() {
        log_init_test();
        let embedded = small_embedding();
        let extractor = AlignmentExtractor::new(AlignParams::new(2, SimilarityMeasure::ExpDistance, NeighbourSearch::Exact));
        let matrix = extractor.extract(&embedded, 3).unwrap();
        assert_eq!(matrix.shape(), (3, 4));
        assert_eq!(matrix.nnz(), 6);
        let row0 = matrix.row_candidates(0);
        assert_eq!(row0[0].0, 0);
        assert!((row0[0].1 - (-0.1f64).exp()).abs() < 1.0E-12);
        assert_eq!(matrix.row_candidates(1)[0], (2, 1.));
        // node 2 = (1,0) is at distance 1 of (1,1) and 1.0049 of (0, 0.1)
        assert_eq!(matrix.row_candidates(2)[0].0, 1);
        for i in 0..3 {
            let candidates = matrix.row_candidates(i);
            assert!(candidates.len() <= 2);
            assert!(candidates.iter().all(|c| c.1 >= 0.));
        }
        // entries not kept are 0.
        assert_eq!(matrix.get(1, 0), 0.);
    } // end of test_exact_top_k

    #[test]
    fn test_tie_break_lower_rank() {
        log_init_test();
        // first graph node 0 at equal distance from the 3 nodes of the second graph
        let data = arr2(&[[0., 0.], [1., 0.], [0., 1.], [-1., 0.]]);
        let embedded = Embedded::new(data, l2_distance);
        let extractor = AlignmentExtractor::new(AlignParams::new(2, SimilarityMeasure::ExpDistance, NeighbourSearch::Exact));
        let matrix = extractor.extract(&embedded, 1).unwrap();
        let candidates = matrix.row_candidates(0);
        assert_eq!(candidates.iter().map(|c| c.0).collect::<Vec<usize>>(), vec![0, 1]);
    } // end of test_tie_break_lower_rank

    #[test]
    fn test_dense_and_inner_product() {
        log_init_test();
        let embedded = small_embedding();
        let dense = AlignmentExtractor::new(AlignParams::new(0, SimilarityMeasure::ExpDistance, NeighbourSearch::Exact))
            .extract(&embedded, 3)
            .unwrap();
        assert!(matches!(dense, AlignmentMatrix::Dense(_)));
        assert_eq!(dense.nnz(), 12);
        assert_eq!(dense.get(1, 2), 1.);
        assert!(dense.to_dense().iter().all(|x| *x > 0. && *x <= 1.));
        // sparse top 4 equals dense
        let sparse = AlignmentExtractor::new(AlignParams::new(4, SimilarityMeasure::ExpDistance, NeighbourSearch::Exact))
            .extract(&embedded, 3)
            .unwrap();
        assert_eq!(sparse.to_dense(), dense.to_dense());
        //
        let data = arr2(&[[1., 0.], [-1., 0.], [2., 1.]]);
        let inner = AlignmentExtractor::new(AlignParams::new(0, SimilarityMeasure::InnerProduct, NeighbourSearch::Exact))
            .extract(&Embedded::new(data, l2_distance), 1)
            .unwrap();
        assert_eq!(inner.get(0, 0), 0.);
        assert_eq!(inner.get(0, 1), 2.);
    } // end of test_dense_and_inner_product

    #[test]
    fn test_parallel_equals_sequential() {
        log_init_test();
        let embedded = small_embedding();
        let mut params = AlignParams::new(2, SimilarityMeasure::ExpDistance, NeighbourSearch::Exact);
        let parallel = AlignmentExtractor::new(params).extract(&embedded, 3).unwrap();
        params.set_parallel(false);
        let sequential = AlignmentExtractor::new(params).extract(&embedded, 3).unwrap();
        assert_eq!(parallel.to_dense(), sequential.to_dense());
    }

    #[test]
    fn test_kdtree_search_equals_scan() {
        log_init_test();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(91);
        let unif = Uniform::<f64>::new(0., 1.);
        let data = Array2::<f64>::from_shape_fn((230, 6), |_| unif.sample(&mut rng));
        let embedded = Embedded::new(data, l2_distance);
        let (u1, u2) = split_embedding(embedded.get_embedded(), 80).unwrap();
        let extractor = AlignmentExtractor::new(AlignParams::new(7, SimilarityMeasure::ExpDistance, NeighbourSearch::Exact));
        let by_tree = extractor.kdtree_top_candidates(&u1, &u2);
        let by_scan = extractor.scan_top_candidates(&u1, &u2);
        assert_eq!(by_tree.len(), 80);
        for (t, s) in by_tree.iter().zip(by_scan.iter()) {
            assert_eq!(t.len(), 7);
            assert_eq!(t.iter().map(|c| c.0).collect::<Vec<usize>>(), s.iter().map(|c| c.0).collect::<Vec<usize>>());
            for (ct, cs) in t.iter().zip(s.iter()) {
                assert_eq!(ct.1, cs.1);
            }
        }
        // 2 extractions give the same matrix
        let m1 = extractor.extract(&embedded, 80).unwrap();
        let m2 = extractor.extract(&embedded, 80).unwrap();
        assert_eq!(m1.to_dense(), m2.to_dense());
    } // end of test_kdtree_search_equals_scan

    #[test]
    fn test_hnsw_agrees_with_exact() {
        log_init_test();
        // points on a grid, the second graph is a slightly shifted copy of the first
        let n = 50;
        let mut data = Array2::<f64>::zeros((2 * n, 3));
        for i in 0..n {
            let x = (i % 10) as f64;
            let y = (i / 10) as f64;
            data[[i, 0]] = x;
            data[[i, 1]] = y;
            data[[i, 2]] = 0.;
            data[[n + i, 0]] = x + 0.01;
            data[[n + i, 1]] = y;
            data[[n + i, 2]] = 0.01;
        }
        let embedded = Embedded::new(data, l2_distance);
        let params = AlignParams::new(1, SimilarityMeasure::ExpDistance, NeighbourSearch::default_hnsw());
        let matrix = AlignmentExtractor::new(params).extract(&embedded, n).unwrap();
        let mut nb_found = 0;
        for i in 0..n {
            let candidates = matrix.row_candidates(i);
            assert!(candidates.len() <= 1);
            if candidates.first().map(|c| c.0) == Some(i) {
                nb_found += 1;
            }
        }
        assert!(nb_found >= 45);
        // hnsw requires the distance based score
        let bad = AlignParams::new(1, SimilarityMeasure::InnerProduct, NeighbourSearch::default_hnsw());
        assert!(AlignmentExtractor::new(bad).extract(&embedded, n).is_err());
    } // end of test_hnsw_agrees_with_exact
} // end of mod tests
