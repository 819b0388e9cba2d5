//! Landmark based embedding of structural identities.
//!
//! We sample k landmark nodes, compute the combined similarity C (n,k) of every node to every landmark
//! and W (k,k) among landmarks. The embedding is $U = C (W^{+})^{1/2}$ (see [nystrom]) so that
//! $U U^{t}$ approximates the full similarity matrix, which is never computed.
//!
//! For landmarks the approximation is exact (up to the ridge if W had to be regularized), for other
//! nodes its quality depends on how well landmarks cover the structural diversity of the graph.
//!
//! Landmarks are sampled with a seeded generator so that an embedding is reproducible.

pub mod params;

pub mod nystrom;

use ndarray::{Array2, Axis};
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};

use std::time::SystemTime;
use cpu_time::ProcessTime;

use crate::embedding::{l2_distance, Embedded, EmbedderT};
use crate::error::{AlignError, Result};
use crate::features::Signatures;
use crate::graph::AlignGraph;
use crate::kernel::SimilarityKernel;
use crate::tools::degrees::{sample_nodes_by_degrees, sample_nodes_uniform};

use self::nystrom::{pseudo_inverse_sqrt, regularized_pseudo_inverse_sqrt, LandmarkFactor};
use self::params::{LandmarkSampling, RepParams};

/// returns the sorted landmark ranks of a graph
pub fn select_landmarks(graph: &AlignGraph, params: &RepParams) -> Result<Vec<usize>> {
    let nb_nodes = graph.nb_nodes();
    let nb_landmarks = params.get_landmarks().count(nb_nodes);
    let landmarks = match params.get_sampling() {
        LandmarkSampling::Uniform => sample_nodes_uniform(nb_nodes, nb_landmarks, params.get_seed()),
        LandmarkSampling::DegreeWeighted => {
            sample_nodes_by_degrees(&graph.degrees(), nb_landmarks, params.get_seed())?
        }
    };
    log::debug!("landmarks : {:?}", landmarks);
    Ok(landmarks)
} // end of select_landmarks

/// Computes the landmark embedding of a graph from its node signatures.
pub struct LandmarkEmbedder<'a> {
    graph: &'a AlignGraph,
    signatures: &'a Signatures,
    params: RepParams,
    /// landmarks used by last embedding
    landmarks: Option<Vec<usize>>,
    /// factor used by last embedding
    factor: Option<LandmarkFactor>,
} // end of struct LandmarkEmbedder

impl<'a> LandmarkEmbedder<'a> {
    pub fn new(graph: &'a AlignGraph, signatures: &'a Signatures, params: RepParams) -> Self {
        LandmarkEmbedder {
            graph,
            signatures,
            params,
            landmarks: None,
            factor: None,
        }
    }

    /// landmarks of the last embedding
    pub fn get_landmarks(&self) -> Option<&Vec<usize>> {
        self.landmarks.as_ref()
    }

    /// factorization of the landmark matrix in the last embedding
    pub fn get_factor(&self) -> Option<&LandmarkFactor> {
        self.factor.as_ref()
    }

    /// (nb_nodes, nb_landmarks) similarities of each node to each landmark
    pub fn similarity_to_landmarks(&self, landmarks: &[usize]) -> Array2<f64> {
        let kernel = SimilarityKernel::new(self.graph, self.signatures, &self.params);
        let mut c = Array2::<f64>::zeros((self.graph.nb_nodes(), landmarks.len()));
        let fill_row = |i: usize, mut row: ndarray::ArrayViewMut1<f64>| {
            for (j, l) in landmarks.iter().enumerate() {
                row[j] = kernel.similarity(i, *l);
            }
        };
        if self.params.get_parallel() {
            c.axis_iter_mut(Axis(0))
                .into_par_iter()
                .enumerate()
                .for_each(|(i, row)| fill_row(i, row));
        } else {
            for (i, row) in c.axis_iter_mut(Axis(0)).enumerate() {
                fill_row(i, row);
            }
        }
        c
    } // end of similarity_to_landmarks

    // plain pseudo inverse, or ridge regularized one if the landmark matrix is singular
    fn factorize(&self, w: &Array2<f64>) -> Result<LandmarkFactor> {
        let tolerance = self.params.get_eigen_tolerance();
        match pseudo_inverse_sqrt(w, tolerance) {
            Ok(factor) => Ok(factor),
            Err(err) if err.is_recoverable() => {
                log::warn!("{}, using regularized pseudo inverse", err);
                Ok(regularized_pseudo_inverse_sqrt(w, tolerance, self.params.get_ridge()))
            }
            Err(err) => Err(err),
        }
    } // end of factorize
} // end of impl LandmarkEmbedder

impl<'a> EmbedderT<f64> for LandmarkEmbedder<'a> {
    type Output = Embedded<f64>;

    fn embed(&mut self) -> std::result::Result<Embedded<f64>, AlignError> {
        //
        let cpu_start = ProcessTime::now();
        let sys_start = SystemTime::now();
        //
        if self.signatures.get_nb_nodes() != self.graph.nb_nodes() {
            return Err(AlignError::DimensionMismatch {
                what: "signature rows",
                expected: self.graph.nb_nodes(),
                got: self.signatures.get_nb_nodes(),
            });
        }
        let landmarks = select_landmarks(self.graph, &self.params)?;
        log::info!("embedding with {} landmarks", landmarks.len());
        let c = self.similarity_to_landmarks(&landmarks);
        // landmark rows of c
        let w = c.select(Axis(0), &landmarks);
        let factor = self.factorize(&w)?;
        let mut u = c.dot(factor.get_factor());
        if self.params.get_row_normalize() {
            for mut row in u.axis_iter_mut(Axis(0)) {
                let norm = row.dot(&row).sqrt();
                if norm > 0. {
                    row.mapv_inplace(|x| x / norm);
                }
            }
        }
        log::info!(
            "landmark embedding done, dimension {}, rank {}, sys time(ms) {:?} cpu time(ms) {:?}",
            u.ncols(),
            factor.get_rank(),
            sys_start.elapsed().map(|d| d.as_millis()).unwrap_or(0),
            cpu_start.elapsed().as_millis()
        );
        self.landmarks = Some(landmarks);
        self.factor = Some(factor);
        Ok(Embedded::new(u, l2_distance))
    } // end of embed
} // end of impl EmbedderT

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;
    use crate::embed::params::LandmarkCount;
    use crate::embedding::EmbeddedT;
    use crate::features::FeatureExtractor;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // a graph whose nodes have pairwise distinct signatures : path 0-1-2 with a triangle 2-3-4 and a tail 4-5-6-7
    fn asymetric_graph() -> AlignGraph {
        let edges = [(0, 1), (1, 2), (2, 3), (3, 4), (4, 2), (4, 5), (5, 6), (6, 7)];
        AlignGraph::from_edges(8, &edges, None).unwrap()
    }

    #[test]
    fn test_landmark_reconstruction() {
        log_init_test();
        let graph = asymetric_graph();
        let mut params = RepParams::new(Some(2), 0.5, LandmarkCount::Fixed(5), None);
        params.set_sampling(LandmarkSampling::Uniform, 17);
        let signatures = FeatureExtractor::new(&graph, params).extract();
        let mut embedder = LandmarkEmbedder::new(&graph, &signatures, params);
        let embedded = embedder.embed().unwrap();
        assert_eq!(embedded.get_nb_nodes(), 8);
        assert_eq!(embedded.get_dimension(), 5);
        let landmarks = embedder.get_landmarks().unwrap().clone();
        assert_eq!(landmarks.len(), 5);
        // signatures are pairwise distinct, the landmark matrix is definite
        let factor = embedder.get_factor().unwrap();
        assert!(!factor.is_regularized());
        assert_eq!(factor.get_rank(), 5);
        let kernel = SimilarityKernel::new(&graph, &signatures, &params);
        let u = embedded.get_embedded();
        // U U^t restricted to landmarks is W
        for &l1 in &landmarks {
            for &l2 in &landmarks {
                let approx = u.row(l1).dot(&u.row(l2));
                assert!((approx - kernel.similarity(l1, l2)).abs() < 1.0E-8);
            }
            assert!((u.row(l1).dot(&u.row(l1)) - 1.).abs() < 1.0E-8);
        }
    } // end of test_landmark_reconstruction

    #[test]
    fn test_embedding_reproducible() {
        log_init_test();
        let graph = asymetric_graph();
        let mut params = RepParams::new(Some(3), 0.1, LandmarkCount::Fixed(4), Some(2.));
        params.set_sampling(LandmarkSampling::DegreeWeighted, 5);
        let signatures = FeatureExtractor::new(&graph, params).extract();
        let e1 = LandmarkEmbedder::new(&graph, &signatures, params).embed().unwrap();
        let e2 = LandmarkEmbedder::new(&graph, &signatures, params).embed().unwrap();
        assert_eq!(e1.get_embedded(), e2.get_embedded());
        params.set_parallel(false);
        let e3 = LandmarkEmbedder::new(&graph, &signatures, params).embed().unwrap();
        assert_eq!(e1.get_embedded(), e3.get_embedded());
    } // end of test_embedding_reproducible

    #[test]
    fn test_identical_landmarks_use_ridge() {
        log_init_test();
        // a cycle : all nodes are structurally identical, W is the all ones matrix
        let edges: Vec<(usize, usize)> = (0..6).map(|i| (i, (i + 1) % 6)).collect();
        let graph = AlignGraph::from_edges(6, &edges, None).unwrap();
        let mut params = RepParams::new(Some(2), 0.5, LandmarkCount::Fixed(3), Some(2.));
        params.set_row_normalize(true);
        let signatures = FeatureExtractor::new(&graph, params).extract();
        let mut embedder = LandmarkEmbedder::new(&graph, &signatures, params);
        let embedded = embedder.embed().unwrap();
        assert!(embedder.get_factor().unwrap().is_regularized());
        let u = embedded.get_embedded();
        for i in 0..6 {
            assert!(u.row(i).iter().all(|x| x.is_finite()));
            assert!((u.row(i).dot(&u.row(i)) - 1.).abs() < 1.0E-10);
            assert!(embedded.get_noderank_distance(0, i) < 1.0E-10);
        }
    } // end of test_identical_landmarks_use_ridge
} // end of mod tests
