//! Similarity between nodes.
//!
//! The structural similarity between nodes i and j with signatures $s_i$ and $s_j$ is
//! exp(-sum_l alpha^l * |s_i\[l\] - s_j\[l\]|_1), 1. for identical signatures.
//! The attribute similarity is the fraction of attributes on which the 2 nodes agree.
//! They are combined as gamma_struc * structural + gamma_attr * attribute.
//!
//! The combined similarity is only evaluated between nodes and landmarks, see [crate::embed].

use ndarray::ArrayView1;

use crate::embed::params::RepParams;
use crate::features::Signatures;
use crate::graph::AlignGraph;
use crate::tools::jaccard::jaccard_distance;

/// Computes similarities between nodes of a graph from their signatures and attributes.
pub struct SimilarityKernel<'a> {
    signatures: &'a Signatures,
    attributes: Option<&'a ndarray::Array2<f64>>,
    /// alpha^l for each layer
    layer_weights: Vec<f64>,
    gamma_struc: f64,
    gamma_attr: f64,
} // end of struct SimilarityKernel

impl<'a> SimilarityKernel<'a> {
    pub fn new(graph: &'a AlignGraph, signatures: &'a Signatures, params: &RepParams) -> Self {
        let alpha = params.get_alpha();
        let mut layer_weights = Vec::<f64>::with_capacity(signatures.get_nb_layers());
        let mut w = 1.;
        for _ in 0..signatures.get_nb_layers() {
            layer_weights.push(w);
            w *= alpha;
        }
        SimilarityKernel {
            signatures,
            attributes: graph.get_attributes(),
            layer_weights,
            gamma_struc: params.get_gamma_struc(),
            gamma_attr: params.get_gamma_attr(),
        }
    } // end of new

    /// true if attributes contribute to the similarity
    pub fn has_attributes(&self) -> bool {
        self.attributes.is_some()
    }

    /// exponential of the decayed sum of L1 distances between layers. In ]0., 1.]
    pub fn structural_similarity(&self, sig_i: &ArrayView1<f64>, sig_j: &ArrayView1<f64>) -> f64 {
        assert_eq!(sig_i.len(), sig_j.len());
        let width = self.signatures.get_width();
        let mut dist = 0.;
        for (l, weight) in self.layer_weights.iter().enumerate() {
            let layer_dist: f64 = (l * width..(l + 1) * width)
                .map(|k| (sig_i[k] - sig_j[k]).abs())
                .sum();
            dist += weight * layer_dist;
        }
        (-dist).exp()
    } // end of structural_similarity

    /// fraction of equal attributes, in \[0., 1.\]
    pub fn attribute_similarity(&self, attr_i: &ArrayView1<f64>, attr_j: &ArrayView1<f64>) -> f64 {
        1. - jaccard_distance(attr_i, attr_j)
    }

    /// combined similarity of 2 nodes given their rank.
    /// Without attributes the attribute term is absent.
    pub fn similarity(&self, i: usize, j: usize) -> f64 {
        let mut sim = self.gamma_struc
            * self.structural_similarity(&self.signatures.signature(i), &self.signatures.signature(j));
        if let Some(attributes) = self.attributes {
            sim += self.gamma_attr * self.attribute_similarity(&attributes.row(i), &attributes.row(j));
        }
        sim
    } // end of similarity

    /// maximal value of the combined similarity, reached for identical nodes
    pub fn max_similarity(&self) -> f64 {
        if self.has_attributes() {
            self.gamma_struc + self.gamma_attr
        } else {
            self.gamma_struc
        }
    }
} // end of impl SimilarityKernel

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;
    use crate::embed::params::LandmarkCount;
    use crate::features::FeatureExtractor;
    use ndarray::arr2;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_self_similarity_is_max() {
        log_init_test();
        let graph = AlignGraph::from_edges(6, &[(0, 1), (1, 2), (2, 3), (0, 4)], None).unwrap();
        let params = RepParams::new(Some(3), 0.3, LandmarkCount::Fixed(2), Some(2.));
        let signatures = FeatureExtractor::new(&graph, params).extract();
        let kernel = SimilarityKernel::new(&graph, &signatures, &params);
        for i in 0..graph.nb_nodes() {
            let sig = signatures.signature(i);
            assert_eq!(kernel.structural_similarity(&sig, &sig), 1.);
            assert_eq!(kernel.similarity(i, i), kernel.max_similarity());
            for j in 0..graph.nb_nodes() {
                let s = kernel.similarity(i, j);
                assert!(s > 0. && s <= 1.);
                assert_eq!(s, kernel.similarity(j, i));
            }
        }
    } // end of test_self_similarity_is_max

    #[test]
    fn test_layer_decay() {
        log_init_test();
        // 0-1-2 path and 3-4-5-6 path : 0 and 3 differ only from layer 2 on
        let graph = AlignGraph::from_edges(7, &[(0, 1), (1, 2), (3, 4), (4, 5), (5, 6)], None).unwrap();
        let mut params = RepParams::new(Some(2), 0.1, LandmarkCount::Fixed(2), None);
        params.set_normalize(false);
        let signatures = FeatureExtractor::new(&graph, params).extract();
        let kernel = SimilarityKernel::new(&graph, &signatures, &params);
        // layer 2 of node 0 is {2} of degree 1, of node 3 is {5} of degree 2 : L1 distance 2
        let expected = (-0.01 * 2.0f64).exp();
        assert!((kernel.similarity(0, 3) - expected).abs() < 1.0E-12);
        // a layer 1 difference weighs more : 0 (layer 1 : degree 2) vs 2 (layer 1 : degree 2)
        // are identical, but 0 vs 1 differs at layer 0 already
        assert!(kernel.similarity(0, 1) < kernel.similarity(0, 3));
        assert_eq!(kernel.similarity(0, 2), 1.);
    } // end of test_layer_decay

    #[test]
    fn test_attributes_discriminate() {
        log_init_test();
        // two identical edges, attributes separate node 0 from node 1
        let attributes = arr2(&[[1., 0.], [0., 0.], [1., 0.], [0., 0.]]);
        let graph = AlignGraph::from_edges(4, &[(0, 1), (2, 3)], Some(attributes)).unwrap();
        let mut params = RepParams::new(Some(1), 0.5, LandmarkCount::Fixed(2), Some(2.));
        params.set_gammas(1., 0.);
        let signatures = FeatureExtractor::new(&graph, params).extract();
        let kernel = SimilarityKernel::new(&graph, &signatures, &params);
        let matching_before = kernel.similarity(0, 2);
        let mismatching_before = kernel.similarity(0, 3);
        assert_eq!(matching_before, mismatching_before);
        //
        params.set_gammas(1., 1.);
        let kernel = SimilarityKernel::new(&graph, &signatures, &params);
        let matching = kernel.similarity(0, 2);
        let mismatching = kernel.similarity(0, 3);
        assert!(matching - mismatching > matching_before - mismatching_before);
        assert_eq!(kernel.attribute_similarity(&graph.get_node_attributes(0).unwrap(), &graph.get_node_attributes(3).unwrap()), 0.5);
    } // end of test_attributes_discriminate
} // end of mod tests
