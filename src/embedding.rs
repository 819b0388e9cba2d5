//! Describes the Embedded vectors.
//!
//! Embedded vectors are described by an Array2\<F\>, each row corresponds to a node, identified by its rank
//! in the combined graph.
//! F is a floating point type, f64 for the landmark embedding.
//!
//! The embedded vectors come with the distance used to compare them in embedded space.

use ndarray::{Array2, ArrayView1};

use crate::error::AlignError;

/// to represent the distance in embedded space between 2 vectors
pub type Distance<F> = fn(&[F], &[F]) -> f64;

/// The Embedded trait. It defines the interface satisfied by embedded data.
/// In our implementations the embedded data are stored in Array2 and embedded node
/// are identified by their rank.
/// F is the type contained in embedded vectors
pub trait EmbeddedT<F> {
    /// get dimension of vectors of the Embedded
    fn get_dimension(&self) -> usize;
    /// get distance in embedded space between node1 and node2, identified by their rank.
    fn get_noderank_distance(&self, node_rank1: usize, node_rank2: usize) -> f64;
    /// the trait provides a function distance between embedded items.
    fn get_vec_distance(&self, from: &[F], to: &[F]) -> f64;
    /// get number of nodes
    fn get_nb_nodes(&self) -> usize;
    /// get embedding of node of rank rank
    fn get_embedded_node(&self, node_rank: usize) -> ArrayView1<F>;
    /// Returns the distance function f (a pointer to) used for computing distances in the embedding.
    fn get_distance(&self) -> fn(&[F], &[F]) -> f64;
} // end of trait

/// L2 distance between 2 vectors of f64
pub fn l2_distance(v1: &[f64], v2: &[f64]) -> f64 {
    assert_eq!(v1.len(), v2.len());
    v1.iter()
        .zip(v2.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt()
} // end of l2_distance

/// represent embedded data, one row by node.
#[derive(Clone, Debug)]
pub struct Embedded<F> {
    /// array (n,d) with n number of data, d dimension of Embedded
    data: Array2<F>,
    /// distance between vectors in embedded space. helps to implement trait [EmbeddedT\<F\>]
    distance: Distance<F>,
} // end of Embedded

impl<F> Embedded<F> {
    // fills embedded vectors with the appropriate distance function
    pub fn new(arr: Array2<F>, distance: Distance<F>) -> Self {
        Embedded {
            data: arr,
            distance,
        }
    }

    /// get the embedded vectors
    pub fn get_embedded(&self) -> &Array2<F> {
        &self.data
    }

    /// get reference to distance function
    pub fn get_distance_ref(&self) -> &fn(&[F], &[F]) -> f64 {
        &self.distance
    }
} // end of impl Embedded

impl<F: Clone> EmbeddedT<F> for Embedded<F> {
    /// get dimension of Embedded. (row size of Array)
    fn get_dimension(&self) -> usize {
        self.data.dim().1
    }

    /// computes the distance in embedded space between 2 vectors
    /// dimensions must be equal to Embedded dimension
    fn get_vec_distance(&self, data1: &[F], data2: &[F]) -> f64 {
        assert_eq!(data1.len(), self.get_dimension());
        (self.distance)(data1, data2)
    }

    /// get distance between nodes identified by their rank!
    fn get_noderank_distance(&self, node1: usize, node2: usize) -> f64 {
        let row1 = self.data.row(node1);
        let row2 = self.data.row(node2);
        match (row1.as_slice(), row2.as_slice()) {
            (Some(s1), Some(s2)) => (self.distance)(s1, s2),
            _ => (self.distance)(&row1.to_vec(), &row2.to_vec()),
        }
    }

    /// return number of nodes
    fn get_nb_nodes(&self) -> usize {
        self.data.dim().0
    }

    fn get_embedded_node(&self, node_rank: usize) -> ArrayView1<F> {
        self.data.row(node_rank)
    }

    /// get distance function
    fn get_distance(&self) -> fn(&[F], &[F]) -> f64 {
        self.distance
    }
} // end impl EmbeddedT<F>

//====================================================================================

/// The trait EmbedderT is something whose method embed has as output something satisfying the trait EmbeddedT\<F\>.
/// F is the type contained in embedded vectors , mostly f64, f32.
pub trait EmbedderT<F> {
    type Output: EmbeddedT<F>;
    ///
    fn embed(&mut self) -> Result<Self::Output, AlignError>;
} // end of trait EmbedderT<F>

#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_embedded_distance() {
        let embedded = Embedded::new(arr2(&[[0., 0.], [3., 4.], [1., 0.]]), l2_distance);
        assert_eq!(embedded.get_nb_nodes(), 3);
        assert_eq!(embedded.get_dimension(), 2);
        assert!((embedded.get_noderank_distance(0, 1) - 5.).abs() < 1.0E-12);
        assert!((embedded.get_vec_distance(&[1., 0.], &[3., 4.]) - 20.0f64.sqrt()).abs() < 1.0E-12);
        assert_eq!(embedded.get_embedded_node(2).to_vec(), vec![1., 0.]);
    }
} // end of mod tests
