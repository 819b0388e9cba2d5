//! The combined graph on which structural identities are computed.
//!
//! The graph is undirected, unweighted and stored as a compressed row matrix (crate sprs).
//! Nodes are identified by their rank in 0..nb_nodes. When two graphs are to be aligned they are
//! merged in one graph, the first one occupying ranks 0..boundary, the second boundary..nb_nodes.
//!
//! Optional node attributes are given as an (nb_nodes, nb_attributes) array, row i describing node i.

use ahash::AHashSet;
use ndarray::{Array2, ArrayView1, Axis};
use sprs::CsMatI;

use crate::error::{AlignError, Result};
use crate::tools::degrees::log_degree_quantiles;

/// Undirected graph in csr format with optional node attributes.
#[derive(Clone, Debug)]
pub struct AlignGraph {
    /// symetric adjacency matrix, no self loop, one entry per edge direction
    csrmat: CsMatI<f64, usize>,
    /// (nb_nodes, nb_attributes) array
    attributes: Option<Array2<f64>>,
} // end of struct AlignGraph

impl AlignGraph {
    /// builds the graph from a list of undirected edges given as pairs of node ranks.
    /// Self loops and multiple edges are dropped. Each edge must have its ends in 0..nb_nodes.
    pub fn from_edges(nb_nodes: usize, edges: &[(usize, usize)], attributes: Option<Array2<f64>>) -> Result<Self> {
        let mut adjacency = vec![Vec::<usize>::new(); nb_nodes];
        for &(i, j) in edges {
            if i >= nb_nodes || j >= nb_nodes {
                log::error!("edge ({}, {}) out of node range 0..{}", i, j, nb_nodes);
                return Err(AlignError::InvalidGraph(format!(
                    "edge ({i}, {j}) has an end out of range 0..{nb_nodes}"
                )));
            }
            if i != j {
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }
        Self::from_adjacency(adjacency, attributes)
    } // end of from_edges

    /// builds the graph from adjacency lists, adjacency\[i\] being the neighbours of node i.
    /// Lists are symetrized so that a neighbourhood given in one direction is enough.
    pub fn from_adjacency(mut adjacency: Vec<Vec<usize>>, attributes: Option<Array2<f64>>) -> Result<Self> {
        let nb_nodes = adjacency.len();
        if nb_nodes == 0 {
            return Err(AlignError::InvalidGraph(String::from("graph has no node")));
        }
        if let Some(attributes) = &attributes {
            if attributes.nrows() != nb_nodes {
                log::error!(
                    "attributes have {} rows for {} nodes",
                    attributes.nrows(),
                    nb_nodes
                );
                return Err(AlignError::DimensionMismatch {
                    what: "attribute rows",
                    expected: nb_nodes,
                    got: attributes.nrows(),
                });
            }
        }
        // symetrize
        let mut reverse = Vec::<(usize, usize)>::new();
        for (i, neighbours) in adjacency.iter().enumerate() {
            for &j in neighbours {
                if j >= nb_nodes {
                    return Err(AlignError::InvalidGraph(format!(
                        "neighbour {j} of node {i} out of range 0..{nb_nodes}"
                    )));
                }
                reverse.push((j, i));
            }
        }
        for (j, i) in reverse {
            adjacency[j].push(i);
        }
        //
        let mut indptr = Vec::<usize>::with_capacity(nb_nodes + 1);
        let mut indices = Vec::<usize>::new();
        indptr.push(0);
        for (i, neighbours) in adjacency.iter_mut().enumerate() {
            neighbours.retain(|j| *j != i);
            neighbours.sort_unstable();
            neighbours.dedup();
            indices.extend_from_slice(neighbours);
            indptr.push(indices.len());
        }
        let data = vec![1.; indices.len()];
        let csrmat = CsMatI::<f64, usize>::new((nb_nodes, nb_nodes), indptr, indices, data);
        let graph = AlignGraph { csrmat, attributes };
        log::info!(
            "graph built, nb nodes : {}, nb edges : {}, max degree : {}",
            graph.nb_nodes(),
            graph.nb_edges(),
            graph.max_degree()
        );
        if log::log_enabled!(log::Level::Info) {
            // quantiles are informative only
            let _ = log_degree_quantiles(&graph.degrees());
        }
        Ok(graph)
    } // end of from_adjacency

    /// merges two graphs in one. Nodes of `second` are shifted by first.nb_nodes().
    /// Returns the combined graph and the boundary (first rank of the second graph).
    /// Attributes must be present in both graphs or in none.
    pub fn merge(first: &AlignGraph, second: &AlignGraph) -> Result<(AlignGraph, usize)> {
        let boundary = first.nb_nodes();
        let nb_nodes = boundary + second.nb_nodes();
        let mut adjacency = Vec::<Vec<usize>>::with_capacity(nb_nodes);
        for i in 0..first.nb_nodes() {
            adjacency.push(first.neighbours(i).to_vec());
        }
        for i in 0..second.nb_nodes() {
            adjacency.push(second.neighbours(i).iter().map(|j| j + boundary).collect());
        }
        let attributes = match (first.get_attributes(), second.get_attributes()) {
            (None, None) => None,
            (Some(a1), Some(a2)) => {
                if a1.ncols() != a2.ncols() {
                    return Err(AlignError::DimensionMismatch {
                        what: "attribute columns",
                        expected: a1.ncols(),
                        got: a2.ncols(),
                    });
                }
                let stacked = ndarray::concatenate(Axis(0), &[a1.view(), a2.view()]).map_err(|e| {
                    AlignError::InvalidGraph(format!("cannot stack attributes : {e}"))
                })?;
                Some(stacked)
            }
            _ => {
                return Err(AlignError::InvalidGraph(String::from(
                    "attributes given for one graph only",
                )));
            }
        };
        let merged = Self::from_adjacency(adjacency, attributes)?;
        Ok((merged, boundary))
    } // end of merge

    /// number of nodes
    pub fn nb_nodes(&self) -> usize {
        self.csrmat.rows()
    }

    /// number of undirected edges
    pub fn nb_edges(&self) -> usize {
        self.csrmat.nnz() / 2
    }

    /// neighbours of a node, sorted by increasing rank
    pub fn neighbours(&self, node: usize) -> &[usize] {
        let range = self.csrmat.indptr().outer_inds_sz(node);
        &self.csrmat.indices()[range]
    }

    pub fn degree(&self, node: usize) -> usize {
        self.csrmat.indptr().nnz_in_outer_sz(node)
    }

    /// degrees of all nodes
    pub fn degrees(&self) -> Vec<usize> {
        (0..self.nb_nodes()).map(|i| self.degree(i)).collect()
    }

    pub fn max_degree(&self) -> usize {
        (0..self.nb_nodes()).map(|i| self.degree(i)).max().unwrap_or(0)
    }

    /// attributes array if any
    pub fn get_attributes(&self) -> Option<&Array2<f64>> {
        self.attributes.as_ref()
    }

    /// attributes of a node if the graph has attributes
    pub fn get_node_attributes(&self, node: usize) -> Option<ArrayView1<f64>> {
        self.attributes.as_ref().map(|a| a.row(node))
    }

    /// get a reference to the adjacency matrix
    pub fn get_csrmat(&self) -> &CsMatI<f64, usize> {
        &self.csrmat
    }

    /// Returns the successive frontiers of a breadth first search from node.
    /// frontiers\[k\] is the set of nodes at distance exactly k from node, so frontiers\[0\] is \[node\].
    /// The search stops after max_layer hops or at the first empty frontier, so the returned vector
    /// can be shorter than max_layer + 1. Each frontier is sorted.
    pub fn frontiers(&self, node: usize, max_layer: usize) -> Vec<Vec<usize>> {
        let mut visited = AHashSet::<usize>::new();
        visited.insert(node);
        let mut frontiers = Vec::<Vec<usize>>::new();
        let mut current = vec![node];
        for _ in 0..max_layer {
            let mut next = Vec::<usize>::new();
            for &u in &current {
                for &v in self.neighbours(u) {
                    if visited.insert(v) {
                        next.push(v);
                    }
                }
            }
            frontiers.push(current);
            if next.is_empty() {
                return frontiers;
            }
            next.sort_unstable();
            current = next;
        }
        frontiers.push(current);
        frontiers
    } // end of frontiers

    /// nodes at hop distance exactly k from node (not less than k). Empty if no such node.
    pub fn k_hop_frontier(&self, node: usize, k: usize) -> Vec<usize> {
        let mut frontiers = self.frontiers(node, k);
        if frontiers.len() > k {
            frontiers.swap_remove(k)
        } else {
            Vec::new()
        }
    } // end of k_hop_frontier
} // end of impl AlignGraph

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // 0 - 1 - 2 - 3 and 4 isolated
    fn path_and_isolated() -> AlignGraph {
        AlignGraph::from_edges(5, &[(0, 1), (1, 2), (2, 3)], None).unwrap()
    }

    #[test]
    fn test_degrees_and_neighbours() {
        log_init_test();
        let graph = AlignGraph::from_edges(4, &[(0, 1), (1, 0), (1, 2), (2, 2), (1, 3)], None).unwrap();
        assert_eq!(graph.nb_nodes(), 4);
        assert_eq!(graph.nb_edges(), 3);
        assert_eq!(graph.neighbours(1), &[0, 2, 3]);
        assert_eq!(graph.degrees(), vec![1, 3, 1, 1]);
        assert_eq!(graph.max_degree(), 3);
    } // end of test_degrees_and_neighbours

    #[test]
    fn test_exact_frontiers() {
        log_init_test();
        let graph = path_and_isolated();
        assert_eq!(graph.k_hop_frontier(0, 0), vec![0]);
        assert_eq!(graph.k_hop_frontier(0, 1), vec![1]);
        assert_eq!(graph.k_hop_frontier(0, 2), vec![2]);
        assert_eq!(graph.k_hop_frontier(1, 1), vec![0, 2]);
        // node 1 is at distance 1 from 2, not 3
        assert_eq!(graph.k_hop_frontier(2, 2), vec![0]);
        assert!(graph.k_hop_frontier(0, 4).is_empty());
        assert_eq!(graph.frontiers(4, 10), vec![vec![4]]);
    } // end of test_exact_frontiers

    #[test]
    fn test_cycle_frontier_does_not_revisit() {
        log_init_test();
        let graph = AlignGraph::from_edges(4, &[(0, 1), (1, 2), (2, 3), (3, 0)], None).unwrap();
        let frontiers = graph.frontiers(0, 5);
        assert_eq!(frontiers, vec![vec![0], vec![1, 3], vec![2]]);
    }

    #[test]
    fn test_bad_edge() {
        log_init_test();
        let res = AlignGraph::from_edges(3, &[(0, 3)], None);
        assert!(matches!(res, Err(AlignError::InvalidGraph(_))));
    }

    #[test]
    fn test_attribute_rows_mismatch() {
        log_init_test();
        let attributes = Array2::<f64>::zeros((2, 3));
        let res = AlignGraph::from_edges(3, &[(0, 1)], Some(attributes));
        assert_eq!(
            res.err(),
            Some(AlignError::DimensionMismatch {
                what: "attribute rows",
                expected: 3,
                got: 2
            })
        );
    } // end of test_attribute_rows_mismatch

    #[test]
    fn test_merge() {
        log_init_test();
        let g1 = AlignGraph::from_edges(3, &[(0, 1), (1, 2)], Some(Array2::<f64>::zeros((3, 2)))).unwrap();
        let g2 = AlignGraph::from_edges(2, &[(0, 1)], Some(Array2::<f64>::ones((2, 2)))).unwrap();
        let (merged, boundary) = AlignGraph::merge(&g1, &g2).unwrap();
        assert_eq!(boundary, 3);
        assert_eq!(merged.nb_nodes(), 5);
        assert_eq!(merged.neighbours(3), &[4]);
        assert_eq!(merged.neighbours(1), &[0, 2]);
        let attributes = merged.get_attributes().unwrap();
        assert_eq!(attributes.dim(), (5, 2));
        assert_eq!(attributes[[4, 1]], 1.);
        assert_eq!(attributes[[0, 1]], 0.);
        //
        let g3 = AlignGraph::from_edges(2, &[(0, 1)], None).unwrap();
        assert!(AlignGraph::merge(&g1, &g3).is_err());
    } // end of test_merge
} // end of mod tests
