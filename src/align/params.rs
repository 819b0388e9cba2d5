//! Parameters of the alignment extraction

use serde::{Deserialize, Serialize};

use crate::error::{AlignError, Result};

/// Score given to a pair of embedded vectors
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimilarityMeasure {
    /// exp(-|u - v|_2), in ]0., 1.]
    ExpDistance,
    /// max(0, <u,v>)
    InnerProduct,
} // end of SimilarityMeasure

/// How candidates are searched in top-k mode
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum NeighbourSearch {
    /// exact search : kd-tree for the distance based score, full scan for the inner product. Reproducible.
    Exact,
    /// approximate search in a Hnsw structure built on the second graph embedded vectors.
    /// Insertion is randomized, two runs can give different candidates.
    Hnsw {
        max_nb_connection: usize,
        ef_construction: usize,
        ef_search: usize,
    },
} // end of NeighbourSearch

impl NeighbourSearch {
    /// Hnsw search with parameters adapted to embedded vectors of moderate dimension
    pub fn default_hnsw() -> Self {
        NeighbourSearch::Hnsw {
            max_nb_connection: 24,
            ef_construction: 400,
            ef_search: 64,
        }
    }
} // end of impl NeighbourSearch

#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct AlignParams {
    /// number of candidates kept for each node, 0 asks for a dense matrix
    numtop: usize,
    measure: SimilarityMeasure,
    search: NeighbourSearch,
    /// parallel mode
    parallel: bool,
} // end of AlignParams

impl AlignParams {
    pub fn new(numtop: usize, measure: SimilarityMeasure, search: NeighbourSearch) -> Self {
        AlignParams {
            numtop,
            measure,
            search,
            parallel: true,
        }
    }

    /// number of candidates by node, 0 for dense mode
    pub fn get_numtop(&self) -> usize {
        self.numtop
    }

    pub fn is_dense(&self) -> bool {
        self.numtop == 0
    }

    pub fn get_measure(&self) -> SimilarityMeasure {
        self.measure
    }

    pub fn get_search(&self) -> NeighbourSearch {
        self.search
    }

    pub fn get_parallel(&self) -> bool {
        self.parallel
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel
    }

    pub fn check(&self) -> Result<()> {
        if let NeighbourSearch::Hnsw {
            max_nb_connection,
            ef_construction,
            ef_search,
        } = self.search
        {
            if self.measure != SimilarityMeasure::ExpDistance {
                return Err(AlignError::InvalidParameter(String::from(
                    "hnsw search requires the ExpDistance measure",
                )));
            }
            if max_nb_connection == 0 || ef_construction == 0 || ef_search == 0 {
                return Err(AlignError::InvalidParameter(String::from(
                    "hnsw parameters must be positive",
                )));
            }
        }
        Ok(())
    } // end of check
} // end of impl AlignParams

impl Default for AlignParams {
    fn default() -> Self {
        AlignParams::new(5, SimilarityMeasure::ExpDistance, NeighbourSearch::Exact)
    }
}
