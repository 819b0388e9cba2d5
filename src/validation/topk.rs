//! top-k accuracy of an alignment.
//!
//! Given the true correspondence of (some) nodes of the first graph, we count the nodes
//! whose true partner is among their topk best candidates in the alignment matrix.
//! The truth gives for a node of the first graph its local rank in the second graph
//! (rank in the combined graph minus the boundary).

use ahash::AHashMap;

use crate::align::AlignmentMatrix;
use crate::error::{AlignError, Result};

/// returns the fraction of nodes of truth correctly aligned within topk candidates, and the sorted list of these nodes.
pub fn score_alignment(matrix: &AlignmentMatrix, topk: usize, truth: &AHashMap<usize, usize>) -> Result<(f64, Vec<usize>)> {
    if topk == 0 {
        return Err(AlignError::InvalidParameter(String::from("topk must be positive")));
    }
    if truth.is_empty() {
        return Err(AlignError::InvalidParameter(String::from("empty ground truth")));
    }
    let (nb_rows, nb_cols) = matrix.shape();
    let mut correct = Vec::<usize>::with_capacity(truth.len());
    for (node, partner) in truth {
        if *node >= nb_rows {
            log::error!("ground truth node {} not in first graph (size {})", node, nb_rows);
            return Err(AlignError::DimensionMismatch {
                what: "ground truth node of first graph",
                expected: nb_rows,
                got: *node,
            });
        }
        if *partner >= nb_cols {
            log::error!("ground truth partner {} not in second graph (size {})", partner, nb_cols);
            return Err(AlignError::DimensionMismatch {
                what: "ground truth node of second graph",
                expected: nb_cols,
                got: *partner,
            });
        }
        let found = matrix
            .row_candidates(*node)
            .iter()
            .take(topk)
            .any(|(candidate, _)| candidate == partner);
        if found {
            correct.push(*node);
        }
    }
    correct.sort_unstable();
    let fraction = correct.len() as f64 / truth.len() as f64;
    log::info!(
        "top {} accuracy : {:.3e} ({} of {} nodes)",
        topk,
        fraction,
        correct.len(),
        truth.len()
    );
    Ok((fraction, correct))
} // end of score_alignment

//========================================================================================

// end of mod tests
