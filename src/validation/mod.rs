//! This module implements validation tools for an alignment
//! - top-k accuracy against a known correspondence between the nodes of the 2 graphs

pub mod topk;
