//! Input of graphs, attributes and ground truth, output of embeddings and alignments.
//!
//! Functions here return anyhow errors, with the file concerned in the context.

pub mod csv;

pub mod text;

pub mod embeddedbson;

pub mod output;
