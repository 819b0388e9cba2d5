//! To ease access to most frequently items
//!

pub use crate::error::AlignError;

pub use crate::graph::AlignGraph;

pub use crate::features::{FeatureExtractor, Signatures};
pub use crate::kernel::SimilarityKernel;

pub use crate::embedding::*;
pub use crate::embed::params::*;
pub use crate::embed::LandmarkEmbedder;

pub use crate::align::params::*;
pub use crate::align::{AlignmentExtractor, AlignmentMatrix};

pub use crate::validation::topk::score_alignment;

pub use crate::pipeline::*;

pub use crate::io::{csv::*, embeddedbson::*, output::*, text::*};
