//! Structural node embedding of 2 graphs and alignment of their nodes.
//!
//! Nodes of the 2 graphs are embedded together : each node gets a signature made of the degree
//! distributions of its successive neighbourhoods, signatures are compared with a kernel and
//! a low rank embedding is computed from the similarities of all nodes to a few landmarks.
//! Nodes of the first graph are then matched with the closest nodes of the second graph.

pub mod error;

pub mod graph;

pub mod features;

pub mod kernel;

pub mod embedding;

pub mod embed;

pub mod align;

pub mod validation;

pub mod pipeline;

pub mod io;

pub mod tools;

pub mod prelude;
