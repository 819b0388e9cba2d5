//! Small utilities : degrees statistics and sampling, ordering of scored candidates, categorical agreement,
//! exact nearest neighbours.

pub mod degrees;

pub mod orderingf;

pub(crate) mod jaccard;

pub(crate) mod kdtree;
