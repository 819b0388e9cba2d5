//! Approximate candidate search with a Hnsw structure (crate hnsw_rs) built on the embedded nodes of the second graph.
//!
//! The Hnsw is built with the L2 distance on f32 copies of the embedded vectors. Candidates it returns
//! are rescored exactly in f64 and sorted by decreasing score then increasing rank.
//! As Hnsw search is approximate a true best candidate can be missed, and as insertion is randomized
//! results are not guaranteed to be reproducible.

use ndarray::ArrayView2;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use std::time::SystemTime;
use cpu_time::ProcessTime;

use hnsw_rs::prelude::*;

use super::params::SimilarityMeasure;
use super::score;
use crate::tools::orderingf::{top_candidates, IndexedValue};

// maximum number of layers in hnsw_rs
const NB_LAYER: usize = 16;

/// parameters of the Hnsw structure
#[derive(Debug, Copy, Clone)]
pub(crate) struct HnswSearch {
    pub(crate) max_nb_connection: usize,
    pub(crate) ef_construction: usize,
    pub(crate) ef_search: usize,
}

/// returns for each row of u1 its numtop best candidates among rows of u2
pub(crate) fn hnsw_top_candidates(
    u1: &ArrayView2<f64>,
    u2: &ArrayView2<f64>,
    numtop: usize,
    search: HnswSearch,
    measure: SimilarityMeasure,
    parallel: bool,
) -> Vec<Vec<IndexedValue<f64>>> {
    //
    let cpu_start = ProcessTime::now();
    let sys_start = SystemTime::now();
    //
    let nbdata = u2.nrows();
    let to_f32 = |row: ndarray::ArrayView1<f64>| row.iter().map(|x| *x as f32).collect::<Vec<f32>>();
    let targets: Vec<Vec<f32>> = u2.outer_iter().map(to_f32).collect();
    let hnsw = Hnsw::<f32, DistL2>::new(
        search.max_nb_connection,
        nbdata,
        NB_LAYER,
        search.ef_construction,
        DistL2 {},
    );
    let data_with_id: Vec<(&[f32], usize)> = targets
        .iter()
        .enumerate()
        .map(|(rank, v)| (v.as_slice(), rank))
        .collect();
    if parallel {
        hnsw.parallel_insert_slice(&data_with_id);
    } else {
        for d in &data_with_id {
            hnsw.insert_slice(*d);
        }
    }
    log::debug!("hnsw built on {} embedded vectors", nbdata);
    //
    let ef_search = search.ef_search.max(numtop);
    let query = |i: usize| -> Vec<IndexedValue<f64>> {
        let q = to_f32(u1.row(i));
        let neighbours = hnsw.search(&q, numtop, ef_search);
        let candidates: Vec<IndexedValue<f64>> = neighbours
            .iter()
            .map(|n| IndexedValue(n.d_id, score(measure, &u1.row(i), &u2.row(n.d_id))))
            .collect();
        top_candidates(candidates, numtop)
    };
    let candidates: Vec<Vec<IndexedValue<f64>>> = if parallel {
        (0..u1.nrows()).into_par_iter().map(query).collect()
    } else {
        (0..u1.nrows()).map(query).collect()
    };
    //
    log::info!(
        "hnsw search done for {} nodes, sys time(ms) {:?} cpu time(ms) {:?}",
        u1.nrows(),
        sys_start.elapsed().map(|d| d.as_millis()).unwrap_or(0),
        cpu_start.elapsed().as_millis()
    );
    candidates
} // end of hnsw_top_candidates
