//! degree statistics and degree based node sampling

use hdrhistogram::Histogram;
use indexmap::set::IndexSet;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::index;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::error::{AlignError, Result};

/// logs degree quantiles and returns the degree histogram
pub fn log_degree_quantiles(degrees: &[usize]) -> Result<Histogram<u64>> {
    let mut degree_histogram = Histogram::<u64>::new(3)
        .map_err(|e| AlignError::InvalidGraph(format!("histogram creation failed : {e}")))?;
    for d in degrees {
        degree_histogram
            .record(*d as u64)
            .map_err(|e| AlignError::InvalidGraph(format!("cannot record degree {d} : {e}")))?;
    }
    //
    let nbslot = 10;
    let mut qs = Vec::<f64>::with_capacity(12);
    for i in 1..nbslot {
        qs.push(i as f64 / nbslot as f64);
    }
    qs.push(0.99);
    qs.push(0.999);
    for q in qs {
        log::info!(
            "fraction : {:.3e}, degree : {}",
            q,
            degree_histogram.value_at_quantile(q)
        );
    }
    //
    Ok(degree_histogram)
} // end of log_degree_quantiles

/// samples exactly nb_sample distinct nodes uniformly among 0..nb_nodes. Returned ranks are sorted.
/// For a given seed the result is always the same.
pub fn sample_nodes_uniform(nb_nodes: usize, nb_sample: usize, seed: u64) -> Vec<usize> {
    let nb_sample = nb_sample.min(nb_nodes);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut sampled = index::sample(&mut rng, nb_nodes, nb_sample).into_vec();
    sampled.sort_unstable();
    sampled
} // end of sample_nodes_uniform

/// samples exactly nb_sample distinct nodes with probability proportional to degree + 1
/// (so isolated nodes can be drawn). Returned ranks are sorted.
pub fn sample_nodes_by_degrees(degrees: &[usize], nb_sample: usize, seed: u64) -> Result<Vec<usize>> {
    let nb_nodes = degrees.len();
    let nb_sample = nb_sample.min(nb_nodes);
    let weights: Vec<f64> = degrees.iter().map(|d| (d + 1) as f64).collect();
    if nb_sample == 0 {
        return Ok(Vec::new());
    }
    let mut sampled = IndexSet::<usize>::with_capacity(nb_sample);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut distribution = WeightedIndex::new(&weights)
        .map_err(|e| AlignError::InvalidParameter(format!("degree weighted sampling failed : {e}")))?;
    let mut nb_try = 0;
    // a drawn node gets a null weight, so each draw is a new node
    loop {
        let node = distribution.sample(&mut rng);
        nb_try += 1;
        if !sampled.insert(node) {
            continue;
        }
        if sampled.len() >= nb_sample {
            break;
        }
        distribution
            .update_weights(&[(node, &0.)])
            .map_err(|e| AlignError::InvalidParameter(format!("degree weighted sampling failed : {e}")))?;
    }
    log::debug!(
        "sample_nodes_by_degrees  nb_try : {} nb_sampled : {}",
        nb_try,
        sampled.len()
    );
    let mut nodes: Vec<usize> = sampled.into_iter().collect();
    nodes.sort_unstable();
    Ok(nodes)
} // end of sample_nodes_by_degrees

// end of mod tests
