//! Structural features of nodes.
//!
//! The signature of a node is made of one histogram per layer. Layer l gathers the degrees of the
//! nodes at hop distance exactly l from the node. Layer 0 contains only the node itself, so its
//! histogram holds one count, in the bin of the node own degree.
//!
//! Degrees are binned on a log scale : degree d goes in bin floor(log_b(d+1)) where b is the
//! buckets parameter. Without buckets each degree value is its own bin.
//! The bin count is fixed for the whole graph by its maximum degree, and the number of layers is
//! the smallest of max_layer + 1 and the number of layers reached by the deepest search, so that all signatures
//! have the same length.

use ndarray::{s, Array2, ArrayView1, Axis};
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, IntoParallelRefIterator, ParallelIterator};

use std::time::SystemTime;
use cpu_time::ProcessTime;

use crate::embed::params::RepParams;
use crate::graph::AlignGraph;

// protects floor against log rounding, log_2(8.) can be 2.9999999999999996
const LOG_ROUNDING: f64 = 1.0E-10;

/// The signatures of all nodes, stored as an (nb_nodes, nb_layers * width) array.
#[derive(Clone, Debug)]
pub struct Signatures {
    data: Array2<f64>,
    /// number of layers
    nb_layers: usize,
    /// number of bins of each layer
    width: usize,
} // end of struct Signatures

impl Signatures {
    pub fn get_nb_nodes(&self) -> usize {
        self.data.nrows()
    }

    pub fn get_nb_layers(&self) -> usize {
        self.nb_layers
    }

    /// number of bins in each layer
    pub fn get_width(&self) -> usize {
        self.width
    }

    /// length of a signature
    pub fn get_dimension(&self) -> usize {
        self.data.ncols()
    }

    /// the whole signature of a node
    pub fn signature(&self, node: usize) -> ArrayView1<f64> {
        self.data.row(node)
    }

    /// histogram of layer of a node
    pub fn layer(&self, node: usize, layer: usize) -> ArrayView1<f64> {
        self.data
            .slice(s![node, layer * self.width..(layer + 1) * self.width])
    }

    pub fn get_data(&self) -> &Array2<f64> {
        &self.data
    }
} // end of impl Signatures

/// Computes the signatures of a graph
pub struct FeatureExtractor<'a> {
    graph: &'a AlignGraph,
    params: RepParams,
} // end of struct FeatureExtractor

impl<'a> FeatureExtractor<'a> {
    pub fn new(graph: &'a AlignGraph, params: RepParams) -> Self {
        FeatureExtractor { graph, params }
    }

    /// bin of a degree
    pub fn bin(&self, degree: usize) -> usize {
        match self.params.get_buckets() {
            Some(base) => {
                let b = ((degree + 1) as f64).ln() / base.ln();
                (b + LOG_ROUNDING).floor() as usize
            }
            None => degree,
        }
    } // end of bin

    /// number of bins of each layer histogram, enough for the maximum degree of the graph
    pub fn get_width(&self) -> usize {
        self.bin(self.graph.max_degree()) + 1
    }

    // histograms of the layers reached from node, not normalized, not padded
    fn node_histograms(&self, node: usize, width: usize) -> Vec<Vec<f64>> {
        let frontiers = self.graph.frontiers(node, self.params.get_max_layer());
        frontiers
            .iter()
            .map(|frontier| {
                let mut histogram = vec![0.; width];
                for &v in frontier {
                    let bin = self.bin(self.graph.degree(v)).min(width - 1);
                    histogram[bin] += 1.;
                }
                histogram
            })
            .collect()
    } // end of node_histograms

    /// computes signatures of all nodes
    pub fn extract(&self) -> Signatures {
        //
        let cpu_start = ProcessTime::now();
        let sys_start = SystemTime::now();
        //
        let nb_nodes = self.graph.nb_nodes();
        let width = self.get_width();
        let histograms: Vec<Vec<Vec<f64>>> = if self.params.get_parallel() {
            (0..nb_nodes)
                .into_par_iter()
                .map(|i| self.node_histograms(i, width))
                .collect()
        } else {
            (0..nb_nodes).map(|i| self.node_histograms(i, width)).collect()
        };
        let nb_layers = histograms.iter().map(|h| h.len()).max().unwrap_or(1);
        log::debug!(
            "extract, nb layers : {}, width : {}, max layer asked : {}",
            nb_layers,
            width,
            self.params.get_max_layer()
        );
        //
        let normalize = self.params.get_normalize();
        let fill_row = |mut row: ndarray::ArrayViewMut1<f64>, node_histograms: &Vec<Vec<f64>>| {
            for (l, histogram) in node_histograms.iter().enumerate() {
                let sum: f64 = histogram.iter().sum();
                let scale = if normalize && sum > 0. { 1. / sum } else { 1. };
                let mut layer = row.slice_mut(s![l * width..(l + 1) * width]);
                for (x, h) in layer.iter_mut().zip(histogram.iter()) {
                    *x = h * scale;
                }
            }
        };
        let mut data = Array2::<f64>::zeros((nb_nodes, nb_layers * width));
        if self.params.get_parallel() {
            data.axis_iter_mut(Axis(0))
                .into_par_iter()
                .zip(histograms.par_iter())
                .for_each(|(row, h)| fill_row(row, h));
        } else {
            for (row, h) in data.axis_iter_mut(Axis(0)).zip(histograms.iter()) {
                fill_row(row, h);
            }
        }
        //
        log::info!(
            "signatures computed, dimension : {}, sys time(ms) {:?} cpu time(ms) {:?}",
            data.ncols(),
            sys_start.elapsed().map(|d| d.as_millis()).unwrap_or(0),
            cpu_start.elapsed().as_millis()
        );
        Signatures {
            data,
            nb_layers,
            width,
        }
    } // end of extract
} // end of impl FeatureExtractor

//========================================================================================

// end of mod tests
