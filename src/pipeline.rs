//! The alignment pipeline : signatures, landmark embedding, alignment extraction.
//!
//! The 2 graphs are given as one combined graph, nodes 0..boundary belonging to the first graph
//! and boundary..n to the second one (see [AlignGraph::merge]).
//! Each stage is timed and logged. An optional [PipelineObserver] can follow the stages,
//! components never depend on it.

use std::sync::Arc;
use std::time::{Duration, SystemTime};
use cpu_time::ProcessTime;

use crate::align::params::AlignParams;
use crate::align::{AlignmentExtractor, AlignmentMatrix};
use crate::embed::params::RepParams;
use crate::embed::LandmarkEmbedder;
use crate::embedding::{Embedded, EmbeddedT, EmbedderT};
use crate::error::{AlignError, Result};
use crate::features::FeatureExtractor;
use crate::graph::AlignGraph;

/// stages of the pipeline
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Stage {
    Features,
    Embedding,
    Alignment,
}

/// events sent to a [PipelineObserver]
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    StageStarted(Stage),
    StageFinished {
        stage: Stage,
        cpu_time: Duration,
        sys_time: Duration,
    },
    /// the landmark matrix was singular and a ridge was added to its diagonal
    SingularFallback { ridge: f64, rank: usize },
} // end of PipelineEvent

/// receives progress of the pipeline.
pub trait PipelineObserver: Send + Sync {
    fn notify(&self, event: &PipelineEvent);
}

/// how the landmark matrix was factorized
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FactorReport {
    /// number of eigenvalues kept
    pub rank: usize,
    /// ridge added to the landmark matrix diagonal when it was singular
    pub ridge: Option<f64>,
}

/// result of an alignment run
#[derive(Clone, Debug)]
pub struct AlignmentResult {
    /// embedded nodes of the combined graph
    embedded: Embedded<f64>,
    /// landmarks used by the embedding
    landmarks: Vec<usize>,
    report: FactorReport,
    matrix: AlignmentMatrix,
    boundary: usize,
} // end of AlignmentResult

impl AlignmentResult {
    pub fn get_embedded(&self) -> &Embedded<f64> {
        &self.embedded
    }

    pub fn get_landmarks(&self) -> &[usize] {
        &self.landmarks
    }

    pub fn get_factor_report(&self) -> FactorReport {
        self.report
    }

    pub fn get_matrix(&self) -> &AlignmentMatrix {
        &self.matrix
    }

    /// rank of the first node of the second graph in the combined graph
    pub fn get_boundary(&self) -> usize {
        self.boundary
    }
} // end of impl AlignmentResult

pub struct StructAlign {
    rep_params: RepParams,
    align_params: AlignParams,
    observer: Option<Arc<dyn PipelineObserver>>,
} // end of struct StructAlign

impl StructAlign {
    pub fn new(rep_params: RepParams, align_params: AlignParams) -> Self {
        StructAlign {
            rep_params,
            align_params,
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: Arc<dyn PipelineObserver>) {
        self.observer = Some(observer);
    }

    pub fn get_rep_params(&self) -> &RepParams {
        &self.rep_params
    }

    pub fn get_align_params(&self) -> &AlignParams {
        &self.align_params
    }

    fn notify(&self, event: PipelineEvent) {
        if let Some(observer) = &self.observer {
            observer.notify(&event);
        }
    }

    // runs a stage between its start and finish events
    fn timed<T>(&self, stage: Stage, f: impl FnOnce() -> Result<T>) -> Result<T> {
        self.notify(PipelineEvent::StageStarted(stage));
        let cpu_start = ProcessTime::now();
        let sys_start = SystemTime::now();
        let res = f()?;
        let cpu_time = cpu_start.elapsed();
        let sys_time = sys_start.elapsed().unwrap_or_default();
        log::info!(
            "stage {:?} done, sys time(ms) {:?} cpu time(ms) {:?}",
            stage,
            sys_time.as_millis(),
            cpu_time.as_millis()
        );
        self.notify(PipelineEvent::StageFinished {
            stage,
            cpu_time,
            sys_time,
        });
        Ok(res)
    } // end of timed

    /// aligns nodes 0..boundary of graph with nodes boundary..n
    pub fn run(&self, graph: &AlignGraph, boundary: usize) -> Result<AlignmentResult> {
        self.rep_params.check()?;
        self.align_params.check()?;
        let nb_nodes = graph.nb_nodes();
        if boundary == 0 || boundary >= nb_nodes {
            log::error!("boundary {} is not inside node range 1..{}", boundary, nb_nodes);
            return Err(AlignError::DimensionMismatch {
                what: "partition boundary (must be in 1..nb_nodes)",
                expected: nb_nodes,
                got: boundary,
            });
        }
        // without attributes the combined similarity would be null everywhere
        if self.rep_params.get_gamma_struc() <= 0. && graph.get_attributes().is_none() {
            log::error!("gamma_struc is null and graph has no attributes");
            return Err(AlignError::InvalidParameter(String::from(
                "gamma_struc must be positive when the graph has no attributes",
            )));
        }
        log::info!(
            "structalign run, nb nodes : {}, first graph : {}, second graph : {}",
            nb_nodes,
            boundary,
            nb_nodes - boundary
        );
        log::debug!("representation parameters : {:?}", self.rep_params);
        log::debug!("alignment parameters : {:?}", self.align_params);
        //
        let signatures = self.timed(Stage::Features, || {
            Ok(FeatureExtractor::new(graph, self.rep_params).extract())
        })?;
        //
        let (embedded, landmarks, report) = self.timed(Stage::Embedding, || {
            let mut embedder = LandmarkEmbedder::new(graph, &signatures, self.rep_params);
            let embedded = embedder.embed()?;
            let mut report = FactorReport {
                rank: embedded.get_dimension(),
                ridge: None,
            };
            if let Some(factor) = embedder.get_factor() {
                report.rank = factor.get_rank();
                if factor.is_regularized() {
                    report.ridge = Some(factor.get_ridge());
                    self.notify(PipelineEvent::SingularFallback {
                        ridge: factor.get_ridge(),
                        rank: factor.get_rank(),
                    });
                }
            }
            let landmarks = embedder.get_landmarks().cloned().unwrap_or_default();
            Ok((embedded, landmarks, report))
        })?;
        if embedded.get_nb_nodes() != nb_nodes {
            return Err(AlignError::DimensionMismatch {
                what: "embedding rows",
                expected: nb_nodes,
                got: embedded.get_nb_nodes(),
            });
        }
        //
        let matrix = self.timed(Stage::Alignment, || {
            AlignmentExtractor::new(self.align_params).extract(&embedded, boundary)
        })?;
        //
        Ok(AlignmentResult {
            embedded,
            landmarks,
            report,
            matrix,
            boundary,
        })
    } // end of run

    /// merges the 2 graphs and aligns the nodes of first with those of second
    pub fn align_graphs(&self, first: &AlignGraph, second: &AlignGraph) -> Result<AlignmentResult> {
        let (combined, boundary) = AlignGraph::merge(first, second)?;
        self.run(&combined, boundary)
    }
} // end of impl StructAlign

//========================================================================================

// end of mod tests
