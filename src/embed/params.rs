//! Parameters of the structural representation : feature extraction, similarity kernel and landmark factorization.
//!
//! As the weight of a layer decreases exponentially with its hop distance,
//! alpha must be related to the number of layers asked for.

use serde::{Deserialize, Serialize};

use crate::error::{AlignError, Result};

/// number of layers used when no maximum layer is given
pub const UNBOUNDED_LAYER: usize = 1000;

/// default tolerance (relative to largest eigenvalue) under which an eigenvalue of the landmark matrix is null
pub const DEFAULT_EIGEN_TOLERANCE: f64 = 1.0E-8;

/// default ridge (relative to mean self similarity of landmarks) of the regularized factorization
pub const DEFAULT_RIDGE: f64 = 1.0E-3;

/// How many landmarks are sampled
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum LandmarkCount {
    /// exactly k landmarks
    Fixed(usize),
    /// k * log2(nb_nodes) landmarks
    LogScaled(usize),
} // end of LandmarkCount

impl LandmarkCount {
    /// number of landmarks for a graph with nb_nodes nodes, never more than nb_nodes and at least 1.
    pub fn count(&self, nb_nodes: usize) -> usize {
        let asked = match self {
            LandmarkCount::Fixed(k) => *k,
            LandmarkCount::LogScaled(k) => {
                let scaled = (*k as f64) * (nb_nodes.max(2) as f64).log2();
                scaled.floor() as usize
            }
        };
        asked.max(1).min(nb_nodes)
    } // end of count
} // end of impl LandmarkCount

/// How landmarks are chosen. Both modes are reproducible for a given seed.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum LandmarkSampling {
    /// uniform sampling without replacement
    Uniform,
    /// sampling without replacement with probability proportional to degree + 1, favours hubs
    DegreeWeighted,
} // end of LandmarkSampling

/// Parameters of the representation
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
pub struct RepParams {
    /// maximum hop distance. None means unbounded (see [UNBOUNDED_LAYER])
    max_layer: Option<usize>,
    /// discount factor of layer l is alpha^l
    alpha: f64,
    /// number of landmarks, it is the dimension of the embedding
    landmarks: LandmarkCount,
    /// base of logarithm for degree binning. None disables binning and degrees are used as bins
    buckets: Option<f64>,
    /// L1 normalization of each layer histogram
    normalize: bool,
    /// weight of structural similarity
    gamma_struc: f64,
    /// weight of attribute similarity
    gamma_attr: f64,
    /// landmark sampling strategy
    sampling: LandmarkSampling,
    /// seed of landmark sampling
    seed: u64,
    /// relative tolerance for null eigenvalues of landmark matrix
    eigen_tolerance: f64,
    /// relative ridge used when the landmark matrix is singular
    ridge: f64,
    /// normalize embedded vectors to unit L2 norm
    row_normalize: bool,
    /// parallel mode
    parallel: bool,
} // end of RepParams

impl RepParams {
    /// buckets less or equal to 1. disables binning
    pub fn new(max_layer: Option<usize>, alpha: f64, landmarks: LandmarkCount, buckets: Option<f64>) -> Self {
        let buckets = buckets.filter(|b| *b > 1.);
        RepParams {
            max_layer,
            alpha,
            landmarks,
            buckets,
            ..Default::default()
        }
    }

    /// effective maximum layer
    pub fn get_max_layer(&self) -> usize {
        self.max_layer.unwrap_or(UNBOUNDED_LAYER)
    }

    pub fn get_alpha(&self) -> f64 {
        self.alpha
    }

    pub fn get_landmarks(&self) -> LandmarkCount {
        self.landmarks
    }

    /// log base used for binning degrees, None if exact degrees are used
    pub fn get_buckets(&self) -> Option<f64> {
        self.buckets
    }

    pub fn get_normalize(&self) -> bool {
        self.normalize
    }

    pub fn get_gamma_struc(&self) -> f64 {
        self.gamma_struc
    }

    pub fn get_gamma_attr(&self) -> f64 {
        self.gamma_attr
    }

    pub fn get_sampling(&self) -> LandmarkSampling {
        self.sampling
    }

    pub fn get_seed(&self) -> u64 {
        self.seed
    }

    pub fn get_eigen_tolerance(&self) -> f64 {
        self.eigen_tolerance
    }

    pub fn get_ridge(&self) -> f64 {
        self.ridge
    }

    pub fn get_row_normalize(&self) -> bool {
        self.row_normalize
    }

    pub fn get_parallel(&self) -> bool {
        self.parallel
    }

    pub fn set_normalize(&mut self, normalize: bool) {
        self.normalize = normalize
    }

    /// set weights of structural and attribute similarities
    pub fn set_gammas(&mut self, gamma_struc: f64, gamma_attr: f64) {
        self.gamma_struc = gamma_struc;
        self.gamma_attr = gamma_attr;
    }

    pub fn set_sampling(&mut self, sampling: LandmarkSampling, seed: u64) {
        self.sampling = sampling;
        self.seed = seed;
    }

    pub fn set_eigen_tolerance(&mut self, eigen_tolerance: f64) {
        self.eigen_tolerance = eigen_tolerance
    }

    pub fn set_ridge(&mut self, ridge: f64) {
        self.ridge = ridge
    }

    pub fn set_row_normalize(&mut self, row_normalize: bool) {
        self.row_normalize = row_normalize
    }

    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel
    }

    /// checks parameters are in their domain
    pub fn check(&self) -> Result<()> {
        if !(self.alpha > 0. && self.alpha <= 1.) {
            return Err(AlignError::InvalidParameter(format!(
                "alpha must be in ]0., 1.], got {}",
                self.alpha
            )));
        }
        let k = match self.landmarks {
            LandmarkCount::Fixed(k) | LandmarkCount::LogScaled(k) => k,
        };
        if k == 0 {
            return Err(AlignError::InvalidParameter(String::from(
                "number of landmarks must be at least 1",
            )));
        }
        if !(self.gamma_struc >= 0. && self.gamma_attr >= 0.) || self.gamma_struc + self.gamma_attr <= 0. {
            return Err(AlignError::InvalidParameter(format!(
                "gammas must be non negative and not both null, got {} {}",
                self.gamma_struc, self.gamma_attr
            )));
        }
        if !(self.eigen_tolerance >= 0. && self.eigen_tolerance < 1.) {
            return Err(AlignError::InvalidParameter(format!(
                "eigen tolerance must be in [0., 1.[, got {}",
                self.eigen_tolerance
            )));
        }
        if !(self.ridge > 0.) {
            return Err(AlignError::InvalidParameter(format!(
                "ridge must be positive, got {}",
                self.ridge
            )));
        }
        Ok(())
    } // end of check
} // end of impl RepParams

impl Default for RepParams {
    fn default() -> Self {
        RepParams {
            max_layer: Some(2),
            alpha: 0.01,
            landmarks: LandmarkCount::Fixed(10),
            buckets: Some(2.),
            normalize: true,
            gamma_struc: 1.,
            gamma_attr: 1.,
            sampling: LandmarkSampling::Uniform,
            seed: 0,
            eigen_tolerance: DEFAULT_EIGEN_TOLERANCE,
            ridge: DEFAULT_RIDGE,
            row_normalize: false,
            parallel: true,
        }
    }
} // end of impl Default for RepParams

// end of mod tests
