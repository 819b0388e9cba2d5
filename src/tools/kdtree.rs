//! An exact k nearest neighbours search in L2 distance, with a kd-tree built on the rows of a matrix.
//!
//! The tree is balanced : each node splits its points at the median along the coordinate of largest spread.
//! Searches return neighbours by increasing distance, equal distances by increasing row rank,
//! so results depend only on the data and never on insertion or thread scheduling.

use ndarray::{ArrayView1, ArrayView2};

use std::cmp::Ordering;
use std::collections::BinaryHeap;

// a node of the tree, children are indexes in KdTree::nodes
#[derive(Debug, Copy, Clone)]
struct KdNode {
    /// row rank of the point stored at this node
    point: usize,
    /// splitting coordinate
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// a candidate neighbour : squared distance and row rank
#[derive(Debug, Copy, Clone)]
struct Neighbour {
    dist2: f64,
    rank: usize,
}

impl PartialEq for Neighbour {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbour {}

impl PartialOrd for Neighbour {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// the worst neighbour (largest distance, then largest rank) is at the top of a max heap
impl Ord for Neighbour {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist2
            .total_cmp(&other.dist2)
            .then(self.rank.cmp(&other.rank))
    }
}

/// squared L2 distance, summed in coordinate order
pub(crate) fn squared_distance(u: &ArrayView1<f64>, v: &ArrayView1<f64>) -> f64 {
    u.iter().zip(v.iter()).map(|(a, b)| (a - b) * (a - b)).sum()
}

/// kd-tree on the rows of a (n, d) matrix
pub(crate) struct KdTree<'a> {
    points: ArrayView2<'a, f64>,
    nodes: Vec<KdNode>,
    root: Option<usize>,
} // end of struct KdTree

impl<'a> KdTree<'a> {
    pub(crate) fn new(points: ArrayView2<'a, f64>) -> Self {
        let mut tree = KdTree {
            points,
            nodes: Vec::with_capacity(points.nrows()),
            root: None,
        };
        let mut ranks: Vec<usize> = (0..points.nrows()).collect();
        tree.root = tree.build(&mut ranks);
        log::debug!("kdtree built on {} points of dimension {}", points.nrows(), points.ncols());
        tree
    }

    // coordinate with largest spread among points, None in dimension 0
    fn split_axis(&self, ranks: &[usize]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for axis in 0..self.points.ncols() {
            let mut min = f64::INFINITY;
            let mut max = f64::NEG_INFINITY;
            for r in ranks {
                let x = self.points[[*r, axis]];
                min = min.min(x);
                max = max.max(x);
            }
            let spread = max - min;
            match best {
                Some((_, s)) if s >= spread => {}
                _ => best = Some((axis, spread)),
            }
        }
        best.map(|b| b.0)
    }

    fn build(&mut self, ranks: &mut [usize]) -> Option<usize> {
        if ranks.is_empty() {
            return None;
        }
        let axis = self.split_axis(ranks).unwrap_or(0);
        let points = self.points;
        let mid = ranks.len() / 2;
        if points.ncols() > 0 {
            ranks.select_nth_unstable_by(mid, |a, b| {
                points[[*a, axis]]
                    .total_cmp(&points[[*b, axis]])
                    .then(a.cmp(b))
            });
        }
        let point = ranks[mid];
        let (left, right) = ranks.split_at_mut(mid);
        let left = self.build(left);
        let right = self.build(&mut right[1..]);
        self.nodes.push(KdNode {
            point,
            axis,
            left,
            right,
        });
        Some(self.nodes.len() - 1)
    } // end of build

    /// the k nearest rows of query as (row rank, squared distance), by increasing distance then rank
    pub(crate) fn nearest(&self, query: &ArrayView1<f64>, k: usize) -> Vec<(usize, f64)> {
        let mut heap = BinaryHeap::<Neighbour>::with_capacity(k + 1);
        if k > 0 {
            if let Some(root) = self.root {
                self.search(root, query, k, &mut heap);
            }
        }
        heap.into_sorted_vec()
            .into_iter()
            .map(|n| (n.rank, n.dist2))
            .collect()
    }

    fn search(&self, node: usize, query: &ArrayView1<f64>, k: usize, heap: &mut BinaryHeap<Neighbour>) {
        let kdnode = self.nodes[node];
        let candidate = Neighbour {
            dist2: squared_distance(query, &self.points.row(kdnode.point)),
            rank: kdnode.point,
        };
        if heap.len() < k {
            heap.push(candidate);
        } else if let Some(worst) = heap.peek() {
            if candidate < *worst {
                heap.pop();
                heap.push(candidate);
            }
        }
        if self.points.ncols() == 0 {
            // all points at distance 0
            for child in [kdnode.left, kdnode.right].into_iter().flatten() {
                self.search(child, query, k, heap);
            }
            return;
        }
        let diff = query[kdnode.axis] - self.points[[kdnode.point, kdnode.axis]];
        let (near, far) = if diff < 0. {
            (kdnode.left, kdnode.right)
        } else {
            (kdnode.right, kdnode.left)
        };
        if let Some(near) = near {
            self.search(near, query, k, heap);
        }
        if let Some(far) = far {
            // equality keeps a chance to lower ranks at the same distance
            let visit = match heap.peek() {
                Some(worst) => heap.len() < k || diff * diff <= worst.dist2,
                None => true,
            };
            if visit {
                self.search(far, query, k, heap);
            }
        }
    } // end of search
} // end of impl KdTree

//========================================================================================

#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::{arr1, arr2, Array2};
    use rand::distributions::{Distribution, Uniform};
    use rand_xoshiro::rand_core::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // full scan reference
    fn scan_nearest(points: &Array2<f64>, query: &ArrayView1<f64>, k: usize) -> Vec<(usize, f64)> {
        let mut all: Vec<Neighbour> = points
            .outer_iter()
            .enumerate()
            .map(|(rank, p)| Neighbour {
                dist2: squared_distance(query, &p),
                rank,
            })
            .collect();
        all.sort();
        all.truncate(k);
        all.into_iter().map(|n| (n.rank, n.dist2)).collect()
    }

    #[test]
    fn test_kdtree_equals_scan() {
        log_init_test();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(4664397);
        let unif = Uniform::<f64>::new(-1., 1.);
        let points = Array2::<f64>::from_shape_fn((300, 4), |_| unif.sample(&mut rng));
        let tree = KdTree::new(points.view());
        for _ in 0..50 {
            let query = ndarray::Array1::<f64>::from_shape_fn(4, |_| unif.sample(&mut rng));
            for k in [1, 5, 17] {
                assert_eq!(tree.nearest(&query.view(), k), scan_nearest(&points, &query.view(), k));
            }
        }
        // a point of the set is its own nearest
        assert_eq!(tree.nearest(&points.row(123), 1)[0], (123, 0.));
    } // end of test_kdtree_equals_scan

    #[test]
    fn test_kdtree_ties_and_sizes() {
        log_init_test();
        // 4 points at distance 1 of origin, a duplicate of point 2
        let points = arr2(&[[1., 0.], [0., 1.], [-1., 0.], [0., -1.], [-1., 0.], [3., 3.]]);
        let tree = KdTree::new(points.view());
        let origin = arr1(&[0., 0.]);
        let found: Vec<usize> = tree.nearest(&origin.view(), 3).iter().map(|n| n.0).collect();
        assert_eq!(found, vec![0, 1, 2]);
        assert_eq!(tree.nearest(&origin.view(), 10).len(), 6);
        assert!(tree.nearest(&origin.view(), 0).is_empty());
        let found: Vec<usize> = tree.nearest(&arr1(&[-1., 0.]).view(), 2).iter().map(|n| n.0).collect();
        assert_eq!(found, vec![2, 4]);
        // empty set and null dimension
        let empty = Array2::<f64>::zeros((0, 2));
        assert!(KdTree::new(empty.view()).nearest(&origin.view(), 3).is_empty());
        let flat = Array2::<f64>::zeros((4, 0));
        let none = arr1::<f64>(&[]);
        let found: Vec<usize> = KdTree::new(flat.view()).nearest(&none.view(), 2).iter().map(|n| n.0).collect();
        assert_eq!(found, vec![0, 1]);
    } // end of test_kdtree_ties_and_sizes
} // end of mod tests
