//! Some utilities to order scored candidates.
//! A candidate is a node rank with a score of a float type F (f64 or f32).

use num_traits::float::*;
use std::cmp;

/// indexed value to keep track of position after sorting
#[derive(Copy, Clone, Debug)]
pub struct IndexedValue<F>(pub usize, pub F);

/// makes an ordering on Float by putting Nan at end of sort.
/// rust sorts in Increasing order so we reverse Greater and Less
pub(crate) fn decreasing_sort_nans_first<F: Float>(a: &IndexedValue<F>, b: &IndexedValue<F>) -> cmp::Ordering {
    match (a, b) {
        (x, y) if x.1.is_nan() && y.1.is_nan() => cmp::Ordering::Equal,
        (x, _) if x.1.is_nan() => cmp::Ordering::Less,
        (_, y) if y.1.is_nan() => cmp::Ordering::Greater,
        (_, _) => b.1.partial_cmp(&a.1).unwrap_or(cmp::Ordering::Equal),
    }
} // end of decreasing_sort_nans_first

/// decreasing score, equal scores are ordered by increasing rank.
/// Nan scores go to the end.
pub(crate) fn decreasing_score_then_rank<F: Float>(a: &IndexedValue<F>, b: &IndexedValue<F>) -> cmp::Ordering {
    let by_score = match (a.1.is_nan(), b.1.is_nan()) {
        (true, true) => cmp::Ordering::Equal,
        (true, false) => cmp::Ordering::Greater,
        (false, true) => cmp::Ordering::Less,
        (false, false) => b.1.partial_cmp(&a.1).unwrap_or(cmp::Ordering::Equal),
    };
    by_score.then(a.0.cmp(&b.0))
} // end of decreasing_score_then_rank

/// keeps the nb_top best candidates, sorted by [decreasing_score_then_rank]
pub(crate) fn top_candidates<F: Float>(mut candidates: Vec<IndexedValue<F>>, nb_top: usize) -> Vec<IndexedValue<F>> {
    if nb_top == 0 {
        return Vec::new();
    }
    if candidates.len() > nb_top {
        candidates.select_nth_unstable_by(nb_top - 1, decreasing_score_then_rank);
        candidates.truncate(nb_top);
    }
    candidates.sort_unstable_by(decreasing_score_then_rank);
    candidates
} // end of top_candidates

impl<F: PartialOrd + PartialEq> PartialEq for IndexedValue<F> {
    fn eq(&self, other: &Self) -> bool {
        self.1 == other.1
    }
}

/// implement an order on IndexedValue.
/// To be used with Vec<IndexedValue<F>>::unstable_sort
impl<F: PartialOrd + PartialEq> PartialOrd for IndexedValue<F> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        self.1.partial_cmp(&other.1)
    }
} // end of PartialOrd

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_nans_first() {
        let mut v = vec![IndexedValue(0, 1.), IndexedValue(1, f64::NAN), IndexedValue(2, 3.)];
        v.sort_unstable_by(decreasing_sort_nans_first);
        assert_eq!(v[0].0, 1);
        assert_eq!(v[1].0, 2);
        assert_eq!(v[2].0, 0);
    }

    #[test]
    fn test_top_candidates_tie_break() {
        let candidates = vec![
            IndexedValue(5, 0.5),
            IndexedValue(3, 0.9),
            IndexedValue(4, 0.9),
            IndexedValue(1, 0.9),
            IndexedValue(0, f64::NAN),
            IndexedValue(2, 0.1),
        ];
        let top = top_candidates(candidates.clone(), 2);
        assert_eq!(top.iter().map(|c| c.0).collect::<Vec<usize>>(), vec![1, 3]);
        let all = top_candidates(candidates, 10);
        assert_eq!(all.iter().map(|c| c.0).collect::<Vec<usize>>(), vec![1, 3, 4, 5, 2, 0]);
    } // end of test_top_candidates_tie_break
} // end of mod tests
