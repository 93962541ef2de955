//! Ranking of merge candidates.
//!
//! Every variant ranks candidates by its own score first, then by raw pair
//! frequency, then by combined length, then by composite key. The chain makes
//! the order total so training is deterministic.

use crate::core::merges::Pair;
use dary_heap::OctonaryHeap;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Primary ranking score of a candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Score {
    /// Raw pair frequency
    Frequency(u64),
    /// Exact rational `num / den`, compared by cross-multiplication
    Ratio { num: u64, den: u64 },
    /// Real-valued score, compared with `f64::total_cmp`
    Real(f64),
}

impl Score {
    /// Lossy view of the score.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Score::Frequency(n) => n as f64,
            Score::Ratio { num, den } => {
                if den == 0 {
                    f64::INFINITY
                } else {
                    num as f64 / den as f64
                }
            }
            Score::Real(v) => v,
        }
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        match (*self, *other) {
            (Score::Frequency(a), Score::Frequency(b)) => a.cmp(&b),
            (Score::Ratio { num: an, den: ad }, Score::Ratio { num: bn, den: bd }) => {
                (an as u128 * bd as u128).cmp(&(bn as u128 * ad as u128))
            }
            (Score::Real(a), Score::Real(b)) => a.total_cmp(&b),
            // Mixed kinds never occur within one run
            (a, b) => a.as_f64().total_cmp(&b.as_f64()),
        }
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Frequency(n) => write!(f, "{n}"),
            Score::Ratio { num, den } => write!(f, "{num}/{den}"),
            Score::Real(v) => write!(f, "{v:.4}"),
        }
    }
}

/// A merge candidate during training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCandidate {
    /// The pair of tokens to merge
    pub pair: Pair,
    /// The frequency of this pair
    pub count: u64,
    /// Variant score
    pub score: Score,
    /// Combined length of both tokens in chars
    pub char_len: usize,
}

impl MergeCandidate {
    /// Create a candidate ranked by frequency alone.
    pub fn new(pair: Pair, count: u64) -> Self {
        Self::with_score(pair, count, Score::Frequency(count))
    }

    /// Create a candidate with an explicit score.
    pub fn with_score(pair: Pair, count: u64, score: Score) -> Self {
        let char_len = pair.char_len();
        Self {
            pair,
            count,
            score,
            char_len,
        }
    }
}

// Max-heap order: the greatest candidate wins
impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| self.count.cmp(&other.count))
            .then_with(|| self.char_len.cmp(&other.char_len))
            .then_with(|| self.pair.cmp_key(&other.pair))
            // Keys collide when a token contains the separator
            .then_with(|| self.pair.left.cmp(&other.pair.left))
    }
}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue of merge candidates.
///
/// Uses an 8-ary heap for better cache locality than a binary heap.
#[derive(Debug, Clone, Default)]
pub struct PairPriorityQueue {
    heap: OctonaryHeap<MergeCandidate>,
}

impl PairPriorityQueue {
    /// Create a new empty priority queue.
    pub fn new() -> Self {
        Self {
            heap: OctonaryHeap::new(),
        }
    }

    /// Push a merge candidate onto the queue.
    pub fn push(&mut self, candidate: MergeCandidate) {
        self.heap.push(candidate);
    }

    /// Pop the highest priority candidate.
    pub fn pop(&mut self) -> Option<MergeCandidate> {
        self.heap.pop()
    }

    /// Pop the highest priority candidate accepted by `accept`.
    ///
    /// Rejected candidates are discarded.
    pub fn pop_matching<F>(&mut self, mut accept: F) -> Option<MergeCandidate>
    where
        F: FnMut(&MergeCandidate) -> bool,
    {
        while let Some(candidate) = self.heap.pop() {
            if accept(&candidate) {
                return Some(candidate);
            }
        }
        None
    }

    /// Get the number of entries in the queue.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl FromIterator<MergeCandidate> for PairPriorityQueue {
    fn from_iter<I: IntoIterator<Item = MergeCandidate>>(iter: I) -> Self {
        Self {
            heap: iter.into_iter().collect(),
        }
    }
}

/// Sort a pair-frequency table into rank order.
///
/// Frequency descending, then combined char length descending, then
/// composite key descending.
pub fn sort_pairs(pairs: &mut [(Pair, u64)]) {
    pairs.sort_by(|(pa, ca), (pb, cb)| {
        cb.cmp(ca)
            .then_with(|| pb.char_len().cmp(&pa.char_len()))
            .then_with(|| pb.cmp_key(pa))
            .then_with(|| pb.left.cmp(&pa.left))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut queue = PairPriorityQueue::new();

        queue.push(MergeCandidate::new(Pair::new("a", "b"), 10));
        queue.push(MergeCandidate::new(Pair::new("b", "c"), 20));
        queue.push(MergeCandidate::new(Pair::new("c", "d"), 15));

        assert_eq!(queue.pop().unwrap().count, 20);
        assert_eq!(queue.pop().unwrap().count, 15);
        assert_eq!(queue.pop().unwrap().count, 10);
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_tie_breaks() {
        // Equal frequency: longer pair wins
        let mut queue = PairPriorityQueue::new();
        queue.push(MergeCandidate::new(Pair::new("a", "b"), 5));
        queue.push(MergeCandidate::new(Pair::new("ab", "c"), 5));
        assert_eq!(queue.pop().unwrap().pair, Pair::new("ab", "c"));

        // Equal frequency and length: greater key wins
        let mut queue = PairPriorityQueue::new();
        queue.push(MergeCandidate::new(Pair::new("l", "o"), 5));
        queue.push(MergeCandidate::new(Pair::new("o", "w"), 5));
        assert_eq!(queue.pop().unwrap().pair, Pair::new("o", "w"));
    }

    #[test]
    fn test_score_before_count() {
        let mut queue = PairPriorityQueue::new();
        queue.push(MergeCandidate::with_score(
            Pair::new("q", "u"),
            3,
            Score::Ratio { num: 3, den: 9 },
        ));
        queue.push(MergeCandidate::with_score(
            Pair::new("t", "h"),
            2,
            Score::Ratio { num: 2, den: 4 },
        ));
        assert_eq!(queue.pop().unwrap().pair, Pair::new("t", "h"));
    }

    #[test]
    fn test_pop_matching() {
        let mut queue: PairPriorityQueue = [
            MergeCandidate::new(Pair::new("a", "b"), 9),
            MergeCandidate::new(Pair::new("c", "d"), 7),
            MergeCandidate::new(Pair::new("e", "f"), 3),
        ]
        .into_iter()
        .collect();

        let found = queue.pop_matching(|c| c.pair.left != "a").unwrap();
        assert_eq!(found.pair, Pair::new("c", "d"));
        // The rejected candidate is gone
        assert_eq!(queue.len(), 1);
        assert!(queue.pop_matching(|c| c.count > 100).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_ratio_is_exact() {
        assert_eq!(
            Score::Ratio { num: 1, den: 3 },
            Score::Ratio { num: 2, den: 6 }
        );
        assert!(Score::Ratio { num: 1, den: 3 } < Score::Ratio { num: 1, den: 2 });
        assert!(Score::Real(0.25) < Score::Real(0.5));
    }

    #[test]
    fn test_sort_pairs() {
        let mut pairs = vec![
            (Pair::new("l", "o"), 5),
            (Pair::new("e", "r"), 1),
            (Pair::new("o", "w"), 5),
            (Pair::new(" ", "low"), 4),
        ];
        sort_pairs(&mut pairs);
        let keys: Vec<String> = pairs.iter().map(|(p, _)| p.key()).collect();
        assert_eq!(keys, vec!["o|w", "l|o", " |low", "e|r"]);
    }
}
