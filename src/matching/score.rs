use std::collections::{HashMap, HashSet};

use crate::model::ConfidenceTier;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub character: f64,
    pub jaccard: f64,
    pub overlap: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            character: 0.40,
            jaccard: 0.30,
            overlap: 0.30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 0.85,
            medium: 0.70,
        }
    }
}

impl ConfidenceThresholds {
    pub fn tier(&self, score: f64) -> ConfidenceTier {
        if score >= self.high {
            ConfidenceTier::High
        } else if score >= self.medium {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimilarityScorer {
    pub weights: ScoreWeights,
}

impl SimilarityScorer {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// Blended similarity of two normalized strings, in `[0, 1]`.
    pub fn score(&self, left: &str, right: &str) -> f64 {
        let left_tokens = token_set(left);
        let right_tokens = token_set(right);

        let combined = self.weights.character * char_similarity(left, right)
            + self.weights.jaccard * jaccard(&left_tokens, &right_tokens)
            + self.weights.overlap * token_overlap(&left_tokens, &right_tokens);
        combined.clamp(0.0, 1.0)
    }
}

pub fn token_set(text: &str) -> HashSet<&str> {
    text.split_whitespace().collect()
}

pub fn jaccard(left: &HashSet<&str>, right: &HashSet<&str>) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(right).count();
    let union = left.union(right).count();
    shared as f64 / union as f64
}

/// Shared tokens over the smaller set; 1.0 when one side contains the other.
pub fn token_overlap(left: &HashSet<&str>, right: &HashSet<&str>) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(right).count();
    shared as f64 / left.len().min(right.len()) as f64
}

/// Ratcliff/Obershelp ratio: `2 * matched / (len(a) + len(b))` over characters.
pub fn char_similarity(left: &str, right: &str) -> f64 {
    let a = left.chars().collect::<Vec<char>>();
    let b = right.chars().collect::<Vec<char>>();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = BlockMatcher::new(&a, &b).matched_chars();
    2.0 * matched as f64 / total as f64
}

// Sequences at least this long drop very frequent characters from the index.
const POPULAR_MIN_LEN: usize = 200;

struct BlockMatcher<'s> {
    a: &'s [char],
    b: &'s [char],
    b_index: HashMap<char, Vec<usize>>,
    popular: HashSet<char>,
}

impl<'s> BlockMatcher<'s> {
    fn new(a: &'s [char], b: &'s [char]) -> Self {
        let mut b_index = HashMap::<char, Vec<usize>>::new();
        for (position, character) in b.iter().enumerate() {
            b_index.entry(*character).or_default().push(position);
        }

        let mut popular = HashSet::new();
        if b.len() >= POPULAR_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b_index.retain(|character, positions| {
                if positions.len() > limit {
                    popular.insert(*character);
                    false
                } else {
                    true
                }
            });
        }

        Self {
            a,
            b,
            b_index,
            popular,
        }
    }

    fn matched_chars(&self) -> usize {
        let mut matched = 0;
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((a_lo, a_hi, b_lo, b_hi)) = queue.pop() {
            let (i, j, size) = self.longest_match(a_lo, a_hi, b_lo, b_hi);
            if size == 0 {
                continue;
            }
            matched += size;
            if a_lo < i && b_lo < j {
                queue.push((a_lo, i, b_lo, j));
            }
            if i + size < a_hi && j + size < b_hi {
                queue.push((i + size, a_hi, j + size, b_hi));
            }
        }

        matched
    }

    fn longest_match(
        &self,
        a_lo: usize,
        a_hi: usize,
        b_lo: usize,
        b_hi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_size) = (a_lo, b_lo, 0);
        let mut run_lengths = HashMap::<usize, usize>::new();

        for i in a_lo..a_hi {
            let mut next_run_lengths = HashMap::<usize, usize>::new();
            if let Some(positions) = self.b_index.get(&self.a[i]) {
                for &j in positions {
                    if j < b_lo {
                        continue;
                    }
                    if j >= b_hi {
                        break;
                    }
                    let previous = if j == 0 {
                        0
                    } else {
                        run_lengths.get(&(j - 1)).copied().unwrap_or(0)
                    };
                    let length = previous + 1;
                    next_run_lengths.insert(j, length);
                    if length > best_size {
                        best_i = i + 1 - length;
                        best_j = j + 1 - length;
                        best_size = length;
                    }
                }
            }
            run_lengths = next_run_lengths;
        }

        // popular characters were left out of the index; grow the block over them
        if !self.popular.is_empty() {
            while best_i > a_lo
                && best_j > b_lo
                && self.a[best_i - 1] == self.b[best_j - 1]
            {
                best_i -= 1;
                best_j -= 1;
                best_size += 1;
            }
            while best_i + best_size < a_hi
                && best_j + best_size < b_hi
                && self.a[best_i + best_size] == self.b[best_j + best_size]
            {
                best_size += 1;
            }
        }

        (best_i, best_j, best_size)
    }
}
