use std::cmp::Ordering;
use std::collections::HashSet;

use clap::ValueEnum;

/// Topic-by-question similarity scores.
///
/// Columns holding byte-identical question text share a group id (the index
/// of the first such column), which is what unmatched-tracking keys on.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    rows: usize,
    column_groups: Vec<usize>,
    scores: Vec<f64>,
}

impl ScoreMatrix {
    pub fn from_fn<F>(rows: usize, column_groups: Vec<usize>, mut score: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let columns = column_groups.len();
        let mut scores = Vec::with_capacity(rows * columns);
        for row in 0..rows {
            for column in 0..columns {
                scores.push(score(row, column));
            }
        }
        Self {
            rows,
            column_groups,
            scores,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.column_groups.len()
    }

    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.scores[row * self.columns() + column]
    }

    pub fn group(&self, column: usize) -> usize {
        self.column_groups[column]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchLimits {
    pub min_score: f64,
    pub max_matches: usize,
}

impl Default for MatchLimits {
    fn default() -> Self {
        Self {
            min_score: 0.72,
            max_matches: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AssignedPair {
    pub row: usize,
    pub column: usize,
    pub score: f64,
}

/// Pairs ordered by row, then score descending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    pub pairs: Vec<AssignedPair>,
    pub unmatched_rows: Vec<usize>,
    pub unmatched_columns: Vec<usize>,
}

pub trait AssignmentStrategy {
    fn name(&self) -> &'static str;

    fn assign(&self, matrix: &ScoreMatrix, limits: &MatchLimits) -> Assignment;
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum AssignmentMode {
    #[default]
    Greedy,
    Exclusive,
}

impl AssignmentMode {
    pub fn strategy(self) -> Box<dyn AssignmentStrategy> {
        match self {
            Self::Greedy => Box::new(GreedyPerTopic),
            Self::Exclusive => Box::new(ExclusiveGreedy),
        }
    }
}

fn by_score_descending(left: f64, right: f64) -> Ordering {
    right.partial_cmp(&left).unwrap_or(Ordering::Equal)
}

/// Each topic independently takes its best `max_matches` questions.
///
/// A question leaves the unmatched set the first time any topic claims it,
/// yet later topics may still match it.
pub struct GreedyPerTopic;

impl AssignmentStrategy for GreedyPerTopic {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn assign(&self, matrix: &ScoreMatrix, limits: &MatchLimits) -> Assignment {
        let mut assignment = Assignment::default();
        let mut still_unmatched = (0..matrix.columns()).collect::<Vec<usize>>();

        for row in 0..matrix.rows() {
            let mut candidates = (0..matrix.columns())
                .map(|column| (column, matrix.get(row, column)))
                .filter(|(_, score)| *score >= limits.min_score)
                .collect::<Vec<(usize, f64)>>();
            candidates.sort_by(|left, right| by_score_descending(left.1, right.1));
            candidates.truncate(limits.max_matches);

            if candidates.is_empty() {
                assignment.unmatched_rows.push(row);
                continue;
            }

            for (column, score) in candidates {
                assignment.pairs.push(AssignedPair { row, column, score });

                let group = matrix.group(column);
                if let Some(position) = still_unmatched
                    .iter()
                    .position(|candidate| matrix.group(*candidate) == group)
                {
                    still_unmatched.remove(position);
                }
            }
        }

        assignment.unmatched_columns = still_unmatched;
        assignment
    }
}

/// Highest scores claim first; every distinct question text is used at most once.
pub struct ExclusiveGreedy;

impl AssignmentStrategy for ExclusiveGreedy {
    fn name(&self) -> &'static str {
        "exclusive"
    }

    fn assign(&self, matrix: &ScoreMatrix, limits: &MatchLimits) -> Assignment {
        let mut candidates = Vec::new();
        for row in 0..matrix.rows() {
            for column in 0..matrix.columns() {
                let score = matrix.get(row, column);
                if score >= limits.min_score {
                    candidates.push(AssignedPair { row, column, score });
                }
            }
        }
        candidates.sort_by(|left, right| {
            by_score_descending(left.score, right.score)
                .then(left.row.cmp(&right.row))
                .then(left.column.cmp(&right.column))
        });

        // identical question texts share a group and are claimed together
        let mut claimed_groups = HashSet::new();
        let mut per_row = vec![0usize; matrix.rows()];
        let mut pairs = Vec::new();
        for candidate in candidates {
            let group = matrix.group(candidate.column);
            if per_row[candidate.row] >= limits.max_matches || claimed_groups.contains(&group) {
                continue;
            }
            per_row[candidate.row] += 1;
            claimed_groups.insert(group);
            pairs.push(candidate);
        }
        pairs.sort_by(|left, right| {
            left.row
                .cmp(&right.row)
                .then(by_score_descending(left.score, right.score))
        });

        Assignment {
            pairs,
            unmatched_rows: (0..matrix.rows())
                .filter(|row| per_row[*row] == 0)
                .collect(),
            unmatched_columns: (0..matrix.columns())
                .filter(|column| !claimed_groups.contains(&matrix.group(*column)))
                .collect(),
        }
    }
}
