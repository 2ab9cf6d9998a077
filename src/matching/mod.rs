mod aliases;
mod normalize;
mod score;
mod strategy;

#[cfg(test)]
mod tests;

use std::collections::HashMap;

pub use aliases::{AliasTable, TermCanonicalizer};
pub use normalize::TopicNormalizer;
pub use score::{ConfidenceThresholds, ScoreWeights, SimilarityScorer};
pub use strategy::{AssignmentMode, AssignmentStrategy, MatchLimits, ScoreMatrix};

use crate::model::{Item, MatchOutcome, MatchRecord, UnmatchedTopic};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchConfig {
    pub limits: MatchLimits,
    pub weights: ScoreWeights,
    pub confidence: ConfidenceThresholds,
}

/// Scores every topic against every question and turns the chosen
/// assignment back into records.
pub fn match_topics<C: TermCanonicalizer>(
    topics: &[Item],
    questions: &[String],
    normalizer: &TopicNormalizer<C>,
    config: &MatchConfig,
    strategy: &dyn AssignmentStrategy,
) -> MatchOutcome {
    let normalized_questions = questions
        .iter()
        .map(|question| normalizer.normalize(question))
        .collect::<Vec<String>>();
    let normalized_topics = topics
        .iter()
        .map(|topic| normalizer.normalize(&topic.text))
        .collect::<Vec<String>>();

    let mut first_seen = HashMap::<&str, usize>::new();
    let column_groups = questions
        .iter()
        .enumerate()
        .map(|(index, question)| *first_seen.entry(question.as_str()).or_insert(index))
        .collect::<Vec<usize>>();

    let scorer = SimilarityScorer::new(config.weights);
    let matrix = ScoreMatrix::from_fn(topics.len(), column_groups, |row, column| {
        scorer.score(&normalized_topics[row], &normalized_questions[column])
    });

    let assignment = strategy.assign(&matrix, &config.limits);

    let records = assignment
        .pairs
        .iter()
        .map(|pair| {
            let topic = &topics[pair.row];
            MatchRecord {
                page: topic.page,
                topic: topic.text.clone(),
                question: questions[pair.column].clone(),
                score: pair.score,
                confidence: config.confidence.tier(pair.score),
            }
        })
        .collect();

    MatchOutcome {
        records,
        unmatched_topics: assignment
            .unmatched_rows
            .iter()
            .map(|row| UnmatchedTopic {
                page: topics[*row].page,
                topic: topics[*row].text.clone(),
            })
            .collect(),
        unmatched_questions: assignment
            .unmatched_columns
            .iter()
            .map(|column| questions[*column].clone())
            .collect(),
    }
}
