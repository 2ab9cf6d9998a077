use std::collections::BTreeMap;

use super::aliases::AliasCanonicalizer;
use super::score::{char_similarity, jaccard, token_overlap, token_set};
use super::strategy::{AssignedPair, ExclusiveGreedy, GreedyPerTopic};
use super::*;
use crate::model::{ConfidenceTier, Item};

fn builtin_normalizer() -> TopicNormalizer<AliasCanonicalizer> {
    let canonicalizer = AliasTable::builtin()
        .compile()
        .expect("builtin aliases should compile");
    TopicNormalizer::new(canonicalizer).expect("normalizer should build")
}

fn topic(page: u32, text: &str) -> Item {
    Item {
        page: Some(page),
        text: text.to_string(),
    }
}

fn synonyms_of<'t>(table: &'t AliasTable, canonical: &str) -> Option<&'t [String]> {
    table
        .iter()
        .find(|(key, _)| *key == canonical)
        .map(|(_, synonyms)| synonyms)
}

fn pair(row: usize, column: usize, score: f64) -> AssignedPair {
    AssignedPair { row, column, score }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn normalize_applies_aliases_and_strips_noise() {
    let normalizer = builtin_normalizer();

    assert_eq!(
        normalizer.normalize("What is an SVM?"),
        "what is support vector machine"
    );
    assert_eq!(
        normalizer.normalize("Explain the Naïve Bayes classifier"),
        "explain naive bayes classifier"
    );
    assert_eq!(normalizer.normalize("K-Means Clustering"), "k means");
    assert_eq!(
        normalizer.normalize("Apriori vs. FP Growth for market basket data"),
        "association rules vs association rules association rules data"
    );
    assert_eq!(
        normalizer.normalize("  The curse of dimensionality  "),
        "curse dimensionality"
    );
}

#[test]
fn normalize_is_idempotent_on_canonical_text() {
    let normalizer = builtin_normalizer();
    let table = AliasTable::builtin();

    for (canonical, _) in table.iter() {
        let once = normalizer.normalize(&format!("compare {canonical} results"));
        assert_eq!(normalizer.normalize(&once), once, "canonical {canonical}");
    }
}

#[test]
fn every_synonym_collapses_to_its_canonical_term() {
    let normalizer = builtin_normalizer();
    let table = AliasTable::builtin();

    for (canonical, synonyms) in table.iter() {
        let canonical_normalized = normalizer.normalize(canonical);
        for synonym in synonyms {
            let normalized = normalizer.normalize(&format!("x {synonym} y"));
            assert!(
                normalized.contains(&canonical_normalized),
                "{synonym} -> {normalized}, expected {canonical_normalized}"
            );

            let single_word = synonym.chars().all(|ch| ch.is_ascii_alphanumeric());
            let part_of_canonical = canonical_normalized
                .split_whitespace()
                .any(|token| token == synonym);
            if single_word && !part_of_canonical {
                assert!(
                    normalized.split_whitespace().all(|token| token != synonym),
                    "{synonym} survived in {normalized}"
                );
            }
        }
    }
}

#[test]
fn longer_canonical_terms_are_applied_first() {
    let mut table = AliasTable::default();
    table.merge(BTreeMap::from([
        ("tree".to_string(), vec!["dt".to_string()]),
        (
            "gradient boosted tree".to_string(),
            vec!["gbdt".to_string(), "boosted dt".to_string()],
        ),
    ]));
    let normalizer =
        TopicNormalizer::new(table.compile().expect("aliases should compile")).expect("normalizer");

    assert_eq!(normalizer.normalize("Boosted DT models"), "gradient boosted tree models");
    assert_eq!(normalizer.normalize("a DT"), "tree");
}

#[test]
fn user_aliases_override_builtin_entries_case_insensitively() {
    let mut table = AliasTable::builtin();
    table.merge(BTreeMap::from([
        ("Decision Tree".to_string(), vec!["  CART ".to_string()]),
        ("gradient boosting".to_string(), vec!["GBM".to_string()]),
    ]));

    assert_eq!(synonyms_of(&table, "decision tree"), Some(&["cart".to_string()][..]));
    assert_eq!(synonyms_of(&table, "gradient boosting"), Some(&["gbm".to_string()][..]));
    assert!(synonyms_of(&table, "Decision Tree").is_none());

    let normalizer =
        TopicNormalizer::new(table.compile().expect("aliases should compile")).expect("normalizer");
    assert_eq!(normalizer.normalize("ID3 versus CART"), "id3 versus decision tree");
}

#[test]
fn case_variant_user_keys_merge_deterministically() {
    let mut table = AliasTable::default();
    table.merge(BTreeMap::from([
        ("svm".to_string(), vec!["lower".to_string()]),
        ("SVM".to_string(), vec!["upper".to_string()]),
    ]));

    assert_eq!(table.len(), 1);
    assert_eq!(synonyms_of(&table, "svm"), Some(&["lower".to_string()][..]));
}

#[test]
fn alias_table_loads_json_overrides_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("aliases.json");
    std::fs::write(&path, r#"{"Random Forest": ["RF", "bagged trees"]}"#).expect("write aliases");

    let table = AliasTable::load(Some(&path)).expect("aliases should load");
    assert_eq!(table.len(), AliasTable::builtin().len() + 1);
    assert_eq!(
        synonyms_of(&table, "random forest"),
        Some(&["rf".to_string(), "bagged trees".to_string()][..])
    );
}

#[test]
fn alias_table_rejects_malformed_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("aliases.json");
    std::fs::write(&path, r#"["not", "a", "map"]"#).expect("write aliases");

    assert!(AliasTable::load(Some(&path)).is_err());
    assert!(AliasTable::load(Some(&dir.path().join("missing.json"))).is_err());
}

#[test]
fn token_metrics_follow_set_semantics() {
    let left = token_set("decision tree pruning");
    let right = token_set("decision tree tree");
    let empty = token_set("");

    assert!((jaccard(&left, &right) - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(token_overlap(&left, &right), 1.0);
    assert_eq!(jaccard(&left, &empty), 0.0);
    assert_eq!(token_overlap(&empty, &right), 0.0);
}

#[test]
fn char_similarity_uses_matching_blocks() {
    assert_eq!(char_similarity("abcd", "bcde"), 0.75);
    let ratio = char_similarity("decision tree", "decision trees");
    assert!((ratio - 0.9629629629629629).abs() < 1e-12);
    assert_eq!(char_similarity("", ""), 1.0);
    assert_eq!(char_similarity("abc", ""), 0.0);

    let long = "abcabcabc ".repeat(30);
    assert_eq!(char_similarity(&long, &long), 1.0);
}

#[test]
fn combined_score_matches_reference_values_and_stays_in_bounds() {
    let scorer = SimilarityScorer::default();

    let pruning = scorer.score("decision tree pruning", "decision tree");
    assert!((pruning - 0.8058823529411765).abs() < 1e-9);
    assert!(
        (scorer.score("support vector machine", "support vector machine margin")
            - 0.8700980392156863)
            .abs()
            < 1e-9
    );
    assert!((scorer.score("k means", "hierarchical clustering") - 0.08).abs() < 1e-9);

    for text in ["k means", "support vector machine", "x"] {
        assert_eq!(scorer.score(text, text), 1.0);
    }

    let samples = ["", "a", "naive bayes", "bayes naive bayes", "zzz qqq"];
    for left in samples {
        for right in samples {
            let score = scorer.score(left, right);
            assert!((0.0..=1.0).contains(&score), "{left:?} vs {right:?} = {score}");
        }
    }
}

#[test]
fn confidence_tiers_use_inclusive_lower_bounds() {
    let thresholds = ConfidenceThresholds::default();
    assert_eq!(thresholds.tier(0.85), ConfidenceTier::High);
    assert_eq!(thresholds.tier(0.8499), ConfidenceTier::Medium);
    assert_eq!(thresholds.tier(0.70), ConfidenceTier::Medium);
    assert_eq!(thresholds.tier(0.69), ConfidenceTier::Low);
}

#[test]
fn greedy_caps_matches_and_respects_min_score() {
    let scores = [[0.9, 0.8, 0.75, 0.5], [0.1, 0.2, 0.3, 0.71]];
    let matrix = ScoreMatrix::from_fn(2, vec![0, 1, 2, 3], |row, column| scores[row][column]);

    let assignment = GreedyPerTopic.assign(&matrix, &MatchLimits::default());

    assert_eq!(assignment.pairs, vec![pair(0, 0, 0.9), pair(0, 1, 0.8)]);
    assert_eq!(assignment.unmatched_rows, vec![1]);
    assert_eq!(assignment.unmatched_columns, vec![2, 3]);
}

#[test]
fn greedy_lets_later_topics_reuse_claimed_questions() {
    let scores = [[0.95, 0.1], [0.9, 0.1]];
    let matrix = ScoreMatrix::from_fn(2, vec![0, 1], |row, column| scores[row][column]);

    let assignment = GreedyPerTopic.assign(&matrix, &MatchLimits::default());

    assert_eq!(assignment.pairs.len(), 2);
    assert!(assignment.pairs.iter().all(|pair| pair.column == 0));
    assert_eq!(assignment.unmatched_columns, vec![1]);
}

#[test]
fn greedy_removes_one_duplicate_question_per_claim() {
    // columns 0 and 1 carry the same question text
    let scores = [[0.9, 0.1, 0.1], [0.9, 0.1, 0.1]];
    let matrix = ScoreMatrix::from_fn(2, vec![0, 0, 2], |row, column| scores[row][column]);

    let assignment = GreedyPerTopic.assign(&matrix, &MatchLimits::default());

    assert_eq!(assignment.unmatched_columns, vec![2]);
}

#[test]
fn exclusive_claims_each_question_once() {
    let scores = [[0.9, 0.8], [0.95, 0.74]];
    let matrix = ScoreMatrix::from_fn(2, vec![0, 1], |row, column| scores[row][column]);

    let assignment = ExclusiveGreedy.assign(&matrix, &MatchLimits::default());

    assert_eq!(assignment.pairs, vec![pair(0, 1, 0.8), pair(1, 0, 0.95)]);
    assert!(assignment.unmatched_rows.is_empty());
    assert!(assignment.unmatched_columns.is_empty());
}

#[test]
fn exclusive_claims_identical_question_text_once() {
    // columns 0 and 1 carry the same question text
    let scores = [[0.9, 0.9, 0.1], [0.85, 0.85, 0.8]];
    let matrix = ScoreMatrix::from_fn(2, vec![0, 0, 2], |row, column| scores[row][column]);

    let assignment = ExclusiveGreedy.assign(&matrix, &MatchLimits::default());

    assert_eq!(assignment.pairs, vec![pair(0, 0, 0.9), pair(1, 2, 0.8)]);
    let groups = assignment
        .pairs
        .iter()
        .map(|pair| matrix.group(pair.column))
        .collect::<Vec<usize>>();
    assert_eq!(groups, vec![0, 2]);
    assert!(assignment.unmatched_rows.is_empty());
    assert!(assignment.unmatched_columns.is_empty());
}

#[test]
fn exclusive_reports_every_copy_of_an_unclaimed_question() {
    let scores = [[0.9, 0.1, 0.1]];
    let matrix = ScoreMatrix::from_fn(1, vec![0, 1, 1], |row, column| scores[row][column]);

    let assignment = ExclusiveGreedy.assign(&matrix, &MatchLimits::default());

    assert_eq!(assignment.pairs, vec![pair(0, 0, 0.9)]);
    assert_eq!(assignment.unmatched_columns, vec![1, 2]);
}

#[test]
fn match_topics_orders_records_and_reports_residuals() {
    let normalizer = builtin_normalizer();
    let topics = vec![
        topic(1, "Decision Trees"),
        topic(2, "Support Vector Machines"),
        topic(3, "Bayesian Networks"),
    ];
    let questions = strings(&[
        "decision tree",
        "decision trees",
        "SVM",
        "decision tree",
        "support vector machine margin",
    ]);

    let outcome = match_topics(
        &topics,
        &questions,
        &normalizer,
        &MatchConfig::default(),
        &GreedyPerTopic,
    );

    let summary = outcome
        .records
        .iter()
        .map(|record| (record.page, record.question.as_str(), record.confidence))
        .collect::<Vec<_>>();
    assert_eq!(
        summary,
        vec![
            (Some(1), "decision trees", ConfidenceTier::High),
            (Some(2), "SVM", ConfidenceTier::High),
            (Some(2), "support vector machine margin", ConfidenceTier::High),
        ]
    );
    assert!((outcome.records[2].score - 0.8700980392156863).abs() < 1e-9);

    assert_eq!(outcome.unmatched_topics.len(), 1);
    assert_eq!(outcome.unmatched_topics[0].topic, "Bayesian Networks");
    assert_eq!(outcome.unmatched_topics[0].page, Some(3));
    assert_eq!(
        outcome.unmatched_questions,
        strings(&["decision tree", "decision tree"])
    );
}

#[test]
fn match_topics_honors_cap_and_floor_contracts() {
    let normalizer = builtin_normalizer();
    let topics = vec![topic(1, "Decision Tree"), topic(2, "Decision Tree Pruning")];
    let questions = strings(&[
        "decision tree",
        "Decision tree?",
        "decision tree pruning",
        "pruning a decision tree",
        "k-means",
    ]);
    let config = MatchConfig {
        limits: MatchLimits {
            min_score: 0.72,
            max_matches: 2,
        },
        ..MatchConfig::default()
    };

    let outcome = match_topics(&topics, &questions, &normalizer, &config, &GreedyPerTopic);

    for topic in &topics {
        let count = outcome
            .records
            .iter()
            .filter(|record| record.topic == topic.text)
            .count();
        assert!(count <= config.limits.max_matches);
    }
    assert!(outcome.records.iter().all(|record| record.score >= 0.72));

    // every question is either claimed or still unmatched, never both
    for question in &questions {
        let claimed = outcome.records.iter().any(|record| &record.question == question);
        let unmatched = outcome.unmatched_questions.contains(question);
        assert!(claimed != unmatched, "{question}");
    }
}
