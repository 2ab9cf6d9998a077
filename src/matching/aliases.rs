use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::{NoExpand, Regex};
use tracing::info;

/// Rewrites free text so that known synonyms collapse onto one term.
///
/// Input arrives lower-cased and trimmed; the output is handed on to
/// punctuation and stopword stripping.
pub trait TermCanonicalizer {
    fn canonicalize(&self, text: &str) -> String;
}

const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
    ("naive bayes", &["nb", "naïve bayes"]),
    ("k-means", &["kmeans", "k means", "k-means clustering"]),
    ("k-medoids", &["kmedoids", "k medoids"]),
    (
        "hierarchical clustering",
        &["agglomerative clustering", "divisive clustering"],
    ),
    ("principal component analysis", &["pca"]),
    (
        "support vector machine",
        &["svm", "support vector machines", "support vector classifier"],
    ),
    ("decision tree", &["dt", "id3", "c4.5", "cart"]),
    (
        "association rules",
        &["apriori", "fp growth", "frequent pattern", "market basket"],
    ),
    ("outlier detection", &["anomaly detection"]),
    ("feature selection", &["attribute selection"]),
    (
        "data preprocessing",
        &["data preparation", "data cleaning", "data cleansing"],
    ),
    (
        "distance measures",
        &["similarity measures", "dissimilarity", "proximity"],
    ),
    ("logistic regression", &["logit"]),
    ("linear regression", &["ols"]),
    ("neural networks", &["ann", "mlp"]),
    ("k-nearest neighbors", &["knn", "k nn", "k-nn"]),
    ("dimensionality reduction", &["feature extraction"]),
    ("cross validation", &["k-fold", "k fold"]),
];

/// Canonical term to synonyms, all lower-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    entries: BTreeMap<String, Vec<String>>,
}

impl AliasTable {
    pub fn builtin() -> Self {
        let entries = BUILTIN_ALIASES
            .iter()
            .map(|(canonical, synonyms)| {
                (
                    canonical.to_string(),
                    synonyms.iter().map(|value| value.to_string()).collect(),
                )
            })
            .collect();
        Self { entries }
    }

    /// Built-in table, with the JSON file at `path` merged on top when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut table = Self::builtin();
        let Some(path) = path else {
            return Ok(table);
        };

        let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let user: BTreeMap<String, Vec<String>> = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse alias map {}", path.display()))?;

        let user_entries = user.len();
        table.merge(user);
        info!(
            path = %path.display(),
            user_entries,
            total_entries = table.len(),
            synonyms = table.iter().map(|(_, synonyms)| synonyms.len()).sum::<usize>(),
            "loaded alias overrides"
        );
        Ok(table)
    }

    /// User entries replace built-in ones on key collision (case-insensitive).
    /// Keys are applied in byte order, so among spellings that differ only in
    /// case the last one in that order wins.
    pub fn merge(&mut self, user: BTreeMap<String, Vec<String>>) {
        for (canonical, synonyms) in user {
            let synonyms = synonyms
                .iter()
                .map(|value| value.trim().to_lowercase())
                .filter(|value| !value.is_empty())
                .collect();
            self.entries
                .insert(canonical.trim().to_lowercase(), synonyms);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(canonical, synonyms)| (canonical.as_str(), synonyms.as_slice()))
    }

    /// Compiles whole-word replacement rules, longest canonical term first.
    pub fn compile(&self) -> Result<AliasCanonicalizer> {
        let mut ordered = self.entries.iter().collect::<Vec<_>>();
        // stable sort keeps alphabetical order among equal lengths
        ordered.sort_by(|(left, _), (right, _)| right.chars().count().cmp(&left.chars().count()));

        let mut rules = Vec::with_capacity(ordered.len());
        for (canonical, synonyms) in ordered {
            let mut patterns = Vec::with_capacity(synonyms.len());
            for synonym in synonyms {
                let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(synonym)))
                    .with_context(|| format!("failed to compile alias pattern for {synonym:?}"))?;
                patterns.push(pattern);
            }
            rules.push(AliasRule {
                canonical: canonical.clone(),
                patterns,
            });
        }

        Ok(AliasCanonicalizer { rules })
    }
}

struct AliasRule {
    canonical: String,
    patterns: Vec<Regex>,
}

pub struct AliasCanonicalizer {
    rules: Vec<AliasRule>,
}

impl TermCanonicalizer for AliasCanonicalizer {
    fn canonicalize(&self, text: &str) -> String {
        let mut current = text.to_string();
        for rule in &self.rules {
            for pattern in &rule.patterns {
                if pattern.is_match(&current) {
                    current = pattern
                        .replace_all(&current, NoExpand(&rule.canonical))
                        .into_owned();
                }
            }
        }
        current
    }
}
