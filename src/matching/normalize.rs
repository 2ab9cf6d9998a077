use anyhow::{Context, Result};
use regex::Regex;

use super::aliases::TermCanonicalizer;

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "of", "and", "or", "to", "for", "from", "in", "on", "with", "without", "by",
    "as", "at", "into", "over", "under", "between", "among", "against",
];

pub struct TopicNormalizer<C> {
    canonicalizer: C,
    non_alphanumeric: Regex,
}

impl<C: TermCanonicalizer> TopicNormalizer<C> {
    pub fn new(canonicalizer: C) -> Result<Self> {
        Ok(Self {
            canonicalizer,
            non_alphanumeric: Regex::new(r"[^a-z0-9\s]")
                .context("failed to compile punctuation regex")?,
        })
    }

    /// Lower-case, canonicalize, strip punctuation, collapse whitespace, drop stopwords.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.trim().to_lowercase();
        let canonical = self.canonicalizer.canonicalize(&lowered);
        let stripped = self.non_alphanumeric.replace_all(&canonical, " ");

        stripped
            .split_whitespace()
            .filter(|token| !STOPWORDS.contains(token))
            .collect::<Vec<&str>>()
            .join(" ")
    }
}
