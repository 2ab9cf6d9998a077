use std::cmp::Ordering;
use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use crate::model::{Item, PageLayout, PositionedLine};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentConfig {
    /// Smallest top-to-top gap that always starts a new item.
    pub min_gap: f64,
    /// Gap threshold as a multiple of the previous line's glyph size.
    pub gap_multiplier: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            min_gap: 20.0,
            gap_multiplier: 2.2,
        }
    }
}

impl SegmentConfig {
    pub fn gap_threshold(&self, previous_glyph_size: f64) -> f64 {
        self.min_gap.max(self.gap_multiplier * previous_glyph_size)
    }
}

pub struct LinePatterns {
    header: Regex,
    bullet: Regex,
}

impl LinePatterns {
    pub fn new() -> Result<Self> {
        Ok(Self {
            header: Regex::new(r"(?i)^(?:page\s*\d+|\d{4}|section|part|final|midterm|exam)\b")
                .context("failed to compile header/footer regex")?,
            bullet: Regex::new(
                r"^(?:[-\u{2022}\u{2023}\u{2219}\u{25E6}\u{00B7}]|\d{1,3}[.)]|\(?\d{1,3}\)?[.)]?|[a-zA-Z][.)])\s+",
            )
            .context("failed to compile bullet regex")?,
        })
    }

    pub fn is_header(&self, text: &str) -> bool {
        self.header.is_match(text)
    }

    /// Byte length of a leading bullet or numbering marker, trailing whitespace included.
    pub fn bullet_prefix_len(&self, text: &str) -> Option<usize> {
        self.bullet.find(text).map(|found| found.end())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SegmentStats {
    pub lines_seen: usize,
    pub empty_lines_dropped: usize,
    pub header_lines_dropped: usize,
    pub lines_assigned: usize,
    pub gap_boundaries: usize,
    pub bullet_boundaries: usize,
    pub question_terminators: usize,
    pub items_emitted: usize,
    pub duplicates_removed: usize,
}

/// Reading order within one page: top edge descending, then left edge ascending.
pub fn order_page_lines(lines: &mut [PositionedLine]) {
    lines.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then(b.bbox.y1.partial_cmp(&a.bbox.y1).unwrap_or(Ordering::Equal))
            .then(a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal))
    });
}

/// Streaming question segmenter. Feed pages in ascending page order; the
/// in-progress item may span a page break.
pub struct Segmenter<'p> {
    config: SegmentConfig,
    patterns: &'p LinePatterns,
    buffer: Vec<String>,
    buffer_page: Option<u32>,
    last_top: Option<f64>,
    last_glyph_size: Option<f64>,
    items: Vec<Item>,
    stats: SegmentStats,
}

impl<'p> Segmenter<'p> {
    pub fn new(config: SegmentConfig, patterns: &'p LinePatterns) -> Self {
        Self {
            config,
            patterns,
            buffer: Vec::new(),
            buffer_page: None,
            last_top: None,
            last_glyph_size: None,
            items: Vec::new(),
            stats: SegmentStats::default(),
        }
    }

    pub fn push_page(&mut self, mut page: PageLayout) {
        order_page_lines(&mut page.lines);
        for line in &page.lines {
            self.push_line(line);
        }
    }

    pub fn push_line(&mut self, line: &PositionedLine) {
        self.stats.lines_seen += 1;

        let mut text = line.text.trim();
        if text.is_empty() {
            self.stats.empty_lines_dropped += 1;
            return;
        }
        if self.patterns.is_header(text) {
            self.stats.header_lines_dropped += 1;
            return;
        }

        if let (Some(last_top), Some(last_size)) = (self.last_top, self.last_glyph_size) {
            let gap = last_top - line.bbox.y1;
            if gap > self.config.gap_threshold(last_size) && !self.buffer.is_empty() {
                self.stats.gap_boundaries += 1;
                self.flush();
            }
        }

        if let Some(prefix_len) = self.patterns.bullet_prefix_len(text) {
            if !self.buffer.is_empty() {
                self.stats.bullet_boundaries += 1;
            }
            self.flush();
            text = &text[prefix_len..];
        }

        if self.buffer.is_empty() {
            self.buffer_page = Some(line.page);
        }
        self.buffer.push(text.to_string());
        self.stats.lines_assigned += 1;

        if text.trim_end().ends_with('?') {
            self.stats.question_terminators += 1;
            self.flush();
        }

        self.last_top = Some(line.bbox.y1);
        if let Some(size) = line.avg_glyph_size.filter(|size| *size > 0.0) {
            self.last_glyph_size = Some(size);
        }
    }

    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let text = self
            .buffer
            .iter()
            .flat_map(|fragment| fragment.split_whitespace())
            .collect::<Vec<&str>>()
            .join(" ");
        if !text.is_empty() {
            self.items.push(Item {
                page: self.buffer_page,
                text,
            });
        }

        self.buffer.clear();
        self.buffer_page = None;
    }

    /// Flushes the tail and drops repeated items, keeping first occurrences.
    pub fn finish(mut self) -> (Vec<Item>, SegmentStats) {
        self.flush();

        let mut seen = HashSet::<String>::new();
        let mut unique = Vec::with_capacity(self.items.len());
        for item in self.items {
            if seen.insert(item.text.clone()) {
                unique.push(item);
            } else {
                self.stats.duplicates_removed += 1;
            }
        }

        self.stats.items_emitted = unique.len();
        (unique, self.stats)
    }
}
