use std::cmp::Ordering;

use super::FALLBACK_PAGE_HEIGHT;
use crate::model::{PageLayout, PositionedLine};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitleConfig {
    /// Fraction of the page, measured from the top, searched for a heading.
    pub top_ratio: f64,
    /// Minimum smaller/larger glyph-size ratio for a continuation line.
    pub merge_threshold: f64,
    pub merge_gap_factor: f64,
    pub align_tolerance_min: f64,
    pub align_tolerance_factor: f64,
    /// Used when the extractor reports no page height.
    pub fallback_page_height: f64,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            top_ratio: 0.35,
            merge_threshold: 0.9,
            merge_gap_factor: 1.6,
            align_tolerance_min: 10.0,
            align_tolerance_factor: 0.8,
            fallback_page_height: FALLBACK_PAGE_HEIGHT,
        }
    }
}

struct SizedLine<'a> {
    line: &'a PositionedLine,
    size: f64,
}

/// Picks the heading of one page; empty when the page has no sized text.
pub fn select_title(page: &PageLayout, config: &TitleConfig) -> String {
    let lines = page
        .lines
        .iter()
        .filter(|line| !line.text.trim().is_empty())
        .filter_map(|line| {
            line.avg_glyph_size
                .filter(|size| *size > 0.0)
                .map(|size| SizedLine { line, size })
        })
        .collect::<Vec<SizedLine<'_>>>();

    if lines.is_empty() {
        return String::new();
    }

    let page_height = page
        .height
        .filter(|height| *height > 0.0)
        .unwrap_or(config.fallback_page_height);
    let top_cut = page_height * (1.0 - config.top_ratio);

    let in_top_area = lines
        .iter()
        .filter(|candidate| candidate.line.bbox.y1 >= top_cut)
        .collect::<Vec<&SizedLine<'_>>>();
    let candidates = if in_top_area.is_empty() {
        lines.iter().collect()
    } else {
        in_top_area
    };

    let Some(title) = largest_then_highest(&candidates) else {
        return String::new();
    };

    let mut text = title.line.text.trim().to_string();
    if let Some(continuation) = continuation_line(title, &lines, config) {
        text.push(' ');
        text.push_str(continuation.line.text.trim());
    }
    text
}

// first wins on exact ties, keeping extraction order
fn largest_then_highest<'a, 'b>(candidates: &[&'b SizedLine<'a>]) -> Option<&'b SizedLine<'a>> {
    let mut best: Option<&'b SizedLine<'a>> = None;
    for &candidate in candidates {
        let better = match best {
            None => true,
            Some(current) => {
                let ordering = candidate
                    .size
                    .partial_cmp(&current.size)
                    .unwrap_or(Ordering::Equal)
                    .then(
                        candidate
                            .line
                            .bbox
                            .y1
                            .partial_cmp(&current.line.bbox.y1)
                            .unwrap_or(Ordering::Equal),
                    );
                ordering == Ordering::Greater
            }
        };
        if better {
            best = Some(candidate);
        }
    }
    best
}

fn continuation_line<'a, 'b>(
    title: &SizedLine<'a>,
    lines: &'b [SizedLine<'a>],
    config: &TitleConfig,
) -> Option<&'b SizedLine<'a>> {
    let title_bottom = title.line.bbox.y0;

    let mut closest: Option<&SizedLine<'a>> = None;
    for candidate in lines.iter().filter(|line| line.line.bbox.y0 < title_bottom) {
        let distance = (candidate.line.bbox.y1 - title_bottom).abs();
        let closer = match closest {
            None => true,
            Some(current) => distance < (current.line.bbox.y1 - title_bottom).abs(),
        };
        if closer {
            closest = Some(candidate);
        }
    }
    let candidate = closest?;

    let size_similarity = title.size.min(candidate.size) / title.size.max(candidate.size);
    let vertically_close =
        title_bottom - candidate.line.bbox.y1 <= title.size * config.merge_gap_factor;
    let horizontally_aligned = (candidate.line.bbox.x0 - title.line.bbox.x0).abs()
        <= config
            .align_tolerance_min
            .max(title.size * config.align_tolerance_factor);

    (size_similarity >= config.merge_threshold && vertically_close && horizontally_aligned)
        .then_some(candidate)
}
