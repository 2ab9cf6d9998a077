use serde::Serialize;

use crate::layout::SegmentStats;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl BoundingBox {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }
}

/// One text line from a document page in PDF space (origin bottom-left).
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedLine {
    pub page: u32,
    pub text: String,
    pub bbox: BoundingBox,
    /// `None` when the extractor could not attribute any glyph size.
    pub avg_glyph_size: Option<f64>,
}

/// All lines of one page plus its height, as produced by the layout extractor.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageLayout {
    pub page: u32,
    pub height: Option<f64>,
    pub lines: Vec<PositionedLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub page: Option<u32>,
    pub text: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    pub page: Option<u32>,
    pub topic: String,
    pub question: String,
    pub score: f64,
    pub confidence: ConfidenceTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedTopic {
    pub page: Option<u32>,
    pub topic: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub records: Vec<MatchRecord>,
    pub unmatched_topics: Vec<UnmatchedTopic>,
    pub unmatched_questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub report_version: u32,
    pub generated_at: String,
    pub assignment: String,
    pub min_score: f64,
    pub max_matches: usize,
    pub topic_count: usize,
    pub question_count: usize,
    pub matched_pairs: usize,
    pub low_confidence_pairs: usize,
    pub unmatched_topics: Vec<UnmatchedTopic>,
    pub unmatched_questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceDocument {
    pub role: String,
    pub path: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelinePaths {
    pub slides_artifact: String,
    pub exam_artifact: String,
    pub csv_out: String,
    pub manifest_path: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineCounts {
    pub slide_pages: usize,
    pub slide_pages_without_title: usize,
    pub exam_items: usize,
    pub matched_pairs: usize,
    pub unmatched_topics: usize,
    pub unmatched_questions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub completed_stages: Vec<String>,
    pub failed_stage: Option<String>,
    pub failure_reason: Option<String>,
    pub extractor_version: String,
    pub sources: Vec<SourceDocument>,
    pub paths: PipelinePaths,
    pub counts: PipelineCounts,
    pub segmentation: Option<SegmentStats>,
}
