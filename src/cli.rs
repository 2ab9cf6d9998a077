use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::layout::{SegmentConfig, TitleConfig};
use crate::matching::{AssignmentMode, MatchConfig, MatchLimits};

#[derive(Parser, Debug)]
#[command(
    name = "slidematch",
    version,
    about = "Match slide titles to exam questions using layout heuristics and fuzzy scoring"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write one `page|title` line per slide page
    ExtractTitles(ExtractTitlesArgs),
    /// Write one extracted exam item per line
    ExtractQuestions(ExtractQuestionsArgs),
    /// Match a slides artifact against an exam artifact and write a CSV
    Match(MatchArgs),
    /// Run extraction and matching end to end
    Run(RunArgs),
}

#[derive(Args, Debug, Clone)]
pub struct TitleTuning {
    #[arg(long, default_value_t = 0.35)]
    pub top_ratio: f64,

    #[arg(long, default_value_t = 0.9)]
    pub merge_threshold: f64,
}

impl TitleTuning {
    pub fn config(&self) -> TitleConfig {
        TitleConfig {
            top_ratio: self.top_ratio,
            merge_threshold: self.merge_threshold,
            ..TitleConfig::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SegmentTuning {
    #[arg(long, default_value_t = 20.0)]
    pub min_gap: f64,

    #[arg(long, default_value_t = 2.2)]
    pub gap_multiplier: f64,
}

impl SegmentTuning {
    pub fn config(&self) -> SegmentConfig {
        SegmentConfig {
            min_gap: self.min_gap,
            gap_multiplier: self.gap_multiplier,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct MatchTuning {
    /// JSON object mapping canonical terms to synonym lists
    #[arg(long)]
    pub aliases: Option<PathBuf>,

    #[arg(long, default_value_t = 0.72)]
    pub min_score: f64,

    #[arg(long, default_value_t = 2)]
    pub max_matches: usize,

    /// Exam lines shorter than this are treated as header fragments
    #[arg(long, default_value_t = 4)]
    pub min_question_chars: usize,

    #[arg(long, value_enum, default_value_t = AssignmentMode::Greedy)]
    pub assignment: AssignmentMode,
}

impl MatchTuning {
    pub fn config(&self) -> MatchConfig {
        MatchConfig {
            limits: MatchLimits {
                min_score: self.min_score,
                max_matches: self.max_matches,
            },
            ..MatchConfig::default()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExtractTitlesArgs {
    #[arg(long)]
    pub pdf: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[command(flatten)]
    pub tuning: TitleTuning,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractQuestionsArgs {
    #[arg(long)]
    pub pdf: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[command(flatten)]
    pub tuning: SegmentTuning,
}

#[derive(Args, Debug, Clone)]
pub struct MatchArgs {
    /// Slides artifact, `page|topic` or one topic per line
    #[arg(long)]
    pub slides: PathBuf,

    /// Exam artifact, one question per line
    #[arg(long)]
    pub exam: PathBuf,

    #[arg(long, default_value = "results/mapped_topics.csv")]
    pub out: PathBuf,

    /// Optional JSON report with unmatched topics and questions
    #[arg(long)]
    pub report: Option<PathBuf>,

    #[command(flatten)]
    pub tuning: MatchTuning,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(long)]
    pub slides_pdf: PathBuf,

    #[arg(long)]
    pub exam_pdf: PathBuf,

    #[arg(long, default_value = "data/slides_topics.txt")]
    pub slides_out: PathBuf,

    #[arg(long, default_value = "data/exam_questions.txt")]
    pub exam_out: PathBuf,

    #[arg(long, default_value = "results/mapped_topics.csv")]
    pub out: PathBuf,

    #[arg(long, default_value = "manifests")]
    pub manifest_dir: PathBuf,

    #[command(flatten)]
    pub titles: TitleTuning,

    #[command(flatten)]
    pub segments: SegmentTuning,

    #[command(flatten)]
    pub matching: MatchTuning,
}
