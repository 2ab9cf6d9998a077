use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use super::artifacts::{parse_exam_questions, parse_slide_topics, write_csv};
use crate::cli::{MatchArgs, MatchTuning};
use crate::matching::{AliasTable, TopicNormalizer, match_topics};
use crate::model::{ConfidenceTier, MatchOutcome, MatchReport};
use crate::util::{now_utc_string, read_lines_lossy, write_json_pretty};

const LOW_CONFIDENCE_PREVIEW: usize = 10;

pub fn run(args: MatchArgs) -> Result<()> {
    match_artifacts(
        &args.slides,
        &args.exam,
        &args.out,
        args.report.as_deref(),
        &args.tuning,
    )?;
    Ok(())
}

pub fn match_artifacts(
    slides_path: &Path,
    exam_path: &Path,
    out_path: &Path,
    report_path: Option<&Path>,
    tuning: &MatchTuning,
) -> Result<MatchOutcome> {
    let aliases = AliasTable::load(tuning.aliases.as_deref())?;
    let normalizer = TopicNormalizer::new(aliases.compile()?)?;

    let topics = parse_slide_topics(&read_lines_lossy(slides_path)?);
    let questions = parse_exam_questions(&read_lines_lossy(exam_path)?, tuning.min_question_chars);

    let config = tuning.config();
    let strategy = tuning.assignment.strategy();
    info!(
        topics = topics.len(),
        questions = questions.len(),
        min_score = config.limits.min_score,
        max_matches = config.limits.max_matches,
        assignment = strategy.name(),
        "matching slide topics to exam questions"
    );

    let outcome = match_topics(&topics, &questions, &normalizer, &config, strategy.as_ref());

    write_csv(out_path, &outcome.records)?;
    info!(path = %out_path.display(), "matches written");

    if let Some(report_path) = report_path {
        let report = MatchReport {
            report_version: 1,
            generated_at: now_utc_string(),
            assignment: strategy.name().to_string(),
            min_score: config.limits.min_score,
            max_matches: config.limits.max_matches,
            topic_count: topics.len(),
            question_count: questions.len(),
            matched_pairs: outcome.records.len(),
            low_confidence_pairs: outcome
                .records
                .iter()
                .filter(|record| record.confidence == ConfidenceTier::Low)
                .count(),
            unmatched_topics: outcome.unmatched_topics.clone(),
            unmatched_questions: outcome.unmatched_questions.clone(),
        };
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote match report");
    }

    log_summary(&outcome);
    Ok(outcome)
}

fn log_summary(outcome: &MatchOutcome) {
    info!(
        matched_pairs = outcome.records.len(),
        unmatched_topics = outcome.unmatched_topics.len(),
        unmatched_questions = outcome.unmatched_questions.len(),
        "matching complete"
    );

    for record in outcome
        .records
        .iter()
        .filter(|record| record.confidence == ConfidenceTier::Low)
        .take(LOW_CONFIDENCE_PREVIEW)
    {
        warn!(
            score = %format!("{:.3}", record.score),
            page = %record.page.map(|page| page.to_string()).unwrap_or_else(|| "-".to_string()),
            topic = %record.topic,
            question = %record.question,
            "low-confidence match, review suggested"
        );
    }
}
