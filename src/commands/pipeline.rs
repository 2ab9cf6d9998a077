use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use super::extract_questions::extract_questions;
use super::extract_titles::extract_titles;
use super::match_topics::match_artifacts;
use crate::cli::RunArgs;
use crate::error::PipelineError;
use crate::layout::{extractor_version, require_extractor};
use crate::model::{PipelineCounts, PipelinePaths, PipelineRunManifest, SourceDocument};
use crate::util::{
    ensure_directory, now_utc_string, sha256_file, utc_compact_string, write_json_pretty,
};

const STAGE_EXTRACT_TITLES: &str = "extract_titles";
const STAGE_EXTRACT_QUESTIONS: &str = "extract_questions";
const STAGE_MATCH: &str = "match";

pub fn run(args: RunArgs) -> Result<()> {
    // nothing runs without the layout extractor
    require_extractor()?;

    let started_ts = Utc::now();
    let run_id = format!("run-{}", utc_compact_string(started_ts));
    ensure_directory(&args.manifest_dir)?;
    let manifest_path = args
        .manifest_dir
        .join(format!("pipeline_run_{}.json", utc_compact_string(started_ts)));
    let report_path = args
        .manifest_dir
        .join(format!("match_report_{}.json", utc_compact_string(started_ts)));

    info!(run_id = %run_id, "starting pipeline");

    let sources = vec![
        source_document("slides", &args.slides_pdf)?,
        source_document("exam", &args.exam_pdf)?,
    ];

    let started_at = now_utc_string();
    let mut manifest = PipelineRunManifest {
        manifest_version: 1,
        run_id,
        status: "running".to_string(),
        started_at: started_at.clone(),
        updated_at: started_at,
        completed_stages: Vec::new(),
        failed_stage: None,
        failure_reason: None,
        extractor_version: extractor_version().unwrap_or_else(|| "unknown".to_string()),
        sources,
        paths: PipelinePaths {
            slides_artifact: args.slides_out.display().to_string(),
            exam_artifact: args.exam_out.display().to_string(),
            csv_out: args.out.display().to_string(),
            manifest_path: manifest_path.display().to_string(),
        },
        counts: PipelineCounts::default(),
        segmentation: None,
    };
    write_json_pretty(&manifest_path, &manifest)?;

    let titles = run_stage(&mut manifest, &manifest_path, STAGE_EXTRACT_TITLES, || {
        extract_titles(&args.slides_pdf, &args.slides_out, &args.titles.config())
    })?;
    manifest.counts.slide_pages = titles.pages;
    manifest.counts.slide_pages_without_title = titles.empty_pages;

    let segments = run_stage(&mut manifest, &manifest_path, STAGE_EXTRACT_QUESTIONS, || {
        extract_questions(&args.exam_pdf, &args.exam_out, &args.segments.config())
    })?;
    manifest.counts.exam_items = segments.items_emitted;
    manifest.segmentation = Some(segments);

    let outcome = run_stage(&mut manifest, &manifest_path, STAGE_MATCH, || {
        match_artifacts(
            &args.slides_out,
            &args.exam_out,
            &args.out,
            Some(&report_path),
            &args.matching,
        )
    })?;
    manifest.counts.matched_pairs = outcome.records.len();
    manifest.counts.unmatched_topics = outcome.unmatched_topics.len();
    manifest.counts.unmatched_questions = outcome.unmatched_questions.len();

    manifest.status = "completed".to_string();
    manifest.updated_at = now_utc_string();
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        csv = %args.out.display(),
        manifest = %manifest_path.display(),
        "pipeline complete"
    );
    Ok(())
}

fn source_document(role: &str, path: &Path) -> Result<SourceDocument> {
    Ok(SourceDocument {
        role: role.to_string(),
        path: path.display().to_string(),
        sha256: sha256_file(path)?,
    })
}

/// Runs one stage; a failure is recorded in the manifest and aborts the pipeline.
fn run_stage<T, F>(
    manifest: &mut PipelineRunManifest,
    manifest_path: &Path,
    stage: &'static str,
    action: F,
) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    info!(stage, "stage started");

    match action() {
        Ok(value) => {
            manifest.completed_stages.push(stage.to_string());
            manifest.updated_at = now_utc_string();
            write_json_pretty(manifest_path, manifest)?;
            info!(stage, "stage completed");
            Ok(value)
        }
        Err(error) => {
            manifest.status = "failed".to_string();
            manifest.failed_stage = Some(stage.to_string());
            manifest.failure_reason = Some(format!("{error:#}"));
            manifest.updated_at = now_utc_string();
            if let Err(write_error) = write_json_pretty(manifest_path, manifest) {
                warn!(error = %write_error, "failed to record stage failure in manifest");
            }
            Err(PipelineError::stage_failure(stage, error).into())
        }
    }
}
