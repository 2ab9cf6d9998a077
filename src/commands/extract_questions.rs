use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::cli::ExtractQuestionsArgs;
use crate::layout::{LinePatterns, SegmentConfig, SegmentStats, Segmenter, extract_layout};
use crate::model::{Item, PageLayout};
use crate::util::write_text_lines;

pub fn run(args: ExtractQuestionsArgs) -> Result<()> {
    let stats = extract_questions(&args.pdf, &args.out, &args.tuning.config())?;
    info!(
        path = %args.out.display(),
        items = stats.items_emitted,
        "wrote exam items"
    );
    Ok(())
}

pub fn extract_questions(
    pdf_path: &Path,
    out_path: &Path,
    config: &SegmentConfig,
) -> Result<SegmentStats> {
    info!(path = %pdf_path.display(), "extracting exam questions");
    let document = extract_layout(pdf_path)?;
    let (items, stats) = segment_pages(document.pages(), config)?;

    info!(
        lines_seen = stats.lines_seen,
        lines_assigned = stats.lines_assigned,
        header_lines_dropped = stats.header_lines_dropped,
        empty_lines_dropped = stats.empty_lines_dropped,
        gap_boundaries = stats.gap_boundaries,
        bullet_boundaries = stats.bullet_boundaries,
        question_terminators = stats.question_terminators,
        duplicates_removed = stats.duplicates_removed,
        "segmented exam layout"
    );

    write_text_lines(out_path, items.iter().map(|item| item.text.as_str()))?;
    Ok(stats)
}

pub fn segment_pages<I>(pages: I, config: &SegmentConfig) -> Result<(Vec<Item>, SegmentStats)>
where
    I: IntoIterator<Item = PageLayout>,
{
    let patterns = LinePatterns::new()?;
    let mut segmenter = Segmenter::new(*config, &patterns);
    for page in pages {
        segmenter.push_page(page);
    }
    Ok(segmenter.finish())
}
