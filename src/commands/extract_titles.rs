use std::path::Path;

use anyhow::Result;
use tracing::{debug, info};

use super::artifacts::format_title_line;
use crate::cli::ExtractTitlesArgs;
use crate::layout::{TitleConfig, extract_layout, select_title};
use crate::model::PageLayout;
use crate::util::write_text_lines;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TitleExtraction {
    pub pages: usize,
    pub empty_pages: usize,
}

pub fn run(args: ExtractTitlesArgs) -> Result<()> {
    let summary = extract_titles(&args.pdf, &args.out, &args.tuning.config())?;
    info!(
        path = %args.out.display(),
        pages = summary.pages,
        empty_pages = summary.empty_pages,
        "wrote slide titles"
    );
    Ok(())
}

pub fn extract_titles(
    pdf_path: &Path,
    out_path: &Path,
    config: &TitleConfig,
) -> Result<TitleExtraction> {
    info!(path = %pdf_path.display(), "extracting slide titles");
    let document = extract_layout(pdf_path)?;
    let titles = select_titles(document.pages(), config);

    write_text_lines(
        out_path,
        titles
            .iter()
            .map(|(page, title)| format_title_line(*page, title)),
    )?;

    Ok(TitleExtraction {
        pages: titles.len(),
        empty_pages: titles.iter().filter(|(_, title)| title.is_empty()).count(),
    })
}

/// One `(page, title)` per input page, empty titles included.
pub fn select_titles<I>(pages: I, config: &TitleConfig) -> Vec<(u32, String)>
where
    I: IntoIterator<Item = PageLayout>,
{
    pages
        .into_iter()
        .map(|page| {
            let title = select_title(&page, config);
            if title.is_empty() {
                debug!(page = page.page, "no title candidate on page");
            }
            (page.page, title)
        })
        .collect()
}
