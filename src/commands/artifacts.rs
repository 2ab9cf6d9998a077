use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::model::{Item, MatchRecord};
use crate::util::ensure_parent_directory;

pub const CSV_HEADER: &str = "page,slide_topic,exam_question,score,confidence";

pub fn format_title_line(page: u32, title: &str) -> String {
    format!("{page}|{title}")
}

/// Reads slide topics; a bad page field keeps the whole line as an unpaged topic.
pub fn parse_slide_topics(lines: &[String]) -> Vec<Item> {
    let mut topics = Vec::new();

    for (index, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let Some((left, right)) = line.split_once('|') else {
            topics.push(Item {
                page: None,
                text: line.to_string(),
            });
            continue;
        };

        let (page, text) = match left.trim().parse::<u32>() {
            Ok(page) => (Some(page), right.trim()),
            Err(_) => {
                debug!(line = index + 1, "page field is not an integer; using whole line as topic");
                (None, line)
            }
        };

        if !text.is_empty() {
            topics.push(Item {
                page,
                text: text.to_string(),
            });
        }
    }

    topics
}

pub fn parse_exam_questions(lines: &[String], min_chars: usize) -> Vec<String> {
    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && line.chars().count() >= min_chars)
        .map(|line| line.to_string())
        .collect()
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

pub fn render_csv_row(record: &MatchRecord) -> String {
    let page = record.page.map(|page| page.to_string()).unwrap_or_default();
    format!(
        "{},{},{},{:.3},{}",
        page,
        csv_field(&record.topic),
        csv_field(&record.question),
        record.score,
        record.confidence.as_str()
    )
}

pub fn write_csv(path: &Path, records: &[MatchRecord]) -> Result<()> {
    ensure_parent_directory(path)?;

    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{CSV_HEADER}")
        .with_context(|| format!("failed to write {}", path.display()))?;
    for record in records {
        writeln!(writer, "{}", render_csv_row(record))
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    Ok(())
}
