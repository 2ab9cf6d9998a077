use std::collections::HashMap;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use regex::{CaptureMatches, Regex};
use tracing::debug;

use super::FALLBACK_PAGE_HEIGHT;
use crate::error::PipelineError;
use crate::model::{BoundingBox, PageLayout, PositionedLine};

const EXTRACTOR_PROGRAM: &str = "pdftohtml";
const EXTRACTOR_INSTALL_HINT: &str =
    "install poppler-utils (e.g. `apt install poppler-utils` or `brew install poppler`)";

fn extractor_available() -> bool {
    Command::new(EXTRACTOR_PROGRAM).arg("-v").output().is_ok()
}

pub fn require_extractor() -> Result<(), PipelineError> {
    if extractor_available() {
        Ok(())
    } else {
        Err(PipelineError::MissingDependency {
            tool: EXTRACTOR_PROGRAM,
            hint: EXTRACTOR_INSTALL_HINT,
        })
    }
}

pub fn extractor_version() -> Option<String> {
    let output = Command::new(EXTRACTOR_PROGRAM).arg("-v").output().ok()?;

    // pdftohtml prints its banner on stderr
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

/// Runs `pdftohtml -xml` on `pdf_path` and keeps its output for lazy page parsing.
pub fn extract_layout(pdf_path: &Path) -> Result<LayoutDocument> {
    require_extractor()?;

    if !pdf_path.is_file() {
        bail!("document not found: {}", pdf_path.display());
    }

    let output = Command::new(EXTRACTOR_PROGRAM)
        .arg("-xml")
        .arg("-i")
        .arg("-q")
        .arg("-zoom")
        .arg("1")
        .arg("-stdout")
        .arg(pdf_path)
        .output()
        .with_context(|| format!("failed to execute pdftohtml for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftohtml returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let xml = String::from_utf8_lossy(&output.stdout).replace('\u{0000}', "");
    debug!(path = %pdf_path.display(), bytes = xml.len(), "captured pdftohtml xml");
    LayoutDocument::from_xml(xml)
}

pub struct LayoutDocument {
    xml: String,
    page_regex: Regex,
    element_regex: Regex,
    attribute_regex: Regex,
    markup_regex: Regex,
    numeric_entity_regex: Regex,
}

impl LayoutDocument {
    pub fn from_xml(xml: String) -> Result<Self> {
        Ok(Self {
            xml,
            page_regex: Regex::new(r"(?s)<page\b([^>]*)>(.*?)</page>")
                .context("failed to compile page regex")?,
            element_regex: Regex::new(r"(?s)<fontspec\b([^>]*?)/?>|<text\b([^>]*)>(.*?)</text>")
                .context("failed to compile layout element regex")?,
            attribute_regex: Regex::new(r#"([A-Za-z_][A-Za-z0-9_-]*)="([^"]*)""#)
                .context("failed to compile attribute regex")?,
            markup_regex: Regex::new(r"<[^>]+>").context("failed to compile markup regex")?,
            numeric_entity_regex: Regex::new(r"&#(x[0-9A-Fa-f]+|[0-9]+);")
                .context("failed to compile numeric entity regex")?,
        })
    }

    /// Pages in document order. Font specs carry over between pages, so the
    /// iterator keeps them as it goes.
    pub fn pages(&self) -> LayoutPages<'_> {
        LayoutPages {
            document: self,
            matches: self.page_regex.captures_iter(&self.xml),
            fonts: HashMap::new(),
            next_page: 1,
        }
    }

    fn parse_attributes<'h>(&self, raw: &'h str) -> HashMap<&'h str, &'h str> {
        self.attribute_regex
            .captures_iter(raw)
            .filter_map(|captures| Some((captures.get(1)?.as_str(), captures.get(2)?.as_str())))
            .collect()
    }

    fn plain_text(&self, raw: &str) -> String {
        let without_markup = self.markup_regex.replace_all(raw, "");
        let decoded = self
            .numeric_entity_regex
            .replace_all(&without_markup, |captures: &regex::Captures<'_>| {
                let value = &captures[1];
                let code = match value.strip_prefix('x') {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => value.parse::<u32>().ok(),
                };
                code.and_then(char::from_u32)
                    .map(|character| character.to_string())
                    .unwrap_or_default()
            });

        decoded
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
            .replace('\u{00a0}', " ")
            .split_whitespace()
            .collect::<Vec<&str>>()
            .join(" ")
    }
}

pub struct LayoutPages<'a> {
    document: &'a LayoutDocument,
    matches: CaptureMatches<'a, 'a>,
    fonts: HashMap<String, f64>,
    next_page: u32,
}

impl Iterator for LayoutPages<'_> {
    type Item = PageLayout;

    fn next(&mut self) -> Option<Self::Item> {
        let captures = self.matches.next()?;
        let document = self.document;

        let page_attributes = document.parse_attributes(captures.get(1)?.as_str());
        let page = page_attributes
            .get("number")
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(self.next_page);
        self.next_page = page + 1;

        let height = page_attributes
            .get("height")
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|value| *value > 0.0);

        let body = captures.get(2).map(|value| value.as_str()).unwrap_or_default();
        let mut lines = Vec::new();

        for element in document.element_regex.captures_iter(body) {
            if let Some(raw) = element.get(1) {
                let attributes = document.parse_attributes(raw.as_str());
                let id = attributes.get("id");
                let size = attributes
                    .get("size")
                    .and_then(|value| value.parse::<f64>().ok());
                if let (Some(id), Some(size)) = (id, size) {
                    self.fonts.insert((*id).to_string(), size);
                }
                continue;
            }

            let (Some(raw_attributes), Some(raw_text)) = (element.get(2), element.get(3)) else {
                continue;
            };

            let text = document.plain_text(raw_text.as_str());
            if text.is_empty() {
                continue;
            }

            let attributes = document.parse_attributes(raw_attributes.as_str());
            let number = |key: &str| {
                attributes
                    .get(key)
                    .and_then(|value| value.parse::<f64>().ok())
                    .unwrap_or(0.0)
            };
            let top = number("top");
            let left = number("left");
            let width = number("width");
            let text_height = number("height");

            // pdftohtml measures from the top edge; flip into PDF space
            let page_height = height.unwrap_or(FALLBACK_PAGE_HEIGHT);
            let bbox = BoundingBox::new(
                left,
                page_height - (top + text_height),
                left + width,
                page_height - top,
            );

            let avg_glyph_size = attributes
                .get("font")
                .and_then(|font| self.fonts.get(*font))
                .copied()
                .filter(|size| *size > 0.0);

            lines.push(PositionedLine {
                page,
                text,
                bbox,
                avg_glyph_size,
            });
        }

        Some(PageLayout {
            page,
            height,
            lines,
        })
    }
}
