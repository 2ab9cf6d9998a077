//! Positioned-text extraction and the layout heuristics built on it.
//!
//! `pdftohtml` yields pages of positioned lines; `segment` groups them into
//! question items and `titles` picks one heading per page.

mod pdftohtml;
mod segment;
mod titles;


/// Page height assumed when the extractor reports none (A4 in points).
pub const FALLBACK_PAGE_HEIGHT: f64 = 842.0;

pub use pdftohtml::{extract_layout, extractor_version, require_extractor};
pub use segment::{LinePatterns, SegmentConfig, SegmentStats, Segmenter};
pub use titles::{TitleConfig, select_title};
