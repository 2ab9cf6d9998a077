pub mod artifacts;
pub mod extract_questions;
pub mod extract_titles;
pub mod match_topics;
pub mod pipeline;
