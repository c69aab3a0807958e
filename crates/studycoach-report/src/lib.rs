//! studycoach-report: progress reports over the quiz history.

pub mod html;

pub use html::{generate_html, write_html_report};
