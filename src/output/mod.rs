//! Output module for exporting tables and generating crawl reports
//!
//! This module handles:
//! - Writing the fetch, visit and links tables as CSV
//! - Reading the tables back for reporting
//! - Tallying and rendering the crawl report (markdown or plain text)

pub mod csv_export;
mod markdown;
mod report;
pub mod stats;

pub use csv_export::{export_tables, read_tables};
pub use markdown::{format_markdown_report, generate_markdown_report};
pub use report::{status_label, CrawlReport, OutputError, OutputResult, SizeBucket};
pub use stats::{format_report_text, load_report, print_report};
