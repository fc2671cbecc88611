//! Statistics generation from the exported tables
//!
//! This module provides functionality for loading the crawl report from
//! the CSV tables and displaying it on the terminal.

use crate::config::OutputConfig;
use crate::output::csv_export::read_tables;
use crate::output::report::{status_label, CrawlReport, OutputResult};

/// Loads the output tables and tallies them into a report
///
/// # Arguments
///
/// * `output` - Where the tables were exported
/// * `site` - Site domain the crawl was scoped to
/// * `worker_count` - Number of workers the crawl ran with
pub fn load_report(output: &OutputConfig, site: &str, worker_count: usize) -> OutputResult<CrawlReport> {
    let tables = read_tables(output)?;
    Ok(CrawlReport::from_tables(&tables, site, worker_count))
}

/// Formats the report as plain text, one section per table
pub fn format_report_text(report: &CrawlReport) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Site crawled: {}", report.site));
    lines.push(format!("Number of workers: {}", report.worker_count));
    lines.push(String::new());

    lines.push("Fetch Statistics".to_string());
    lines.push("================".to_string());
    lines.push(format!("# fetches attempted: {}", report.fetches_attempted));
    lines.push(format!("# fetches succeeded: {}", report.fetches_succeeded));
    lines.push(format!("# fetches failed or aborted: {}", report.fetches_failed));
    lines.push(String::new());

    lines.push("Outgoing URLs:".to_string());
    lines.push("==============".to_string());
    lines.push(format!("Total URLs extracted: {}", report.urls_extracted));
    lines.push(format!("# unique URLs extracted: {}", report.unique_urls));
    lines.push(format!("# unique URLs within site: {}", report.unique_within));
    lines.push(format!("# unique URLs outside site: {}", report.unique_outside));
    lines.push(String::new());

    lines.push("Status Codes:".to_string());
    lines.push("=============".to_string());
    for (status, count) in &report.status_counts {
        lines.push(format!("{}: {}", status_label(status), count));
    }
    lines.push(String::new());

    lines.push("File Sizes:".to_string());
    lines.push("===========".to_string());
    for (bucket, count) in &report.size_buckets {
        lines.push(format!("{}: {}", bucket, count));
    }
    lines.push(String::new());

    lines.push("Content Types:".to_string());
    lines.push("==============".to_string());
    for (content_type, count) in &report.content_types {
        lines.push(format!("{}: {}", content_type, count));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Prints the report to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Statistics ===\n");
    print!("{}", format_report_text(report));
    println!(
        "\nSuccess Rate: {:.1}% ({} / {} fetches returned 200)",
        report.success_rate(),
        report.fetches_succeeded,
        report.fetches_attempted
    );
}
