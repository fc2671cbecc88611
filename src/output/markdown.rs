//! Markdown report generation
//!
//! This module renders the crawl report as a markdown document with one
//! table per section.

use crate::output::report::{status_label, CrawlReport, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report to `output_path`
///
/// # Arguments
///
/// * `report` - The crawl report
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown report
/// * `Err(OutputError)` - Failed to write report
pub fn generate_markdown_report(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_report(report: &CrawlReport) -> String {
    let mut md = String::new();

    md.push_str("# Crawl Report\n\n");

    md.push_str(&format!("- **Site**: {}\n", report.site));
    md.push_str(&format!("- **Workers**: {}\n\n", report.worker_count));

    // Fetch statistics
    md.push_str("## Fetch Statistics\n\n");
    md.push_str(&format!(
        "- **Fetches attempted**: {}\n",
        report.fetches_attempted
    ));
    md.push_str(&format!(
        "- **Fetches succeeded**: {}\n",
        report.fetches_succeeded
    ));
    md.push_str(&format!(
        "- **Fetches failed or aborted**: {}\n",
        report.fetches_failed
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        report.success_rate()
    ));

    // Outgoing URLs
    md.push_str("## Outgoing URLs\n\n");
    md.push_str(&format!(
        "- **Total URLs extracted**: {}\n",
        report.urls_extracted
    ));
    md.push_str(&format!("- **Unique URLs extracted**: {}\n", report.unique_urls));
    md.push_str(&format!(
        "- **Unique URLs within site**: {}\n",
        report.unique_within
    ));
    md.push_str(&format!(
        "- **Unique URLs outside site**: {}\n\n",
        report.unique_outside
    ));

    if !report.status_counts.is_empty() {
        md.push_str("## Status Codes\n\n");
        md.push_str("| Status | Count |\n");
        md.push_str("|--------|-------|\n");
        for (status, count) in &report.status_counts {
            md.push_str(&format!("| {} | {} |\n", status_label(status), count));
        }
        md.push('\n');
    }

    if !report.size_buckets.is_empty() {
        md.push_str("## File Sizes\n\n");
        md.push_str("| Size | Count |\n");
        md.push_str("|------|-------|\n");
        for (bucket, count) in &report.size_buckets {
            md.push_str(&format!("| {} | {} |\n", bucket, count));
        }
        md.push('\n');
    }

    if !report.content_types.is_empty() {
        md.push_str("## Content Types\n\n");
        md.push_str("| Content Type | Count |\n");
        md.push_str("|--------------|-------|\n");
        for (content_type, count) in &report.content_types {
            md.push_str(&format!("| {} | {} |\n", content_type, count));
        }
        md.push('\n');
    }

    md
}
