//! CSV export and import of the output tables
//!
//! The three tables are written as `fetch_<site>.csv`, `visit_<site>.csv` and
//! `urls_<site>.csv` with fixed header rows.

use crate::config::OutputConfig;
use crate::output::report::{OutputError, OutputResult};
use crate::state::{FetchRecord, FetchStatus, LinkRecord, ResultTables, VisitRecord};
use crate::url::LinkIndicator;
use csv::{Reader, StringRecord, Writer};
use std::path::Path;

pub const FETCH_HEADER: [&str; 2] = ["url", "status"];
pub const VISIT_HEADER: [&str; 4] = ["url", "byte_size", "outlink_count", "content_type"];
pub const LINKS_HEADER: [&str; 2] = ["url", "indicator"];

/// Writes all three tables into the configured output directory
pub fn export_tables(config: &OutputConfig, tables: &ResultTables) -> OutputResult<()> {
    std::fs::create_dir_all(&config.directory)?;

    write_fetch_table(&config.fetch_table_path(), &tables.fetches)?;
    write_visit_table(&config.visit_table_path(), &tables.visits)?;
    write_links_table(&config.links_table_path(), &tables.links)?;

    Ok(())
}

pub fn write_fetch_table(path: &Path, fetches: &[FetchRecord]) -> OutputResult<()> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(FETCH_HEADER)?;
    for fetch in fetches {
        let status = fetch.status.to_string();
        writer.write_record([fetch.url.as_str(), status.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_visit_table(path: &Path, visits: &[VisitRecord]) -> OutputResult<()> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(VISIT_HEADER)?;
    for visit in visits {
        let byte_size = visit.byte_size.to_string();
        let outlink_count = visit.outlink_count.to_string();
        writer.write_record([
            visit.url.as_str(),
            byte_size.as_str(),
            outlink_count.as_str(),
            visit.content_type.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_links_table(path: &Path, links: &[LinkRecord]) -> OutputResult<()> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record(LINKS_HEADER)?;
    for link in links {
        writer.write_record([link.url.as_str(), link.indicator.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads back the three tables written by [`export_tables`]
pub fn read_tables(config: &OutputConfig) -> OutputResult<ResultTables> {
    Ok(ResultTables {
        fetches: read_fetch_table(&config.fetch_table_path())?,
        visits: read_visit_table(&config.visit_table_path())?,
        links: read_links_table(&config.links_table_path())?,
    })
}

fn malformed(path: &Path, message: impl Into<String>) -> OutputError {
    OutputError::Malformed {
        table: path.display().to_string(),
        message: message.into(),
    }
}

fn open_table(path: &Path, header: &[&str]) -> OutputResult<Reader<std::fs::File>> {
    let mut reader = Reader::from_path(path)?;
    let found = reader.headers()?;
    if found.iter().ne(header.iter().copied()) {
        return Err(malformed(
            path,
            format!("expected header {:?}, found {:?}", header, found),
        ));
    }
    Ok(reader)
}

fn field<'r>(path: &Path, record: &'r StringRecord, index: usize) -> OutputResult<&'r str> {
    record
        .get(index)
        .ok_or_else(|| malformed(path, format!("missing column {} in {:?}", index, record)))
}

fn number(path: &Path, record: &StringRecord, index: usize) -> OutputResult<u64> {
    let value = field(path, record, index)?;
    value
        .trim()
        .parse()
        .map_err(|_| malformed(path, format!("'{}' is not a number", value)))
}

pub fn read_fetch_table(path: &Path) -> OutputResult<Vec<FetchRecord>> {
    let mut reader = open_table(path, &FETCH_HEADER)?;
    let mut fetches = Vec::new();

    for record in reader.records() {
        let record = record?;
        let status = field(path, &record, 1)?
            .parse::<FetchStatus>()
            .map_err(|e| malformed(path, e.to_string()))?;
        fetches.push(FetchRecord {
            url: field(path, &record, 0)?.to_string(),
            status,
        });
    }

    Ok(fetches)
}

pub fn read_visit_table(path: &Path) -> OutputResult<Vec<VisitRecord>> {
    let mut reader = open_table(path, &VISIT_HEADER)?;
    let mut visits = Vec::new();

    for record in reader.records() {
        let record = record?;
        visits.push(VisitRecord {
            url: field(path, &record, 0)?.to_string(),
            byte_size: number(path, &record, 1)?,
            outlink_count: number(path, &record, 2)?,
            content_type: field(path, &record, 3)?.to_string(),
        });
    }

    Ok(visits)
}

pub fn read_links_table(path: &Path) -> OutputResult<Vec<LinkRecord>> {
    let mut reader = open_table(path, &LINKS_HEADER)?;
    let mut links = Vec::new();

    for record in reader.records() {
        let record = record?;
        let indicator = field(path, &record, 1)?
            .parse::<LinkIndicator>()
            .map_err(|e| malformed(path, e.to_string()))?;
        links.push(LinkRecord {
            url: field(path, &record, 0)?.to_string(),
            indicator,
        });
    }

    Ok(links)
}
