//! Reader for Neko statistics CSV tables
//!
//! Files are small enough to be read whole. An optional header line is kept
//! for reference only, the column meaning comes from the statistics registry.

// standard library
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// crate modules
use crate::readers::parsers;
use crate::stats::RawTable;
use crate::utils::*;

// external crates
use anyhow::{anyhow, Context, Result};
use log::{debug, trace};

/// A simple reader for statistics tables
#[derive(Debug, Default)]
pub struct StatsFileReader;

impl StatsFileReader {
    /// Just calls Default::default(), nothing special to be initialised
    pub fn new() -> Self {
        Default::default()
    }

    /// Parses every row of the table at `path`
    ///
    /// Blank lines are skipped. The first non-blank line is taken as a header
    /// unless it is itself a numeric row, later lines starting with `#` are
    /// comments. Every other line must be a full row of comma separated
    /// numbers.
    pub fn parse(&self, path: &Path) -> Result<RawTable> {
        let file = File::open(path).with_context(|| f!("Could not open {}", path.display()))?;
        let reader = BufReader::new(file);

        let mut header: Option<Vec<String>> = None;
        let mut rows: Vec<Vec<f64>> = Vec::new();

        for (n, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            let line_number = n + 1;

            if line.is_empty() {
                continue;
            }

            // header only allowed before any data
            let first = header.is_none() && rows.is_empty();

            match parsers::csv_row(line) {
                Ok((_, row)) => {
                    if let Some(expected) = rows.first().map(|r| r.len()) {
                        if row.len() != expected {
                            return Err(anyhow!(
                                "{}:{line_number} has {} columns, expected {expected}",
                                path.display(),
                                row.len()
                            ));
                        }
                    }
                    rows.push(row);
                }
                Err(_) if first => {
                    trace!("[Header ] {line}");
                    header = Some(parsers::csv_header(line));
                }
                Err(_) if parsers::is_comment(line) => {
                    trace!("[Comment] {line}");
                }
                Err(_) => {
                    return Err(anyhow!(
                        "{}:{line_number} is not a row of numbers: \"{line}\"",
                        path.display()
                    ))
                }
            }
        }

        debug!("Read {} rows from {}", rows.len(), path.display());
        RawTable::new(header.unwrap_or_default(), rows)
    }
}
