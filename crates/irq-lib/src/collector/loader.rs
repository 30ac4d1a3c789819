//! Loading a full interrupt statistics table

use super::parser::parse_line;
use crate::balance::distribution::Distribution;
use crate::error::{IrqError, Result};
use crate::models::{saturating_sum, BalanceReport, InterruptRecord};
use std::path::Path;
use tokio::fs;

/// All accepted rows of a statistics source
#[derive(Debug, Clone, Default)]
pub struct StatCollection {
    records: Vec<InterruptRecord>,
    cpu_count: usize,
    skipped_lines: usize,
}

impl StatCollection {
    /// Build a collection from records that were obtained elsewhere
    pub fn new(records: Vec<InterruptRecord>, cpu_count: usize) -> Self {
        Self {
            records,
            cpu_count,
            skipped_lines: 0,
        }
    }

    /// Build a collection whose CPU count is the widest record
    pub fn from_records(records: Vec<InterruptRecord>) -> Self {
        let cpu_count = records
            .iter()
            .map(|r| r.per_cpu_counts().len())
            .max()
            .unwrap_or(0);
        Self::new(records, cpu_count)
    }

    /// Parse the text of a statistics table
    ///
    /// The first line is the header and is always skipped. Rows the parser
    /// rejects are dropped and only counted.
    pub fn parse(content: &str) -> Self {
        let mut collection = Self::default();

        for line in content.lines().skip(1) {
            match parse_line(line) {
                Some(record) => {
                    collection.cpu_count = collection.cpu_count.max(record.per_cpu_counts().len());
                    collection.records.push(record);
                }
                None => {
                    tracing::debug!(line = %line, "Skipping unparseable interrupt line");
                    collection.skipped_lines += 1;
                }
            }
        }

        collection
    }

    /// Read and parse a statistics source from disk
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)
            .await
            .map_err(|source| IrqError::SourceUnavailable {
                path: path.to_path_buf(),
                source,
            })?;

        // Invalid UTF-8 only spoils the lines it appears on
        let collection = Self::parse(&String::from_utf8_lossy(&bytes));
        tracing::debug!(
            path = %path.display(),
            records = collection.records.len(),
            cpu_count = collection.cpu_count,
            skipped_lines = collection.skipped_lines,
            "Loaded interrupt statistics"
        );

        Ok(collection)
    }

    pub fn records(&self) -> &[InterruptRecord] {
        &self.records
    }

    pub fn cpu_count(&self) -> usize {
        self.cpu_count
    }

    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of every record's load
    pub fn total_load(&self) -> u64 {
        saturating_sum(self.records.iter().map(InterruptRecord::total))
    }

    /// The distribution as parsed, without any balancing applied
    pub fn current_report(&self) -> BalanceReport {
        let distribution = Distribution::from_records(&self.records, self.cpu_count);
        let dispersion = distribution.dispersion();

        BalanceReport {
            strategy: None,
            balanced_stats: self.records.clone(),
            instructions: Vec::new(),
            per_cpu_counts: distribution.counts,
            per_cpu_percent: distribution.percent,
            dispersion,
        }
    }
}
