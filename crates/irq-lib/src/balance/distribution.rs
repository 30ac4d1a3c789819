//! Per-CPU interrupt distribution and dispersion

use crate::models::{saturating_sum, InterruptRecord};

/// Element-wise sums of a set of records, with each CPU's share of the total
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub counts: Vec<u64>,
    pub percent: Vec<f64>,
    records: usize,
}

impl Distribution {
    /// Sum `records` column by column
    ///
    /// The width is `cpu_count`, widened if a record carries more columns.
    /// Shorter records contribute zero to the missing CPUs.
    pub fn from_records(records: &[InterruptRecord], cpu_count: usize) -> Self {
        let width = records
            .iter()
            .map(|r| r.per_cpu_counts().len())
            .fold(cpu_count, usize::max);

        let mut counts = vec![0u64; width];
        for record in records {
            for (sum, count) in counts.iter_mut().zip(record.per_cpu_counts()) {
                *sum = sum.saturating_add(*count);
            }
        }

        let total = saturating_sum(counts.iter().copied());
        let percent = counts
            .iter()
            .map(|&count| {
                if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64 * 100.0
                }
            })
            .collect();

        Self {
            counts,
            percent,
            records: records.len(),
        }
    }

    pub fn total(&self) -> u64 {
        saturating_sum(self.counts.iter().copied())
    }

    /// Sample standard deviation of the per-CPU counts
    ///
    /// Undefined with fewer than two CPUs or without any record.
    pub fn dispersion(&self) -> Option<f64> {
        if self.records == 0 {
            return None;
        }
        let values: Vec<f64> = self.counts.iter().map(|&c| c as f64).collect();
        sample_std_dev(&values)
    }
}

/// Sample (n - 1) standard deviation, `None` below two samples
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();

    Some((sum_sq / (n - 1.0)).sqrt())
}
