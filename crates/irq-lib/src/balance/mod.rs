//! Interrupt balancing strategies
//!
//! Every strategy moves each interrupt source, with its whole load, onto a
//! single CPU and emits one `pin <irq> to CPU<n>` instruction per source.
//! They differ only in the order sources are visited and in how the target
//! CPU is picked:
//!
//! - `alternating`: round robin in encounter order, load is ignored
//! - `least-used`: greedy least-loaded CPU, encounter order
//! - `sorted-least-used`: greedy, lightest sources first
//! - `reverse-sorted-least-used`: greedy, heaviest sources first

pub mod distribution;

use crate::collector::StatCollection;
use crate::error::{IrqError, Result};
use crate::models::{saturating_sum, BalanceReport, InterruptRecord, PinInstruction};
use distribution::Distribution;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of balancing heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BalanceStrategy {
    Alternating,
    LeastUsed,
    SortedLeastUsed,
    #[default]
    ReverseSortedLeastUsed,
}

impl BalanceStrategy {
    pub const ALL: [BalanceStrategy; 4] = [
        BalanceStrategy::Alternating,
        BalanceStrategy::LeastUsed,
        BalanceStrategy::SortedLeastUsed,
        BalanceStrategy::ReverseSortedLeastUsed,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BalanceStrategy::Alternating => "alternating",
            BalanceStrategy::LeastUsed => "least-used",
            BalanceStrategy::SortedLeastUsed => "sorted-least-used",
            BalanceStrategy::ReverseSortedLeastUsed => "reverse-sorted-least-used",
        }
    }

    /// Balance a collection and build the resulting report
    pub fn compute_balance(&self, collection: &StatCollection) -> Result<BalanceReport> {
        let cpu_count = collection.cpu_count();
        let (balanced_stats, instructions) = self.balance_stats(collection.records(), cpu_count)?;

        let distribution = Distribution::from_records(&balanced_stats, cpu_count);
        let dispersion = distribution.dispersion();

        Ok(BalanceReport {
            strategy: Some(*self),
            balanced_stats,
            instructions,
            per_cpu_counts: distribution.counts,
            per_cpu_percent: distribution.percent,
            dispersion,
        })
    }

    /// Assign every record to one CPU
    ///
    /// Returns the derived records sorted by IRQ and the instructions sorted
    /// by their rendered text.
    pub fn balance_stats(
        &self,
        records: &[InterruptRecord],
        cpu_count: usize,
    ) -> Result<(Vec<InterruptRecord>, Vec<PinInstruction>)> {
        if cpu_count == 0 {
            let load = saturating_sum(records.iter().map(InterruptRecord::total));
            if load > 0 {
                return Err(IrqError::NoCapacity { load });
            }
            return Ok((sorted_by_irq(records.to_vec()), Vec::new()));
        }

        let assignments = match self {
            BalanceStrategy::Alternating => alternating(records, cpu_count),
            BalanceStrategy::LeastUsed => least_used(records.iter(), cpu_count),
            BalanceStrategy::SortedLeastUsed => {
                let mut ordered: Vec<&InterruptRecord> = records.iter().collect();
                ordered.sort_by_key(|r| r.total());
                least_used(ordered, cpu_count)
            }
            BalanceStrategy::ReverseSortedLeastUsed => {
                let mut ordered: Vec<&InterruptRecord> = records.iter().collect();
                ordered.sort_by_key(|r| std::cmp::Reverse(r.total()));
                least_used(ordered, cpu_count)
            }
        };

        let mut balanced = Vec::with_capacity(assignments.len());
        let mut instructions = Vec::with_capacity(assignments.len());
        for (record, cpu) in assignments {
            instructions.push(PinInstruction {
                irq: record.irq(),
                cpu,
            });
            balanced.push(record.pinned_to(cpu, cpu_count));
        }

        instructions.sort_by_cached_key(|i| i.to_string());
        Ok((sorted_by_irq(balanced), instructions))
    }
}

impl fmt::Display for BalanceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BalanceStrategy {
    type Err = IrqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        BalanceStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == normalized)
            .ok_or_else(|| IrqError::UnknownStrategy(s.to_string()))
    }
}

/// Run every strategy over the same collection
///
/// Returns each strategy with the dispersion it achieves, in
/// [`BalanceStrategy::ALL`] order.
pub fn compare_strategies(
    collection: &StatCollection,
) -> Result<Vec<(BalanceStrategy, Option<f64>)>> {
    BalanceStrategy::ALL
        .into_iter()
        .map(|strategy| {
            let report = strategy.compute_balance(collection)?;
            Ok((strategy, report.dispersion))
        })
        .collect()
}

fn alternating(records: &[InterruptRecord], cpu_count: usize) -> Vec<(&InterruptRecord, usize)> {
    records
        .iter()
        .enumerate()
        .map(|(k, record)| (record, k % cpu_count))
        .collect()
}

/// Greedy least-loaded assignment; ties go to the lowest CPU index
fn least_used<'a>(
    records: impl IntoIterator<Item = &'a InterruptRecord>,
    cpu_count: usize,
) -> Vec<(&'a InterruptRecord, usize)> {
    let mut accumulated = vec![0u64; cpu_count];

    records
        .into_iter()
        .map(|record| {
            let cpu = least_loaded(&accumulated);
            accumulated[cpu] = accumulated[cpu].saturating_add(record.total());
            (record, cpu)
        })
        .collect()
}

fn least_loaded(accumulated: &[u64]) -> usize {
    let mut best = 0;
    for (cpu, &load) in accumulated.iter().enumerate().skip(1) {
        if load < accumulated[best] {
            best = cpu;
        }
    }
    best
}

fn sorted_by_irq(mut records: Vec<InterruptRecord>) -> Vec<InterruptRecord> {
    records.sort_by_key(InterruptRecord::irq);
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(irq: u32, counts: Vec<u64>) -> InterruptRecord {
        InterruptRecord::new(irq, "IO-APIC-edge", format!("dev{}", irq), counts)
    }

    /// Four sources with totals [10, 1, 1, 1] on two CPUs
    fn skewed_collection() -> StatCollection {
        StatCollection::from_records(vec![
            record(1, vec![6, 4]),
            record(2, vec![1, 0]),
            record(3, vec![0, 1]),
            record(4, vec![1, 0]),
        ])
    }

    fn assigned_cpu(report: &BalanceReport, irq: u32) -> usize {
        report
            .instructions
            .iter()
            .find(|i| i.irq == irq)
            .map(|i| i.cpu)
            .unwrap()
    }

    #[test]
    fn test_strategy_names_round_trip() {
        for strategy in BalanceStrategy::ALL {
            assert_eq!(strategy.name().parse::<BalanceStrategy>().unwrap(), strategy);
        }
        assert_eq!(
            "Reverse_Sorted_Least_Used".parse::<BalanceStrategy>().unwrap(),
            BalanceStrategy::ReverseSortedLeastUsed
        );
        assert!("fastest".parse::<BalanceStrategy>().is_err());
        assert_eq!(BalanceStrategy::default(), BalanceStrategy::ReverseSortedLeastUsed);
    }

    #[test]
    fn test_least_used_on_skewed_load() {
        let report = BalanceStrategy::LeastUsed
            .compute_balance(&skewed_collection())
            .unwrap();

        assert_eq!(assigned_cpu(&report, 1), 0);
        assert_eq!(assigned_cpu(&report, 2), 1);
        assert_eq!(assigned_cpu(&report, 3), 1);
        assert_eq!(assigned_cpu(&report, 4), 1);
        assert_eq!(report.per_cpu_counts, vec![10, 3]);
    }

    #[test]
    fn test_reverse_sorted_on_skewed_load() {
        let report = BalanceStrategy::ReverseSortedLeastUsed
            .compute_balance(&skewed_collection())
            .unwrap();

        assert_eq!(report.per_cpu_counts, vec![10, 3]);
        let expected = 7.0 / 2f64.sqrt();
        assert!((report.dispersion.unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_alternating_ignores_load() {
        let collection = StatCollection::from_records(vec![
            record(7, vec![1000, 0, 0]),
            record(3, vec![1, 0, 0]),
            record(5, vec![0, 0, 2]),
            record(9, vec![0, 50, 0]),
            record(1, vec![4, 4, 4]),
        ]);
        let report = BalanceStrategy::Alternating.compute_balance(&collection).unwrap();

        for (k, source) in collection.records().iter().enumerate() {
            assert_eq!(assigned_cpu(&report, source.irq()), k % 3);
        }
        assert_eq!(report.per_cpu_counts, vec![1000 + 50, 1 + 12, 2]);
    }

    #[test]
    fn test_sorted_visits_lightest_first() {
        let collection = StatCollection::from_records(vec![
            record(1, vec![9, 0]),
            record(2, vec![1, 0]),
            record(3, vec![0, 2]),
        ]);
        let report = BalanceStrategy::SortedLeastUsed
            .compute_balance(&collection)
            .unwrap();

        // visit order: irq2 (1) -> CPU0, irq3 (2) -> CPU1, irq1 (9) -> CPU0
        assert_eq!(assigned_cpu(&report, 2), 0);
        assert_eq!(assigned_cpu(&report, 3), 1);
        assert_eq!(assigned_cpu(&report, 1), 0);
        assert_eq!(report.per_cpu_counts, vec![10, 2]);
    }

    #[test]
    fn test_greedy_choice_is_minimal_at_each_step() {
        let totals = [13u64, 2, 8, 8, 21, 1, 5, 5, 34, 3];
        let records: Vec<InterruptRecord> = totals
            .iter()
            .enumerate()
            .map(|(i, &t)| record(i as u32, vec![t, 0, 0]))
            .collect();

        let mut accumulated = vec![0u64; 3];
        for (record, cpu) in least_used(&records, 3) {
            assert!(accumulated.iter().all(|&load| accumulated[cpu] <= load));
            let first_min = accumulated.iter().position(|&l| l == accumulated[cpu]).unwrap();
            assert_eq!(first_min, cpu);
            accumulated[cpu] += record.total();
        }
    }

    #[test]
    fn test_all_strategies_conserve_load() {
        let collection = StatCollection::from_records(vec![
            record(11, vec![100, 20, 3, 0]),
            record(4, vec![7, 7, 7, 7]),
            record(30, vec![0, 0, 0, 900]),
            record(2, vec![15, 0, 1, 0]),
            record(19, vec![0, 0, 0, 0]),
        ]);
        let expected = collection.total_load();

        for strategy in BalanceStrategy::ALL {
            let report = strategy.compute_balance(&collection).unwrap();
            assert_eq!(report.total_interrupts(), expected, "{}", strategy);

            let percent_sum: f64 = report.per_cpu_percent.iter().sum();
            assert!((percent_sum - 100.0).abs() < 1e-6, "{}", strategy);
        }
    }

    #[test]
    fn test_derived_records_hold_full_load_on_one_cpu() {
        let collection = skewed_collection();

        for strategy in BalanceStrategy::ALL {
            let report = strategy.compute_balance(&collection).unwrap();
            assert_eq!(report.balanced_stats.len(), 4);

            for derived in &report.balanced_stats {
                assert_eq!(derived.per_cpu_counts().len(), 2);
                let nonzero = derived.per_cpu_counts().iter().filter(|&&c| c > 0).count();
                assert!(nonzero <= 1);
                assert_eq!(derived.per_cpu_counts().iter().sum::<u64>(), derived.total());
            }
        }
        // source records are unchanged
        assert_eq!(collection.records()[0].per_cpu_counts(), &[6, 4]);
    }

    #[test]
    fn test_outputs_are_sorted() {
        let collection = StatCollection::from_records(
            [9u32, 10, 2, 100, 1]
                .iter()
                .map(|&irq| record(irq, vec![irq as u64, 1]))
                .collect(),
        );
        let report = BalanceStrategy::LeastUsed.compute_balance(&collection).unwrap();

        let irqs: Vec<u32> = report.balanced_stats.iter().map(|r| r.irq()).collect();
        assert_eq!(irqs, vec![1, 2, 9, 10, 100]);

        let rendered: Vec<String> = report.instructions.iter().map(|i| i.to_string()).collect();
        let mut sorted = rendered.clone();
        sorted.sort();
        assert_eq!(rendered, sorted);
        // lexicographic, not numeric
        assert!(rendered[0].starts_with("pin 1 "));
        assert!(rendered[1].starts_with("pin 10 "));
    }

    #[test]
    fn test_distribution_round_trip_on_balanced_output() {
        let collection = skewed_collection();
        let report = BalanceStrategy::ReverseSortedLeastUsed
            .compute_balance(&collection)
            .unwrap();

        let again = Distribution::from_records(&report.balanced_stats, collection.cpu_count());
        assert_eq!(again.counts, report.per_cpu_counts);
        assert_eq!(again.percent, report.per_cpu_percent);
    }

    #[test]
    fn test_heavy_sources_do_not_overflow_accumulator() {
        let collection = StatCollection::from_records(vec![
            record(1, vec![u64::MAX - 2, 0]),
            record(2, vec![0, u64::MAX - 2]),
            record(3, vec![2, 2]),
        ]);

        for strategy in BalanceStrategy::ALL {
            let report = strategy.compute_balance(&collection).unwrap();
            assert_eq!(report.instructions.len(), 3, "{}", strategy);
            assert!(report.per_cpu_counts.contains(&u64::MAX), "{}", strategy);
        }
    }

    #[test]
    fn test_zero_cpus_with_load_is_no_capacity() {
        let collection = StatCollection::new(vec![record(1, vec![5])], 0);

        for strategy in BalanceStrategy::ALL {
            match strategy.compute_balance(&collection) {
                Err(IrqError::NoCapacity { load }) => assert_eq!(load, 5),
                other => panic!("expected NoCapacity, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_zero_cpus_without_load_is_empty_report() {
        let collection = StatCollection::from_records(vec![record(1, vec![])]);
        let report = BalanceStrategy::Alternating.compute_balance(&collection).unwrap();

        assert!(report.instructions.is_empty());
        assert!(report.per_cpu_counts.is_empty());
        assert_eq!(report.dispersion, None);
    }

    #[test]
    fn test_empty_collection() {
        let collection = StatCollection::new(Vec::new(), 4);
        let report = BalanceStrategy::LeastUsed.compute_balance(&collection).unwrap();

        assert!(report.balanced_stats.is_empty());
        assert_eq!(report.per_cpu_counts, vec![0, 0, 0, 0]);
        assert_eq!(report.per_cpu_percent, vec![0.0; 4]);
        assert_eq!(report.dispersion, None);
    }

    #[test]
    fn test_compare_strategies_favours_heaviest_first() {
        let collection = StatCollection::from_records(vec![
            record(1, vec![1, 0]),
            record(2, vec![1, 0]),
            record(3, vec![2, 0]),
            record(4, vec![0, 2]),
            record(5, vec![3, 3]),
        ]);
        let results = compare_strategies(&collection).unwrap();

        assert_eq!(results.len(), 4);
        let dispersion_of = |s: BalanceStrategy| {
            results.iter().find(|(strategy, _)| *strategy == s).unwrap().1.unwrap()
        };
        // heaviest first yields [6, 6]
        assert_eq!(dispersion_of(BalanceStrategy::ReverseSortedLeastUsed), 0.0);
        assert!(dispersion_of(BalanceStrategy::Alternating) > 0.0);
    }
}
