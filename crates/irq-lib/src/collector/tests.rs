//! Integration tests for statistics loading
//!
//! These tests write mock interrupt tables to a temporary directory and load
//! them back, without touching the real `/proc/interrupts`.

#[cfg(test)]
mod mock_source_tests {
    use crate::collector::StatCollection;
    use crate::error::IrqError;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tokio::fs;

    const TWO_CPU_TABLE: &str = r#"           CPU0       CPU1
  0:         36          0   IO-APIC-edge      timer
  1:          2          8   IO-APIC-edge      i8042
this is not an interrupt row
 16:        120         45   IO-APIC-edge      eth0
NMI:          0          0   Non-maskable interrupts
LOC:     123456     654321   Local timer interrupts
"#;

    async fn write_table(temp_dir: &TempDir, content: &str) -> PathBuf {
        let path = temp_dir.path().join("interrupts");
        fs::write(&path, content).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_skips_header_and_bad_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_table(&temp_dir, TWO_CPU_TABLE).await;

        let collection = StatCollection::load(&path).await.unwrap();

        assert_eq!(collection.records().len(), 3);
        assert_eq!(collection.cpu_count(), 2);
        assert_eq!(collection.skipped_lines(), 3);
        assert_eq!(collection.total_load(), 36 + 10 + 165);

        let eth0 = &collection.records()[2];
        assert_eq!(eth0.irq(), 16);
        assert_eq!(eth0.per_cpu_counts(), &[120, 45]);
        assert_eq!(eth0.irq_type(), "IO-APIC-edge");
        assert_eq!(eth0.device(), "eth0");
        assert_eq!(eth0.total(), 165);
    }

    #[tokio::test]
    async fn test_header_is_skipped_even_when_it_parses() {
        let temp_dir = TempDir::new().unwrap();
        let content = "5: 1 1 edge first\n6: 2 2 edge second\n";
        let path = write_table(&temp_dir, content).await;

        let collection = StatCollection::load(&path).await.unwrap();

        assert_eq!(collection.records().len(), 1);
        assert_eq!(collection.records()[0].irq(), 6);
    }

    #[tokio::test]
    async fn test_header_bad_row_good_row_yields_one_record() {
        let temp_dir = TempDir::new().unwrap();
        let content = "           CPU0       CPU1\ngarbage line\n16:    120    45   IO-APIC-edge      eth0\n";
        let path = write_table(&temp_dir, content).await;

        let collection = StatCollection::load(&path).await.unwrap();

        assert_eq!(collection.records().len(), 1);
        assert_eq!(collection.cpu_count(), 2);
        assert_eq!(collection.records()[0].total(), 165);
    }

    #[tokio::test]
    async fn test_cpu_count_is_widest_row() {
        let temp_dir = TempDir::new().unwrap();
        let content = "CPU0 CPU1 CPU2\n1: 5 edge a\n2: 1 2 3 edge b\n3: 4 4 edge c\n";
        let path = write_table(&temp_dir, content).await;

        let collection = StatCollection::load(&path).await.unwrap();

        assert_eq!(collection.records().len(), 3);
        assert_eq!(collection.cpu_count(), 3);
    }

    #[tokio::test]
    async fn test_missing_source_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("does-not-exist");

        let result = StatCollection::load(&path).await;

        match result {
            Err(IrqError::SourceUnavailable { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected SourceUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_source_is_empty_collection() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_table(&temp_dir, "").await;

        let collection = StatCollection::load(&path).await.unwrap();

        assert!(collection.is_empty());
        assert_eq!(collection.cpu_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_utf8_does_not_abort_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("interrupts");
        let mut content = b"    CPU0  CPU1\n 16:  120  45  IO-APIC-edge  eth0\n".to_vec();
        content.extend_from_slice(b" 17:  1  2  edge  bad\xff\xfe\n");
        content.extend_from_slice(b"\xff9:  1  2  edge  worse\n");
        fs::write(&path, content).await.unwrap();

        let collection = StatCollection::load(&path).await.unwrap();

        let irqs: Vec<u32> = collection.records().iter().map(|r| r.irq()).collect();
        assert_eq!(irqs, vec![16, 17]);
        assert_eq!(collection.records()[0].device(), "eth0");
        assert!(collection.records()[1].device().starts_with("bad"));
        assert_eq!(collection.skipped_lines(), 1);
        assert_eq!(collection.total_load(), 168);
    }

    #[test]
    fn test_current_report_keeps_parsed_distribution() {
        let collection = StatCollection::parse(TWO_CPU_TABLE);
        let report = collection.current_report();

        assert!(report.strategy.is_none());
        assert!(report.instructions.is_empty());
        assert_eq!(report.per_cpu_counts, vec![36 + 2 + 120, 8 + 45]);
        let percent_sum: f64 = report.per_cpu_percent.iter().sum();
        assert!((percent_sum - 100.0).abs() < 1e-6);
        assert!(report.dispersion.is_some());
    }
}
