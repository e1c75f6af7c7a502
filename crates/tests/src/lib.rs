//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! Covers:
//! - Contract snapshots
//! - Config file -> sink factory -> batcher -> output file
//! - Sink failure handling across crate boundaries

#[cfg(test)]
mod contract_tests {
    use contracts::{BatcherConfig, FailurePolicy, StatsSnapshot};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_default_config_snapshot() {
        let json = serde_json::to_value(BatcherConfig::default()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "batcher",
                "buffer_size": 10000,
                "batch_size": 100,
                "flush_interval_ms": 1000,
                "failure_policy": "retry",
                "retry_backoff_ms": 1000
            })
        );
        assert_eq!(BatcherConfig::default().failure_policy, FailurePolicy::Retry);
    }

    #[test]
    fn test_stats_snapshot_serializes_all_counters() {
        let json = serde_json::to_value(StatsSnapshot::default()).unwrap();
        for key in ["buffered", "sent", "dropped", "flush_failed", "lost", "queue_len"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashSet;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use batcher::{create_sink, Batcher, BatcherError, FnSink};
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{BoxError, FailurePolicy, SinkConfig};
    use observability::FlushStatsAggregator;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    struct Record {
        producer: u32,
        seq: u32,
    }

    /// End-to-end: TOML config -> FileSink -> Batcher -> JSON lines on disk
    ///
    /// Verifies:
    /// 1. The loader produces a blueprint the factory accepts
    /// 2. Concurrent producers lose nothing when the queue has room
    /// 3. Each producer's items land in submission order
    #[test]
    fn test_e2e_config_to_file() {
        const PRODUCERS: u32 = 3;
        const PER_PRODUCER: u32 = 400;

        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out").join("records.jsonl");
        let toml = format!(
            r#"
[batcher]
name = "e2e"
buffer_size = 2000
batch_size = 64
flush_interval_ms = 25

[sink]
name = "records"
sink_type = "file"
[sink.params]
path = "{}"
truncate = "true"
"#,
            output.display()
        );

        let blueprint = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        let sink = create_sink::<Record>(&blueprint.sink).unwrap();
        let batcher = Batcher::builder(blueprint.batcher.clone())
            .boxed_sink(sink)
            .build()
            .unwrap();

        let producers: Vec<_> = (0..PRODUCERS)
            .map(|producer| {
                let handle = batcher.handle();
                thread::spawn(move || {
                    (0..PER_PRODUCER)
                        .filter(|&seq| handle.enqueue(Record { producer, seq }))
                        .count()
                })
            })
            .collect();
        let accepted: usize = producers.into_iter().map(|p| p.join().unwrap()).sum();
        assert_eq!(accepted, (PRODUCERS * PER_PRODUCER) as usize);

        let handle = batcher.handle();
        batcher.close().unwrap();

        let stats = handle.stats();
        assert_eq!(stats.sent, u64::from(PRODUCERS * PER_PRODUCER));
        assert_eq!(stats.dropped, 0);
        assert_eq!(stats.flush_failed, 0);

        let records: Vec<Record> = fs::read_to_string(&output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(records.len(), (PRODUCERS * PER_PRODUCER) as usize);

        for producer in 0..PRODUCERS {
            let seqs: Vec<u32> = records
                .iter()
                .filter(|r| r.producer == producer)
                .map(|r| r.seq)
                .collect();
            assert_eq!(seqs, (0..PER_PRODUCER).collect::<Vec<_>>());
        }
    }

    /// Every accepted item is flushed exactly once even with early sink failures
    #[test]
    fn test_e2e_retry_delivers_exactly_once() {
        let json = r#"{
            "batcher": {
                "name": "flaky",
                "buffer_size": 500,
                "batch_size": 10,
                "flush_interval_ms": 10,
                "failure_policy": "retry",
                "retry_backoff_ms": 0
            },
            "sink": { "name": "unused", "sink_type": "log" }
        }"#;
        let blueprint = ConfigLoader::load_from_str(json, ConfigFormat::Json).unwrap();

        let delivered = Arc::new(std::sync::Mutex::new(Vec::new()));
        let failures = Arc::new(AtomicUsize::new(5));
        let sink = {
            let delivered = Arc::clone(&delivered);
            let failures = Arc::clone(&failures);
            FnSink::<_, BoxError>::new("flaky", move |batch: &[u32]| -> Result<(), BoxError> {
                if failures.load(Ordering::SeqCst) > 0 {
                    failures.fetch_sub(1, Ordering::SeqCst);
                    return Err("transient".into());
                }
                delivered.lock().unwrap().extend_from_slice(batch);
                Ok(())
            })
        };

        let batcher = Batcher::new(blueprint.batcher, sink).unwrap();
        for i in 0..200 {
            assert!(batcher.enqueue(i));
        }
        let handle = batcher.handle();
        batcher.close().unwrap();

        let delivered = delivered.lock().unwrap();
        let unique: HashSet<_> = delivered.iter().copied().collect();
        assert_eq!(delivered.len(), 200);
        assert_eq!(unique.len(), 200);
        assert_eq!(handle.stats().flush_failed, 5);
    }

    /// Stop policy: the first failure ends dispatching and surfaces on close
    #[test]
    fn test_e2e_stop_policy() {
        let mut blueprint = ConfigLoader::load_from_str(
            r#"
[batcher]
batch_size = 1
failure_policy = "stop"

[sink]
name = "down"
sink_type = "log"
"#,
            ConfigFormat::Toml,
        )
        .unwrap();
        blueprint.batcher.buffer_size = 16;
        assert_eq!(blueprint.batcher.failure_policy, FailurePolicy::Stop);

        let batcher = Batcher::new(
            blueprint.batcher,
            FnSink::<_, BoxError>::new("down", |_: &[u8]| -> Result<(), BoxError> {
                Err("sink down".into())
            }),
        )
        .unwrap();

        batcher.enqueue(1);
        let err = batcher.close().unwrap_err();

        assert!(matches!(
            err,
            BatcherError::Stopped(_) | BatcherError::Drain(_)
        ));
        assert!(err.to_string().contains("sink down"));
    }

    /// Flush statistics line up with the engine counters
    #[test]
    fn test_e2e_flush_statistics() {
        let aggregator = Arc::new(std::sync::Mutex::new(FlushStatsAggregator::new()));
        let sink = {
            let aggregator = Arc::clone(&aggregator);
            FnSink::<_, BoxError>::new("measured", move |batch: &[u64]| -> Result<(), BoxError> {
                aggregator
                    .lock()
                    .unwrap()
                    .update(batch.len(), std::time::Duration::ZERO, true);
                Ok(())
            })
        };

        let mut config = contracts::BatcherConfig::default();
        config.batch_size = 25;
        let batcher = Batcher::new(config, sink).unwrap();
        for i in 0..110 {
            batcher.enqueue(i);
        }
        let handle = batcher.handle();
        batcher.close().unwrap();

        let summary = aggregator.lock().unwrap().summary();
        assert_eq!(summary.total_items, handle.stats().sent);
        assert_eq!(summary.total_items, 110);
        assert!(summary.batch_size.max <= 25.0);
    }

    #[test]
    fn test_e2e_log_sink_from_config() {
        let sink = create_sink::<Record>(&SinkConfig::log("audit")).unwrap();
        let batcher = Batcher::builder(Default::default())
            .boxed_sink(sink)
            .build()
            .unwrap();

        for seq in 0..10 {
            batcher.enqueue(Record { producer: 0, seq });
        }
        let handle = batcher.handle();
        batcher.close().unwrap();
        assert_eq!(handle.stats().sent, 10);
    }
}
