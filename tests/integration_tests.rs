//! Integration tests for timeshard

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use timeshard::codec;
use timeshard::config::DEFAULT_PARTITION_CAPACITY;
use timeshard::record::format_rfc3339;
use timeshard::service::SelectRequest;
use timeshard::{
    Config, InternalRecord, Partition, PartitionFiles, PartitionMeta, QueryService, ShardError,
    StorageRegistry,
};

const TS1: i64 = 994_620_570; // 2001-07-08T19:29:30Z

fn write_source(dir: &Path, name: &str, start: i64, count: i64, step: i64) {
    let lines: String = (0..count)
        .map(|i| format!("{} u{}@example.com s{}\n", format_rfc3339(start + i * step), i, i))
        .collect();
    fs::write(dir.join(name), lines).unwrap();
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[test]
fn test_build_and_query_many_files() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_source(src.path(), "hourly.txt", TS1, 48, 3_600);
    write_source(src.path(), "minutely.txt", TS1, 500, 60);

    let config = Config::builder()
        .source_dir(src.path())
        .partition_dir(out.path())
        .partition_capacity(16)
        .build();
    let service = QueryService::new(Arc::new(StorageRegistry::build(&config).unwrap()));

    assert_eq!(service.registry().get("hourly.txt").unwrap().len(), 3);
    assert_eq!(service.registry().get("minutely.txt").unwrap().len(), 32);

    // Six hours starting at the seventh record
    let hourly = service
        .select(&SelectRequest::new(
            "hourly.txt",
            format_rfc3339(TS1 + 6 * 3_600),
            format_rfc3339(TS1 + 11 * 3_600),
        ))
        .unwrap();
    assert_eq!(hourly.len(), 6);
    assert_eq!(hourly[0].session_id, "s6");
    assert_eq!(hourly[5].session_id, "s11");

    // Spans partitions 0 through 2 of the minutely file
    let minutely = service
        .select(&SelectRequest::new(
            "minutely.txt",
            format_rfc3339(TS1 + 10 * 60),
            format_rfc3339(TS1 + 40 * 60),
        ))
        .unwrap();
    assert_eq!(minutely.len(), 31);
    assert!(minutely
        .windows(2)
        .all(|w| w[0].event_time <= w[1].event_time));
}

#[test]
fn test_partitions_discoverable_after_build() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_source(src.path(), "events.txt", TS1, 10, 1);

    let registry = StorageRegistry::build_from(src.path(), 3, out.path()).unwrap();
    let built = registry.get("events.txt").unwrap();

    let discovered = PartitionFiles::discover(out.path(), "events.txt").unwrap();
    assert_eq!(discovered.len(), built.len());
    for (files, partition) in discovered.into_iter().zip(built) {
        let remapped = files.setup().unwrap();
        assert_eq!(remapped.meta(), partition.meta());
        assert_eq!(remapped.select_records(TS1, TS1 + 9).unwrap(), partition.decode_all().unwrap());
    }
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_defaults() {
    let config = Config::default();

    assert_eq!(config.partition_capacity, DEFAULT_PARTITION_CAPACITY);
    assert_eq!(config.partition_capacity, 4096);
    assert_eq!(config.listen_addr, "127.0.0.1:8279");
    assert_eq!(config.ingest_workers, 0);
    assert!(!config.strict_ordering);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_builder() {
    let config = Config::builder()
        .source_dir("/data/logs")
        .partition_dir("/data/parts")
        .partition_capacity(128)
        .ingest_workers(4)
        .strict_ordering(true)
        .listen_addr("0.0.0.0:9000")
        .max_connections(8)
        .read_timeout_ms(100)
        .write_timeout_ms(200)
        .build();

    assert_eq!(config.source_dir, Path::new("/data/logs"));
    assert_eq!(config.partition_dir, Path::new("/data/parts"));
    assert_eq!(config.partition_capacity, 128);
    assert_eq!(config.ingest_workers, 4);
    assert!(config.strict_ordering);
    assert_eq!(config.listen_addr, "0.0.0.0:9000");
    assert_eq!(config.max_connections, 8);
    assert_eq!(config.read_timeout_ms, 100);
    assert_eq!(config.write_timeout_ms, 200);
}

#[test]
fn test_config_validation() {
    let zero_capacity = Config::builder().partition_capacity(0).build();
    let zero_connections = Config::builder().max_connections(0).build();

    assert!(matches!(zero_capacity.validate(), Err(ShardError::Config(_))));
    assert!(matches!(zero_connections.validate(), Err(ShardError::Config(_))));
}

// =============================================================================
// Codec Tests
// =============================================================================

#[test]
fn test_codec_records() {
    let records = vec![
        InternalRecord::new("a@b.com", "s1", TS1),
        InternalRecord::new("c@d.com", "s2", TS1 + 1),
    ];

    let bytes = codec::encode_records(&records).unwrap();

    assert_eq!(codec::decode_records(&bytes).unwrap(), records);
}

#[test]
fn test_codec_meta() {
    let meta = PartitionMeta {
        min_timestamp: TS1,
        max_timestamp: TS1 + 100,
        size: 7,
    };

    let bytes = codec::encode_meta(&meta).unwrap();

    assert_eq!(codec::decode_meta(&bytes).unwrap(), meta);
}

#[test]
fn test_codec_rejects_truncated_input() {
    let bytes = codec::encode_records(&[InternalRecord::new("a@b.com", "s1", TS1)]).unwrap();

    let result = codec::decode_records(&bytes[..bytes.len() - 3]);

    assert!(matches!(result, Err(ShardError::Decode(_))));
    assert!(matches!(codec::decode_meta(&[1, 2]), Err(ShardError::Decode(_))));
}
