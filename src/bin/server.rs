//! timeshard Server Binary
//!
//! Ingests the source directory, then serves range queries over TCP.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use timeshard::config::DEFAULT_PARTITION_CAPACITY;
use timeshard::network::Server;
use timeshard::registry::remove_partition_dir;
use timeshard::{Config, QueryService, StorageRegistry};
use tracing_subscriber::{fmt, EnvFilter};

/// timeshard Server
#[derive(Parser, Debug)]
#[command(name = "timeshard-server")]
#[command(about = "Range queries over memory-mapped event log partitions")]
#[command(version)]
struct Args {
    /// Directory containing the source event logs
    #[arg(short, long, default_value = "./test-files")]
    dir: PathBuf,

    /// Number of records per partition
    #[arg(short = 's', long, default_value_t = DEFAULT_PARTITION_CAPACITY)]
    partition_size: usize,

    /// Directory partition files are written to (removed on exit)
    #[arg(short, long, default_value = "./partitions")]
    partition_dir: PathBuf,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8279")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Ingestion worker threads (0 = one per source file)
    #[arg(short, long, default_value = "0")]
    workers: usize,

    /// Refuse to ingest files whose timestamps go backwards
    #[arg(long)]
    strict_ordering: bool,

    /// Keep partition files on exit
    #[arg(long)]
    keep_partitions: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,timeshard=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("timeshard Server v{}", timeshard::VERSION);
    tracing::info!("Source directory: {}", args.dir.display());
    tracing::info!("Partition directory: {}", args.partition_dir.display());
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .source_dir(&args.dir)
        .partition_dir(&args.partition_dir)
        .partition_capacity(args.partition_size)
        .ingest_workers(args.workers)
        .strict_ordering(args.strict_ordering)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .build();

    // Partition files from an earlier run are never reused
    if let Err(e) = remove_partition_dir(&config.partition_dir) {
        tracing::error!("Failed to clear partition directory: {}", e);
        std::process::exit(1);
    }

    // Nothing is served unless every source file ingested cleanly
    let registry = match StorageRegistry::build(&config) {
        Ok(r) => Arc::new(r),
        Err(e) => {
            tracing::error!("Error building storage: {}", e);
            cleanup(&config, args.keep_partitions);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Storage built: {} files, {} partitions",
        registry.file_count(),
        registry.partition_count()
    );

    let service = Arc::new(QueryService::new(registry));
    let mut server = Server::new(config.clone(), service);

    // Ctrl+C and SIGTERM stop the accept loop so cleanup below runs
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received shutdown signal, stopping server...");
        shutdown.shutdown();
    }) {
        tracing::error!("Failed to install signal handler: {}", e);
        cleanup(&config, args.keep_partitions);
        std::process::exit(1);
    }

    let code = match server.run() {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("Server error: {}", e);
            1
        }
    };

    tracing::info!("Server stopped");
    cleanup(&config, args.keep_partitions);
    std::process::exit(code);
}

fn cleanup(config: &Config, keep_partitions: bool) {
    if keep_partitions {
        return;
    }
    if let Err(e) = remove_partition_dir(&config.partition_dir) {
        tracing::warn!("Error removing partition data: {}", e);
    }
}
