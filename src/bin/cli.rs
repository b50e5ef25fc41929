//! timeshard CLI Client
//!
//! Command-line interface for querying a server and inspecting partitions.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use timeshard::network::Client;
use timeshard::record::format_rfc3339;
use timeshard::service::{Reply, SelectRequest};
use timeshard::{PartitionFiles, Result};

/// timeshard CLI
#[derive(Parser, Debug)]
#[command(name = "timeshard-cli")]
#[command(about = "CLI for the timeshard event store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8279")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Select the records of a source file within a closed time range
    Select {
        /// Source file name
        #[arg(short, long)]
        file: String,

        /// Range start (RFC3339, inclusive)
        #[arg(long)]
        from: String,

        /// Range end (RFC3339, inclusive)
        #[arg(long)]
        to: String,
    },

    /// List the partitions written for a source file
    Inspect {
        /// Partition directory
        #[arg(short, long, default_value = "./partitions")]
        partition_dir: PathBuf,

        /// Source file name
        #[arg(short = 'n', long)]
        source: String,

        /// Decode every data file and check it against its meta
        #[arg(long)]
        verify: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Select { file, from, to } => select(&args.server, SelectRequest::new(file, from, to)),
        Commands::Inspect {
            partition_dir,
            source,
            verify,
        } => inspect(&partition_dir, &source, verify),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn select(server: &str, request: SelectRequest) -> Result<bool> {
    let mut client = Client::connect(server)?;
    match client.request(&request)? {
        Reply::Records(records) => {
            let pretty = serde_json::to_string_pretty(&records)
                .map_err(|e| timeshard::ShardError::Encode(e.to_string()))?;
            println!("{}", pretty);
            Ok(true)
        }
        Reply::Error(response) => {
            eprintln!("{:?}: {}", response.error.kind, response.error.message);
            Ok(false)
        }
    }
}

fn inspect(dir: &std::path::Path, source: &str, verify: bool) -> Result<bool> {
    let pairs = PartitionFiles::discover(dir, source)?;
    if pairs.is_empty() {
        eprintln!("no partitions for {} in {}", source, dir.display());
        return Ok(false);
    }

    let mut healthy = true;
    for (index, files) in pairs.into_iter().enumerate() {
        let partition = files.setup()?;
        let meta = partition.meta();
        println!(
            "{:>6}  {}  {}  {:>8} records  {:>10} bytes",
            index,
            format_rfc3339(meta.min_timestamp),
            format_rfc3339(meta.max_timestamp),
            meta.size,
            partition.mapped_len()
        );

        if verify {
            let records = partition.decode_all()?;
            let sorted = records.windows(2).all(|w| w[0].timestamp <= w[1].timestamp);
            let bounds = records.first().map(|r| r.timestamp) == Some(meta.min_timestamp)
                && records.last().map(|r| r.timestamp) == Some(meta.max_timestamp);
            if records.len() as u64 != meta.size || !sorted || !bounds {
                println!(
                    "        mismatch: decoded {} records, sorted={}, bounds match={}",
                    records.len(),
                    sorted,
                    bounds
                );
                healthy = false;
            }
        }
    }
    Ok(healthy)
}
