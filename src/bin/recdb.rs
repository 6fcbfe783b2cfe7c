//! recdb Command-Line Tools
//!
//! Bulk load and point lookups over a recdb data directory.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use recdb::loader;
use recdb::{Config, Database, Record, RecordLookup};
use tracing_subscriber::{fmt, EnvFilter};

/// recdb
#[derive(Parser, Debug)]
#[command(name = "recdb")]
#[command(about = "Disk-based record store with hashed data file and B+Tree indexes")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./data")]
    data_dir: PathBuf,

    /// Number of buckets in the data file; must match the value used at upload
    #[arg(short, long, default_value = "1000")]
    buckets: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a `;`-separated CSV file and build both indexes
    Upload {
        /// Path to the CSV file
        csv: PathBuf,
    },

    /// Find a record by id by probing the data file
    Findrec {
        /// Record id
        id: i32,
    },

    /// Find a record by id through the primary index
    Seek1 {
        /// Record id
        id: i32,
    },

    /// Find a record by exact title through the secondary index
    Seek2 {
        /// Title words; joined with single spaces
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,recdb=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("Fatal: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> recdb::Result<()> {
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .total_buckets(args.buckets)
        .build();

    tracing::debug!("recdb v{}", recdb::VERSION);
    let mut db = Database::open(config)?;

    match args.command {
        Commands::Upload { csv } => {
            tracing::info!("Loading {}", csv.display());
            let started = Instant::now();
            let reader = BufReader::new(File::open(&csv)?);
            let report = loader::load_csv(&mut db, reader)?;

            println!("Records loaded:            {}", report.loaded);
            println!("Malformed lines skipped:   {}", report.skipped);
            println!("Duplicate ids rejected:    {}", report.duplicates);
            println!("Rejected (data file full): {}", report.rejected_full);
            println!("Data file blocks:          {}", db.data_blocks());
            println!("Primary index blocks:      {}", db.primary_blocks());
            println!("Secondary index blocks:    {}", db.secondary_blocks());
            println!("Elapsed:                   {:.2?}", started.elapsed());
        }

        Commands::Findrec { id } => {
            let lookup = db.find_by_id(id)?;
            print_lookup(&lookup, &format!("id {}", id));
            println!();
            println!("Blocks read in data file:  {}", lookup.data_blocks_read);
            println!("Total blocks in data file: {}", db.data_blocks());
        }

        Commands::Seek1 { id } => {
            let lookup = db.get_by_id(id)?;
            print_lookup(&lookup, &format!("id {}", id));
            println!();
            println!("Blocks read in primary index:  {}", lookup.index_blocks_read);
            println!("Total blocks in primary index: {}", db.primary_blocks());
        }

        Commands::Seek2 { title } => {
            let title = title.join(" ");
            let lookup = db.get_by_title(&title)?;
            print_lookup(&lookup, &format!("title {:?}", title));
            println!();
            println!("Blocks read in secondary index:  {}", lookup.index_blocks_read);
            println!("Total blocks in secondary index: {}", db.secondary_blocks());
        }
    }

    db.close()
}

fn print_lookup(lookup: &RecordLookup, what: &str) {
    match &lookup.record {
        Some(record) => {
            println!("Record found for {}", what);
            print_record(record);
        }
        None => println!("No record found for {}", what),
    }
}

fn print_record(record: &Record) {
    println!("  id:         {}", record.id);
    println!("  title:      {}", record.title);
    println!("  year:       {}", record.year);
    println!("  authors:    {}", record.authors);
    println!("  citations:  {}", record.citations);
    println!("  updated_at: {}", format_timestamp(record.updated_at));
    println!("  snippet:    {}", record.snippet);
}

fn format_timestamp(secs: i64) -> String {
    match chrono::DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.format(loader::TIMESTAMP_FORMAT).to_string(),
        None => secs.to_string(),
    }
}
