//! Command-line interface.
//!
//! Provides ingest, encode, types, and schema subcommands. Rows go to stdout
//! (or Parquet files); logs and error messages go to stderr.

use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::json;
use std::io::{BufRead, BufReader, Read, StdoutLock, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ti_common::{Error, LogFormat, OutputFormat, Result, StreamId, Value};
use ti_config::{resolve_config, CatalogBundle, IngestConfig};
use ti_telemetry::WriterConfig;
use tracing::{debug, info, warn};

use crate::encode::{encode_records, row_from_json};
use crate::exit_codes::ExitCode;
use crate::ingest::{IngestSummary, RecordIngester};
use crate::layout::TableLayout;
use crate::logging::{effective_level, init_logging};
use crate::registry::TypeRegistry;
use crate::sink::{CountingSink, JsonArraySink, JsonLinesSink, ParquetSink, RowSink};

/// Schema-less telemetry ingestion.
#[derive(Parser, Debug)]
#[command(name = "ti-core", version, about)]
pub struct Cli {
    /// Config file (overrides TI_CONFIG and the XDG location)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log line format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decode an ingestion buffer and write its rows
    Ingest(IngestArgs),
    /// Encode JSON rows into an ingestion buffer
    Encode(EncodeArgs),
    /// List registered logical types
    Types,
    /// Show a stream's resolved columns and table DDL
    Schema(SchemaArgs),
}

/// Arguments for the ingest command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Stream identifier
    #[arg(long)]
    pub stream: String,

    /// Input buffer file, or - for stdin
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Catalog bundle (overrides config and TI_CATALOG)
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Row output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Root directory for Parquet output
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

/// Arguments for the encode command
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Stream identifier
    #[arg(long)]
    pub stream: String,

    /// JSON lines file, one array per row in column order (- for stdin)
    #[arg(long, value_name = "FILE")]
    pub rows: PathBuf,

    /// Output buffer file (- for stdout)
    #[arg(long, value_name = "FILE")]
    pub output: PathBuf,

    /// Catalog bundle (overrides config and TI_CATALOG)
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,
}

/// Arguments for the schema command
#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Stream identifier
    #[arg(long)]
    pub stream: String,

    /// Catalog bundle (overrides config and TI_CATALOG)
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Print the layout as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run a parsed command line; errors are reported on stderr.
pub fn run(cli: Cli) -> ExitCode {
    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ti-core: error [{}]: {}", e.code(), e);
            ExitCode::for_error(&e)
        }
    }
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let (config, paths) = resolve_config(cli.config.as_deref())?;
    let log_format = cli.log_format.unwrap_or(config.logging.format);
    init_logging(log_format, &effective_level(&config.logging.level, cli.verbose))?;
    debug!(source = ?paths.source, file = ?paths.config_file, "configuration resolved");

    let ingester = RecordIngester::new(Arc::new(TypeRegistry::standard()));
    match cli.command {
        Commands::Ingest(args) => run_ingest(&ingester, &config, args),
        Commands::Encode(args) => run_encode(&ingester, &config, args),
        Commands::Types => run_types(ingester.registry()),
        Commands::Schema(args) => run_schema(&ingester, &config, args),
    }
}

fn load_catalog(flag: Option<&Path>, config: &IngestConfig) -> Result<CatalogBundle> {
    let path = flag.or(config.catalog.path.as_deref()).ok_or_else(|| {
        Error::Config("no catalog configured; pass --catalog or set TI_CATALOG".to_string())
    })?;
    let bundle = CatalogBundle::load_from_file(path)?;
    debug!(path = %path.display(), streams = bundle.streams.len(), "catalog loaded");
    Ok(bundle)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read(path)?)
    }
}

fn writer_config(config: &IngestConfig, out_dir: Option<PathBuf>) -> WriterConfig {
    let compression = match config.output.compression {
        ti_config::Compression::Zstd => ti_telemetry::Compression::Zstd,
        ti_config::Compression::Snappy => ti_telemetry::Compression::Snappy,
        ti_config::Compression::None => ti_telemetry::Compression::Uncompressed,
    };
    WriterConfig::new(out_dir.unwrap_or_else(|| config.output.dir.clone()))
        .with_batch_size(config.output.batch_size)
        .with_compression(compression)
}

/// Sink selected by the output format.
enum OutputSink {
    Lines(JsonLinesSink<StdoutLock<'static>>),
    Array(JsonArraySink<StdoutLock<'static>>),
    Parquet(ParquetSink),
}

impl OutputSink {
    fn open(format: OutputFormat, config: &IngestConfig, out_dir: Option<PathBuf>) -> Self {
        match format {
            OutputFormat::Jsonl => OutputSink::Lines(JsonLinesSink::new(std::io::stdout().lock())),
            OutputFormat::Json => OutputSink::Array(JsonArraySink::new(std::io::stdout().lock())),
            OutputFormat::Parquet => OutputSink::Parquet(ParquetSink::new(writer_config(config, out_dir))),
        }
    }
}

impl RowSink for OutputSink {
    fn insert_row(&mut self, layout: &TableLayout, row: &[Value]) -> Result<()> {
        match self {
            OutputSink::Lines(s) => s.insert_row(layout, row),
            OutputSink::Array(s) => s.insert_row(layout, row),
            OutputSink::Parquet(s) => s.insert_row(layout, row),
        }
    }

    fn finish(&mut self) -> Result<()> {
        match self {
            OutputSink::Lines(s) => s.finish(),
            OutputSink::Array(s) => s.finish(),
            OutputSink::Parquet(s) => s.finish(),
        }
    }
}

/// Flush the sink after an ingest call.
///
/// The outer error is a flush failure after a clean ingest. A failed ingest
/// is flushed only when rows were delivered, and its error stays the one
/// reported: a second failure while flushing is logged and dropped.
fn finish_ingest(
    outcome: Result<IngestSummary>,
    sink: &mut dyn RowSink,
    delivered: u64,
) -> Result<Result<IngestSummary>> {
    match outcome {
        Ok(summary) => {
            sink.finish()?;
            Ok(Ok(summary))
        }
        Err(e) => {
            if delivered > 0 {
                if let Err(flush) = sink.finish() {
                    warn!(error = %flush, rows = delivered, "flush after failed ingest");
                }
            }
            Ok(Err(e))
        }
    }
}

fn run_ingest(ingester: &RecordIngester, config: &IngestConfig, args: IngestArgs) -> Result<ExitCode> {
    let catalog = load_catalog(args.catalog.as_deref(), config)?;
    let buf = read_input(&args.input)?;
    let stream = StreamId::new(args.stream);
    let format = args.format.unwrap_or(config.output.format);

    let mut sink = OutputSink::open(format, config, args.out_dir);
    let mut counting = CountingSink::new(&mut sink);
    let outcome = ingester.ingest(&catalog, &mut counting, &stream, &buf);
    let delivered = counting.rows();
    let outcome = finish_ingest(outcome, &mut counting, delivered)?;

    match outcome {
        Ok(summary) => {
            if let OutputSink::Parquet(p) = &sink {
                let files: Vec<String> = p.files().iter().map(|f| f.display().to_string()).collect();
                let report = json!({ "summary": summary, "files": files });
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            info!(rows = summary.records, "done");
            Ok(ExitCode::Clean)
        }
        Err(e) if delivered > 0 => {
            eprintln!(
                "ti-core: error [{}]: {} ({} rows committed before the failure)",
                e.code(),
                e,
                delivered
            );
            Ok(ExitCode::PartialIngest)
        }
        Err(e) => Err(e),
    }
}

fn run_encode(ingester: &RecordIngester, config: &IngestConfig, args: EncodeArgs) -> Result<ExitCode> {
    let catalog = load_catalog(args.catalog.as_deref(), config)?;
    let layout = ingester.layout(&catalog, &StreamId::new(args.stream))?;

    let input = read_input(&args.rows)?;
    let mut rows = Vec::new();
    for (i, line) in BufReader::new(input.as_slice()).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let json: serde_json::Value = serde_json::from_str(&line)?;
        let row = row_from_json(&layout, &json).map_err(|e| match e {
            Error::SchemaValidation(msg) => Error::SchemaValidation(format!("line {}: {}", i + 1, msg)),
            other => other,
        })?;
        rows.push(row);
    }

    let buf = encode_records(&layout, &rows)?;
    if args.output.as_os_str() == "-" {
        let mut out = std::io::stdout().lock();
        out.write_all(&buf)?;
        out.flush()?;
    } else {
        std::fs::write(&args.output, &buf)?;
    }
    info!(
        stream = %layout.stream(),
        rows = rows.len(),
        bytes = buf.len(),
        "rows encoded"
    );
    Ok(ExitCode::Clean)
}

fn run_types(registry: &TypeRegistry) -> Result<ExitCode> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "{:<10} {:<17} {:<13} DEFAULT", "TYPE", "WIRE", "STORAGE")?;
    for (name, info) in registry.iter() {
        writeln!(
            out,
            "{:<10} {:<17} {:<13} {}",
            name,
            info.wire.name(),
            info.storage.sql_type(),
            info.default.to_sql_literal()
        )?;
    }
    Ok(ExitCode::Clean)
}

fn run_schema(ingester: &RecordIngester, config: &IngestConfig, args: SchemaArgs) -> Result<ExitCode> {
    let catalog = load_catalog(args.catalog.as_deref(), config)?;
    let layout = ingester.layout(&catalog, &StreamId::new(args.stream))?;
    let mut out = std::io::stdout().lock();

    if args.json {
        let report = json!({
            "layout": layout.describe(),
            "create_table": layout.create_table_sql(),
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(ExitCode::Clean);
    }

    writeln!(out, "stream:      {}", layout.stream())?;
    writeln!(out, "table:       {}", layout.table())?;
    writeln!(out, "fingerprint: {}", layout.fingerprint())?;
    writeln!(out)?;
    writeln!(out, "{:<4} {:<24} {:<10} {:<17} STORAGE", "TAG", "COLUMN", "TYPE", "WIRE")?;
    for (i, col) in layout.columns().iter().enumerate() {
        writeln!(
            out,
            "{:<4} {:<24} {:<10} {:<17} {}",
            i + 1,
            col.name,
            col.type_name,
            col.wire.name(),
            col.storage.sql_type()
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{};", layout.create_table_sql())?;
    Ok(ExitCode::Clean)
}
