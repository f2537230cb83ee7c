use als_engine::{
    AlsCompressor, AlsDocument, AlsError, AlsParser, CompressionReport, CompressorConfig,
    CsvAdapter, Encoding, JsonAdapter, ParserConfig, Strategy, TableSource,
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// ALS (Adaptive Logic Stream) compression tool for tabular data
#[derive(Parser)]
#[command(name = "als")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Configuration file path (JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Tabular formats on the uncompressed side
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// CSV (Comma-Separated Values)
    Csv,
    /// JSON array of objects
    Json,
    /// Detect from file extension or content
    Auto,
}

impl Format {
    fn as_str(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Json => "json",
            Format::Auto => "auto",
        }
    }
}

/// Engine settings that override the configuration file
#[derive(Args, Debug, Clone, Default)]
struct TuningArgs {
    /// Number of worker threads and chunks (0 = one per CPU)
    #[arg(short = 'j', long, value_name = "N")]
    parallelism: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress CSV or JSON data to ALS format
    Compress {
        /// Input file (use '-' for stdin)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        input: String,

        /// Output file (use '-' for stdout)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        output: String,

        /// Input format
        #[arg(short, long, value_enum, default_value = "auto")]
        format: Format,

        /// Minimum improvement ratio a pattern must reach over raw
        #[arg(short = 't', long, value_name = "RATIO")]
        threshold: Option<f64>,

        /// Minimum run or sequence length worth encoding
        #[arg(short = 'm', long, value_name = "LEN")]
        min_pattern_length: Option<usize>,

        /// Print the strategy chosen for every column
        #[arg(short, long)]
        report: bool,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Decompress ALS data to CSV or JSON format
    Decompress {
        /// Input file (use '-' for stdin)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        input: String,

        /// Output file (use '-' for stdout)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        output: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: Format,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Display information about ALS compressed data
    Info {
        /// Input file (use '-' for stdin)
        #[arg(short, long, value_name = "FILE", default_value = "-")]
        input: String,
    },
}

/// Settings loaded from `--config`.
#[derive(Debug, Default)]
struct Settings {
    compressor: CompressorConfig,
    parser: ParserConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let settings = match &cli.config {
        Some(path) => load_config(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Commands::Compress {
            input,
            output,
            format,
            threshold,
            min_pattern_length,
            report,
            tuning,
        } => {
            let mut config = settings.compressor;
            if let Some(threshold) = threshold {
                config.ctx_fallback_threshold = threshold;
            }
            if let Some(length) = min_pattern_length {
                config.min_pattern_length = length;
            }
            if let Some(parallelism) = tuning.parallelism {
                config.parallelism = parallelism;
            }
            compress_command(&input, &output, format, config, report, cli.quiet)?;
        }
        Commands::Decompress {
            input,
            output,
            format,
            pretty,
            tuning,
        } => {
            let mut config = settings.parser;
            if let Some(parallelism) = tuning.parallelism {
                config.parallelism = parallelism;
            }
            decompress_command(&input, &output, format, pretty, config, cli.quiet)?;
        }
        Commands::Info { input } => {
            info_command(&input, settings.parser, cli.verbose, cli.quiet)?;
        }
    }

    Ok(())
}

/// Set up logging based on verbosity flags
fn setup_logging(verbose: bool, quiet: bool) {
    let log_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    debug!("Logging initialized at {} level", log_level);
}

/// Load settings from a JSON file.
///
/// The file holds either a bare compressor configuration or an object with
/// optional `compressor` and `parser` sections. Missing fields keep their
/// defaults.
fn load_config(path: &Path) -> Result<Settings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("Config file is not valid JSON: {}", path.display()))?;

    let sectioned = value.get("compressor").is_some() || value.get("parser").is_some();
    let settings = if sectioned {
        let compressor = match value.get("compressor") {
            Some(section) => serde_json::from_value(section.clone())
                .context("Invalid 'compressor' section in config file")?,
            None => CompressorConfig::default(),
        };
        let parser = match value.get("parser") {
            Some(section) => serde_json::from_value(section.clone())
                .context("Invalid 'parser' section in config file")?,
            None => ParserConfig::default(),
        };
        Settings { compressor, parser }
    } else {
        Settings {
            compressor: serde_json::from_value(value)
                .with_context(|| format!("Invalid compressor config in {}", path.display()))?,
            parser: ParserConfig::default(),
        }
    };

    debug!("Loaded configuration from {}: {:?}", path.display(), settings);
    Ok(settings)
}

/// Read input from file or stdin
fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        Ok(buffer)
    } else {
        fs::read_to_string(input).with_context(|| format!("Failed to read input file: {}", input))
    }
}

/// Write output to file or stdout
fn write_output(output: &str, content: &str) -> Result<()> {
    if output == "-" {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(content.as_bytes())
            .context("Failed to write to stdout")?;
        stdout.flush().context("Failed to flush stdout")?;
    } else {
        fs::write(output, content)
            .with_context(|| format!("Failed to write output file: {}", output))?;
    }
    Ok(())
}

/// Detect input format from file extension, then content
fn detect_format(input: &str, content: &str) -> Format {
    if input != "-" {
        let extension = Path::new(input).extension().and_then(|e| e.to_str());
        match extension.map(str::to_ascii_lowercase).as_deref() {
            Some("csv") => return Format::Csv,
            Some("json") => return Format::Json,
            _ => {}
        }
    }

    let trimmed = content.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        Format::Json
    } else {
        Format::Csv
    }
}

/// Execute the compress command
fn compress_command(
    input: &str,
    output: &str,
    format: Format,
    config: CompressorConfig,
    report: bool,
    quiet: bool,
) -> Result<()> {
    let start_time = Instant::now();
    info!("Starting compression: {} -> {}", input, output);

    let progress = create_progress_bar(quiet, "Reading input");
    let input_data = read_input(input)?;
    progress.finish_and_clear();

    if input_data.trim().is_empty() {
        warn!("Input is empty");
    }
    if input_data.trim_start().starts_with("!v") {
        anyhow::bail!("Input is already in ALS format. Use 'decompress' command instead.");
    }

    let input_size = input_data.len();
    debug!("Read {} bytes from input", input_size);

    let format = match format {
        Format::Auto => {
            let detected = detect_format(input, &input_data);
            info!("Auto-detected format: {}", detected.as_str());
            detected
        }
        other => other,
    };

    let compressor = AlsCompressor::with_config(config).map_err(|e| map_als_error(e, "Configuration"))?;

    let progress = create_progress_bar(quiet, "Compressing");
    let compress_start = Instant::now();
    let table = match format {
        Format::Json => JsonAdapter::new().read_table(&input_data),
        _ => CsvAdapter::new().read_table(&input_data),
    }
    .map_err(|e| map_als_error(e, &format!("{} input", format.as_str().to_uppercase())))?;
    let (compressed, stats) = compressor
        .compress_with_report(&table)
        .map_err(|e| map_als_error(e, "Compression"))?;
    let compress_duration = compress_start.elapsed();
    progress.finish_and_clear();

    let output_size = compressed.len();
    debug!("Compressed {} bytes to {} bytes", input_size, output_size);
    debug!("Compression time: {:.3}s", compress_duration.as_secs_f64());

    let progress = create_progress_bar(quiet, "Writing output");
    write_output(output, &compressed)?;
    progress.finish_and_clear();

    if report {
        print_report(&stats);
    }

    if !quiet {
        let ratio = ratio(input_size, output_size);
        let savings = ((1.0 - (output_size as f64 / input_size.max(1) as f64)) * 100.0).max(0.0);
        eprintln!("✓ Compression complete");
        eprintln!("  Input:       {}", format_bytes(input_size));
        eprintln!("  Output:      {}", format_bytes(output_size));
        eprintln!("  Ratio:       {:.2}x", ratio);
        eprintln!("  Savings:     {:.1}%", savings);
        eprintln!(
            "  Columns:     {} of {} pattern-encoded",
            stats.compressed_column_count(),
            stats.columns.len()
        );
        eprintln!("  Workers:     {}", stats.parallelism);
        eprintln!("  Time:        {:.3}s", start_time.elapsed().as_secs_f64());
    }

    info!("Compression completed in {:.3}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Print the per-column strategy table to stderr
fn print_report(report: &CompressionReport) {
    let width = report
        .columns
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("column".len());

    eprintln!(
        "{:<width$}  {:<5}  {:>10}  {:>10}  {:>10}",
        "column",
        "enc",
        "cost",
        "raw cost",
        "bytes",
        width = width
    );
    for column in &report.columns {
        eprintln!(
            "{:<width$}  {:<5}  {:>10}  {:>10}  {:>10}",
            column.name,
            column.strategy.tag(),
            column.estimated_cost,
            column.raw_cost,
            column.output_bytes,
            width = width
        );
    }
    eprintln!("estimated ratio: {:.2}x", report.estimated_ratio());
}

/// Execute the decompress command
fn decompress_command(
    input: &str,
    output: &str,
    format: Format,
    pretty: bool,
    config: ParserConfig,
    quiet: bool,
) -> Result<()> {
    let start_time = Instant::now();
    info!("Starting decompression: {} -> {}", input, output);

    let format = match format {
        Format::Auto => {
            let detected = detect_format(output, "");
            info!("Output format: {}", detected.as_str());
            detected
        }
        other => other,
    };

    let progress = create_progress_bar(quiet, "Reading input");
    let als_data = read_input(input)?;
    progress.finish_and_clear();

    let input_size = als_data.len();
    debug!("Read {} bytes from input", input_size);

    let parser = AlsParser::with_config(config).map_err(|e| map_als_error(e, "Configuration"))?;

    let progress = create_progress_bar(quiet, "Decompressing");
    let decompress_start = Instant::now();
    let decompressed = match format {
        Format::Json => parser.decode_into(&JsonAdapter::new().with_pretty(pretty), &als_data),
        _ => parser.decode_into(&CsvAdapter::new(), &als_data),
    }
    .map_err(|e| map_als_error(e, "Decompression"))?;
    progress.finish_and_clear();

    let output_size = decompressed.len();
    debug!(
        "Decompressed {} bytes to {} bytes in {:.3}s",
        input_size,
        output_size,
        decompress_start.elapsed().as_secs_f64()
    );

    let progress = create_progress_bar(quiet, "Writing output");
    write_output(output, &decompressed)?;
    progress.finish_and_clear();

    if !quiet {
        eprintln!("✓ Decompression complete");
        eprintln!("  Input:       {}", format_bytes(input_size));
        eprintln!("  Output:      {}", format_bytes(output_size));
        eprintln!("  Expansion:   {:.2}x", ratio(output_size, input_size));
        eprintln!("  Time:        {:.3}s", start_time.elapsed().as_secs_f64());
    }

    info!("Decompression completed in {:.3}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

/// Execute the info command
fn info_command(input: &str, config: ParserConfig, verbose: bool, quiet: bool) -> Result<()> {
    info!("Reading ALS document info from {}", input);

    let progress = create_progress_bar(quiet, "Reading input");
    let als_data = read_input(input)?;
    progress.finish_and_clear();

    let progress = create_progress_bar(quiet, "Parsing ALS");
    let parser = AlsParser::with_config(config).map_err(|e| map_als_error(e, "Configuration"))?;
    let doc = parser
        .parse(&als_data)
        .map_err(|e| map_als_error(e, "ALS parsing"))?;
    progress.finish_and_clear();

    display_document_info(&doc, als_data.len(), verbose);
    Ok(())
}

/// Display information about an ALS document
fn display_document_info(doc: &AlsDocument<'_>, compressed_size: usize, verbose: bool) {
    println!("=== ALS Document Information ===\n");
    println!("Version: {}", doc.version);
    println!("Columns: {}", doc.column_count());
    println!("Rows: {}", doc.row_count);
    println!("Compressed size: {}", format_bytes(compressed_size));

    println!("\n--- Encodings ---");
    for (strategy, count) in doc.strategy_counts() {
        if count > 0 {
            println!("  {:<5} {} column(s) ({})", strategy.tag(), count, describe(strategy));
        }
    }

    println!("\n--- Columns ---");
    for (i, column) in doc.columns.iter().enumerate() {
        println!(
            "  {}: {} ({}, {})",
            i + 1,
            column.name,
            column.declared_type,
            column.strategy().tag()
        );
        if verbose {
            match &column.encoding {
                Encoding::Raw(values) => println!("     {} literal value(s)", values.len()),
                Encoding::Dictionary { entries, .. } => {
                    println!("     {} dictionary entr(ies)", entries.len())
                }
                Encoding::Arithmetic(segments) => println!("     {} segment(s)", segments.len()),
                Encoding::RunLength(segments) => println!("     {} segment(s)", segments.len()),
                Encoding::Cycle { pattern, len } => {
                    println!("     pattern of {} value(s) over {} row(s)", pattern.len(), len)
                }
            }
        }
    }
    println!();
}

fn describe(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::Dictionary => "dictionary of repeated values",
        Strategy::Arithmetic => "arithmetic sequences",
        Strategy::RunLength => "runs of equal values",
        Strategy::Cycle => "repeating cycle",
        Strategy::Raw => "no compression",
    }
}

/// Create a progress bar (spinner) for operations
fn create_progress_bar(quiet: bool, message: &str) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Format bytes in human-readable format
fn format_bytes(bytes: usize) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];

    let mut size = bytes as f64;
    let mut unit_index = 0;
    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Map AlsError to anyhow::Error with context
///
/// Worker failures are reported by the error they wrap.
fn map_als_error(error: AlsError, context: &str) -> anyhow::Error {
    let detail = match error.root() {
        AlsError::CorruptStream { line, message } => {
            Some(format!("corrupt ALS stream at line {}: {}", line, message))
        }
        AlsError::UnknownEncoding { column, tag } => Some(format!(
            "column '{}' uses encoding '{}', which this version cannot read",
            column, tag
        )),
        AlsError::CsvParseError {
            line,
            column,
            message,
        } => Some(format!(
            "CSV parse error at line {}, column {}: {}",
            line, column, message
        )),
        _ => None,
    };
    match detail {
        Some(detail) => anyhow::anyhow!("{}: {}", context, detail),
        None => anyhow::Error::new(error).context(context.to_string()),
    }
}
