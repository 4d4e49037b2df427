//! hwpcorpus CLI - batch-extract HWP/HWPX documents into corpus records.

use clap::{Parser, Subcommand};
use colored::Colorize;
use hwpcorpus::{
    discover_files, BatchProcessor, Hwp5Parser, MetadataMapper, YamlExporter,
    DEFAULT_TIMEOUT_SECS,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "hwpcorpus")]
#[command(version, about = "Extract HWP/HWPX documents into YAML/JSONL corpus records", long_about = None)]
struct Cli {
    /// Increase verbosity (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a single file
    Extract {
        /// HWP or HWPX file
        file: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Process directories of files in parallel
    Batch {
        /// Directories to scan for .hwp/.hwpx files
        directories: Vec<PathBuf>,

        /// Text file with one input path per line
        #[arg(short, long)]
        filelist: Option<PathBuf>,

        /// Output directory for YAML/JSONL results
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Crawl-metadata JSONL file
        #[arg(short, long)]
        metadata: Option<PathBuf>,

        /// Worker count (default: half the logical CPUs)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Per-file timeout in seconds
        #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout: u64,

        /// Recurse into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Output format
        #[arg(long, value_parser = ["yaml", "jsonl"], default_value = "jsonl")]
        format: String,
    },

    /// Print container information for an HWP 5.x file
    Info {
        /// HWP file
        file: PathBuf,
    },
}

fn setup_logging(verbosity: u8, quiet: bool) {
    if quiet {
        return;
    }

    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Extract { file, output } => cmd_extract(&file, output.as_deref()),
        Commands::Batch {
            directories,
            filelist,
            output,
            metadata,
            workers,
            timeout,
            recursive,
            format,
        } => cmd_batch(BatchArgs {
            directories,
            filelist,
            output,
            metadata,
            workers,
            timeout,
            recursive,
            format,
            quiet: cli.quiet,
        }),
        Commands::Info { file } => cmd_info(&file, cli.verbose > 0),
    }
}

fn cmd_extract(file: &std::path::Path, output: Option<&std::path::Path>) -> ExitCode {
    let result = hwpcorpus::extract_text(file);

    if result.success {
        let text = result.text.unwrap_or_default();
        match output {
            Some(path) => {
                if let Err(e) = std::fs::write(path, &text) {
                    eprintln!("{}: {}", "Error".red().bold(), e);
                    return ExitCode::FAILURE;
                }
                println!("saved: {}", path.display());
            }
            None => println!("{}", text),
        }
        ExitCode::SUCCESS
    } else {
        eprintln!(
            "{}: {}",
            "Error".red().bold(),
            result.error.unwrap_or_else(|| "extraction failed".into())
        );
        ExitCode::FAILURE
    }
}

struct BatchArgs {
    directories: Vec<PathBuf>,
    filelist: Option<PathBuf>,
    output: Option<PathBuf>,
    metadata: Option<PathBuf>,
    workers: Option<usize>,
    timeout: u64,
    recursive: bool,
    format: String,
    quiet: bool,
}

fn cmd_batch(args: BatchArgs) -> ExitCode {
    let files = match collect_inputs(&args) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    if files.is_empty() {
        eprintln!("{}: no HWP files to process", "Error".red().bold());
        return ExitCode::FAILURE;
    }

    let mapper = match &args.metadata {
        Some(path) => match MetadataMapper::load(path) {
            Ok(mapper) => Some(mapper),
            Err(e) => {
                eprintln!("{}: metadata file: {}", "Error".red().bold(), e);
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let processor = BatchProcessor::new(args.workers, args.timeout);
    println!(
        "processing {} files with {} workers...",
        files.len(),
        processor.workers()
    );

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    };

    let result = processor.process_files(&files, |r| {
        progress.inc(1);
        if !r.success {
            progress.set_message(format!("failed: {}", r.filepath));
        }
    });
    progress.finish_and_clear();

    println!(
        "{} {}",
        if result.failed == 0 {
            "ok".green().bold()
        } else {
            "done".yellow().bold()
        },
        result.summary()
    );

    if let Some(output_dir) = &args.output {
        if let Err(e) = write_outputs(output_dir, &args.format, &result, mapper.as_ref()) {
            eprintln!("{}: {}", "Error".red().bold(), e);
            return ExitCode::FAILURE;
        }
    }

    if result.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn collect_inputs(args: &BatchArgs) -> std::io::Result<Vec<PathBuf>> {
    if let Some(filelist) = &args.filelist {
        let file = std::fs::File::open(filelist)?;
        let files = std::io::BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect();
        return Ok(files);
    }

    let mut files = Vec::new();
    for dir in &args.directories {
        files.extend(discover_files(dir, args.recursive));
    }
    Ok(files)
}

fn write_outputs(
    output_dir: &std::path::Path,
    format: &str,
    result: &hwpcorpus::BatchResult,
    mapper: Option<&MetadataMapper>,
) -> hwpcorpus::Result<()> {
    let exporter = YamlExporter::new(output_dir)?;

    if format == "yaml" {
        let saved = exporter.export_batch(result, mapper)?;
        println!("saved {} YAML files to {}", saved.len(), output_dir.display());
    } else {
        let jsonl = output_dir.join("training_data.jsonl");
        let count = exporter.export_batch_jsonl(result, &jsonl, mapper)?;
        println!("saved {} records to {}", count, jsonl.display());
    }

    if result.failed > 0 {
        let failed_log = output_dir.join("failed.jsonl");
        let count = exporter.export_failed_log(result, &failed_log)?;
        println!("logged {} failures to {}", count, failed_log.display());
    }

    Ok(())
}

fn cmd_info(file: &std::path::Path, list_streams: bool) -> ExitCode {
    match Hwp5Parser::open(file) {
        Ok(parser) => {
            let meta = parser.metadata();
            println!("file:       {}", meta.filename);
            println!("version:    {}", meta.version);
            println!("compressed: {}", if meta.is_compressed { "yes" } else { "no" });
            println!("size:       {} bytes", meta.file_size_bytes);
            println!("streams:    {}", meta.streams.len());

            if list_streams {
                println!();
                for stream in &meta.streams {
                    println!("  - {}", stream);
                }
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
