//! DualDigest CLI - single-pass copy-and-hash with BLAKE3 and SHA-256

use clap::Parser;
use dualdigest::config::{parse_size, CliArgs, Commands, HashAlgorithm, LogFormat, PipelineConfig};
use dualdigest::error::{DigestError, Result};
use dualdigest::hash::{
    checksum_line, hash_file_with_progress, hash_files_parallel, verify_file,
    ChunkedDualHasher, Digest256, DigestPair, ExpectedDigests, SequentialDualHasher,
};
use dualdigest::pipeline::{CancellationToken, FanOutPipeline};
use dualdigest::progress::{ProgressBarReporter, ProgressReporter};
use dualdigest::store::persist_file;
use serde::Serialize;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = CliArgs::parse();
    init_logging(&args);

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &CliArgs) {
    let level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dualdigest={}", level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr);

    match args.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(args: &CliArgs) -> Result<()> {
    let config = PipelineConfig::from_cli(args)?;
    if args.verbose > 0 && !args.json {
        print_config(&config);
    }
    let pipeline = FanOutPipeline::new(config)?;

    match &args.command {
        Commands::Hash { paths } => cmd_hash(&pipeline, paths, args),
        Commands::Store {
            source,
            destination,
        } => cmd_store(&pipeline, source, destination, args),
        Commands::Checksum {
            paths,
            algorithm,
            output,
        } => cmd_checksum(&pipeline, paths, *algorithm, output.as_deref()),
        Commands::Verify {
            path,
            blake3,
            sha256,
        } => cmd_verify(&pipeline, path, blake3, sha256.as_deref(), args),
        Commands::Benchmark { size } => cmd_benchmark(&pipeline, size, args),
    }
}

/// Progress bar for one file, when requested
fn file_progress(args: &CliArgs, path: &Path) -> Option<ProgressBarReporter> {
    if !args.progress || args.quiet || args.json {
        return None;
    }
    let total = std::fs::metadata(path).ok().map(|m| m.len());
    Some(ProgressBarReporter::new(total))
}

#[derive(Serialize)]
struct HashReport<'a> {
    path: &'a Path,
    #[serde(flatten)]
    digests: DigestPair,
}

fn cmd_hash(pipeline: &FanOutPipeline, paths: &[PathBuf], args: &CliArgs) -> Result<()> {
    let results: Vec<Result<DigestPair>> = if args.progress && !args.quiet && !args.json {
        paths
            .iter()
            .map(|path| {
                let mut bar = file_progress(args, path);
                let result = hash_file_with_progress(
                    pipeline,
                    path,
                    bar.as_mut().map(|b| b as &mut dyn ProgressReporter),
                );
                if let Some(bar) = &bar {
                    match &result {
                        Ok(_) => bar.finish_success(&path.display().to_string()),
                        Err(e) => bar.finish_error(&e.to_string()),
                    }
                }
                result
            })
            .collect()
    } else {
        hash_files_parallel(pipeline, paths)
    };

    let mut reports = Vec::new();
    let mut first_error = None;
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(digests) => reports.push(HashReport { path, digests }),
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                first_error.get_or_insert(e);
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else if !args.quiet {
        for report in &reports {
            println!("blake3  {}  {}", report.digests.primary(), report.path.display());
            println!("sha256  {}  {}", report.digests.secondary(), report.path.display());
            println!(
                "size    {}  {}",
                humansize::format_size(report.digests.byte_count(), humansize::BINARY),
                report.path.display()
            );
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn cmd_store(
    pipeline: &FanOutPipeline,
    source: &Path,
    destination: &Path,
    args: &CliArgs,
) -> Result<()> {
    let mut bar = file_progress(args, source);
    let start = Instant::now();

    let result = persist_file(
        pipeline,
        source,
        destination,
        bar.as_mut().map(|b| b as &mut dyn ProgressReporter),
        &CancellationToken::new(),
    );

    if let Some(bar) = &bar {
        match &result {
            Ok(record) => bar.finish_success(&record.name),
            Err(e) => bar.finish_error(&e.to_string()),
        }
    }
    let record = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else if !args.quiet {
        let elapsed = start.elapsed();
        println!("Stored:   {} -> {}", source.display(), destination.display());
        println!(
            "Size:     {}",
            humansize::format_size(record.size, humansize::BINARY)
        );
        println!("BLAKE3:   {}", record.digests.primary());
        println!("SHA-256:  {}", record.digests.secondary());
        println!("Duration: {}", humantime::format_duration(round_millis(elapsed)));
    }

    Ok(())
}

fn cmd_checksum(
    pipeline: &FanOutPipeline,
    paths: &[PathBuf],
    algorithm: HashAlgorithm,
    output: Option<&Path>,
) -> Result<()> {
    let results = hash_files_parallel(pipeline, paths);

    let mut manifest = String::new();
    let mut first_error = None;
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(digests) => {
                manifest.push_str(&checksum_line(algorithm, &digests, &path.to_string_lossy()))
            }
            Err(e) => {
                eprintln!("{}: {}", path.display(), e);
                first_error.get_or_insert(e);
            }
        }
    }

    match output {
        Some(out) => std::fs::write(out, &manifest).map_err(|e| DigestError::io(out, e))?,
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(manifest.as_bytes())
                .map_err(DigestError::SinkWrite)?;
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn cmd_verify(
    pipeline: &FanOutPipeline,
    path: &Path,
    blake3: &str,
    sha256: Option<&str>,
    args: &CliArgs,
) -> Result<()> {
    let expected = ExpectedDigests {
        primary: Digest256::from_hex(blake3)?,
        secondary: sha256.map(Digest256::from_hex).transpose()?,
        byte_count: None,
    };

    let actual = verify_file(pipeline, path, &expected)?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&HashReport {
                path,
                digests: actual
            })?
        );
    } else if !args.quiet {
        println!("OK: {}", path.display());
    }
    Ok(())
}

#[derive(Serialize)]
struct BenchmarkRow {
    method: &'static str,
    elapsed_ms: f64,
    throughput_bytes_per_sec: f64,
}

fn cmd_benchmark(pipeline: &FanOutPipeline, size: &str, args: &CliArgs) -> Result<()> {
    let size = parse_size(size).map_err(|e| DigestError::config(format!("Invalid size: {}", e)))?
        as usize;
    let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    let chunk_size = pipeline.config().strategy.chunk_size;

    if !args.json {
        println!(
            "Benchmarking with {} of data\n",
            humansize::format_size(size as u64, humansize::BINARY)
        );
    }

    let mut rows = Vec::new();
    let mut reference: Option<DigestPair> = None;
    let mut measure = |method: &'static str, run: &dyn Fn() -> Result<DigestPair>| -> Result<()> {
        let start = Instant::now();
        let digests = run()?;
        let elapsed = start.elapsed();

        if let Some(expected) = reference {
            if expected != digests {
                return Err(DigestError::fault(format!(
                    "{} produced different digests",
                    method
                )));
            }
        }
        reference.get_or_insert(digests);

        let secs = elapsed.as_secs_f64();
        rows.push(BenchmarkRow {
            method,
            elapsed_ms: secs * 1000.0,
            throughput_bytes_per_sec: if secs > 0.0 { size as f64 / secs } else { 0.0 },
        });
        Ok(())
    };

    measure("sequential", &|| {
        SequentialDualHasher::new().hash_reader(Cursor::new(&data), None)
    })?;
    measure("chunked", &|| {
        ChunkedDualHasher::new(chunk_size).hash_reader(Cursor::new(&data), None)
    })?;
    measure("fan-out", &|| {
        pipeline
            .hash_and_persist(
                Cursor::new(&data),
                io::sink(),
                Some(size as u64),
                None,
                &CancellationToken::new(),
            )
            .map(|outcome| outcome.digests)
    })?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            println!(
                "  {:<12} {:>10.1} ms  {}/s",
                row.method,
                row.elapsed_ms,
                humansize::format_size(row.throughput_bytes_per_sec as u64, humansize::BINARY)
            );
        }
    }

    Ok(())
}

fn print_config(config: &PipelineConfig) {
    println!("=== Pipeline Configuration ===");
    println!(
        "Buffer:        {}",
        humansize::format_size(config.buffer_size as u64, humansize::BINARY)
    );
    println!(
        "Chunk size:    {}",
        humansize::format_size(config.strategy.chunk_size as u64, humansize::BINARY)
    );
    println!(
        "Threshold:     {}",
        humansize::format_size(config.strategy.parallel_threshold, humansize::BINARY)
    );
    println!("Conduit depth: {}", config.conduit_depth);
    if let Some(timeout) = config.timeout() {
        println!("Timeout:       {}", humantime::format_duration(timeout));
    }
    println!();
}

fn round_millis(elapsed: Duration) -> Duration {
    Duration::from_millis(elapsed.as_millis() as u64)
}
