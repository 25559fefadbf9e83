// src/main.rs
use anyhow::{bail, Context, Result};
use clap::Parser;
use colorful::Colorful;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use wavreduce::config::{QualityPreset, ReducerConfig, ShapingCoefficients, SmoothingRule};
use wavreduce::core::BitReducer;
use wavreduce::wav::{merge_wavs, read_wav, write_wav, CORRECTION_BITS};

#[derive(Parser, Debug)]
#[command(name = "wavreduce")]
#[command(about = "Perceptually-guided reversible bit-depth reduction for PCM WAV audio")]
struct Args {
    /// Input WAV file or directory
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "reduced")]
    output: PathBuf,

    /// Quality preset (insane, extreme, high, standard, economic, portable)
    #[arg(short, long, default_value = "standard")]
    quality: String,

    /// Analysis block length in samples (power of two)
    #[arg(long)]
    block_length: Option<usize>,

    /// Analysis overlap fraction, 0 <= f < 1
    #[arg(long)]
    overlap: Option<f64>,

    /// Safety margin in bits between injected noise and the masking curve
    #[arg(long)]
    safety_margin: Option<f64>,

    /// Decision smoothing window (blocks)
    #[arg(long)]
    smoothing_window: Option<usize>,

    /// Decision smoothing rule: min (default) or weighted
    #[arg(long)]
    smoothing_rule: Option<String>,

    /// Disable noise shaping (flat quantization error)
    #[arg(long)]
    no_shaping: bool,

    /// Also write a correction file enabling exact reconstruction
    #[arg(short, long)]
    correction: bool,

    /// Merge mode: recombine INPUT (reduced WAV) with this correction WAV
    #[arg(long, value_name = "CORRECTION_WAV")]
    merge: Option<PathBuf>,

    /// Emit per-file reports as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct FileReport {
    file: String,
    sample_rate: u32,
    bits_per_sample: u32,
    channels: usize,
    duration_secs: f64,
    mean_bits_removed: f64,
    min_bits_removed: u32,
    max_bits_removed: u32,
    /// Size-equivalent savings if a lossless coder consumes the output.
    percent_savings: f64,
    reduced_path: String,
    correction_path: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Some(correction_path) = &args.merge {
        return run_merge(&args.input, correction_path, &args.output);
    }

    let config = build_config(&args)?;
    info!(
        "preset {}: block {}, overlap {:.2}, margin {:.2} bits",
        args.quality, config.block_length, config.overlap_fraction, config.safety_margin_bits
    );

    let wav_files = collect_wav_files(&args.input)?;
    if wav_files.is_empty() {
        println!("{}", "No WAV files found!".red());
        return Ok(());
    }

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    println!("Found {} WAV file(s)\n", wav_files.len());

    let progress = if wav_files.len() > 1 && !args.json {
        let pb = ProgressBar::new(wav_files.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}").unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Some(pb)
    } else {
        None
    };

    let mut failures = 0usize;
    for file_path in &wav_files {
        if let Some(pb) = &progress {
            pb.set_message(
                file_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
        }

        match process_file(file_path, &args, &config) {
            Ok(report) => print_report(&report, &args)?,
            Err(e) => {
                failures += 1;
                println!("{} {}: {:#}", "✗".red(), file_path.display(), e);
            }
        }

        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    if failures > 0 {
        bail!("{failures} file(s) failed");
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<ReducerConfig> {
    let preset = QualityPreset::from_name(&args.quality)
        .with_context(|| format!("Unknown quality preset: {}", args.quality))?;

    let mut config = ReducerConfig::from_preset(preset);
    if let Some(n) = args.block_length {
        config.block_length = n;
    }
    if let Some(f) = args.overlap {
        config.overlap_fraction = f;
    }
    if let Some(margin) = args.safety_margin {
        config.safety_margin_bits = margin;
    }
    if let Some(k) = args.smoothing_window {
        config.smoothing_window = k;
    }
    if let Some(name) = &args.smoothing_rule {
        config.smoothing_rule = SmoothingRule::from_name(name)
            .with_context(|| format!("Unknown smoothing rule: {name}"))?;
    }
    if args.no_shaping {
        config.shaping = ShapingCoefficients::flat();
    }
    config.correction_enabled = args.correction;

    config.validate()?;
    Ok(config)
}

fn collect_wav_files(path: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        files.push(path.to_path_buf());
    } else if path.is_dir() {
        for entry in WalkDir::new(path).follow_links(true) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_wav = entry
                .path()
                .extension()
                .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("wav"))
                .unwrap_or(false);
            if is_wav {
                files.push(entry.path().to_path_buf());
            }
        }
        files.sort();
    } else {
        bail!("Input path does not exist: {}", path.display());
    }

    Ok(files)
}

fn process_file(path: &Path, args: &Args, config: &ReducerConfig) -> Result<FileReport> {
    let audio = read_wav(path)?;
    let reducer = BitReducer::new(config.clone(), audio.sample_rate, audio.bits_per_sample)?;
    let results = reducer.process(&audio.channels)?;

    let file_stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());

    let reduced_path = args.output.join(format!("{file_stem}.reduced.wav"));
    let reduced: Vec<Vec<i32>> = results.iter().map(|r| r.output.reduced.clone()).collect();
    write_wav(&reduced_path, &reduced, audio.sample_rate, audio.bits_per_sample)?;

    let correction_path = if config.correction_enabled {
        let corr_path = args.output.join(format!("{file_stem}.corr.wav"));
        let mut correction: Vec<Vec<i32>> = Vec::with_capacity(results.len());
        for result in &results {
            let stream = result
                .output
                .correction
                .clone()
                .context("correction enabled but no stream was produced")?;
            correction.push(stream);
        }
        write_wav(&corr_path, &correction, audio.sample_rate, CORRECTION_BITS)?;
        Some(corr_path)
    } else {
        None
    };

    let total_samples: usize = audio.channels.iter().map(Vec::len).sum();
    let mean_bits_removed = if total_samples == 0 {
        0.0
    } else {
        results
            .iter()
            .zip(&audio.channels)
            .map(|(r, c)| r.stats.mean_bits_removed * c.len() as f64)
            .sum::<f64>()
            / total_samples as f64
    };

    Ok(FileReport {
        file: path.display().to_string(),
        sample_rate: audio.sample_rate,
        bits_per_sample: audio.bits_per_sample,
        channels: audio.num_channels(),
        duration_secs: audio.duration_secs,
        mean_bits_removed,
        min_bits_removed: results.iter().map(|r| r.stats.min_bits_removed).min().unwrap_or(0),
        max_bits_removed: results.iter().map(|r| r.stats.max_bits_removed).max().unwrap_or(0),
        percent_savings: 100.0 * mean_bits_removed / audio.bits_per_sample as f64,
        reduced_path: reduced_path.display().to_string(),
        correction_path: correction_path.map(|p| p.display().to_string()),
    })
}

fn print_report(report: &FileReport, args: &Args) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "{} {} ({} ch, {} Hz, {} bit, {:.1}s)",
        "✓".green(),
        report.file,
        report.channels,
        report.sample_rate,
        report.bits_per_sample,
        report.duration_secs
    );
    let summary = format!(
        "  removed {:.2} bits/sample (min {}, max {}), {:.1}% size-equivalent savings",
        report.mean_bits_removed,
        report.min_bits_removed,
        report.max_bits_removed,
        report.percent_savings
    );
    if report.mean_bits_removed > 0.0 {
        println!("{}", summary.green());
    } else {
        println!("{}", summary.yellow());
    }
    if let Some(corr) = &report.correction_path {
        println!("  correction: {corr}");
    }
    Ok(())
}

fn run_merge(reduced: &Path, correction: &Path, output: &Path) -> Result<()> {
    let out_path = if output.extension().is_some() {
        output.to_path_buf()
    } else {
        std::fs::create_dir_all(output)
            .with_context(|| format!("Failed to create {}", output.display()))?;
        let stem = reduced
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "restored".to_string());
        output.join(format!("{stem}.restored.wav"))
    };

    merge_wavs(reduced, correction, &out_path)?;
    println!("{} restored {}", "✓".green(), out_path.display());
    Ok(())
}
