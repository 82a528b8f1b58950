//! Shark habitat CLI - depth-stratified foraging model.
//!
//! Score measured ocean fields or generate synthetic data, and write the
//! JSON document consumed by the web visualization.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;

use shark_habitat::export::{check_document, ModelDocument};
use shark_habitat::ingest::{load_field_file, IngestOptions};
use shark_habitat::model::{IntensityConfig, LapseModel, ScoringConfig};
use shark_habitat::pipeline::{run_depths_with_callbacks, RunConfig};
use shark_habitat::synthetic::{generate, SyntheticConfig};

/// Depth-stratified shark foraging habitat model.
#[derive(Parser)]
#[command(name = "shark-habitat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a field file at every depth level.
    Run {
        /// JSON field file with SST, SSHA and chlorophyll grids.
        #[arg(short, long)]
        input: PathBuf,

        /// JSON run configuration (depths, stride, model parameters).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Random seed for the intensity jitter.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Comma-separated depth levels in metres (e.g. 50,100,150).
        #[arg(short, long, value_delimiter = ',')]
        depths: Option<Vec<u32>>,

        /// Emit every n-th row and column as an output point.
        #[arg(long)]
        stride: Option<usize>,

        /// Keep every n-th row and column of the input before scoring.
        #[arg(long, default_value = "1")]
        downsample: usize,

        /// Keep the input's row order even if latitude is descending.
        #[arg(long)]
        keep_orientation: bool,

        /// Emit cells below the cold cutoff instead of dropping them.
        #[arg(long)]
        emit_cold: bool,

        /// Output JSON file.
        #[arg(short, long, default_value = "./output/modis-shark-model.json")]
        output: PathBuf,
    },

    /// Generate synthetic hotspot data in the output format.
    Synthetic {
        /// Random seed for reproducible generation.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Comma-separated depth levels in metres.
        #[arg(short, long, value_delimiter = ',')]
        depths: Option<Vec<u32>>,

        /// Output JSON file.
        #[arg(short, long, default_value = "./output/modis-shark-model.json")]
        output: PathBuf,
    },

    /// Check a written document for implausible points and inconsistent stats.
    Check {
        /// Document to check.
        input: PathBuf,
    },

    /// Display the model parameters of a configuration.
    Info {
        /// JSON run configuration; defaults are shown if omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            config,
            seed,
            depths,
            stride,
            downsample,
            keep_orientation,
            emit_cold,
            output,
        } => {
            run_model(
                input,
                config,
                seed,
                depths,
                stride,
                downsample,
                keep_orientation,
                emit_cold,
                output,
            );
        }
        Commands::Synthetic { seed, depths, output } => {
            run_synthetic(seed, depths, output);
        }
        Commands::Check { input } => {
            run_check(input);
        }
        Commands::Info { config } => {
            run_info(config);
        }
    }
}

fn time_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn load_config(path: Option<&Path>) -> RunConfig {
    match path {
        Some(path) => RunConfig::from_json_file(path).unwrap_or_else(|e| {
            eprintln!("Error loading config {}: {}", path.display(), e);
            std::process::exit(1);
        }),
        None => RunConfig::default(),
    }
}

fn ensure_parent_dir(path: &Path) {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).unwrap_or_else(|e| {
            eprintln!("Error creating output directory: {}", e);
            std::process::exit(1);
        });
    }
}

fn write_document(doc: &ModelDocument, output: &Path) {
    ensure_parent_dir(output);
    doc.write_json(output).unwrap_or_else(|e| {
        eprintln!("Error writing {}: {}", output.display(), e);
        std::process::exit(1);
    });
    let size_mb = std::fs::metadata(output)
        .map(|m| m.len() as f64 / 1024.0 / 1024.0)
        .unwrap_or(0.0);
    println!("  Saved to: {}", output.display());
    println!("  File size: {:.2} MB", size_mb);
}

#[allow(clippy::too_many_arguments)]
fn run_model(
    input: PathBuf,
    config: Option<PathBuf>,
    seed: Option<u64>,
    depths: Option<Vec<u32>>,
    stride: Option<usize>,
    downsample: usize,
    keep_orientation: bool,
    emit_cold: bool,
    output: PathBuf,
) {
    let mut cfg = load_config(config.as_deref());
    if let Some(depths) = depths {
        cfg.depths = depths;
    }
    if let Some(stride) = stride {
        cfg.stride = stride;
    }
    if emit_cold {
        cfg.emit_cold_suppressed = true;
    }
    let seed = seed.or(cfg.seed).unwrap_or_else(time_seed);
    cfg.seed = Some(seed);

    if downsample == 0 {
        eprintln!("Error: Downsample step must be at least 1");
        std::process::exit(1);
    }

    println!("Shark Habitat - Depth-Stratified Foraging Model");
    println!("===============================================");
    println!("Input: {}", input.display());
    println!("Seed: {}", seed);
    println!("Output: {}", output.display());

    let start = Instant::now();

    println!("\nLoading fields...");
    let opts = IngestOptions { downsample, ascending_latitude: !keep_orientation };
    let fields = load_field_file(&input, &opts).unwrap_or_else(|e| {
        eprintln!("Error loading {}: {}", input.display(), e);
        std::process::exit(1);
    });
    let (rows, cols) = fields.shape();
    println!("  Grid: {}x{} ({})", rows, cols, fields.source);
    println!(
        "  Cells with data: SST {}, SSHA {}, chlorophyll {}",
        fields.sst().present_count(),
        fields.ssha().present_count(),
        fields.chlorophyll().present_count()
    );

    let depth_list = cfg
        .depths
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    println!("\nComputing model for {} depth levels ({} m)...", cfg.depths.len(), depth_list);

    let report = run_depths_with_callbacks(
        &fields,
        &cfg,
        |depth| {
            println!("  Starting: {} m", depth);
        },
        |depth, result| match result {
            Ok(r) => println!("  Completed: {} m, {} points", depth, r.stats.count),
            Err(e) => println!("  Failed: {}", e),
        },
    )
    .unwrap_or_else(|e| {
        eprintln!("Error during model run: {}", e);
        std::process::exit(1);
    });

    println!("Model completed in {:.2?}", start.elapsed());

    println!("\nSaving document...");
    let doc = ModelDocument::from_report(&fields, &report);
    write_document(&doc, &output);

    println!("\nTotal data points: {}", doc.total_points());
    println!("Total time: {:.2?}", start.elapsed());

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        for e in &failures {
            eprintln!("Error: {}", e);
        }
        eprintln!("{} of {} depth levels failed", failures.len(), report.results.len());
        std::process::exit(1);
    }
    println!("Done!");
}

fn run_synthetic(seed: Option<u64>, depths: Option<Vec<u32>>, output: PathBuf) {
    let seed = seed.unwrap_or_else(time_seed);
    let mut cfg = SyntheticConfig::with_seed(seed);
    if let Some(depths) = depths {
        cfg.depths = depths;
    }

    println!("Shark Habitat - Synthetic Data Generator");
    println!("========================================");
    println!("Hotspots: {}", cfg.hotspots.len());
    println!("Seed: {}", seed);
    println!("Output: {}", output.display());

    let start = Instant::now();
    let doc = generate(&cfg).unwrap_or_else(|e| {
        eprintln!("Error generating synthetic data: {}", e);
        std::process::exit(1);
    });
    for (depth, entry) in &doc.depths {
        println!("  Generated {} points for depth {} m", entry.data.len(), depth);
    }
    println!("Generation completed in {:.2?}", start.elapsed());

    println!("\nSaving document...");
    write_document(&doc, &output);
    println!("\nTotal data points: {}", doc.total_points());
    println!("Done!");
}

fn run_check(input: PathBuf) {
    let doc = ModelDocument::read_json(&input).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", input.display(), e);
        std::process::exit(1);
    });

    println!("Shark Habitat - Document Check");
    println!("==============================");
    println!("File: {}", input.display());
    println!("Source: {}", doc.metadata.source_file);
    println!("Processed: {}", doc.metadata.processing_date);
    println!(
        "Grid: {}x{}, lat [{}, {}], lon [{}, {}]",
        doc.metadata.grid_size.lat,
        doc.metadata.grid_size.lon,
        doc.metadata.bounds.lat_min,
        doc.metadata.bounds.lat_max,
        doc.metadata.bounds.lon_min,
        doc.metadata.bounds.lon_max
    );
    if let Some(note) = &doc.metadata.note {
        println!("Note: {}", note);
    }
    println!();

    for (depth, entry) in &doc.depths {
        let s = &entry.stats;
        println!(
            "  {:>4} m: {:>7} points, mean intensity {}, mean probability {}",
            depth,
            entry.data.len(),
            fmt_mean(s.mean_intensity),
            fmt_mean(s.mean_probability)
        );
    }

    let report = check_document(&doc);
    println!();
    println!("Points checked: {}", report.points_checked);
    if report.is_clean() {
        println!("No issues found.");
        return;
    }
    for issue in &report.issues {
        println!("  {}", issue);
    }
    eprintln!(
        "Error: {} issues found ({} implausible points)",
        report.issues.len(),
        report.implausible_points()
    );
    std::process::exit(1);
}

fn fmt_mean(v: Option<f64>) -> String {
    v.map(|v| format!("{:.4}", v)).unwrap_or_else(|| "n/a".to_string())
}

fn run_info(config: Option<PathBuf>) {
    let cfg = load_config(config.as_deref());
    if let Err(e) = cfg.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    let s: &ScoringConfig = &cfg.scoring;
    let i: &IntensityConfig = &cfg.intensity;

    println!("Shark Habitat - Model Configuration");
    println!("===================================");
    println!();
    println!("Run:");
    println!("  Depths:        {:?} m", cfg.depths);
    println!("  Stride:        {}", cfg.stride);
    println!("  Seed:          {}", cfg.seed.map(|s| s.to_string()).unwrap_or_else(|| "random".to_string()));
    println!("  Emit cold:     {}", cfg.emit_cold_suppressed);
    println!();
    println!("Gaussian scoring:");
    println!("  SST:           mu {:>6.2} C,     sigma {:.2}", s.mu_sst, s.sigma_sst);
    println!("  SSHA:          mu {:>6.2},       sigma {:.2}", s.mu_ssha, s.sigma_ssha);
    println!("  Chlorophyll:   mu {:>6.2} mg/m3, sigma {:.2} (log space)", s.mu_chl, s.sigma_chl);
    println!("  Weights:       {:?} (sum {:.2})", s.weights, s.weight_sum());
    println!("  Cold cutoff:   {:.1} C", s.cold_cutoff_c);
    match s.lapse_model {
        LapseModel::Linear => println!(
            "  Lapse rate:    {} + {} sin^2(lat) C/m",
            s.lapse_base_c_per_m, s.lapse_amplitude_c_per_m
        ),
        LapseModel::Thermocline { deep_lapse_c_per_m } => println!(
            "  Lapse rate:    {} + {} sin^2(lat) C/m above the thermocline, {} C/m below",
            s.lapse_base_c_per_m, s.lapse_amplitude_c_per_m, deep_lapse_c_per_m
        ),
    }
    println!("  Chlorophyll profile: {:?}", s.chlorophyll_profile);
    println!();
    println!("Intensity link:");
    println!("  lambda = exp({} + {} * Bp + eps), eps ~ N(0, {})", i.beta0, i.beta1, i.noise_sd);
    println!();

    // Score of a reference cell at the optimum as it cools with depth.
    println!("Reference cell (SST {:.1} C at the equator, other signals at optimum):", s.mu_sst);
    for &depth in &cfg.depths {
        let cell = shark_habitat::model::score_cell(
            Some(s.mu_sst),
            Some(s.mu_ssha),
            Some(s.mu_chl),
            0.0,
            depth,
            s,
        );
        let adjusted = cell.adjusted_sst.map(|t| format!("{:.2}", t)).unwrap_or_else(|| "n/a".to_string());
        println!(
            "  {:>4} m: adjusted SST {:>6} C, Bp {}{}",
            depth,
            adjusted,
            fmt_mean(cell.probability),
            if cell.cold_suppressed { " (cold suppressed)" } else { "" }
        );
    }
}
