//! emtf CLI — run the endcap track finder over JSON event files.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use emtf::{
    particles_to_parameters, roads_to_variables, GeometryTables, Hit, LutPtModel, Particle,
    PatternBank, StageCounts, Track, TrackBuildConfig, TrackBuilder,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "emtf")]
#[command(about = "Endcap muon track-finder emulator: roads, cleaning, slimming and pT assignment")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build tracks for every event in a file.
    Run(CliRunArgs),

    /// Write (particle parameters, road variables) training pairs.
    Export(CliExportArgs),

    /// Print pattern bank statistics.
    BankInfo {
        /// Pattern bank JSON document.
        #[arg(long)]
        bank: PathBuf,
    },

    /// Print the (type, station, ring) -> layer table.
    LayerInfo,
}

#[derive(Debug, Clone, Args)]
struct CliPipelineArgs {
    /// Pattern bank JSON document.
    #[arg(long)]
    bank: PathBuf,

    /// Events JSON: an array of `{hits, particles}` objects.
    #[arg(long)]
    events: PathBuf,

    /// Pipeline configuration JSON (missing fields take defaults).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the phi window probed against the bank (quadstrips).
    #[arg(long)]
    phi_window: Option<i32>,

    /// Drop hits the Run-2 trigger could not use.
    #[arg(long)]
    only_run2: bool,

    /// Build sector roads on the calling thread.
    #[arg(long)]
    serial: bool,

    /// Stop after this many events.
    #[arg(long)]
    max_events: Option<usize>,
}

#[derive(Debug, Clone, Args)]
struct CliRunArgs {
    #[command(flatten)]
    pipeline: CliPipelineArgs,

    /// Inverse-pT table for the table model (JSON `{"inv_pt": [..9 values]}`).
    #[arg(long)]
    model_table: Option<PathBuf>,

    /// Path to write per-event results (JSON).
    #[arg(long)]
    out: PathBuf,
}

#[derive(Debug, Clone, Args)]
struct CliExportArgs {
    #[command(flatten)]
    pipeline: CliPipelineArgs,

    /// Path to write the training pairs (JSON).
    #[arg(long)]
    out: PathBuf,
}

#[derive(Debug, serde::Deserialize)]
struct Event {
    hits: Vec<Hit>,
    #[serde(default)]
    particles: Vec<Particle>,
}

#[derive(Debug, serde::Serialize)]
struct EventOutput {
    event: usize,
    counts: StageCounts,
    tracks: Vec<Track>,
}

#[derive(Debug, serde::Serialize)]
struct TrainingPairs {
    parameters: Vec<[f32; 3]>,
    /// Missing layers are written as null.
    variables: Vec<Vec<f32>>,
}

impl CliPipelineArgs {
    fn to_config(&self) -> CliResult<TrackBuildConfig> {
        let mut config = match &self.config {
            Some(path) => TrackBuildConfig::from_json_file(path)?,
            None => TrackBuildConfig::default(),
        };
        if let Some(window) = self.phi_window {
            if window < 0 {
                return Err(format!("--phi-window must be >= 0, got {window}").into());
            }
            config.recognition.phi_window = window;
        }
        if self.only_run2 {
            config.recognition.only_use_run2 = true;
        }
        if self.serial {
            config.recognition.parallel_sectors = false;
        }
        Ok(config)
    }

    fn load(&self) -> CliResult<(TrackBuilder, Vec<Event>)> {
        let config = self.to_config()?;
        tracing::info!("Loading pattern bank: {}", self.bank.display());
        let builder = TrackBuilder::from_bank_file(&self.bank, config)?;
        let mut events = load_events(&self.events)?;
        if let Some(max) = self.max_events {
            events.truncate(max);
        }
        tracing::info!("Loaded {} events from {}", events.len(), self.events.display());
        Ok((builder, events))
    }
}

fn load_events(path: &Path) -> CliResult<Vec<Event>> {
    let data = std::fs::read_to_string(path).map_err(|e| -> CliError {
        format!("Failed to read events {}: {}", path.display(), e).into()
    })?;
    Ok(serde_json::from_str(&data)?)
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_tracks(&args),
        Commands::Export(args) => run_export(&args),
        Commands::BankInfo { bank } => run_bank_info(&bank),
        Commands::LayerInfo => run_layer_info(),
    }
}

// ── bank-info ─────────────────────────────────────────────────────────

fn run_bank_info(path: &Path) -> CliResult<()> {
    use emtf::geometry::{N_ETA_ZONES, N_LAYERS, N_PT_BINS};

    let bank = PatternBank::from_json_file(path)?;
    println!("emtf pattern bank {}", path.display());
    println!("  shape:              {:?}", emtf::BANK_SHAPE);
    println!(
        "  populated windows:  {} / {}",
        bank.populated_windows(),
        N_PT_BINS * N_ETA_ZONES * N_LAYERS
    );
    for ipt in 0..N_PT_BINS {
        let mut populated = 0;
        let mut widest = 0;
        for zone in 0..N_ETA_ZONES {
            for layer in 0..N_LAYERS {
                let [lo, _, hi] = bank.phi_window(ipt, zone, layer);
                if lo <= hi {
                    populated += 1;
                    widest = widest.max(hi - lo + 1);
                }
            }
        }
        println!(
            "  pt bin {}:           {:>2} windows, widest {} quadstrips",
            ipt, populated, widest
        );
    }
    Ok(())
}

// ── layer-info ────────────────────────────────────────────────────────

fn run_layer_info() -> CliResult<()> {
    let tables = GeometryTables::new();
    println!("emtf layer assignment (type, station, ring -> layer)");
    for (kind, station, ring, layer) in tables.layer_entries() {
        println!("  {:<4} {} {} -> {:>2}", format!("{kind:?}"), station, ring, layer);
    }
    Ok(())
}

// ── run ───────────────────────────────────────────────────────────────

fn run_tracks(args: &CliRunArgs) -> CliResult<()> {
    let (mut builder, events) = args.pipeline.load()?;
    if let Some(path) = &args.model_table {
        tracing::info!("Loading pT table: {}", path.display());
        builder = builder.with_model(Box::new(LutPtModel::from_json_file(path)?));
    }

    let mut outputs = Vec::with_capacity(events.len());
    let mut totals = StageCounts::default();
    let (mut n_important, mut n_passed) = (0usize, 0usize);

    for (ievt, event) in events.iter().enumerate() {
        let result = builder.process(&event.hits)?;
        let counts = result.counts();
        tracing::debug!(
            "Event {}: {} hits, {} roads, {} clean, {} tracks",
            ievt,
            counts.hits,
            counts.roads,
            counts.clean_roads,
            counts.tracks
        );
        totals.hits += counts.hits;
        totals.roads += counts.roads;
        totals.clean_roads += counts.clean_roads;
        totals.slim_roads += counts.slim_roads;
        totals.tracks += counts.tracks;

        if event.particles.first().is_some_and(Particle::is_important) {
            n_important += 1;
            if !result.clean_roads.is_empty() {
                n_passed += 1;
            }
        }

        outputs.push(EventOutput {
            event: ievt,
            counts,
            tracks: result.tracks,
        });
    }

    tracing::info!(
        "Processed {} events: {} hits, {} roads, {} clean roads, {} tracks",
        outputs.len(),
        totals.hits,
        totals.roads,
        totals.clean_roads,
        totals.tracks
    );
    if n_important > 0 {
        tracing::info!(
            "Road efficiency: {}/{} = {:.4}",
            n_passed,
            n_important,
            n_passed as f64 / n_important as f64
        );
    }

    let json = serde_json::to_string_pretty(&outputs)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Results written to {}", args.out.display());
    Ok(())
}

// ── export ────────────────────────────────────────────────────────────

fn run_export(args: &CliExportArgs) -> CliResult<()> {
    let (builder, events) = args.pipeline.load()?;

    let mut particles = Vec::new();
    let mut roads = Vec::new();
    for event in &events {
        let result = builder.process(&event.hits)?;
        let (Some(part), Some(road)) = (event.particles.first(), result.slim_roads.first()) else {
            continue;
        };
        particles.push(*part);
        roads.push(road.clone());
    }

    let pairs = TrainingPairs {
        parameters: particles_to_parameters(&particles),
        variables: roads_to_variables(&roads)
            .into_iter()
            .map(|v| v.0.to_vec())
            .collect(),
    };
    tracing::info!(
        "Exporting {} training pairs from {} events",
        pairs.parameters.len(),
        events.len()
    );

    let json = serde_json::to_string(&pairs)?;
    std::fs::write(&args.out, &json)?;
    tracing::info!("Training pairs written to {}", args.out.display());
    Ok(())
}
