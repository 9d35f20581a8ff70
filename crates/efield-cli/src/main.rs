use anyhow::{bail, Context, Result};
use clap::Parser;
use efield_core::{
    compute_frame_timed, regenerate, ChargeSnapshot, DipoleArrayConfig, FrameTimings,
    PointChargeSource, RenderData, VisualizationConfig,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Compute field arrows and equipotential lines for a set of point charges.
#[derive(Parser, Debug)]
#[command(name = "efield", version)]
struct Args {
    /// Visualization config JSON; missing fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Charge list JSON: [{"position": [x, y], "charge": q, "exclusion_radius": r}, ...].
    /// Without it a dipole array is generated.
    #[arg(long, conflicts_with = "dipole")]
    charges: Option<PathBuf>,

    /// Dipole array config JSON used when no charge list is given.
    #[arg(long)]
    dipole: Option<PathBuf>,

    /// Write render data here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[arg(long)]
    pretty: bool,

    /// Recompute the frame this many times and report mean pass timings.
    #[arg(long, value_name = "FRAMES")]
    bench: Option<u32>,
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn load_charges(args: &Args) -> Result<Vec<PointChargeSource>> {
    if let Some(path) = &args.charges {
        return read_json(path);
    }
    let dipole: DipoleArrayConfig = match &args.dipole {
        Some(path) => read_json(path)?,
        None => DipoleArrayConfig::default(),
    };
    regenerate(&dipole).context("generating dipole array")
}

fn run_bench(snapshot: &ChargeSnapshot, config: &VisualizationConfig, frames: u32) -> Result<()> {
    if frames == 0 {
        bail!("--bench needs at least one frame");
    }
    let mut sum = FrameTimings::default();
    let start = Instant::now();
    for _ in 0..frames {
        let (_, t) = compute_frame_timed(snapshot, config)?;
        sum.vector_pass_us += t.vector_pass_us;
        sum.potential_pass_us += t.potential_pass_us;
        sum.contour_pass_us += t.contour_pass_us;
        sum.total_us += t.total_us;
    }
    let n = frames as u64;
    println!(
        "{} frames over {} charges in {:?}",
        frames,
        snapshot.len(),
        start.elapsed()
    );
    println!("  vector pass:    {} us/frame", sum.vector_pass_us / n);
    println!("  potential pass: {} us/frame", sum.potential_pass_us / n);
    println!("  contour pass:   {} us/frame", sum.contour_pass_us / n);
    println!("  total:          {} us/frame", sum.total_us / n);
    Ok(())
}

fn write_frame(frame: &RenderData, args: &Args) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(frame)?
    } else {
        serde_json::to_string(frame)?
    };
    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config: VisualizationConfig = match &args.config {
        Some(path) => read_json(path)?,
        None => VisualizationConfig::default(),
    };
    config.validate().context("invalid visualization config")?;

    let charges = load_charges(&args)?;
    let snapshot = ChargeSnapshot::from_sources(charges).context("invalid charge list")?;
    log::info!("loaded {} charges", snapshot.len());

    if let Some(frames) = args.bench {
        return run_bench(&snapshot, &config, frames);
    }

    let (frame, timings) = compute_frame_timed(&snapshot, &config)?;
    log::info!(
        "{} field segments, {} contour segments in {} us",
        frame.field_segments.len(),
        frame.contour_segment_count(),
        timings.total_us
    );
    write_frame(&frame, &args)
}
