use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use tracing::{info, Level};

use anvil_view::{
    config::ViewerConfig,
    minimap,
    region::ChunkPos,
    transport::{ChunkRequest, StreamMessage},
    viewer::Viewer,
};

/// Prints what a region file holds and what a selection of it looks like.
#[derive(Parser, Debug)]
#[command(name = "anvil-view", version)]
struct Args {
    /// Region file to load, named r.<x>.<z>.mca
    region: Option<PathBuf>,

    /// Chunks to select, as absolute x,z pairs
    #[arg(long, value_parser = parse_chunk_pos, num_args = 1.., requires = "region")]
    chunks: Vec<ChunkPos>,

    /// Select every chunk in the region
    #[arg(long, default_value_t = false, requires = "region")]
    all: bool,

    /// Feed a file of stream messages (one JSON envelope per line) into the session
    #[arg(long, conflicts_with_all = ["chunks", "all"])]
    replay: Option<PathBuf>,

    /// Viewer settings (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Slice fraction in [0.01, 1.0]; overrides the config
    #[arg(long)]
    slice: Option<f64>,

    /// More log output; repeat for trace
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn parse_chunk_pos(arg: &str) -> Result<ChunkPos, String> {
    let (x, z) = arg
        .split_once(',')
        .ok_or_else(|| format!("expected x,z but got {arg:?}"))?;
    let x = x.trim().parse().map_err(|e| format!("bad x in {arg:?}: {e}"))?;
    let z = z.trim().parse().map_err(|e| format!("bad z in {arg:?}: {e}"))?;
    Ok(ChunkPos::new(x, z))
}

fn load_region(viewer: &mut Viewer, path: &Path) -> Result<()> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file", path.display()))?;
    let bytes = fs::read(path).with_context(|| format!("Reading {name} Error"))?;
    let region = viewer.drop_file(&name, bytes)?;

    println!("{}: {} chunks available", region.name(), region.available_chunks().len());
    Ok(())
}

/// The request a live session opens with: the first chunk of the loaded region.
fn opening_request(viewer: &Viewer) -> ChunkRequest {
    let first = viewer
        .region()
        .and_then(|region| region.available_chunks().first().copied())
        .unwrap_or_default();
    ChunkRequest::new(first)
}

fn replay(viewer: &mut Viewer, path: &Path) -> Result<()> {
    info!(
        url = %viewer.config().stream_url,
        request = %opening_request(viewer).to_json()?,
        "replaying recorded stream"
    );
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read stream file {}", path.display()))?;
    for (number, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let message = StreamMessage::from_json(line)
            .with_context(|| format!("{}:{}: malformed stream message", path.display(), number + 1))?;
        if let Some(outcome) = viewer.receive(message) {
            info!(line = number + 1, ?outcome, "batch");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_max_level(level)
        .init();

    let config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    let mut viewer = Viewer::new(config);
    if let Some(slice) = args.slice {
        viewer.set_slice(slice);
    }

    if let Some(path) = &args.region {
        load_region(&mut viewer, path)?;
    }

    if let Some(path) = &args.replay {
        replay(&mut viewer, path)?;
    } else if args.all {
        viewer.select_all();
    } else if !args.chunks.is_empty() {
        viewer.select_chunks(&args.chunks);
    } else if args.region.is_none() {
        bail!("nothing to show: give a region file or --replay");
    }

    if viewer.region().is_some() {
        print!("{}", minimap::to_text(&viewer.minimap()));
    }

    let summary = viewer.selection().summary();
    println!(
        "selection: {} chunks, {} blocks, {} distinct block ids",
        summary.chunk_count, summary.block_count, summary.distinct_blocks
    );
    if summary.bounds.is_empty() {
        println!("bounds: empty");
        return Ok(());
    }

    let b = summary.bounds;
    println!(
        "bounds: x {}..={}, y {}..={}, z {}..={}",
        b.min_x, b.max_x, b.min_y, b.max_y, b.min_z, b.max_z
    );
    if let Some(placement) = viewer.placement() {
        let [x, y, z] = placement.center;
        println!("center: ({x}, {y}, {z}), zoom {:.3}", placement.zoom);
    }
    if let Some(level) = viewer.slice_level() {
        println!(
            "slice {:.2}: y <= {level}, {} voxels visible",
            viewer.slice(),
            viewer.visible_voxels().count()
        );
    }
    Ok(())
}
