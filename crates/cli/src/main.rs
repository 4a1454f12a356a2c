//! DeepWater CLI - tile scenes and visualise water-segmentation output

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array2, Axis};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use deepwater_core::io::{read_geotiff, write_geotiff, GeoTiffSource};
use deepwater_core::RasterImage;
use deepwater_overlay::{overlay, visualise_features, visualise_results, ColorSpec, VisualiseConfig};
use deepwater_tiling::{
    parse_tile_file_name, tile_file_name, tiles_of, Bitmap, ResultTile, SourceRef, Tile, TileGrid, TileOrigin,
};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "deepwater")]
#[command(author, version, about = "Tiling and overlay rendering for satellite water masks", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Cut a scene into square tiles, one GeoTIFF per tile
    Tile {
        /// Input scene
        input: PathBuf,
        /// Directory for `<stem>_<row>_<col>.tif` tiles
        output_dir: PathBuf,
        /// Tile edge length in pixels
        #[arg(short, long, default_value = "64")]
        tile_size: usize,
    },
    /// Burn a single-band bitmap raster into a scene
    Overlay {
        /// Bitmap raster; pixels equal to 1 are colored
        bitmap: PathBuf,
        /// Scene with at least three bands
        source: PathBuf,
        /// Output file
        output: PathBuf,
        /// Color name: red, green, blue
        #[arg(short, long, default_value = "blue")]
        color: String,
    },
    /// Composite predicted mask tiles onto their source scenes
    Visualise {
        /// Directory of `<stem>_<row>_<col>.tif` mask tiles
        #[arg(long)]
        tiles: PathBuf,
        /// Source scenes the tiles were cut from
        #[arg(long, num_args = 1.., required = true)]
        source: Vec<PathBuf>,
        /// Output directory
        #[arg(short, long, default_value = "output/imgs")]
        output_dir: PathBuf,
        /// Tile edge length in pixels
        #[arg(short, long, default_value = "64")]
        tile_size: usize,
        /// Color name: red, green, blue
        #[arg(short, long, default_value = "blue")]
        color: String,
        /// Process source scenes in parallel
        #[arg(long)]
        parallel: bool,
    },
    /// Composite labels, predictions and false positives onto their source scenes
    Results {
        /// Directory of prediction tiles
        #[arg(long)]
        predictions: PathBuf,
        /// Directory of label tiles, named like the prediction tiles
        #[arg(long)]
        labels: PathBuf,
        /// Directory of false-positive tiles; derived from predictions and labels when omitted
        #[arg(long)]
        false_positives: Option<PathBuf>,
        /// Source scenes the tiles were cut from
        #[arg(long, num_args = 1.., required = true)]
        source: Vec<PathBuf>,
        /// Output directory
        #[arg(short, long, default_value = "output/imgs")]
        output_dir: PathBuf,
        /// Tile edge length in pixels
        #[arg(short, long, default_value = "64")]
        tile_size: usize,
        /// Process source scenes in parallel
        #[arg(long)]
        parallel: bool,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn bar(len: usize, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {pos}/{len}") {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(msg.to_string());
    pb
}

fn read_scene(path: &Path) -> Result<RasterImage<f64>> {
    let pb = spinner("Reading raster...");
    let image: RasterImage<f64> =
        read_geotiff(path).with_context(|| format!("Failed to read {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {} x {}", image.cols(), image.rows(), image.bands());
    Ok(image)
}

/// First band of a mask raster
fn read_mask(path: &Path) -> Result<Array2<u8>> {
    let image: RasterImage<u8> =
        read_geotiff(path).with_context(|| format!("Failed to read mask {}", path.display()))?;
    Ok(image.band(0)?.to_owned())
}

fn parse_color(name: &str) -> Result<ColorSpec> {
    name.parse::<ColorSpec>()
        .with_context(|| format!("Valid colors: {}", ColorSpec::ALL.map(|c| c.name()).join(", ")))
}

/// Tile files in `dir` with their parsed `(stem, origin)`, sorted by file name
fn list_tiles(dir: &Path) -> Result<Vec<(PathBuf, String, TileOrigin)>> {
    let mut tiles = Vec::new();
    let entries = std::fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("tif") {
            continue;
        }
        match parse_tile_file_name(&path) {
            Some((stem, origin)) => tiles.push((path, stem, origin)),
            None => debug!("Skipping {}: not a tile file name", path.display()),
        }
    }
    tiles.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(tiles)
}

/// Map tile stems back to the scenes passed on the command line
struct SourceIndex(HashMap<String, SourceRef>);

impl SourceIndex {
    fn new(sources: &[PathBuf]) -> Result<Self> {
        let mut index = HashMap::new();
        for path in sources {
            let source = SourceRef::new(path);
            let stem = source.stem();
            if let Some(previous) = index.insert(stem.clone(), source) {
                bail!("Sources {} and {} share the stem '{}'", previous, path.display(), stem);
            }
        }
        Ok(Self(index))
    }

    fn resolve(&self, stem: &str, tile: &Path) -> Result<SourceRef> {
        match self.0.get(stem) {
            Some(source) => Ok(source.clone()),
            None => bail!("No --source matches tile {} (stem '{}')", tile.display(), stem),
        }
    }
}

fn done(name: &str, paths: &[PathBuf], elapsed: std::time::Duration) {
    for path in paths {
        println!("{} saved to: {}", name, path.display());
    }
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Commands ───────────────────────────────────────────────────────────

fn cmd_info(input: &Path) -> Result<()> {
    let image = read_scene(input)?;
    let profile = image.profile();
    let bounds = image.bounds();

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} bands)", image.cols(), image.rows(), image.bands());
    println!("Data type: {}", profile.dtype);
    println!("Cell size: {} x {}", profile.transform.pixel_width, profile.transform.pixel_height);
    println!(
        "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        bounds.0, bounds.1, bounds.2, bounds.3
    );
    match image.crs() {
        Some(crs) => println!("CRS: {}", crs),
        None => println!("CRS: none"),
    }
    if let Some(nodata) = image.nodata() {
        println!("NoData: {}", nodata);
    }
    Ok(())
}

fn cmd_tile(input: &Path, output_dir: &Path, tile_size: usize) -> Result<()> {
    let image = read_scene(input)?;
    let stem = SourceRef::new(input).stem();
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let total = TileGrid::new(image.rows(), image.cols(), tile_size).total();
    if total == 0 {
        bail!(
            "Tile size {} yields no tiles for a {} x {} raster",
            tile_size,
            image.cols(),
            image.rows()
        );
    }

    let start = Instant::now();
    let pb = bar(total, "Writing tiles");
    for tile in tiles_of(&image, tile_size) {
        let profile = image
            .profile()
            .window(tile.origin.row, tile.origin.col, tile_size, tile_size);
        let out = output_dir.join(tile_file_name(&stem, tile.origin));
        let tile_image = RasterImage::from_array(tile.data).with_profile(profile)?;
        write_geotiff(&tile_image, &out).with_context(|| format!("Failed to write {}", out.display()))?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!("{} tiles saved to: {}", total, output_dir.display());
    println!("  Processing time: {:.2?}", start.elapsed());
    Ok(())
}

fn cmd_overlay(bitmap: &Path, source: &Path, output: &Path, color: &str) -> Result<()> {
    parse_color(color)?;
    let mask = Bitmap::from_array(read_mask(bitmap)?);
    let scene = read_scene(source)?;

    let start = Instant::now();
    let pb = spinner("Writing output...");
    overlay(&mask, &scene, output, color, &GeoTiffSource).context("Failed to render overlay")?;
    pb.finish_and_clear();
    done("Overlay", &[output.to_path_buf()], start.elapsed());
    Ok(())
}

fn cmd_visualise(tiles_dir: &Path, sources: &[PathBuf], config: VisualiseConfig) -> Result<()> {
    let index = SourceIndex::new(sources)?;
    let files = list_tiles(tiles_dir)?;
    info!("Found {} tiles in {}", files.len(), tiles_dir.display());

    let pb = bar(files.len(), "Reading tiles");
    let mut features = Vec::with_capacity(files.len());
    for (path, stem, origin) in &files {
        let source = index.resolve(stem, path)?;
        let mask = read_mask(path)?.insert_axis(Axis(2));
        features.push(Tile::new(mask, *origin, source));
        pb.inc(1);
    }
    pb.finish_and_clear();

    let start = Instant::now();
    let written =
        visualise_features::<f64, _>(&features, &config, &GeoTiffSource).context("Failed to visualise features")?;
    done("Overlay", &written, start.elapsed());
    Ok(())
}

fn cmd_results(
    predictions: &Path,
    labels: &Path,
    false_positives: Option<&Path>,
    sources: &[PathBuf],
    config: VisualiseConfig,
) -> Result<()> {
    let index = SourceIndex::new(sources)?;
    let files = list_tiles(predictions)?;
    info!("Found {} prediction tiles in {}", files.len(), predictions.display());

    let pb = bar(files.len(), "Reading tiles");
    let mut results = Vec::with_capacity(files.len());
    for (path, stem, origin) in &files {
        let source = index.resolve(stem, path)?;
        let Some(name) = path.file_name() else {
            continue;
        };
        let prediction = read_mask(path)?;
        let label = read_mask(&labels.join(name))?;
        let tile = match false_positives {
            Some(dir) => {
                let fp = read_mask(&dir.join(name))?;
                ResultTile::new(prediction, label, fp, *origin, source)?
            }
            None => ResultTile::with_derived_false_positives(prediction, label, *origin, source)?,
        };
        results.push(tile);
        pb.inc(1);
    }
    pb.finish_and_clear();

    let start = Instant::now();
    let written =
        visualise_results::<f64, _>(&results, &config, &GeoTiffSource).context("Failed to visualise results")?;
    done("Results", &written, start.elapsed());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Info { input } => cmd_info(&input)?,

        Commands::Tile {
            input,
            output_dir,
            tile_size,
        } => cmd_tile(&input, &output_dir, tile_size)?,

        Commands::Overlay {
            bitmap,
            source,
            output,
            color,
        } => cmd_overlay(&bitmap, &source, &output, &color)?,

        Commands::Visualise {
            tiles,
            source,
            output_dir,
            tile_size,
            color,
            parallel,
        } => {
            let config = VisualiseConfig::default()
                .with_tile_size(tile_size)
                .with_output_dir(output_dir)
                .with_feature_color(parse_color(&color)?)
                .with_parallel(parallel);
            cmd_visualise(&tiles, &source, config)?
        }

        Commands::Results {
            predictions,
            labels,
            false_positives,
            source,
            output_dir,
            tile_size,
            parallel,
        } => {
            let config = VisualiseConfig::default()
                .with_tile_size(tile_size)
                .with_output_dir(output_dir)
                .with_parallel(parallel);
            cmd_results(&predictions, &labels, false_positives.as_deref(), &source, config)?
        }
    }

    Ok(())
}
