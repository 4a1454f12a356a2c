//! Turning per-tile model output back into full-scene overlay images.

use crate::color::ColorSpec;
use crate::render::burn;
use deepwater_core::io::RasterSource;
use deepwater_core::{Error, RasterElement, RasterImage, Result};
use deepwater_tiling::{composite, Bitmap, ResultChannel, ResultTile, SourceRef, Tile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Settings for [`visualise_features`] and [`visualise_results`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualiseConfig {
    /// Edge length of every tile, in pixels
    pub tile_size: usize,
    /// Directory the overlay images are written to; created when missing
    pub output_dir: PathBuf,
    pub feature_color: ColorSpec,
    pub label_color: ColorSpec,
    pub prediction_color: ColorSpec,
    pub false_positive_color: ColorSpec,
    /// Process source groups on the rayon pool. Needs the `parallel` feature,
    /// otherwise groups run one after another.
    pub parallel: bool,
}

impl Default for VisualiseConfig {
    fn default() -> Self {
        Self {
            tile_size: 64,
            output_dir: PathBuf::from("output/imgs"),
            feature_color: ColorSpec::Blue,
            label_color: ColorSpec::Blue,
            prediction_color: ColorSpec::Green,
            false_positive_color: ColorSpec::Red,
            parallel: false,
        }
    }
}

impl VisualiseConfig {
    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn with_feature_color(mut self, color: ColorSpec) -> Self {
        self.feature_color = color;
        self
    }

    pub fn with_label_color(mut self, color: ColorSpec) -> Self {
        self.label_color = color;
        self
    }

    pub fn with_prediction_color(mut self, color: ColorSpec) -> Self {
        self.prediction_color = color;
        self
    }

    pub fn with_false_positive_color(mut self, color: ColorSpec) -> Self {
        self.false_positive_color = color;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// `<output_dir>/<stem>.tif`
    pub fn feature_path(&self, source: &SourceRef) -> PathBuf {
        self.output_dir.join(format!("{}.tif", source.stem()))
    }

    /// `<output_dir>/<stem>_results.tif`
    pub fn results_path(&self, source: &SourceRef) -> PathBuf {
        self.output_dir.join(format!("{}_results.tif", source.stem()))
    }

    fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(Error::InvalidParameter {
                name: "tile_size",
                value: "0".to_string(),
                reason: "tiles must be at least one pixel wide".to_string(),
            });
        }
        Ok(())
    }
}

/// Bucket records by source path, sorted by path, keeping input order inside a bucket
fn group_by_source<'a, R>(
    records: &'a [R],
    source_of: impl Fn(&R) -> &SourceRef,
) -> Vec<(&'a SourceRef, Vec<&'a R>)> {
    let mut groups: BTreeMap<&SourceRef, Vec<&R>> = BTreeMap::new();
    for record in records {
        groups.entry(source_of(record)).or_default().push(record);
    }
    groups.into_iter().collect()
}

/// Run `job` once per group and collect the written paths in group order.
///
/// Sequential runs stop at the first failure. Parallel runs let every group
/// finish, then report the first failure in group order.
fn run_groups<G, F>(groups: &[G], parallel: bool, job: F) -> Result<Vec<PathBuf>>
where
    G: Sync,
    F: Fn(&G) -> Result<PathBuf> + Sync,
{
    #[cfg(feature = "parallel")]
    if parallel {
        let outcomes: Vec<Result<PathBuf>> = groups.par_iter().map(&job).collect();
        return outcomes.into_iter().collect();
    }

    #[cfg(not(feature = "parallel"))]
    if parallel {
        debug!("parallel requested without the `parallel` feature, running sequentially");
    }

    groups.iter().map(job).collect()
}

fn prepare_output_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        debug!("Creating output directory {}", dir.display());
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn channel_bitmap(tiles: &[&ResultTile], channel: ResultChannel, tile_size: usize, shape: (usize, usize)) -> Result<Bitmap> {
    composite(tiles.iter().map(|t| t.patch(channel)), tile_size, shape)
}

/// Overlay predicted feature tiles onto their source scenes.
///
/// Tiles are grouped by source path. Each group is composited into one
/// bitmap, burned into the source raster in `feature_color`, and written to
/// [`VisualiseConfig::feature_path`]. Returns the written paths in source
/// path order.
pub fn visualise_features<T, S>(features: &[Tile<u8>], config: &VisualiseConfig, source: &S) -> Result<Vec<PathBuf>>
where
    T: RasterElement,
    S: RasterSource + Sync,
{
    config.validate()?;
    prepare_output_dir(&config.output_dir)?;

    let groups = group_by_source(features, |t| &t.source);
    run_groups(&groups, config.parallel, |(src, tiles)| {
        debug!("{}: compositing {} feature tiles", src, tiles.len());

        let mut image: RasterImage<T> = source.read(src.path())?;
        let bitmap = composite(tiles.iter().map(|t| t.patch()), config.tile_size, image.shape())?;
        burn(&mut image, &bitmap, config.feature_color.rgb())?;

        let out = config.feature_path(src);
        source.write(&image, &out)?;
        info!("Wrote {} ({} pixels marked)", out.display(), bitmap.count_on());
        Ok(out)
    })
}

/// Overlay labels, predictions and false positives onto their source scenes.
///
/// For every source, the three channels are composited separately and burned
/// into a single copy of the scene: labels first, then predictions, then
/// false positives, each overwriting the previous where they overlap. The
/// result is written once to [`VisualiseConfig::results_path`].
pub fn visualise_results<T, S>(results: &[ResultTile], config: &VisualiseConfig, source: &S) -> Result<Vec<PathBuf>>
where
    T: RasterElement,
    S: RasterSource + Sync,
{
    config.validate()?;
    prepare_output_dir(&config.output_dir)?;

    let layers = [
        (ResultChannel::Label, config.label_color),
        (ResultChannel::Prediction, config.prediction_color),
        (ResultChannel::FalsePositive, config.false_positive_color),
    ];

    let groups = group_by_source(results, |t| &t.source);
    run_groups(&groups, config.parallel, |(src, tiles)| {
        debug!("{}: compositing {} result tiles", src, tiles.len());

        let mut image: RasterImage<T> = source.read(src.path())?;
        let shape = image.shape();
        for (channel, color) in layers {
            let bitmap = channel_bitmap(tiles, channel, config.tile_size, shape)?;
            debug!("{}: {} pixels of {} as {}", src, bitmap.count_on(), channel.name(), color);
            burn(&mut image, &bitmap, color.rgb())?;
        }

        let out = config.results_path(src);
        source.write(&image, &out)?;
        info!("Wrote {}", out.display());
        Ok(out)
    })
}
