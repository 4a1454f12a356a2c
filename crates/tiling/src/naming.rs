//! File names for exported tiles
//!
//! Tiles are written as `<source stem>_<row>_<col>.tif` so the origin and
//! the raster they belong to can be recovered from the name alone.

use crate::tile::TileOrigin;
use std::path::Path;

/// `<stem>_<row>_<col>.tif`
pub fn tile_file_name(stem: &str, origin: TileOrigin) -> String {
    format!("{}_{}_{}.tif", stem, origin.row, origin.col)
}

/// Recover `(stem, origin)` from a tile file name or path.
///
/// The stem itself may contain underscores; only the last two
/// `_`-separated fields are read as the origin.
pub fn parse_tile_file_name(path: &Path) -> Option<(String, TileOrigin)> {
    let name = path.file_stem()?.to_str()?;
    let mut parts = name.rsplitn(3, '_');
    let col = parts.next()?.parse().ok()?;
    let row = parts.next()?.parse().ok()?;
    let stem = parts.next().filter(|s| !s.is_empty())?;
    Some((stem.to_string(), TileOrigin::new(row, col)))
}
