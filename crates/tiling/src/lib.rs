//! # DeepWater Tiling
//!
//! Cutting georeferenced rasters into fixed-size tiles for model
//! consumption, and putting per-tile model output back together.
//!
//! - [`extract`]: lazy tile grids over a pixel array ([`extract_tiles`])
//! - [`composite`]: full-extent [`Bitmap`]s from positioned patches
//! - [`tile`]: the [`Tile`] / [`ResultTile`] records passed between stages
//! - [`naming`]: file names for exported tiles

pub mod composite;
pub mod extract;
pub mod naming;
pub mod tile;

pub use composite::{composite, Bitmap};
pub use extract::{extract_tiles, extract_tiles_2d, tiles_of, TileGrid, Tiles};
pub use naming::{parse_tile_file_name, tile_file_name};
pub use tile::{Patch, ResultChannel, ResultTile, SourceRef, Tile, TileOrigin};
