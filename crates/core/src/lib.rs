//! # DeepWater Core
//!
//! Raster data model and I/O shared by the DeepWater tiling toolkit.
//!
//! This crate provides:
//! - `RasterImage<T>`: multi-band pixel array indexed `(row, col, band)`
//! - `RasterProfile`: dimensions, sample type and georeferencing for re-serialization
//! - `GeoTransform` and `CRS` for georeferencing
//! - Native GeoTIFF reading/writing and the [`io::RasterSource`] trait

pub mod crs;
pub mod error;
pub mod io;
pub mod raster;

pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{DataType, GeoTransform, RasterElement, RasterImage, RasterProfile};

