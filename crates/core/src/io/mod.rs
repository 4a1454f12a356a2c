//! I/O operations for reading and writing georeferenced rasters

mod native;

pub use native::{read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer};

use crate::error::Result;
use crate::raster::{RasterElement, RasterImage};
use std::path::Path;

/// Where rasters come from and go to.
///
/// Every call opens, uses and closes its own file handle before returning,
/// so no handle outlives the call on success or on error.
pub trait RasterSource {
    /// Read all bands of the raster at `path`
    fn read<T: RasterElement>(&self, path: &Path) -> Result<RasterImage<T>>;

    /// Write `image` to `path` using the image's profile, replacing any existing file
    fn write<T: RasterElement>(&self, image: &RasterImage<T>, path: &Path) -> Result<()>;
}

/// [`RasterSource`] backed by the native GeoTIFF reader/writer
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTiffSource;

impl RasterSource for GeoTiffSource {
    fn read<T: RasterElement>(&self, path: &Path) -> Result<RasterImage<T>> {
        read_geotiff(path)
    }

    fn write<T: RasterElement>(&self, image: &RasterImage<T>, path: &Path) -> Result<()> {
        write_geotiff(image, path)
    }
}
