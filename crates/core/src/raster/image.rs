//! Multi-band raster image

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement, RasterProfile};
use ndarray::{Array3, ArrayView2, ArrayView3, ArrayViewMut2, Axis};
use std::path::{Path, PathBuf};

/// A decoded, georeferenced multi-band raster.
///
/// Pixels are stored as a 3D array indexed `(row, col, band)`; the profile
/// carries everything needed to write the image back out unchanged.
///
/// # Example
///
/// ```ignore
/// use deepwater_core::RasterImage;
///
/// // 3-band 256x256 image, all zeros
/// let mut image: RasterImage<u8> = RasterImage::new(256, 256, 3);
/// image.set(10, 20, 0, 255)?;
/// assert_eq!(image.get(10, 20, 0)?, 255);
/// ```
#[derive(Debug, Clone)]
pub struct RasterImage<T: RasterElement> {
    data: Array3<T>,
    profile: RasterProfile,
    path: Option<PathBuf>,
}

impl<T: RasterElement> RasterImage<T> {
    /// Create a new image filled with zeros
    pub fn new(rows: usize, cols: usize, bands: usize) -> Self {
        Self::from_array(Array3::zeros((rows, cols, bands)))
    }

    /// Create an image from an `(row, col, band)` array
    pub fn from_array(data: Array3<T>) -> Self {
        let (rows, cols, bands) = data.dim();
        Self {
            data,
            profile: RasterProfile::new(rows, cols, bands, T::DATA_TYPE),
            path: None,
        }
    }

    /// Create an image from band-interleaved pixel values (`r g b r g b ...`)
    pub fn from_interleaved(data: Vec<T>, rows: usize, cols: usize, bands: usize) -> Result<Self> {
        if data.len() != rows * cols * bands {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array3::from_shape_vec((rows, cols, bands), data)
            .map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self::from_array(array))
    }

    /// Attach an existing profile. Dimensions and band count must match the pixels.
    pub fn with_profile(mut self, profile: RasterProfile) -> Result<Self> {
        let (rows, cols, bands) = self.data.dim();
        if profile.height != rows || profile.width != cols {
            return Err(Error::SizeMismatch {
                er: profile.height,
                ec: profile.width,
                ar: rows,
                ac: cols,
            });
        }
        if profile.count != bands {
            return Err(Error::BandCount {
                expected: profile.count,
                actual: bands,
            });
        }
        self.profile = profile;
        Ok(self)
    }

    /// Record the file this image was read from
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.dim().0
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.dim().1
    }

    /// Number of bands
    pub fn bands(&self) -> usize {
        self.data.dim().2
    }

    /// Spatial dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    // Data access

    /// Get value at (row, col, band)
    pub fn get(&self, row: usize, col: usize, band: usize) -> Result<T> {
        self.data
            .get((row, col, band))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col, band)
    pub fn set(&mut self, row: usize, col: usize, band: usize, value: T) -> Result<()> {
        match self.data.get_mut((row, col, band)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            }),
        }
    }

    /// Pixel values of all bands at (row, col)
    pub fn pixel(&self, row: usize, col: usize) -> Result<Vec<T>> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(self.data.slice(ndarray::s![row, col, ..]).to_vec())
    }

    /// View of a single band
    pub fn band(&self, band: usize) -> Result<ArrayView2<'_, T>> {
        self.check_band(band)?;
        Ok(self.data.index_axis(Axis(2), band))
    }

    /// Mutable view of a single band
    pub fn band_mut(&mut self, band: usize) -> Result<ArrayViewMut2<'_, T>> {
        self.check_band(band)?;
        Ok(self.data.index_axis_mut(Axis(2), band))
    }

    fn check_band(&self, band: usize) -> Result<()> {
        if band >= self.bands() {
            return Err(Error::BandCount {
                expected: band + 1,
                actual: self.bands(),
            });
        }
        Ok(())
    }

    /// View of all pixels
    pub fn view(&self) -> ArrayView3<'_, T> {
        self.data.view()
    }

    /// Reference to the underlying array
    pub fn data(&self) -> &Array3<T> {
        &self.data
    }

    // Metadata

    pub fn profile(&self) -> &RasterProfile {
        &self.profile
    }

    /// File this image was read from, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.profile.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.profile.transform = transform;
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.profile.crs.as_ref()
    }

    pub fn set_crs(&mut self, crs: Option<CRS>) {
        self.profile.crs = crs;
    }

    pub fn nodata(&self) -> Option<f64> {
        self.profile.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<f64>) {
        self.profile.nodata = nodata;
    }

    /// Geographic bounds (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.profile.transform.bounds(self.cols(), self.rows())
    }
}
