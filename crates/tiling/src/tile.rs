//! Tile records carried through the training / inference pipeline

use deepwater_core::{Error, RasterElement, Result};
use ndarray::{Array2, Array3, ArrayViewD};
use std::fmt;
use std::path::{Path, PathBuf};

/// Top-left pixel of a tile in its source raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileOrigin {
    pub row: usize,
    pub col: usize,
}

impl TileOrigin {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for TileOrigin {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for TileOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Path of the raster a tile was cut from
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceRef(PathBuf);

impl SourceRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// File name without directory or extension
    pub fn stem(&self) -> String {
        self.0
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

macro_rules! impl_source_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SourceRef {
                fn from(path: $t) -> Self {
                    Self::new(path)
                }
            }
        )*
    };
}

impl_source_from!(PathBuf, &Path, &PathBuf, String, &str);

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A square patch of pixels cut from a raster, all bands included
#[derive(Debug, Clone, PartialEq)]
pub struct Tile<T> {
    /// `(tile_size, tile_size, bands)`
    pub data: Array3<T>,
    pub origin: TileOrigin,
    pub source: SourceRef,
}

impl<T: RasterElement> Tile<T> {
    pub fn new(data: Array3<T>, origin: impl Into<TileOrigin>, source: impl Into<SourceRef>) -> Self {
        Self {
            data,
            origin: origin.into(),
            source: source.into(),
        }
    }

    /// Edge length in pixels
    pub fn size(&self) -> usize {
        self.data.dim().0
    }

    pub fn bands(&self) -> usize {
        self.data.dim().2
    }
}

impl Tile<u8> {
    /// Single-band mask tile from a flat, row-major model output
    pub fn from_mask(
        values: Vec<u8>,
        tile_size: usize,
        origin: impl Into<TileOrigin>,
        source: impl Into<SourceRef>,
    ) -> Result<Self> {
        let actual = values.len();
        let data = Array3::from_shape_vec((tile_size, tile_size, 1), values)
            .map_err(|_| Error::TileShape { tile_size, actual })?;
        Ok(Self::new(data, origin, source))
    }

    /// All bands of this tile as a compositor patch
    pub fn patch(&self) -> Patch<'_> {
        Patch {
            values: self.data.view().into_dyn(),
            origin: self.origin,
        }
    }
}

/// Which array of a [`ResultTile`] to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultChannel {
    Prediction,
    Label,
    FalsePositive,
}

impl ResultChannel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Prediction => "prediction",
            Self::Label => "label",
            Self::FalsePositive => "false_positive",
        }
    }
}

/// Model output for one tile: prediction, ground truth and false-positive mask
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTile {
    pub prediction: Array2<u8>,
    pub label: Array2<u8>,
    pub false_positive: Array2<u8>,
    pub origin: TileOrigin,
    pub source: SourceRef,
}

impl ResultTile {
    /// Build from three arrays of identical shape
    pub fn new(
        prediction: Array2<u8>,
        label: Array2<u8>,
        false_positive: Array2<u8>,
        origin: impl Into<TileOrigin>,
        source: impl Into<SourceRef>,
    ) -> Result<Self> {
        let (er, ec) = prediction.dim();
        for other in [&label, &false_positive] {
            let (ar, ac) = other.dim();
            if (ar, ac) != (er, ec) {
                return Err(Error::SizeMismatch { er, ec, ar, ac });
            }
        }
        Ok(Self {
            prediction,
            label,
            false_positive,
            origin: origin.into(),
            source: source.into(),
        })
    }

    /// Build from flat, row-major model outputs of `tile_size * tile_size` values each
    pub fn from_flat(
        prediction: Vec<u8>,
        label: Vec<u8>,
        false_positive: Vec<u8>,
        tile_size: usize,
        origin: impl Into<TileOrigin>,
        source: impl Into<SourceRef>,
    ) -> Result<Self> {
        let reshape = |values: Vec<u8>| {
            let actual = values.len();
            Array2::from_shape_vec((tile_size, tile_size), values)
                .map_err(|_| Error::TileShape { tile_size, actual })
        };
        Self::new(
            reshape(prediction)?,
            reshape(label)?,
            reshape(false_positive)?,
            origin,
            source,
        )
    }

    /// Derive false positives as pixels predicted as water but absent from the label
    pub fn with_derived_false_positives(
        prediction: Array2<u8>,
        label: Array2<u8>,
        origin: impl Into<TileOrigin>,
        source: impl Into<SourceRef>,
    ) -> Result<Self> {
        let (er, ec) = prediction.dim();
        let (ar, ac) = label.dim();
        if (ar, ac) != (er, ec) {
            return Err(Error::SizeMismatch { er, ec, ar, ac });
        }
        let false_positive = ndarray::Zip::from(&prediction)
            .and(&label)
            .map_collect(|&p, &l| u8::from(p == 1 && l != 1));
        Self::new(prediction, label, false_positive, origin, source)
    }

    pub fn channel(&self, channel: ResultChannel) -> &Array2<u8> {
        match channel {
            ResultChannel::Prediction => &self.prediction,
            ResultChannel::Label => &self.label,
            ResultChannel::FalsePositive => &self.false_positive,
        }
    }

    /// One channel as a compositor patch, sharing this tile's origin
    pub fn patch(&self, channel: ResultChannel) -> Patch<'_> {
        Patch {
            values: self.channel(channel).view().into_dyn(),
            origin: self.origin,
        }
    }
}

/// Borrowed single-band values positioned at an origin.
///
/// The compositor reshapes `values` to `tile_size x tile_size`, so any
/// layout with the right element count is accepted.
#[derive(Debug, Clone)]
pub struct Patch<'a> {
    pub values: ArrayViewD<'a, u8>,
    pub origin: TileOrigin,
}

impl<'a> Patch<'a> {
    pub fn new(values: ArrayViewD<'a, u8>, origin: impl Into<TileOrigin>) -> Self {
        Self {
            values,
            origin: origin.into(),
        }
    }
}
