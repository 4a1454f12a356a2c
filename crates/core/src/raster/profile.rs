//! Serialization profile carried alongside raster pixels

use crate::crs::CRS;
use crate::raster::GeoTransform;
use serde::{Deserialize, Serialize};
use std::fmt;

/// On-disk sample type of a raster band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    F32,
    F64,
}

impl DataType {
    /// Bits per sample
    pub fn bits(&self) -> u16 {
        match self {
            DataType::U8 | DataType::I8 => 8,
            DataType::U16 | DataType::I16 => 16,
            DataType::U32 | DataType::I32 | DataType::F32 => 32,
            DataType::F64 => 64,
        }
    }

    /// TIFF SampleFormat tag value (1 = uint, 2 = int, 3 = IEEE float)
    pub fn sample_format(&self) -> u16 {
        match self {
            DataType::U8 | DataType::U16 | DataType::U32 => 1,
            DataType::I8 | DataType::I16 | DataType::I32 => 2,
            DataType::F32 | DataType::F64 => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::U8 => "uint8",
            DataType::U16 => "uint16",
            DataType::U32 => "uint32",
            DataType::I8 => "int8",
            DataType::I16 => "int16",
            DataType::I32 => "int32",
            DataType::F32 => "float32",
            DataType::F64 => "float64",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything needed to write a raster back out with the same layout
/// and georeferencing it was read with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterProfile {
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Number of bands
    pub count: usize,
    /// Sample type used on disk
    pub dtype: DataType,
    /// Affine transformation
    pub transform: GeoTransform,
    /// Coordinate reference system
    pub crs: Option<CRS>,
    /// No-data value, if declared
    pub nodata: Option<f64>,
}

impl RasterProfile {
    /// Create a profile with the default transform and no CRS
    pub fn new(height: usize, width: usize, count: usize, dtype: DataType) -> Self {
        Self {
            width,
            height,
            count,
            dtype,
            transform: GeoTransform::default(),
            crs: None,
            nodata: None,
        }
    }

    /// Profile of a `rows x cols` window starting at `(row, col)`
    pub fn window(&self, row: usize, col: usize, rows: usize, cols: usize) -> Self {
        Self {
            width: cols,
            height: rows,
            transform: self.transform.shifted(row, col),
            ..self.clone()
        }
    }
}
