//! Raster data structures

mod element;
mod geotransform;
mod image;
mod profile;

pub use element::RasterElement;
pub use geotransform::GeoTransform;
pub use image::RasterImage;
pub use profile::{DataType, RasterProfile};
