//! # DeepWater Overlay
//!
//! Highlighting model output on the scenes it came from.
//!
//! Composited tile bitmaps are burned into the RGB bands of the source
//! raster with a fixed color per class, and written back as GeoTIFF with
//! the source's georeferencing.
//!
//! ## Usage
//!
//! ```ignore
//! use deepwater_core::io::GeoTiffSource;
//! use deepwater_overlay::{visualise_results, VisualiseConfig};
//!
//! let config = VisualiseConfig::default().with_output_dir("out");
//! let written = visualise_results::<u16, _>(&results, &config, &GeoTiffSource)?;
//! ```

pub mod color;
pub mod render;
pub mod visualise;

pub use color::{ColorSpec, ColorTable, Rgb};
pub use render::{burn, overlay, render};
pub use visualise::{visualise_features, visualise_results, VisualiseConfig};
