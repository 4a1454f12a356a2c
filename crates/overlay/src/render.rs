//! Burning bitmaps into the RGB bands of a raster.

use crate::color::{ColorTable, Rgb};
use deepwater_core::io::RasterSource;
use deepwater_core::{Error, RasterElement, RasterImage, Result};
use deepwater_tiling::Bitmap;
use ndarray::Zip;
use std::path::Path;
use tracing::debug;

/// Cast an 8-bit color component into the image's element type
fn component<T: RasterElement>(value: u8) -> Result<T> {
    num_traits::cast(value).ok_or_else(|| {
        Error::UnsupportedDataType(format!(
            "color component {} does not fit {}",
            value,
            T::DATA_TYPE
        ))
    })
}

/// Recolor `image` in place wherever `bitmap` is on.
///
/// Bands 0, 1 and 2 receive the red, green and blue components. Values are
/// overwritten, not blended, and any band after the third is left as is.
pub fn burn<T: RasterElement>(image: &mut RasterImage<T>, bitmap: &Bitmap, rgb: Rgb) -> Result<()> {
    if image.bands() < 3 {
        return Err(Error::BandCount {
            expected: 3,
            actual: image.bands(),
        });
    }
    let (er, ec) = image.shape();
    let (ar, ac) = bitmap.shape();
    if (ar, ac) != (er, ec) {
        return Err(Error::SizeMismatch { er, ec, ar, ac });
    }

    let values = [component::<T>(rgb.r)?, component::<T>(rgb.g)?, component::<T>(rgb.b)?];
    let mask = bitmap.view();
    for (band, value) in values.into_iter().enumerate() {
        let mut pixels = image.band_mut(band)?;
        Zip::from(&mut pixels).and(&mask).for_each(|px, &m| {
            if m == 1 {
                *px = value;
            }
        });
    }
    Ok(())
}

/// Colored copy of `source`; the profile and path are carried over
pub fn render<T: RasterElement>(bitmap: &Bitmap, source: &RasterImage<T>, rgb: Rgb) -> Result<RasterImage<T>> {
    let mut image = source.clone();
    burn(&mut image, bitmap, rgb)?;
    Ok(image)
}

/// Render `bitmap` onto `source_image`, write it to `out_path`, and re-open it.
///
/// The color name is resolved before anything touches the disk. The returned
/// image is the one read back from `out_path`, so calling this again with the
/// returned image and the same path layers another class on top.
pub fn overlay<T, S>(
    bitmap: &Bitmap,
    source_image: &RasterImage<T>,
    out_path: &Path,
    color_name: &str,
    raster_source: &S,
) -> Result<RasterImage<T>>
where
    T: RasterElement,
    S: RasterSource,
{
    let rgb = ColorTable::new().get(color_name)?;
    let rendered = render(bitmap, source_image, rgb)?;

    debug!(
        "Burning {} pixels as {} into {}",
        bitmap.count_on(),
        color_name,
        out_path.display()
    );
    raster_source.write(&rendered, out_path)?;
    raster_source.read(out_path)
}
