//! Native GeoTIFF reading/writing built on the `tiff` crate
//!
//! Supports uncompressed, chunky (band-interleaved) output with any band
//! count, and reads whatever the `tiff` decoder can expand into interleaved
//! samples. Georeferencing is limited to the transform, an EPSG code and
//! the GDAL nodata tag.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{DataType, GeoTransform, RasterElement, RasterImage, RasterProfile};
use ndarray::Array3;
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind};
use tiff::tags::Tag;
use tiff::ColorType;
use tracing::debug;

// GeoTIFF tag IDs (not in the standard tiff crate)
const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

// GeoKey IDs
const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const USER_DEFINED: u32 = 32767;

/// Read a GeoTIFF file into a RasterImage.
///
/// All bands are read; samples are cast to `T`, with values that do not fit
/// replaced by `T::default_nodata()`. The returned image remembers `path`.
pub fn read_geotiff<T, P>(path: P) -> Result<RasterImage<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = BufReader::new(File::open(path)?);
    Ok(decode_geotiff(file)?.with_path(path))
}

/// Read a GeoTIFF from an in-memory buffer
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<RasterImage<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

fn decode_geotiff<T, R>(reader: R) -> Result<RasterImage<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader)?;

    let (width, height) = decoder.dimensions()?;
    let rows = height as usize;
    let cols = width as usize;
    let bands = band_count(decoder.colortype()?)?;

    let (dtype, (data, replaced)): (DataType, (Vec<T>, usize)) = match decoder.read_image()? {
        DecodingResult::U8(buf) => (DataType::U8, cast_samples(&buf)),
        DecodingResult::U16(buf) => (DataType::U16, cast_samples(&buf)),
        DecodingResult::U32(buf) => (DataType::U32, cast_samples(&buf)),
        DecodingResult::I8(buf) => (DataType::I8, cast_samples(&buf)),
        DecodingResult::I16(buf) => (DataType::I16, cast_samples(&buf)),
        DecodingResult::I32(buf) => (DataType::I32, cast_samples(&buf)),
        DecodingResult::F32(buf) => (DataType::F32, cast_samples(&buf)),
        DecodingResult::F64(buf) => (DataType::F64, cast_samples(&buf)),
        _ => return Err(Error::UnsupportedDataType("Unsupported TIFF sample format".to_string())),
    };

    if replaced > 0 {
        debug!(
            "{} of {} {} samples do not fit {} and were set to nodata",
            replaced,
            data.len(),
            dtype,
            T::DATA_TYPE
        );
    }

    let mut profile = RasterProfile::new(rows, cols, bands, dtype);
    profile.transform = read_geotransform(&mut decoder).unwrap_or_default();
    profile.crs = read_crs(&mut decoder);
    profile.nodata = read_nodata(&mut decoder);

    RasterImage::from_interleaved(data, rows, cols, bands)?.with_profile(profile)
}

fn band_count(colortype: ColorType) -> Result<usize> {
    match colortype {
        ColorType::Gray(_) => Ok(1),
        ColorType::GrayA(_) => Ok(2),
        ColorType::RGB(_) => Ok(3),
        ColorType::RGBA(_) | ColorType::CMYK(_) => Ok(4),
        ColorType::Multiband { num_samples, .. } => Ok(num_samples as usize),
        other => Err(Error::UnsupportedDataType(format!("TIFF color type {:?}", other))),
    }
}

/// Cast decoded samples to `T`; returns the values and how many had to be
/// replaced by `T::default_nodata()`
fn cast_samples<S, T>(buf: &[S]) -> (Vec<T>, usize)
where
    S: Copy + num_traits::NumCast,
    T: RasterElement,
{
    let mut replaced = 0;
    let values = buf
        .iter()
        .map(|&v| {
            num_traits::cast(v).unwrap_or_else(|| {
                replaced += 1;
                T::default_nodata()
            })
        })
        .collect();
    (values, replaced)
}

/// GeoTransform from ModelPixelScale + ModelTiepoint, or from the
/// ModelTransformation matrix.
fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE)).ok();
    let tiepoint = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT)).ok();

    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        if scale.len() >= 2 && tiepoint.len() >= 6 {
            // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            return Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
        }
    }

    // Row-major 4x4 matrix
    let t = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_TRANSFORMATION)).ok()?;
    if t.len() < 16 {
        return None;
    }
    Some(GeoTransform {
        origin_x: t[3],
        origin_y: t[7],
        pixel_width: t[0],
        pixel_height: t[5],
        row_rotation: t[1],
        col_rotation: t[4],
    })
}

/// EPSG code from the GeoKey directory, projected CRS taking precedence
fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder.get_tag_u32_vec(Tag::Unknown(GEO_KEY_DIRECTORY)).ok()?;
    if keys.len() < 4 {
        return None;
    }

    let mut geographic = None;
    let mut projected = None;
    for entry in keys[4..].chunks_exact(4) {
        let (key, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 || value == 0 || value == USER_DEFINED {
            continue;
        }
        match key as u16 {
            PROJECTED_CS_TYPE_GEO_KEY => projected = Some(value),
            GEOGRAPHIC_TYPE_GEO_KEY => geographic = Some(value),
            _ => {}
        }
    }

    projected.or(geographic).map(CRS::from_epsg)
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder.get_tag_ascii_string(Tag::Unknown(GDAL_NODATA)).ok()?;
    text.trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .parse()
        .ok()
}

/// Write a RasterImage to a GeoTIFF file.
///
/// Samples are written in the profile's `dtype`, all bands interleaved in a
/// single uncompressed strip. The file is flushed before returning; if any
/// step fails the file is left in an undefined state.
pub fn write_geotiff<T, P>(image: &RasterImage<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let mut file = BufWriter::new(File::create(path.as_ref())?);
    encode_geotiff(image, &mut file)?;
    file.flush()?;
    Ok(())
}

/// Write a RasterImage to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(image: &RasterImage<T>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(image, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode_geotiff<T, W>(image: &RasterImage<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let profile = image.profile();
    let (rows, cols) = image.shape();
    let bands = image.bands();

    if rows == 0 || cols == 0 || bands == 0 {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }
    let width = u32::try_from(cols).map_err(|_| Error::InvalidDimensions { width: cols, height: rows })?;
    let height = u32::try_from(rows).map_err(|_| Error::InvalidDimensions { width: cols, height: rows })?;

    let pixels = sample_bytes(image.data(), profile.dtype)?;
    let byte_count = u32::try_from(pixels.len())
        .map_err(|_| Error::Other("Raster exceeds 4 GiB; BigTIFF is not supported".into()))?;

    let mut encoder = TiffEncoder::new(writer)?;
    let mut dir = encoder.image_directory()?;

    dir.write_tag(Tag::ImageWidth, width)?;
    dir.write_tag(Tag::ImageLength, height)?;
    dir.write_tag(Tag::BitsPerSample, vec![profile.dtype.bits(); bands].as_slice())?;
    dir.write_tag(Tag::Compression, 1u16)?;

    // RGB for 3/4-band visible imagery, BlackIsZero for everything else
    let (photometric, extra) = match bands {
        3 | 4 => (2u16, bands - 3),
        _ => (1u16, bands - 1),
    };
    dir.write_tag(Tag::PhotometricInterpretation, photometric)?;
    dir.write_tag(Tag::SamplesPerPixel, bands as u16)?;
    dir.write_tag(Tag::SampleFormat, vec![profile.dtype.sample_format(); bands].as_slice())?;
    dir.write_tag(Tag::PlanarConfiguration, 1u16)?;
    dir.write_tag(Tag::RowsPerStrip, height)?;
    if extra > 0 {
        dir.write_tag(Tag::ExtraSamples, vec![0u16; extra].as_slice())?;
    }

    write_geo_tags(&mut dir, profile)?;

    let offset = dir.write_data(pixels.as_slice())?;
    let offset = u32::try_from(offset)
        .map_err(|_| Error::Other("Strip offset exceeds 4 GiB".into()))?;
    dir.write_tag(Tag::StripOffsets, offset)?;
    dir.write_tag(Tag::StripByteCounts, byte_count)?;

    dir.finish()?;
    Ok(())
}

fn write_geo_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<'_, W, K>,
    profile: &RasterProfile,
) -> Result<()> {
    let gt = &profile.transform;

    if gt.is_axis_aligned() {
        let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
        dir.write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])?;

        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        dir.write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])?;
    } else {
        let matrix = [
            gt.pixel_width, gt.row_rotation, 0.0, gt.origin_x,
            gt.col_rotation, gt.pixel_height, 0.0, gt.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        dir.write_tag(Tag::Unknown(MODEL_TRANSFORMATION), &matrix[..])?;
    }

    let geokeys = geokey_directory(profile.crs.as_ref());
    dir.write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), geokeys.as_slice())?;

    if let Some(nodata) = profile.nodata {
        let text = format!("{}", nodata);
        dir.write_tag(Tag::Unknown(GDAL_NODATA), text.as_str())?;
    }

    Ok(())
}

/// GeoKeyDirectory: `[version, revision, minor, count]` followed by
/// `[key, location, count, value]` entries, all values stored inline.
fn geokey_directory(crs: Option<&CRS>) -> Vec<u16> {
    let mut entries: Vec<[u16; 4]> = Vec::new();

    let code = crs.and_then(|c| c.epsg()).and_then(|code| u16::try_from(code).ok());
    if let (Some(crs), Some(code)) = (crs, code) {
        if crs.is_geographic() {
            entries.push([GT_MODEL_TYPE_GEO_KEY, 0, 1, MODEL_TYPE_GEOGRAPHIC]);
            entries.push([GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
            entries.push([GEOGRAPHIC_TYPE_GEO_KEY, 0, 1, code]);
        } else {
            entries.push([GT_MODEL_TYPE_GEO_KEY, 0, 1, MODEL_TYPE_PROJECTED]);
            entries.push([GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
            entries.push([PROJECTED_CS_TYPE_GEO_KEY, 0, 1, code]);
        }
    } else {
        entries.push([GT_MODEL_TYPE_GEO_KEY, 0, 1, MODEL_TYPE_PROJECTED]);
        entries.push([GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA]);
    }

    let mut keys = vec![1, 1, 0, entries.len() as u16];
    keys.extend(entries.iter().flatten());
    keys
}

macro_rules! push_samples {
    ($out:ident, $data:ident, $dtype:ident, $t:ty) => {
        for &v in $data.iter() {
            let s: $t = num_traits::cast(v).ok_or_else(|| {
                Error::UnsupportedDataType(format!("{:?} cannot be stored as {}", v, $dtype))
            })?;
            $out.extend_from_slice(&s.to_ne_bytes());
        }
    };
}

/// Interleaved native-endian sample bytes in `(row, col, band)` order
fn sample_bytes<T: RasterElement>(data: &Array3<T>, dtype: DataType) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * (dtype.bits() as usize / 8));
    match dtype {
        DataType::U8 => push_samples!(out, data, dtype, u8),
        DataType::U16 => push_samples!(out, data, dtype, u16),
        DataType::U32 => push_samples!(out, data, dtype, u32),
        DataType::I8 => push_samples!(out, data, dtype, i8),
        DataType::I16 => push_samples!(out, data, dtype, i16),
        DataType::I32 => push_samples!(out, data, dtype, i32),
        DataType::F32 => push_samples!(out, data, dtype, f32),
        DataType::F64 => push_samples!(out, data, dtype, f64),
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geokeys_for_projected_crs() {
        let keys = geokey_directory(Some(&CRS::from_epsg(32632)));
        assert_eq!(&keys[..4], &[1, 1, 0, 3]);
        assert_eq!(&keys[12..16], &[PROJECTED_CS_TYPE_GEO_KEY, 0, 1, 32632]);
    }

    #[test]
    fn geokeys_without_crs() {
        let keys = geokey_directory(None);
        assert_eq!(keys.len(), 4 + 2 * 4);
        assert_eq!(keys[3], 2);
    }

    #[test]
    fn sample_bytes_rejects_unrepresentable_values() {
        let data = Array3::from_elem((1, 1, 1), 300.0f32);
        let result = sample_bytes(&data, DataType::U8);
        assert!(matches!(result, Err(Error::UnsupportedDataType(_))));
    }

    #[test]
    fn narrowing_cast_counts_replaced_samples() {
        let (values, replaced) = cast_samples::<u16, u8>(&[0, 200, 255, 256, 10_000]);
        assert_eq!(values, vec![0, 200, 255, 0, 0]);
        assert_eq!(replaced, 2);

        let (_, replaced) = cast_samples::<u8, u16>(&[0, 17, 255]);
        assert_eq!(replaced, 0);
    }

    #[test]
    fn sample_bytes_are_interleaved() {
        let data = Array3::from_shape_vec((1, 2, 2), vec![1u16, 2, 3, 4]).unwrap();
        let bytes = sample_bytes(&data, DataType::U16).unwrap();
        let expected: Vec<u8> = [1u16, 2, 3, 4].iter().flat_map(|v| v.to_ne_bytes()).collect();
        assert_eq!(bytes, expected);
    }
}
