//! Pixel element trait for generic band values

use crate::raster::DataType;
use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a raster band.
///
/// Every element type maps onto exactly one on-disk [`DataType`], which is
/// what a freshly created image records in its profile.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// On-disk sample type matching this element
    const DATA_TYPE: DataType;

    /// Default no-data value for this type
    fn default_nodata() -> Self;
}

macro_rules! impl_raster_element_int {
    ($t:ty, $dt:expr) => {
        impl RasterElement for $t {
            const DATA_TYPE: DataType = $dt;

            fn default_nodata() -> Self {
                <$t>::MIN
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty, $dt:expr) => {
        impl RasterElement for $t {
            const DATA_TYPE: DataType = $dt;

            fn default_nodata() -> Self {
                <$t>::NAN
            }
        }
    };
}

impl_raster_element_int!(i8, DataType::I8);
impl_raster_element_int!(i16, DataType::I16);
impl_raster_element_int!(i32, DataType::I32);
impl_raster_element_int!(u8, DataType::U8);
impl_raster_element_int!(u16, DataType::U16);
impl_raster_element_int!(u32, DataType::U32);
impl_raster_element_float!(f32, DataType::F32);
impl_raster_element_float!(f64, DataType::F64);
