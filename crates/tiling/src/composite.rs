//! Reassembling tiles into full-extent bitmaps

use crate::tile::Patch;
use deepwater_core::{Error, Result};
use ndarray::{s, Array2, ArrayView2};

/// Full-extent single-band mask; a pixel is "on" when its value is 1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    data: Array2<u8>,
}

impl Bitmap {
    /// All-zero bitmap of `(rows, cols)`
    pub fn zeros(shape: (usize, usize)) -> Self {
        Self {
            data: Array2::zeros(shape),
        }
    }

    pub fn from_array(data: Array2<u8>) -> Self {
        Self { data }
    }

    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<u8> {
        self.data.get((row, col)).copied()
    }

    pub fn is_on(&self, row: usize, col: usize) -> bool {
        self.get(row, col) == Some(1)
    }

    /// Number of "on" pixels
    pub fn count_on(&self) -> usize {
        self.data.iter().filter(|&&v| v == 1).count()
    }

    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.data.view()
    }
}

/// Rebuild a full-extent bitmap from positioned patches.
///
/// Each patch is reshaped to `tile_size x tile_size` and written at its
/// origin over whatever is already there, so overlapping patches resolve
/// last-write-wins. The part of a patch that falls outside `image_shape` is
/// clipped. A patch whose element count is not `tile_size^2` is an error,
/// as is a `tile_size` whose square does not fit in `usize`.
pub fn composite<'a, I>(patches: I, tile_size: usize, image_shape: (usize, usize)) -> Result<Bitmap>
where
    I: IntoIterator<Item = Patch<'a>>,
{
    let cells = tile_size
        .checked_mul(tile_size)
        .ok_or_else(|| Error::InvalidParameter {
            name: "tile_size",
            value: tile_size.to_string(),
            reason: "tile area does not fit in usize".to_string(),
        })?;
    let (rows, cols) = image_shape;
    let mut bitmap = Bitmap::zeros(image_shape);

    for patch in patches {
        let actual = patch.values.len();
        if actual != cells {
            return Err(Error::TileShape { tile_size, actual });
        }
        let values = patch
            .values
            .to_shape((tile_size, tile_size))
            .map_err(|e| Error::Other(e.to_string()))?;

        let (row, col) = (patch.origin.row, patch.origin.col);
        if row >= rows || col >= cols {
            continue;
        }
        let h = tile_size.min(rows - row);
        let w = tile_size.min(cols - col);

        bitmap
            .data
            .slice_mut(s![row..row + h, col..col + w])
            .assign(&values.slice(s![..h, ..w]));
    }

    Ok(bitmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{ResultChannel, ResultTile, Tile, TileOrigin};
    use ndarray::{Array2, Array3};

    fn filled(value: u8, t: usize, origin: (usize, usize)) -> Tile<u8> {
        Tile::new(Array3::from_elem((t, t, 1), value), origin, "a.tif")
    }

    #[test]
    fn quadrants_of_ten_by_ten() {
        let tiles = [filled(1, 5, (0, 0)), filled(7, 5, (5, 5))];
        let bitmap = composite(tiles.iter().map(Tile::patch), 5, (10, 10)).unwrap();

        let data = bitmap.view();
        assert!(data.slice(s![0..5, 0..5]).iter().all(|&v| v == 1));
        assert!(data.slice(s![5..10, 5..10]).iter().all(|&v| v == 7));
        assert!(data.slice(s![0..5, 5..10]).iter().all(|&v| v == 0));
        assert!(data.slice(s![5..10, 0..5]).iter().all(|&v| v == 0));
    }

    #[test]
    fn overlapping_patches_last_write_wins() {
        let tiles = [filled(1, 4, (0, 0)), filled(2, 4, (2, 2))];
        let bitmap = composite(tiles.iter().map(Tile::patch), 4, (8, 8)).unwrap();

        assert_eq!(bitmap.get(1, 1), Some(1));
        assert_eq!(bitmap.get(3, 3), Some(2));
        assert_eq!(bitmap.get(5, 5), Some(2));
    }

    #[test]
    fn out_of_bounds_patch_is_clipped() {
        let tiles = [filled(1, 4, (6, 6)), filled(1, 4, (20, 0))];
        let bitmap = composite(tiles.iter().map(Tile::patch), 4, (8, 8)).unwrap();
        assert_eq!(bitmap.count_on(), 4);
        assert!(bitmap.is_on(7, 7));
    }

    #[test]
    fn wrong_sized_patch_is_rejected() {
        let tile = filled(1, 4, (0, 0));
        let result = composite([tile.patch()], 5, (10, 10));
        assert!(matches!(
            result,
            Err(Error::TileShape { tile_size: 5, actual: 16 })
        ));
    }

    #[test]
    fn oversized_tile_size_is_an_error() {
        let tile = filled(1, 2, (0, 0));
        let result = composite([tile.patch()], usize::MAX >> 1, (10, 10));
        assert!(matches!(
            result,
            Err(Error::InvalidParameter { name: "tile_size", .. })
        ));
    }

    #[test]
    fn flat_and_column_layouts_are_reshaped() {
        let flat: Vec<u8> = (0..9).collect();
        let flat = ndarray::Array1::from(flat);
        let patch = Patch::new(flat.view().into_dyn(), TileOrigin::new(1, 1));
        let bitmap = composite([patch], 3, (4, 4)).unwrap();
        assert_eq!(bitmap.get(1, 1), Some(0));
        assert_eq!(bitmap.get(1, 3), Some(2));
        assert_eq!(bitmap.get(3, 1), Some(6));
    }

    #[test]
    fn result_channels_composite_independently() {
        let mut label = Array2::zeros((2, 2));
        label[[0, 0]] = 1;
        let tile = ResultTile::new(Array2::ones((2, 2)), label, Array2::zeros((2, 2)), (2, 0), "a.tif").unwrap();

        let predictions = composite([tile.patch(ResultChannel::Prediction)], 2, (4, 4)).unwrap();
        let labels = composite([tile.patch(ResultChannel::Label)], 2, (4, 4)).unwrap();

        assert_eq!(predictions.count_on(), 4);
        assert_eq!(labels.count_on(), 1);
        assert!(labels.is_on(2, 0));
    }
}
