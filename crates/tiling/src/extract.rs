//! Cutting rasters into fixed-size tiles

use crate::tile::{SourceRef, Tile, TileOrigin};
use deepwater_core::{RasterElement, RasterImage};
use ndarray::{s, ArrayView2, ArrayView3, Axis};

/// Lazy, restartable iterator over the origins of all in-bounds tiles.
///
/// Origins are the row-major product of `0, t, 2t, ...` over rows and
/// columns. An origin is kept only when `row + t < rows` and
/// `col + t < cols`. Boundary tiles are never padded, and the strict
/// comparison also drops the last row and column of tiles when the
/// dimensions are exact multiples of `t`.
#[derive(Debug, Clone)]
pub struct TileGrid {
    rows: usize,
    cols: usize,
    tile_size: usize,
    next_row: usize,
    next_col: usize,
}

impl TileGrid {
    pub fn new(rows: usize, cols: usize, tile_size: usize) -> Self {
        Self {
            rows,
            cols,
            tile_size,
            next_row: 0,
            next_col: 0,
        }
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    fn in_bounds(&self, row: usize, col: usize) -> bool {
        row + self.tile_size < self.rows && col + self.tile_size < self.cols
    }

    /// Number of starts along an axis of length `len` that pass the bounds check
    fn starts(&self, len: usize) -> usize {
        if self.tile_size == 0 || len <= self.tile_size {
            0
        } else {
            (len - self.tile_size - 1) / self.tile_size + 1
        }
    }

    /// Total number of tiles the grid yields from the start
    pub fn total(&self) -> usize {
        self.starts(self.rows) * self.starts(self.cols)
    }
}

impl Iterator for TileGrid {
    type Item = TileOrigin;

    fn next(&mut self) -> Option<Self::Item> {
        if self.tile_size == 0 {
            return None;
        }

        while self.next_row < self.rows {
            let (row, col) = (self.next_row, self.next_col);

            self.next_col += self.tile_size;
            if self.next_col >= self.cols {
                self.next_col = 0;
                self.next_row += self.tile_size;
            }

            if self.in_bounds(row, col) {
                return Some(TileOrigin::new(row, col));
            }
        }

        None
    }
}

/// Lazy iterator of tiles over a borrowed pixel array
#[derive(Debug, Clone)]
pub struct Tiles<'a, T> {
    pixels: ArrayView3<'a, T>,
    grid: TileGrid,
    source: SourceRef,
}

impl<'a, T: RasterElement> Iterator for Tiles<'a, T> {
    type Item = Tile<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let origin = self.grid.next()?;
        let t = self.grid.tile_size();
        let data = self
            .pixels
            .slice(s![origin.row..origin.row + t, origin.col..origin.col + t, ..])
            .to_owned();
        Some(Tile::new(data, origin, self.source.clone()))
    }
}

/// Partition a `(row, col, band)` array into `tile_size` squares.
///
/// A `tile_size` of zero, or one not smaller than both dimensions, yields
/// no tiles. Nothing is copied until a tile is pulled from the iterator.
pub fn extract_tiles<'a, T: RasterElement>(
    pixels: ArrayView3<'a, T>,
    tile_size: usize,
    source: impl Into<SourceRef>,
) -> Tiles<'a, T> {
    let (rows, cols, _) = pixels.dim();
    Tiles {
        pixels,
        grid: TileGrid::new(rows, cols, tile_size),
        source: source.into(),
    }
}

/// Same as [`extract_tiles`] for a single-band array; tiles get one band
pub fn extract_tiles_2d<'a, T: RasterElement>(
    pixels: ArrayView2<'a, T>,
    tile_size: usize,
    source: impl Into<SourceRef>,
) -> Tiles<'a, T> {
    extract_tiles(pixels.insert_axis(Axis(2)), tile_size, source)
}

/// Tiles of a decoded image, tagged with the path it was read from
pub fn tiles_of<T: RasterElement>(image: &RasterImage<T>, tile_size: usize) -> Tiles<'_, T> {
    let source = image
        .path()
        .map(SourceRef::from)
        .unwrap_or_else(|| SourceRef::new(""));
    extract_tiles(image.view(), tile_size, source)
}
