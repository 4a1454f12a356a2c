//! Extraction followed by compositing over whole rasters.

use deepwater_tiling::{composite, extract_tiles, Tile, TileGrid};
use ndarray::{s, Array3};

/// Pseudo-random 0/1 mask so every position is distinguishable from the zero fill
fn mask(rows: usize, cols: usize) -> Array3<u8> {
    Array3::from_shape_fn((rows, cols, 1), |(r, c, _)| (((r * 31 + c * 17) % 7) % 2) as u8 + 1)
}

#[test]
fn interior_blocks_survive_and_last_blocks_stay_zero() {
    let t = 8;
    let (rows, cols) = (6 * t, 4 * t);
    let source = mask(rows, cols);

    let tiles: Vec<Tile<u8>> = extract_tiles(source.view(), t, "scene.tif").collect();
    assert_eq!(tiles.len(), 5 * 3);

    let bitmap = composite(tiles.iter().map(Tile::patch), t, (rows, cols)).unwrap();
    let rebuilt = bitmap.view();

    let interior_rows = rows - t;
    let interior_cols = cols - t;
    assert_eq!(
        rebuilt.slice(s![..interior_rows, ..interior_cols]),
        source.slice(s![..interior_rows, ..interior_cols, 0])
    );
    assert!(rebuilt.slice(s![interior_rows.., ..]).iter().all(|&v| v == 0));
    assert!(rebuilt.slice(s![.., interior_cols..]).iter().all(|&v| v == 0));
}

#[test]
fn ragged_edges_are_left_uncovered() {
    let t = 5;
    let (rows, cols) = (23, 17);
    let source = mask(rows, cols);

    let tiles: Vec<Tile<u8>> = extract_tiles(source.view(), t, "scene.tif").collect();
    assert_eq!(tiles.len(), TileGrid::new(rows, cols, t).total());

    let bitmap = composite(tiles.iter().map(Tile::patch), t, (rows, cols)).unwrap();

    // rows: starts 0, 5, 10, 15 (15 + 5 < 23); cols: 0, 5, 10 (10 + 5 < 17)
    let covered_rows = 20;
    let covered_cols = 15;
    for r in 0..rows {
        for c in 0..cols {
            let expected = if r < covered_rows && c < covered_cols {
                source[[r, c, 0]]
            } else {
                0
            };
            assert_eq!(bitmap.get(r, c), Some(expected), "pixel ({r}, {c})");
        }
    }
}
