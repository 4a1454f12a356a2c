//! End-to-end overlay runs against GeoTIFFs on disk.

use deepwater_core::io::{read_geotiff, write_geotiff, GeoTiffSource};
use deepwater_core::{Error, GeoTransform, RasterImage, CRS};
use deepwater_overlay::{overlay, visualise_features, visualise_results, VisualiseConfig};
use deepwater_tiling::{Bitmap, ResultTile, Tile};
use ndarray::{Array2, Array3};
use std::path::{Path, PathBuf};

const T: usize = 4;

/// 13x13 three-band scene with a uniform fill, so a 4-pixel grid yields 3x3 tiles
fn write_scene(dir: &Path, name: &str, fill: u8) -> PathBuf {
    let mut image = RasterImage::from_array(Array3::from_elem((13, 13, 3), fill));
    image.set_transform(GeoTransform::new(500_000.0, 4_500_000.0, 10.0, -10.0));
    image.set_crs(Some(CRS::from_epsg(32633)));
    let path = dir.join(name);
    write_geotiff(&image, &path).unwrap();
    path
}

fn mask_tile(path: &Path, origin: (usize, usize)) -> Tile<u8> {
    Tile::new(Array3::ones((T, T, 1)), origin, path)
}

fn result_tile(path: &Path, origin: (usize, usize), pred: u8, label: u8, fp: u8) -> ResultTile {
    ResultTile::new(
        Array2::from_elem((T, T), pred),
        Array2::from_elem((T, T), label),
        Array2::from_elem((T, T), fp),
        origin,
        path,
    )
    .unwrap()
}

fn config(out: &Path) -> VisualiseConfig {
    VisualiseConfig::default().with_tile_size(T).with_output_dir(out)
}

#[test]
fn interleaved_sources_produce_one_file_each() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_scene(dir.path(), "alpha.tif", 50);
    let b = write_scene(dir.path(), "beta.tif", 80);
    let out = dir.path().join("imgs");

    let features = vec![mask_tile(&b, (4, 4)), mask_tile(&a, (0, 0)), mask_tile(&b, (0, 8))];
    let written = visualise_features::<u8, _>(&features, &config(&out), &GeoTiffSource).unwrap();

    assert_eq!(written, vec![out.join("alpha.tif"), out.join("beta.tif")]);

    let alpha: RasterImage<u8> = read_geotiff(&written[0]).unwrap();
    assert_eq!(alpha.pixel(1, 1).unwrap(), vec![0, 0, 255]);
    assert_eq!(alpha.pixel(5, 5).unwrap(), vec![50, 50, 50]);
    assert_eq!(alpha.pixel(1, 9).unwrap(), vec![50, 50, 50]);

    let beta: RasterImage<u8> = read_geotiff(&written[1]).unwrap();
    assert_eq!(beta.pixel(1, 1).unwrap(), vec![80, 80, 80]);
    assert_eq!(beta.pixel(5, 5).unwrap(), vec![0, 0, 255]);
    assert_eq!(beta.pixel(1, 9).unwrap(), vec![0, 0, 255]);
}

#[test]
fn output_keeps_source_georeferencing() {
    let dir = tempfile::tempdir().unwrap();
    let scene = write_scene(dir.path(), "scene.tif", 1);
    let out = dir.path().join("imgs");

    let written = visualise_features::<u8, _>(&[mask_tile(&scene, (0, 0))], &config(&out), &GeoTiffSource).unwrap();
    let image: RasterImage<u8> = read_geotiff(&written[0]).unwrap();

    assert_eq!(image.crs().and_then(|c| c.epsg()), Some(32633));
    assert_eq!(image.transform().origin_x, 500_000.0);
    assert_eq!(image.transform().pixel_height, -10.0);
}

#[test]
fn results_layer_labels_predictions_then_false_positives() {
    let dir = tempfile::tempdir().unwrap();
    let scene = write_scene(dir.path(), "scene.tif", 7);
    let out = dir.path().join("imgs");

    let results = vec![
        // label only
        result_tile(&scene, (0, 0), 0, 1, 0),
        // prediction over label
        result_tile(&scene, (0, 4), 1, 1, 0),
        // false positive over label
        result_tile(&scene, (4, 0), 0, 1, 1),
        // nothing
        result_tile(&scene, (4, 4), 0, 0, 0),
    ];
    let written = visualise_results::<u8, _>(&results, &config(&out), &GeoTiffSource).unwrap();
    assert_eq!(written, vec![out.join("scene_results.tif")]);

    let image: RasterImage<u8> = read_geotiff(&written[0]).unwrap();
    assert_eq!(image.pixel(0, 0).unwrap(), vec![0, 0, 255]);
    assert_eq!(image.pixel(0, 4).unwrap(), vec![0, 255, 0]);
    assert_eq!(image.pixel(4, 0).unwrap(), vec![255, 0, 0]);
    assert_eq!(image.pixel(4, 4).unwrap(), vec![7, 7, 7]);
    assert_eq!(image.pixel(12, 12).unwrap(), vec![7, 7, 7]);
}

#[test]
fn missing_output_dir_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let scene = write_scene(dir.path(), "scene.tif", 0);
    let out = dir.path().join("nested").join("imgs");

    visualise_features::<u8, _>(&[mask_tile(&scene, (0, 0))], &config(&out), &GeoTiffSource).unwrap();
    assert!(out.join("scene.tif").exists());
}

#[test]
fn wrong_sized_tile_fails_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let scene = write_scene(dir.path(), "scene.tif", 0);
    let out = dir.path().join("imgs");

    let bad = Tile::new(Array3::ones((3, 3, 1)), (0, 0), &scene);
    let result = visualise_features::<u8, _>(&[bad], &config(&out), &GeoTiffSource);
    assert!(matches!(result, Err(Error::TileShape { tile_size: 4, actual: 9 })));
    assert!(!out.join("scene.tif").exists());
}

#[test]
fn missing_source_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let ghost = dir.path().join("ghost.tif");
    let out = dir.path().join("imgs");

    let result = visualise_features::<u8, _>(&[mask_tile(&ghost, (0, 0))], &config(&out), &GeoTiffSource);
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn sequential_failure_keeps_earlier_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let alpha = write_scene(dir.path(), "alpha.tif", 20);
    let zeta = dir.path().join("zeta.tif");
    let out = dir.path().join("imgs");

    let features = vec![mask_tile(&zeta, (0, 0)), mask_tile(&alpha, (0, 0))];
    let result = visualise_features::<u8, _>(&features, &config(&out), &GeoTiffSource);

    assert!(matches!(result, Err(Error::Io(_))));
    assert!(out.join("alpha.tif").exists());
    assert!(!out.join("zeta.tif").exists());
}

#[test]
fn unknown_color_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let scene_path = write_scene(dir.path(), "scene.tif", 0);
    let scene: RasterImage<u8> = read_geotiff(&scene_path).unwrap();
    let out = dir.path().join("overlay.tif");

    let result = overlay(&Bitmap::zeros((13, 13)), &scene, &out, "purple", &GeoTiffSource);
    assert!(matches!(result, Err(Error::UnknownColor(name)) if name == "purple"));
    assert!(!out.exists());
}

#[test]
fn chained_overlays_compose_through_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let scene_path = write_scene(dir.path(), "scene.tif", 9);
    let scene: RasterImage<u8> = read_geotiff(&scene_path).unwrap();
    let out = dir.path().join("scene_results.tif");

    let mut first = Array2::zeros((13, 13));
    first[[0, 0]] = 1;
    first[[1, 1]] = 1;
    let mut second = Array2::zeros((13, 13));
    second[[1, 1]] = 1;

    let step = overlay(&Bitmap::from_array(first), &scene, &out, "blue", &GeoTiffSource).unwrap();
    let step = overlay(&Bitmap::from_array(second), &step, &out, "red", &GeoTiffSource).unwrap();

    assert_eq!(step.path(), Some(out.as_path()));
    assert_eq!(step.pixel(0, 0).unwrap(), vec![0, 0, 255]);
    assert_eq!(step.pixel(1, 1).unwrap(), vec![255, 0, 0]);
    assert_eq!(step.pixel(2, 2).unwrap(), vec![9, 9, 9]);

    let on_disk: RasterImage<u8> = read_geotiff(&out).unwrap();
    assert_eq!(on_disk.data(), step.data());
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_run_matches_sequential() {
    let dir = tempfile::tempdir().unwrap();
    let names = ["a.tif", "b.tif", "c.tif"];
    let scenes: Vec<PathBuf> = names.iter().map(|n| write_scene(dir.path(), n, 3)).collect();
    let features: Vec<Tile<u8>> = scenes.iter().map(|s| mask_tile(s, (4, 0))).collect();

    let seq_out = dir.path().join("seq");
    let par_out = dir.path().join("par");
    let seq = visualise_features::<u8, _>(&features, &config(&seq_out), &GeoTiffSource).unwrap();
    let par = visualise_features::<u8, _>(&features, &config(&par_out).with_parallel(true), &GeoTiffSource).unwrap();

    assert_eq!(seq.len(), 3);
    for (s, p) in seq.iter().zip(&par) {
        assert_eq!(s.file_name(), p.file_name());
        let s: RasterImage<u8> = read_geotiff(s).unwrap();
        let p: RasterImage<u8> = read_geotiff(p).unwrap();
        assert_eq!(s.data(), p.data());
    }
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_run_finishes_all_groups_and_reports_first_error() {
    let dir = tempfile::tempdir().unwrap();
    // a: missing scene, b: fine, c: tile of the wrong size
    let a = dir.path().join("a.tif");
    let b = write_scene(dir.path(), "b.tif", 5);
    let c = write_scene(dir.path(), "c.tif", 5);
    let out = dir.path().join("imgs");

    let features = vec![
        Tile::new(Array3::ones((3, 3, 1)), (0, 0), &c),
        mask_tile(&b, (0, 0)),
        mask_tile(&a, (0, 0)),
    ];
    let result = visualise_features::<u8, _>(&features, &config(&out).with_parallel(true), &GeoTiffSource);

    assert!(matches!(result, Err(Error::Io(_))));
    assert!(out.join("b.tif").exists());
    assert!(!out.join("c.tif").exists());
}
