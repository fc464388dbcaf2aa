//! Shapefile reading and end-to-end imports into the SQLite layer store.

use camino::Utf8PathBuf;
use geo::{Geometry, Point};
use rstest::{fixture, rstest};
use terrane_core::{AttributeValue, FeatureDataset, SqliteLayerStore};
use terrane_data::{
    DatasetError, ImportError, LayerImporter, ShapefileDataset, UnpairedStream,
};

mod support;

use support::{FixtureDir, RecordingObserver, ShapefileBuilder};

const NAD83: &str = r#"GEOGCS["NAD83",DATUM["North_American_Datum_1983"]]"#;

#[fixture]
fn fixture_dir() -> FixtureDir {
    FixtureDir::new()
}

fn trees() -> ShapefileBuilder {
    ShapefileBuilder::new()
        .character_field("species", 12)
        .numeric_field("height", 6)
        .point(1.0, 2.0)
        .null_shape()
        .point(3.5, -4.25)
        .row(&["oak", "12"])
        .row(&["ash", "7"])
        .row(&["elm", "30"])
        .projection(NAD83)
}

#[rstest]
fn opens_dataset_without_extension(fixture_dir: FixtureDir) {
    let base = trees().write(fixture_dir.path(), "trees");

    let dataset = ShapefileDataset::open(&base).expect("open dataset");
    assert_eq!(dataset.layer_name(), "trees");
    assert_eq!(dataset.path(), base.with_extension("shp").as_path());
    assert_eq!(dataset.field_names(), ["species", "height"]);
    assert_eq!(
        dataset
            .coordinate_reference_system()
            .and_then(|crs| crs.name()),
        Some("NAD83")
    );
}

#[rstest]
fn streams_shapes_and_rows_in_file_order(fixture_dir: FixtureDir) {
    let base = trees().write(fixture_dir.path(), "trees");
    let mut dataset = ShapefileDataset::open(&base.with_extension("shp")).expect("open dataset");

    let streams = dataset.streams();
    let geometries: Vec<_> = streams
        .geometries
        .map(|record| record.expect("shape decodes"))
        .collect();
    let rows: Vec<_> = streams
        .attributes
        .map(|record| record.expect("row decodes"))
        .collect();

    assert_eq!(geometries.len(), 3);
    assert_eq!(geometries.first(), Some(&Geometry::Point(Point::new(1.0, 2.0))));
    assert_eq!(
        rows.first().map(Vec::as_slice),
        Some([AttributeValue::from("oak"), AttributeValue::Number(12.0)].as_slice())
    );
    assert_eq!(rows.len(), 3);
}

#[rstest]
fn missing_projection_means_no_crs(fixture_dir: FixtureDir) {
    let base = ShapefileBuilder::new()
        .point(0.0, 0.0)
        .write(fixture_dir.path(), "bare");
    let dataset = ShapefileDataset::open(&base).expect("open dataset");
    assert!(dataset.coordinate_reference_system().is_none());
    assert!(dataset.field_names().is_empty());
}

#[rstest]
#[case("shp", "shape")]
#[case("dbf", "attribute")]
fn reports_missing_components(
    fixture_dir: FixtureDir,
    #[case] removed: &str,
    #[case] component: &str,
) {
    let base = trees().write(fixture_dir.path(), "trees");
    std::fs::remove_file(base.with_extension(removed)).expect("remove component");

    let err = ShapefileDataset::open(&base).expect_err("component missing");
    match err {
        DatasetError::NotFound {
            component: found,
            path,
        } => {
            assert_eq!(found, component);
            assert_eq!(path.extension(), Some(removed));
        }
        other => panic!("expected a not-found error, got {other:?}"),
    }
}

#[rstest]
#[case("shp", "shape")]
#[case("dbf", "attribute")]
fn rejects_corrupt_headers(
    fixture_dir: FixtureDir,
    #[case] corrupted: &str,
    #[case] component: &str,
) {
    let base = trees().write(fixture_dir.path(), "trees");
    std::fs::write(base.with_extension(corrupted), b"junk").expect("corrupt header");

    let err = ShapefileDataset::open(&base).expect_err("corrupt header");
    match err {
        DatasetError::Format {
            component: found,
            path,
            ..
        } => {
            assert_eq!(found, component);
            assert_eq!(path.extension(), Some(corrupted));
        }
        other => panic!("expected a format error, got {other:?}"),
    }
}

#[rstest]
#[case("shp")]
#[case("dbf")]
fn corrupt_headers_create_no_layer(fixture_dir: FixtureDir, #[case] corrupted: &str) {
    let base = trees().write(fixture_dir.path(), "trees");
    std::fs::write(base.with_extension(corrupted), b"junk").expect("corrupt header");
    let store = SqliteLayerStore::open_in_memory().expect("open store");
    let mut importer = LayerImporter::new(store, 10).expect("valid interval");

    let err = importer.import_path(&base, None).expect_err("corrupt header");

    assert!(matches!(err, ImportError::Dataset(DatasetError::Format { .. })));
    assert!(importer.store().layer_names().expect("list").is_empty());
}

#[rstest]
fn corrupt_shape_record_skips_only_that_record(fixture_dir: FixtureDir) {
    let base = ShapefileBuilder::new()
        .character_field("species", 12)
        .point(1.0, 2.0)
        .point_tagged(99, 5.0, 5.0)
        .point(3.5, -4.25)
        .row(&["oak"])
        .row(&["ash"])
        .row(&["elm"])
        .write(fixture_dir.path(), "trees");
    let store = SqliteLayerStore::open_in_memory().expect("open store");
    let mut importer = LayerImporter::new(store, 10)
        .expect("valid interval")
        .with_observer(RecordingObserver::default());

    let report = importer.import_path(&base, None).expect("import succeeds");

    assert_eq!(report.records_read, 3);
    assert_eq!(report.features_added, 2);
    assert_eq!(report.skipped_invalid, 1);
    assert_eq!(report.skipped_empty, 0);
    let skipped: Vec<_> = importer
        .observer()
        .skipped
        .iter()
        .map(|(record, _)| *record)
        .collect();
    assert_eq!(skipped, [2]);

    let features = importer.store().features("trees").expect("load features");
    let pairs: Vec<_> = features
        .iter()
        .map(|feature| (feature.geometry.clone(), feature.value("species").cloned()))
        .collect();
    assert_eq!(
        pairs,
        [
            (
                Geometry::Point(Point::new(1.0, 2.0)),
                Some(AttributeValue::from("oak"))
            ),
            (
                Geometry::Point(Point::new(3.5, -4.25)),
                Some(AttributeValue::from("elm"))
            ),
        ]
    );
}

#[rstest]
fn deleted_attribute_rows_are_reported(fixture_dir: FixtureDir) {
    let base = ShapefileBuilder::new()
        .character_field("species", 12)
        .point(1.0, 2.0)
        .point(2.0, 3.0)
        .point(3.0, 4.0)
        .row(&["oak"])
        .deleted_row(&["ash"])
        .row(&["elm"])
        .write(fixture_dir.path(), "trees");
    let store = SqliteLayerStore::open_in_memory().expect("open store");
    let mut importer = LayerImporter::new(store, 10)
        .expect("valid interval")
        .with_observer(RecordingObserver::default());

    let report = importer.import_path(&base, None).expect("import succeeds");

    assert_eq!(report.features_added, 2);
    assert_eq!(report.unpaired, Some(UnpairedStream::Geometries));
    assert_eq!(importer.observer().missing_rows, [(3, 2)]);
}

#[rstest]
fn imports_into_sqlite_and_skips_null_shapes(fixture_dir: FixtureDir) {
    let base = trees().write(fixture_dir.path(), "trees");
    let store_path: Utf8PathBuf = fixture_dir.path().join("layers.db");
    let store = SqliteLayerStore::open(&store_path).expect("open store");
    let mut importer = LayerImporter::new(store, 2)
        .expect("valid interval")
        .with_observer(RecordingObserver::default());

    let report = importer.import_path(&base, None).expect("import succeeds");

    assert_eq!(report.layer, "trees");
    assert_eq!(report.records_read, 3);
    assert_eq!(report.features_added, 2);
    assert_eq!(report.skipped_empty, 1);
    assert_eq!(report.batches, 2);
    assert_eq!(importer.observer().skipped, [(2, "empty".to_owned())]);

    let store = importer.into_store();
    let layer = store.layer("trees").expect("query").expect("layer exists");
    assert_eq!(layer.field_names(), ["species", "height"]);
    assert_eq!(
        layer.coordinate_reference_system().map(|crs| crs.wkt()),
        Some(NAD83)
    );
    let features = store.features("trees").expect("load features");
    let species: Vec<_> = features
        .iter()
        .filter_map(|feature| feature.value("species").cloned())
        .collect();
    assert_eq!(species, [AttributeValue::from("oak"), AttributeValue::from("elm")]);
}

#[rstest]
fn explicit_layer_name_overrides_the_stem(fixture_dir: FixtureDir) {
    let base = trees().write(fixture_dir.path(), "trees");
    let store = SqliteLayerStore::open_in_memory().expect("open store");
    let mut importer = LayerImporter::new(store, 10).expect("valid interval");

    importer
        .import_path(&base, Some("forest"))
        .expect("import succeeds");

    let names = importer.store().layer_names().expect("list layers");
    assert_eq!(names, ["forest"]);
}

#[rstest]
fn truncates_to_the_shorter_stream(fixture_dir: FixtureDir) {
    let base = ShapefileBuilder::new()
        .numeric_field("id", 4)
        .point(0.0, 0.0)
        .point(1.0, 1.0)
        .point(2.0, 2.0)
        .row(&["1"])
        .write(fixture_dir.path(), "short");
    let store = SqliteLayerStore::open_in_memory().expect("open store");
    let mut importer = LayerImporter::new(store, 10)
        .expect("valid interval")
        .with_observer(RecordingObserver::default());

    let report = importer.import_path(&base, None).expect("import succeeds");

    assert_eq!(report.features_added, 1);
    assert_eq!(report.unpaired, Some(UnpairedStream::Geometries));
    assert_eq!(importer.observer().unpaired, [UnpairedStream::Geometries]);
}

#[rstest]
fn missing_dataset_fails_before_any_layer_exists(fixture_dir: FixtureDir) {
    let store = SqliteLayerStore::open_in_memory().expect("open store");
    let mut importer = LayerImporter::new(store, 10).expect("valid interval");

    let err = importer
        .import_path(&fixture_dir.path().join("absent"), None)
        .expect_err("dataset missing");

    assert!(matches!(
        err,
        ImportError::Dataset(DatasetError::NotFound { component: "shape", .. })
    ));
    assert!(importer.store().layer_names().expect("list").is_empty());
}
