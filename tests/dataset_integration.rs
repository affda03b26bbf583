//! Integration tests for the dataset API.
//!
//! These tests exercise DataSet, Item, and Array together against real
//! directories, and pin the on-disk JSON layout.

use std::fs;

use serde_json::{json, Value};
use tempfile::TempDir;

use jbof::{ArrayData, ArrayOptions, DataSet, Format, JbofError, Metadata, Query};

// =============================================================================
// Test Fixtures
// =============================================================================

fn meta(value: Value) -> Metadata {
    value.as_object().cloned().expect("object")
}

/// A temp directory holding a fresh dataset at `<temp>/set`.
struct TestSet {
    dir: TempDir,
    dataset: DataSet,
}

impl TestSet {
    fn new(itemformat: Option<&str>) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let dataset = DataSet::create(dir.path().join("set"), meta(json!({"kind": "dataset"})), itemformat)
            .expect("failed to create dataset");
        Self { dir, dataset }
    }

    fn path(&self) -> std::path::PathBuf {
        self.dir.path().join("set")
    }

    fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path().join(rel)).expect("read file")
    }

    fn item_names(dataset: &DataSet) -> Vec<String> {
        let mut names: Vec<_> = dataset
            .all_items()
            .unwrap()
            .map(|item| item.unwrap().name().to_string())
            .collect();
        names.sort();
        names
    }
}

// =============================================================================
// End-to-end
// =============================================================================

#[test]
fn create_add_reopen_read() {
    let set = TestSet::new(None);
    let item = set
        .dataset
        .add_item(None, meta(json!({"kind": "item"})))
        .unwrap();
    item.add_array(
        "ones",
        vec![1.0f64; 10],
        ArrayOptions::new().metadata(meta(json!({"kind": "array"}))),
    )
    .unwrap();

    let reopened = DataSet::open(set.path(), true).unwrap();
    assert_eq!(reopened.metadata(), &meta(json!({"kind": "dataset"})));

    let items: Vec<_> = reopened.all_items().unwrap().collect::<Result<_, _>>().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].metadata().unwrap(), meta(json!({"kind": "item"})));

    let ones = items[0].get_array("ones").unwrap();
    assert_eq!(ones.value, ArrayData::from(vec![1.0f64; 10]));
    assert_eq!(ones.metadata, meta(json!({"kind": "array"})));
    assert_eq!(ones.format(), Format::Npy);
    assert_eq!(ones.source.filename, "ones.npy");
    assert_eq!(ones.source.item, items[0].name());
}

#[test]
fn on_disk_layout() {
    let set = TestSet::new(Some("{speaker}-{take:03d}"));
    let item = set
        .dataset
        .add_item(None, meta(json!({"speaker": "ann", "take": 7})))
        .unwrap();
    item.add_array(
        "audio",
        vec![0i16, 100, -100, 0],
        ArrayOptions::new()
            .format(Format::Wav)
            .samplerate(8000)
            .metadata(meta(json!({"mic": "left"}))),
    )
    .unwrap();

    insta::assert_snapshot!(set.read("_metadata.json"), @r###"
    {
      "_itemformat": "{speaker}-{take:03d}",
      "kind": "dataset"
    }
    "###);
    insta::assert_snapshot!(set.read("ann-007/_metadata.json"), @r###"
    {
      "speaker": "ann",
      "take": 7
    }
    "###);
    insta::assert_snapshot!(set.read("ann-007/audio.json"), @r###"
    {
      "_filename": "audio.wav",
      "mic": "left",
      "samplerate": 8000
    }
    "###);
    assert!(set.path().join("ann-007/audio.wav").is_file());
}

#[test]
fn reads_are_idempotent() {
    let set = TestSet::new(None);
    let item = set.dataset.add_item(Some("a"), Metadata::new()).unwrap();
    item.add_array("x", vec![1i32, 2, 3], ArrayOptions::new())
        .unwrap();

    let reopened = DataSet::open(set.path(), true).unwrap();
    let item = reopened.get_item("a").unwrap();
    let first = item.get_array("x").unwrap();
    item.clear_cache();
    let second = item.get_array("x").unwrap();
    assert_eq!(first.value, second.value);
    assert_eq!(first.metadata, second.metadata);
    assert_eq!(TestSet::item_names(&reopened), TestSet::item_names(&reopened));
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn find_items_by_value_and_list() {
    let set = TestSet::new(None);
    for (name, foo) in [("first", "bar"), ("second", "baz"), ("third", "quz")] {
        set.dataset
            .add_item(Some(name), meta(json!({ "foo": foo })))
            .unwrap();
    }

    let names = |query: Query| -> Vec<String> {
        let mut names: Vec<_> = set
            .dataset
            .find_items(query)
            .unwrap()
            .map(|item| item.unwrap().name().to_string())
            .collect();
        names.sort();
        names
    };

    assert_eq!(names(Query::new().equals("foo", "bar")), vec!["first"]);
    assert_eq!(
        names(Query::new().one_of("foo", ["bar", "baz"])),
        vec!["first", "second"]
    );
    assert!(names(Query::new().equals("doesnotexist", "x")).is_empty());
}

// =============================================================================
// Failure leaves state unchanged
// =============================================================================

#[test]
fn duplicate_array_keeps_original() {
    let set = TestSet::new(None);
    let item = set.dataset.add_item(Some("a"), Metadata::new()).unwrap();
    item.add_array("x", vec![1u8], ArrayOptions::new()).unwrap();

    let err = item
        .add_array("x", vec![2u8], ArrayOptions::new().format(Format::Mat))
        .unwrap_err();
    assert!(matches!(err, JbofError::AlreadyExists(_)));
    assert!(!set.path().join("a/x.mat").exists());

    item.clear_cache();
    assert_eq!(item.get_array("x").unwrap().value, ArrayData::from(vec![1u8]));
}

#[test]
fn audio_without_samplerate_writes_nothing() {
    let set = TestSet::new(None);
    let item = set.dataset.add_item(Some("a"), Metadata::new()).unwrap();

    for format in [Format::Wav, Format::Flac, Format::Ogg] {
        let err = item
            .add_array("audio", vec![0.0f32; 16], ArrayOptions::new().format(format))
            .unwrap_err();
        assert!(matches!(err, JbofError::MissingParameter { .. }));
    }
    assert!(item.array_names().unwrap().is_empty());
    assert_eq!(
        fs::read_dir(set.path().join("a")).unwrap().count(),
        1,
        "only _metadata.json remains"
    );
}

#[test]
fn readonly_dataset_changes_nothing() {
    let set = TestSet::new(None);
    let item = set.dataset.add_item(Some("a"), Metadata::new()).unwrap();
    item.add_array("x", vec![1i64], ArrayOptions::new()).unwrap();
    let before = set.dataset.calculate_hash().unwrap();

    let readonly = DataSet::open(set.path(), true).unwrap();
    let item = readonly.get_item("a").unwrap();
    let array = item.get_array("x").unwrap();

    assert!(matches!(
        item.add_array("y", vec![1i64], ArrayOptions::new()),
        Err(JbofError::ReadOnly(_))
    ));
    assert!(matches!(item.delete_array(&array), Err(JbofError::ReadOnly(_))));
    assert!(matches!(readonly.delete_item(&item), Err(JbofError::ReadOnly(_))));
    assert!(matches!(
        readonly.add_item(Some("b"), Metadata::new()),
        Err(JbofError::ReadOnly(_))
    ));

    assert_eq!(readonly.calculate_hash().unwrap(), before);
    assert_eq!(TestSet::item_names(&readonly), vec!["a"]);
}

// =============================================================================
// Deletion
// =============================================================================

#[test]
fn deleted_things_disappear() {
    let set = TestSet::new(None);
    let a = set.dataset.add_item(Some("a"), Metadata::new()).unwrap();
    set.dataset.add_item(Some("b"), Metadata::new()).unwrap();
    let x = a.add_array("x", vec![1.0f32], ArrayOptions::new()).unwrap();
    a.add_array("y", vec![2.0f32], ArrayOptions::new()).unwrap();

    a.delete_array(&x).unwrap();
    assert_eq!(a.array_names().unwrap(), vec!["y"]);
    assert!(a.get_array("x").unwrap_err().is_not_found());
    assert!(!set.path().join("a/x.npy").exists());
    assert!(!set.path().join("a/x.json").exists());

    set.dataset.delete_item("b").unwrap();
    assert_eq!(TestSet::item_names(&set.dataset), vec!["a"]);
    let reopened = DataSet::open(set.path(), true).unwrap();
    assert_eq!(TestSet::item_names(&reopened), vec!["a"]);
}

#[test]
fn array_from_other_item_is_rejected() {
    let set = TestSet::new(None);
    let a = set.dataset.add_item(Some("a"), Metadata::new()).unwrap();
    let b = set.dataset.add_item(Some("b"), Metadata::new()).unwrap();
    let x = a.add_array("x", vec![1u8], ArrayOptions::new()).unwrap();

    assert!(matches!(b.delete_array(&x), Err(JbofError::TypeMismatch(_))));
    assert!(a.has_array("x").unwrap());
}

// =============================================================================
// Files and legacy sidecars
// =============================================================================

#[test]
fn add_array_from_wav_file_reads_samplerate() {
    let set = TestSet::new(None);
    let item = set.dataset.add_item(Some("a"), Metadata::new()).unwrap();

    let source = set.dir.path().join("tone.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 22_050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&source, spec).unwrap();
    for s in [0i16, 1000, -1000, 0] {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();

    let array = item
        .add_array_from_file("tone", &source, meta(json!({"samplerate": 1})))
        .unwrap();
    assert_eq!(array.samplerate(), Some(22_050));
    assert_eq!(array.value, ArrayData::from(vec![0i16, 1000, -1000, 0]));
    assert_eq!(
        fs::read(&source).unwrap(),
        fs::read(set.path().join("a/tone.wav")).unwrap()
    );
}

#[test]
fn legacy_full_path_filename_resolves_by_basename() {
    let set = TestSet::new(None);
    let item = set.dataset.add_item(Some("a"), Metadata::new()).unwrap();
    item.add_array("x", vec![3.0f64], ArrayOptions::new()).unwrap();

    fs::write(
        set.path().join("a/x.json"),
        r#"{"_filename": "/old/machine/set/a/x.npy", "note": "legacy"}"#,
    )
    .unwrap();

    let reopened = DataSet::open(set.path(), true).unwrap();
    let array = reopened.get_item("a").unwrap().get_array("x").unwrap();
    assert_eq!(array.value, ArrayData::from(vec![3.0f64]));
    assert_eq!(array.metadata["note"], "legacy");
}

// =============================================================================
// Hashing
// =============================================================================

#[test]
fn hash_ignores_names_and_dataset_metadata() {
    let left = TestSet::new(None);
    let right = TestSet::new(Some("{n}"));

    for (dataset, names) in [(&left.dataset, ["a", "b"]), (&right.dataset, ["zz", "yy"])] {
        for (name, value) in names.iter().zip([1.0f64, 2.0]) {
            let item = dataset
                .add_item(Some(*name), meta(json!({ "n": value })))
                .unwrap();
            item.add_array("v", vec![value; 4], ArrayOptions::new())
                .unwrap();
        }
    }

    let hash = left.dataset.calculate_hash().unwrap();
    assert_eq!(hash, right.dataset.calculate_hash().unwrap());
    assert_eq!(hash.as_str().len(), 64);

    left.dataset
        .get_item("a")
        .unwrap()
        .add_array("extra", vec![0u8], ArrayOptions::new())
        .unwrap();
    assert_ne!(left.dataset.calculate_hash().unwrap(), hash);
}

// =============================================================================
// Serialization
// =============================================================================

#[test]
fn item_handles_serialize_and_reopen() {
    let set = TestSet::new(None);
    let item = set.dataset.add_item(Some("a"), meta(json!({"v": 1}))).unwrap();
    item.add_array("x", vec![5i16], ArrayOptions::new()).unwrap();

    let json = serde_json::to_string(&item).unwrap();
    let back: jbof::Item = serde_json::from_str(&json).unwrap();
    assert_eq!(back.name(), "a");
    assert_eq!(back.metadata().unwrap(), meta(json!({"v": 1})));
    assert_eq!(back.get_array("x").unwrap().value, ArrayData::from(vec![5i16]));
}
