//! Codec contracts through the item API.
//!
//! Each format is written by `Item::add_array`, read back from a reopened
//! dataset, and checked against what that format promises.

use ndarray::{arr2, Array2};
use tempfile::TempDir;

use jbof::{ArrayData, ArrayOptions, DType, DataSet, Format, JbofError, Metadata};

fn create_test_item() -> (TempDir, DataSet) {
    let temp = TempDir::new().expect("create temp dir");
    let dataset =
        DataSet::create(temp.path().join("set"), Metadata::new(), None).expect("create dataset");
    dataset.add_item(Some("item"), Metadata::new()).expect("add item");
    (temp, dataset)
}

fn reopen(temp: &TempDir) -> jbof::Item {
    DataSet::open(temp.path().join("set"), true)
        .unwrap()
        .get_item("item")
        .unwrap()
}

fn stereo(frames: usize) -> Array2<i16> {
    Array2::from_shape_fn((frames, 2), |(i, c)| {
        let v = ((i * 37 + c * 11) % 2000) as i16;
        if c == 0 {
            v
        } else {
            -v
        }
    })
}

#[test]
fn every_format_in_one_item() {
    let (temp, dataset) = create_test_item();
    let item = dataset.get_item("item").unwrap();
    let audio = ArrayOptions::new().samplerate(16_000);

    item.add_array("n", arr2(&[[1.5f64, 2.5], [3.5, 4.5]]), ArrayOptions::new())
        .unwrap();
    item.add_array("w", stereo(100), audio.clone().format(Format::Wav))
        .unwrap();
    item.add_array("f", stereo(100), audio.clone().format(Format::Flac))
        .unwrap();
    item.add_array("o", vec![0.0f32; 4096], audio.format(Format::Ogg))
        .unwrap();
    item.add_array("m", arr2(&[[1i32, 2, 3]]), ArrayOptions::new().format(Format::Mat))
        .unwrap();

    let item = reopen(&temp);
    let mut names = item.array_names().unwrap();
    names.sort();
    assert_eq!(names, vec!["f", "m", "n", "o", "w"]);

    let formats: Vec<_> = names
        .iter()
        .map(|name| item.get_array(name).unwrap().format())
        .collect();
    assert_eq!(
        formats,
        vec![Format::Flac, Format::Mat, Format::Npy, Format::Ogg, Format::Wav]
    );
}

#[test]
fn lossless_audio_is_exact() {
    let (temp, dataset) = create_test_item();
    let item = dataset.get_item("item").unwrap();
    let options = ArrayOptions::new().samplerate(44_100);

    item.add_array("w", stereo(500), options.clone().format(Format::Wav))
        .unwrap();
    item.add_array("f", stereo(500), options.format(Format::Flac))
        .unwrap();

    let item = reopen(&temp);
    for name in ["w", "f"] {
        let array = item.get_array(name).unwrap();
        assert_eq!(array.value, ArrayData::from(stereo(500)), "{}", name);
        assert_eq!(array.samplerate(), Some(44_100), "{}", name);
        assert_eq!(array.metadata["samplerate"], 44_100);
    }
}

#[test]
fn ogg_is_lossy_but_keeps_rate_and_shape() {
    let (temp, dataset) = create_test_item();
    let item = dataset.get_item("item").unwrap();
    let signal: Vec<f32> = (0..8000)
        .map(|i| (i as f32 * 0.05).sin() * 0.5)
        .collect();
    item.add_array(
        "o",
        signal,
        ArrayOptions::new().format(Format::Ogg).samplerate(8000),
    )
    .unwrap();

    let array = reopen(&temp).get_array("o").unwrap();
    assert_eq!(array.samplerate(), Some(8000));
    assert_eq!(array.value.dtype(), DType::Float32);
    assert_eq!(array.value.ndim(), 1);
    assert!(array.value.len().abs_diff(8000) <= 4096);
}

#[test]
fn mat_keeps_two_dimensional_arrays() {
    let (temp, dataset) = create_test_item();
    let item = dataset.get_item("item").unwrap();
    let value = arr2(&[[1.0f32, -2.0, 3.0], [4.0, 5.0, -6.0]]);
    item.add_array("m", value.clone(), ArrayOptions::new().format(Format::Mat))
        .unwrap();

    let array = reopen(&temp).get_array("m").unwrap();
    assert_eq!(array.value, ArrayData::from(value));
    assert_eq!(array.samplerate(), None);
    assert!(!array.metadata.contains_key("samplerate"));
}

#[test]
fn unsupported_dtype_leaves_no_files() {
    let (temp, dataset) = create_test_item();
    let item = dataset.get_item("item").unwrap();

    let err = item
        .add_array(
            "w",
            vec![1u8, 2, 3],
            ArrayOptions::new().format(Format::Wav).samplerate(8000),
        )
        .unwrap_err();
    assert!(matches!(err, JbofError::Codec(_)));
    assert!(!temp.path().join("set/item/w.wav").exists());
    assert!(!temp.path().join("set/item/w.json").exists());
}

#[test]
fn unknown_payload_extension_is_unsupported() {
    let (temp, dataset) = create_test_item();
    let dir = temp.path().join("set/item");
    std::fs::write(dir.join("x.mp3"), b"ID3").unwrap();
    std::fs::write(dir.join("x.json"), br#"{"_filename": "x.mp3"}"#).unwrap();

    let err = dataset.get_item("item").unwrap().get_array("x").unwrap_err();
    assert!(matches!(err, JbofError::UnsupportedFormat(_)));
}
