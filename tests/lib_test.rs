//! Tests for top-level LogWriter / LogReader API

use trueno_vislog::image::ImageConfig;
use trueno_vislog::storage::RecordStore;
use trueno_vislog::{Error, LogWriter, DEFAULT_MODE};

#[test]
fn test_log_writer_builder_defaults() {
    let writer = LogWriter::builder().build().unwrap();
    assert_eq!(writer.mode(), DEFAULT_MODE);
    assert!(writer.store().persist_dir().is_none());
}

#[test]
fn test_log_writer_builder_chain() {
    let writer = LogWriter::builder()
        .mode("validation")
        .persist_dir("/tmp/trueno-vislog-builder")
        .build()
        .unwrap();
    assert_eq!(writer.mode(), "validation");
    assert!(writer.store().persist_dir().is_some());
}

#[test]
fn test_log_writer_builder_rejects_bad_mode() {
    assert!(matches!(
        LogWriter::builder().mode("").build(),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
        LogWriter::builder().mode("a/b").build(),
        Err(Error::InvalidConfig(_))
    ));
    assert!(matches!(
        LogWriter::builder().mode("tr%ain").build(),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_as_mode_rejects_bad_mode() {
    let writer = LogWriter::builder().build().unwrap();
    for bad in ["", "a/b", "tr%ain"] {
        assert!(matches!(writer.as_mode(bad), Err(Error::InvalidConfig(_))));
    }
    assert_eq!(writer.as_mode("test").unwrap().mode(), "test");
}

#[test]
fn test_new_series_register_captions() {
    let writer = LogWriter::builder().build().unwrap();
    writer.new_scalar::<i64>("tokens").unwrap();
    writer.new_scalar::<i64>("tokens").unwrap();
    writer
        .new_image("layer1/weights", &ImageConfig::default())
        .unwrap();

    let store = writer.store();
    assert_eq!(store.captions("train/tokens"), vec!["train/tokens"]);
    assert_eq!(
        store.captions("train/layer1%weights"),
        vec!["train/layer1%weights"]
    );
}

#[test]
fn test_new_image_rejects_invalid_config() {
    let writer = LogWriter::builder().build().unwrap();
    let config = ImageConfig {
        sample_period: 0,
        ..ImageConfig::default()
    };
    assert!(matches!(
        writer.new_image("x", &config),
        Err(Error::InvalidConfig(_))
    ));
    assert!(writer.store().tags().is_empty());
}

#[test]
fn test_modes_share_store_and_stay_separate() {
    let train = LogWriter::builder().build().unwrap();
    let test = train.as_mode("test").unwrap();

    train.new_scalar::<f32>("loss").unwrap().add_record(0, 0.9).unwrap();
    test.new_scalar::<f32>("loss").unwrap().add_record(0, 1.1).unwrap();
    test.new_scalar::<f32>("acc").unwrap();

    assert_eq!(train.reader().tags(), vec!["loss"]);
    assert_eq!(test.reader().tags(), vec!["acc", "loss"]);

    let test_loss = test.reader().scalar::<f32>("loss").records().unwrap();
    assert_eq!(test_loss, vec![1.1]);
}

#[test]
fn test_reader_caption_resolution() {
    let writer = LogWriter::builder().mode("test").build().unwrap();
    writer.new_image("conv/out", &ImageConfig::default()).unwrap();

    let reader = writer.reader();
    assert_eq!(reader.image("conv/out").caption().unwrap(), "conv/out");
    assert_eq!(reader.scalar::<f32>("conv/out").caption().unwrap(), "test/conv%out");
}
