#![cfg(feature = "async")]
//! Tests for the tokio background adapter.

use std::io::Cursor;

use tempfile::NamedTempFile;

use fixedlen::record::field::{FieldSpec, Record};
use fixedlen::record::file::RecordFile;
use fixedlen::record::types::SemanticType;
use fixedlen::util::background::BackgroundRecordFile;
use fixedlen::FlfError;

#[derive(Default, Debug, Clone, PartialEq)]
struct Reading {
    sensor: u16,
    value: f32,
}

impl Record for Reading {
    fn fields() -> Vec<FieldSpec<Self>> {
        vec![
            FieldSpec::new(
                "sensor",
                SemanticType::UInt16,
                |r: &Reading| Some(r.sensor.into()),
                |r: &mut Reading, v| {
                    r.sensor = v.try_into()?;
                    Ok(())
                },
            )
            .order(0),
            FieldSpec::new(
                "value",
                SemanticType::Float32,
                |r: &Reading| Some(r.value.into()),
                |r: &mut Reading, v| {
                    r.value = v.try_into()?;
                    Ok(())
                },
            )
            .order(1),
        ]
    }
}

fn reading(sensor: u16) -> Reading {
    Reading {
        sensor,
        value: f32::from(sensor) / 2.0,
    }
}

#[tokio::test]
async fn test_append_and_read_in_background() {
    let file = RecordFile::<Reading, _>::from_bytes(Vec::new()).unwrap();
    let bg = BackgroundRecordFile::new(file);

    for sensor in 0..4 {
        assert_eq!(bg.append(reading(sensor)).await.unwrap(), u64::from(sensor));
    }
    assert_eq!(bg.record_count().await.unwrap(), 4);
    assert_eq!(bg.read_record(2).await.unwrap(), reading(2));

    bg.write_record_at(2, reading(9)).await.unwrap();
    assert_eq!(bg.read_record(2).await.unwrap(), reading(9));

    let file: RecordFile<Reading, Cursor<Vec<u8>>> = bg.into_inner().ok().unwrap();
    assert_eq!(file.into_inner().into_inner().len(), 24);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_appends_are_serialized() {
    let tmp = NamedTempFile::new().unwrap();
    let bg = BackgroundRecordFile::new(RecordFile::<Reading>::create(tmp.path()).unwrap());

    let tasks: Vec<_> = (0..16u16)
        .map(|sensor| {
            let bg = bg.clone();
            tokio::spawn(async move { bg.append(reading(sensor)).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }
    bg.flush().await.unwrap();

    assert_eq!(bg.record_count().await.unwrap(), 16);
    let mut sensors: Vec<u16> = Vec::new();
    for i in 0..16 {
        sensors.push(bg.read_record(i).await.unwrap().sensor);
    }
    sensors.sort_unstable();
    assert_eq!(sensors, (0..16).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_errors_cross_the_thread_boundary() {
    let bg = BackgroundRecordFile::new(RecordFile::<Reading, _>::from_bytes(vec![0u8; 6]).unwrap());
    assert!(matches!(bg.read_record(1).await, Err(FlfError::Io(_))));

    let clone = bg.clone();
    assert!(clone.into_inner().is_err());
}
