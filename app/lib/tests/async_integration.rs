//! Integration tests for async compression and decompression.
//!
//! These tests verify that async methods work correctly and integrate
//! properly with the Tokio runtime.

#![cfg(feature = "async")]

use als_engine::convert::{CsvAdapter, TableSource};
use als_engine::{AlsCompressor, AlsError, AlsParser, Column, CompressorConfig, Table, Value};

fn sample_table() -> Table<'static> {
    Table::new(vec![
        Column::new("id", (1..=100).map(Value::Integer).collect()),
        Column::new(
            "status",
            (0..100)
                .map(|i| Value::text(if i < 50 { "active" } else { "idle" }))
                .collect(),
        ),
    ])
    .unwrap()
}

#[tokio::test]
async fn test_compress_async_matches_sync() {
    let compressor = AlsCompressor::new();
    let table = sample_table();

    let expected = compressor.compress(&table).unwrap();
    let als = compressor.compress_async(table).await.unwrap();
    assert_eq!(als, expected);
    assert!(als.contains("#status text rle active*50 idle*50"));
}

#[tokio::test]
async fn test_decode_async_round_trip() {
    let table = sample_table();
    let als = AlsCompressor::new().compress(&table).unwrap();

    let decoded = AlsParser::new().decode_async(als).await.unwrap();
    assert_eq!(decoded, table);
}

#[tokio::test]
async fn test_async_from_csv() {
    let csv = "id,name\n1,Alice\n2,Bob\n3,Charlie\n";
    let table = CsvAdapter::new().read_table(csv).unwrap().into_owned();

    let als = AlsCompressor::new().compress_async(table).await.unwrap();
    let decoded = AlsParser::new().decode_async(als).await.unwrap();
    assert_eq!(decoded.column_names(), vec!["id", "name"]);
    assert_eq!(decoded.row_count(), 3);
}

#[tokio::test]
async fn test_decode_async_corrupt() {
    let err = AlsParser::new()
        .decode_async("!v1 x 1\n#a int raw 1\n".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, AlsError::CorruptStream { line: 1, .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_async_compression() {
    let compressor =
        AlsCompressor::with_config(CompressorConfig::new().with_parallelism(2)).unwrap();
    let expected = compressor.compress(&sample_table()).unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let compressor = compressor.clone();
            tokio::spawn(async move { compressor.compress_async(sample_table()).await })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap().unwrap(), expected);
    }
}
