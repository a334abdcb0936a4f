//! A rolling file installed as the writer of the global `tracing`
//! subscriber keeps working while it rolls, contends for locks and deletes
//! old files.
//!
//! The global dispatcher can only be set once per process, so this file
//! holds a single test.

use chrono::NaiveDate;
use rolling_log_writer::{
    Config, FileWriterFactory, RetentionPolicy, RollPolicy, RollingFile, RollingInterval,
    WriterFactory, WriterOptions,
};
use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;
use tempfile::TempDir;

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_global_subscriber_survives_engine_diagnostics() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("app20240101.log"), b"old\n").unwrap();

    // held by another writer, so the first open is retried on the next sequence
    let _other = FileWriterFactory
        .open(&dir.path().join("app20240105.log"), &WriterOptions::default())
        .unwrap();

    let now = NaiveDate::from_ymd_opt(2024, 1, 5)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();

    // every event fills a file, so each one after the first rolls
    let roll = RollPolicy::default()
        .with_interval(RollingInterval::Day)
        .with_size_of_file(1)
        .with_roll_on_size(true);
    let retention = RetentionPolicy::default().with_number_of_files(2);
    let log = RollingFile::new(dir.path().join("app.log"), Config::new(roll, retention))
        .unwrap()
        .with_clock(move || now);

    let subscriber = tracing_subscriber::fmt()
        .with_writer(log)
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let (done_tx, done_rx) = mpsc::channel();
    std::thread::spawn(move || {
        tracing::info!("first event");
        tracing::info!("second event");
        let _ = done_tx.send(());
    });

    done_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("writing events through the global subscriber hung");

    assert_eq!(
        file_names(dir.path()),
        ["app20240105_001.log", "app20240105_002.log"]
    );

    // nothing but the events themselves reaches the files
    let first = fs::read_to_string(dir.path().join("app20240105_001.log")).unwrap();
    assert_eq!(first.lines().count(), 1);
    assert!(first.contains("first event"));

    let second = fs::read_to_string(dir.path().join("app20240105_002.log")).unwrap();
    assert_eq!(second.lines().count(), 1);
    assert!(second.contains("second event"));
}
