//! Tests for the append-only CSV result file.
//!
//! Each test works in its own directory under the system temp dir, named after the
//! test and the process id, and removes it afterwards.

use std::fs;
use std::path::PathBuf;

use chrono::{Local, TimeZone};
use slabstencil::metrics::{GlobalMetrics, LocalMetrics};
use slabstencil::output::{CsvRecorder, ResultRow, CSV_HEADER};
use slabstencil::{GlobalGrid, RunConfig};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("slabstencil-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn sample_row(cfg: &RunConfig) -> ResultRow {
    let metrics = GlobalMetrics::combine(&[
        LocalMetrics { comm_time: 0.25, comp_time: 1.5, total_time: 2.0, checksum: 1000.0 },
        LocalMetrics { comm_time: 0.5, comp_time: 1.25, total_time: 2.0, checksum: 234.5 },
    ]);
    let at = Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    ResultRow::new(cfg, &metrics, 3, 8, at)
}

/// Missing directories are created and the header is written exactly once.
#[test]
fn header_written_once_rows_appended() {
    let dir = scratch_dir("append");
    let path = dir.join("nested").join("scaling.csv");
    let cfg = RunConfig::new(GlobalGrid::new(16, 8, 4).unwrap(), 10, path.clone());
    let recorder = CsvRecorder::new(path.clone());

    let row = sample_row(&cfg);
    recorder.append(&row).unwrap();
    recorder.append(&row).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADER);
    assert_eq!(lines[1], lines[2]);
    assert_eq!(text.matches("nodes,ranks").count(), 1);

    let _ = fs::remove_dir_all(&dir);
}

/// Column values and number formats of one row.
#[test]
fn row_columns() {
    let dir = scratch_dir("columns");
    let path = dir.join("row.csv");
    let cfg = RunConfig::new(GlobalGrid::new(16, 8, 4).unwrap(), 10, path.clone());
    CsvRecorder::new(path.clone()).append(&sample_row(&cfg)).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let cols: Vec<&str> = text.lines().nth(1).unwrap().split(',').collect();
    assert_eq!(cols.len(), 13);
    assert_eq!(&cols[..7], &["3", "2", "8", "16", "8", "4", "10"]);
    assert_eq!(cols[7], "2.000000");
    assert_eq!(cols[8], "1.500000");
    assert_eq!(cols[9], "0.500000");
    // 16*8*4*10 updates over 2 s
    assert_eq!(cols[10], "2560.00");
    assert_eq!(cols[11], "1.2345e+03");
    assert!(cols[12].starts_with("2024-05-01T12:00:00"));
    let offset = &cols[12]["2024-05-01T12:00:00".len()..];
    assert_eq!(offset.len(), 5);
    assert!(offset.starts_with('+') || offset.starts_with('-'));

    let _ = fs::remove_dir_all(&dir);
}

/// A path whose parent is a regular file cannot be created.
#[test]
fn unwritable_path_is_an_io_error() {
    let dir = scratch_dir("blocked");
    fs::create_dir_all(&dir).unwrap();
    let blocker = dir.join("file");
    fs::write(&blocker, "x").unwrap();
    let cfg = RunConfig::new(GlobalGrid::new(4, 4, 4).unwrap(), 1, blocker.join("out.csv"));
    let err = CsvRecorder::new(cfg.output.clone()).append(&sample_row(&cfg)).unwrap_err();
    assert!(matches!(err, slabstencil::StencilError::Io(_)));
    assert_eq!(err.exit_code(), 4);

    let _ = fs::remove_dir_all(&dir);
}
