//! Result recording (CSV).
//!
//! One benchmark run appends exactly one row, written by the leader after the
//! metrics reduction. The header is written only when the file is created.
//!
//! Format:
//! ```csv
//! nodes,ranks,threads_per_rank,nx,ny,nz,steps,total_time_s,compute_time_s,comm_time_s,updates_per_sec,checksum,timestamp
//! 1,4,8,128,128,128,200,1.234567,1.100000,0.100000,339853290.12,2.3847e+06,2024-05-01T12:00:00+0200
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::config::RunConfig;
use crate::error::Result;
use crate::metrics::GlobalMetrics;

pub const CSV_HEADER: &str =
    "nodes,ranks,threads_per_rank,nx,ny,nz,steps,total_time_s,compute_time_s,comm_time_s,updates_per_sec,checksum,timestamp";

/// One data row of the results file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub nodes: usize,
    pub ranks: usize,
    pub threads_per_rank: usize,
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
    pub steps: usize,
    pub total_time: f64,
    pub compute_time: f64,
    pub comm_time: f64,
    pub updates_per_sec: f64,
    pub checksum: f64,
    pub timestamp: String,
}

impl ResultRow {
    /// Assemble a row from the reduced metrics. `nodes` is the scheduler hint and
    /// `threads_per_rank` the rayon workers available to one rank (the pool size
    /// divided by the rank count when ranks share one process). Neither affects
    /// the run itself.
    pub fn new(
        cfg: &RunConfig,
        metrics: &GlobalMetrics,
        nodes: usize,
        threads_per_rank: usize,
        at: DateTime<Local>,
    ) -> Self {
        Self {
            nodes,
            ranks: metrics.ranks,
            threads_per_rank,
            nx: cfg.grid.nx,
            ny: cfg.grid.ny,
            nz: cfg.grid.nz,
            steps: cfg.steps,
            total_time: metrics.max_total,
            compute_time: metrics.max_comp,
            comm_time: metrics.max_comm,
            updates_per_sec: metrics.updates_per_sec(cfg),
            checksum: metrics.checksum,
            timestamp: format_timestamp(&at),
        }
    }
}

/// Write the CSV header line.
pub fn write_header<W: Write>(writer: &mut W) -> Result<()> {
    writeln!(writer, "{CSV_HEADER}")?;
    Ok(())
}

/// Write one data row.
pub fn write_row<W: Write>(row: &ResultRow, writer: &mut W) -> Result<()> {
    writeln!(
        writer,
        "{},{},{},{},{},{},{},{:.6},{:.6},{:.6},{:.2},{},{}",
        row.nodes,
        row.ranks,
        row.threads_per_rank,
        row.nx,
        row.ny,
        row.nz,
        row.steps,
        row.total_time,
        row.compute_time,
        row.comm_time,
        row.updates_per_sec,
        format_sci(row.checksum, 4),
        row.timestamp,
    )?;
    Ok(())
}

/// Append-only results file.
#[derive(Debug, Clone)]
pub struct CsvRecorder {
    path: PathBuf,
}

impl CsvRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create missing parent directories, then append `row`, writing the header
    /// first if the file did not exist.
    pub fn append(&self, row: &ResultRow) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let is_new = !self.path.exists();
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if is_new {
            write_header(&mut file)?;
        }
        write_row(row, &mut file)?;
        tracing::debug!(path = %self.path.display(), is_new, "result row appended");
        Ok(())
    }
}

/// Scientific notation with a signed, at least two-digit exponent (`1.2346e+05`).
pub fn format_sci(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return value.to_string().to_lowercase();
    }
    let raw = format!("{value:.precision$e}");
    match raw.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => raw,
    }
}

/// ISO-8601 local time with numeric offset, e.g. `2024-05-01T12:00:00+0200`.
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%z").to_string()
}
