//! Day-keyed report history with bounded retention
//!
//! Reports are kept in memory and mirrored to one JSON file per calendar
//! day. The bucket for a day never exceeds [`MAX_REPORTS_PER_DAY`]
//! entries; appending beyond the cap evicts the oldest entry first.
//! Files are rewritten via write-to-temp-then-rename, so a crash
//! mid-write leaves either the prior history or the new one - never a
//! truncated file.

use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use tracing::{debug, trace};

use crate::Report;

/// Retention cap for a single day's bucket
pub const MAX_REPORTS_PER_DAY: usize = 100;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while persisting or loading reports
#[derive(Debug)]
pub enum StoreError {
    /// I/O error (file access, rename, etc.)
    Io(std::io::Error),

    /// Report serialization/deserialization error
    Serialization(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Io(err) => write!(f, "report store I/O error: {err}"),
            StoreError::Serialization(err) => {
                write!(f, "report serialization error: {err}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Io(err) => Some(err),
            StoreError::Serialization(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err)
    }
}

pub struct ReportStore {
    dir: PathBuf,

    /// Day the in-memory bucket belongs to
    day: NaiveDate,

    /// Today's reports, oldest first
    reports: VecDeque<Report>,
}

impl ReportStore {
    /// Open a store rooted at `dir`, seeding today's bucket from any
    /// existing day file.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let day = Utc::now().date_naive();
        let reports: VecDeque<Report> = load_day_file(&day_file(&dir, day))?.into();

        if !reports.is_empty() {
            debug!("seeded {} reports for {day} from disk", reports.len());
        }

        Ok(Self { dir, day, reports })
    }

    /// Append a report to today's bucket and persist it.
    ///
    /// The report is retained in memory even if persistence fails, so a
    /// transient disk error costs durability for this cycle, not history.
    pub fn append(&mut self, report: Report) -> StoreResult<()> {
        self.append_for_day(report, Utc::now().date_naive())
    }

    fn append_for_day(&mut self, report: Report, day: NaiveDate) -> StoreResult<()> {
        if day != self.day {
            debug!("day rollover {} -> {day}, starting empty bucket", self.day);
            self.day = day;
            self.reports.clear();
        }

        self.reports.push_back(report);
        while self.reports.len() > MAX_REPORTS_PER_DAY {
            self.reports.pop_front();
        }

        self.persist()
    }

    /// The most recent `n` reports of the current day, most recent last.
    pub fn recent(&self, n: usize) -> Vec<Report> {
        let skip = self.reports.len().saturating_sub(n);
        self.reports.iter().skip(skip).cloned().collect()
    }

    /// Load the full history for a given day; absent file means empty.
    pub fn load(&self, day: NaiveDate) -> StoreResult<Vec<Report>> {
        load_day_file(&day_file(&self.dir, day))
    }

    fn persist(&self) -> StoreResult<()> {
        let path = day_file(&self.dir, self.day);
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_vec_pretty(&self.reports)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        trace!("persisted {} reports to {}", self.reports.len(), path.display());
        Ok(())
    }
}

fn day_file(dir: &Path, day: NaiveDate) -> PathBuf {
    dir.join(format!("monitor_report_{}.json", day.format("%Y%m%d")))
}

fn load_day_file(path: &Path) -> StoreResult<Vec<Report>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(vec![]),
        Err(e) => Err(e.into()),
    }
}
