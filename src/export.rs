//! JSON session report
//!
//! Captures the session state, the active network and the latest readings.
//! A reading that failed is written as its error, never as zero.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

use crate::domain::{Amount, FetchError, NetworkConfig, SessionState};

/// A reading as it appears in a report
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportValue<T> {
    Ok { value: T },
    Unavailable { error: String },
    NotFetched,
}

impl<T> From<Result<T, FetchError>> for ReportValue<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => ReportValue::Ok { value },
            Err(err) => ReportValue::Unavailable {
                error: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub generated_at: DateTime<Local>,
    pub session: SessionState,
    pub network: Option<NetworkConfig>,
    pub balance: ReportValue<Amount>,
    pub gas_price: ReportValue<Amount>,
    pub block_height: ReportValue<u64>,
}

impl SessionReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize session report")
    }
}

/// Generate a timestamped filename
fn generate_filename(prefix: &str, extension: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d-%H%M%S");
    format!("{}-{}.{}", prefix, timestamp, extension)
}

/// Write a report into `dir`, creating it if needed
pub fn write_report(dir: &Path, report: &SessionReport) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(generate_filename("session", "json"));

    let json = report.to_json()?;
    let mut file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    file.write_all(json.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;

    Ok(path)
}
