use gapmend_domain::repositories::reports::ReportWriter;
use gapmend_domain::value_objects::period::MissingPeriod;
use std::fs;
use std::path::Path;

pub fn write_summary_json(path: &Path, summary: &serde_json::Value) -> Result<(), String> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|err| format!("failed to serialize summary: {err}"))?;
    fs::write(path, json).map_err(|err| format!("failed to write {}: {err}", path.display()))
}

pub fn write_periods_csv(path: &Path, periods: &[MissingPeriod]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create {}: {err}", path.display()))?;
    wtr.write_record([
        "start_time",
        "start_time_utc",
        "end_time",
        "end_time_utc",
        "first_missing",
        "last_missing",
        "missing_count",
        "channels",
    ])
    .map_err(|err| format!("failed to write periods header: {err}"))?;

    for period in periods {
        let record = vec![
            period.start_time.map(|t| t.to_string()).unwrap_or_default(),
            period.start_time.map(rfc3339).unwrap_or_default(),
            period.end_time.map(|t| t.to_string()).unwrap_or_default(),
            period.end_time.map(rfc3339).unwrap_or_default(),
            period
                .first_missing()
                .map(|t| t.to_string())
                .unwrap_or_default(),
            period
                .last_missing()
                .map(|t| t.to_string())
                .unwrap_or_default(),
            period.missing_timestamps.len().to_string(),
            period.channels.join(";"),
        ];
        wtr.write_record(record)
            .map_err(|err| format!("failed to write periods row: {err}"))?;
    }
    wtr.flush()
        .map_err(|err| format!("failed to flush {}: {err}", path.display()))?;
    Ok(())
}

fn rfc3339(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

pub fn write_config_snapshot_toml(path: &Path, contents: &str) -> Result<(), String> {
    fs::write(path, contents).map_err(|err| {
        format!(
            "failed to write config snapshot {}: {}",
            path.display(),
            err
        )
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemReportWriter;

impl FilesystemReportWriter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportWriter for FilesystemReportWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String> {
        fs::create_dir_all(path)
            .map_err(|err| format!("failed to create dir {}: {}", path.display(), err))
    }

    fn write_summary_json(&self, path: &Path, summary: &serde_json::Value) -> Result<(), String> {
        tracing::debug!(path = %path.display(), "writing run summary");
        write_summary_json(path, summary)
    }

    fn write_periods_csv(&self, path: &Path, periods: &[MissingPeriod]) -> Result<(), String> {
        tracing::debug!(path = %path.display(), periods = periods.len(), "writing periods report");
        write_periods_csv(path, periods)
    }

    fn write_config_snapshot_toml(&self, path: &Path, contents: &str) -> Result<(), String> {
        write_config_snapshot_toml(path, contents)
    }
}
