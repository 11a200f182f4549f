use crate::value_objects::period::MissingPeriod;
use std::path::Path;

/// Port for run observability artifacts. The repaired dataset itself is
/// never persisted through this interface; writing results back to files is
/// a separate collaborator's concern.
pub trait ReportWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String>;
    fn write_summary_json(&self, path: &Path, summary: &serde_json::Value) -> Result<(), String>;
    fn write_periods_csv(&self, path: &Path, periods: &[MissingPeriod]) -> Result<(), String>;
    fn write_config_snapshot_toml(&self, path: &Path, contents: &str) -> Result<(), String>;
}
