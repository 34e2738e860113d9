//! Local plan history.
//!
//! Finished plans are saved as pretty-printed JSON under the platform data
//! directory so a session can be recovered after the terminal closes.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

fn history_dir() -> Result<PathBuf> {
    let base = dirs::data_dir().context("no platform data directory available")?;
    Ok(base.join("date-plan-cli").join("history"))
}

fn timestamp_slug() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
        // Colons are not portable in file names.
        .replace(':', "-")
}

/// Save a completed plan into the history directory, returning its path.
pub fn save_plan(plan: &serde_json::Value) -> Result<PathBuf> {
    let dir = history_dir()?;
    save_plan_in(&dir, plan)
}

pub(crate) fn save_plan_in(dir: &Path, plan: &serde_json::Value) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create history dir {}", dir.display()))?;
    let path = dir.join(format!("plan-{}.json", timestamp_slug()));
    export_json(&path, plan)?;
    Ok(path)
}

/// Write a plan as pretty-printed JSON to an explicit path.
pub fn export_json(path: &Path, plan: &serde_json::Value) -> Result<()> {
    let body = serde_json::to_string_pretty(plan).context("failed to serialize plan")?;
    std::fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_writes_readable_json() {
        let dir = tempfile::tempdir().unwrap();
        let plan = serde_json::json!({"theme": "art and canals"});
        let path = save_plan_in(dir.path(), &plan).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["theme"], "art and canals");
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("plan-"));
    }

    #[test]
    fn export_fails_on_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope").join("plan.json");
        let err = export_json(&missing, &serde_json::json!({})).unwrap_err();
        assert!(err.to_string().contains("failed to write"));
    }
}
