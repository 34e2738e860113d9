//! Post-completion processing.
//!
//! Handles auto-save and exports after a plan arrives.

use crate::storage;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Result of post-completion processing, ready for presentation layers.
pub struct ProcessedPlan {
    pub auto_saved_path: Option<PathBuf>,
    pub export_messages: Vec<String>,
}

/// Process a completed plan: auto-save it to local history and run any
/// requested export. Export failures become messages rather than hard errors
/// so a finished plan is never lost to a bad path.
pub fn process_plan_completion(
    plan: &serde_json::Value,
    auto_save: bool,
    export_json: Option<&Path>,
) -> Result<ProcessedPlan> {
    let auto_saved_path = if auto_save {
        Some(storage::save_plan(plan)?)
    } else {
        None
    };

    let mut export_messages = Vec::new();
    if let Some(path) = export_json {
        match storage::export_json(path, plan) {
            Ok(()) => export_messages.push(format!("Exported JSON: {}", path.display())),
            Err(e) => export_messages.push(format!("Export JSON failed: {e:#}")),
        }
    }

    Ok(ProcessedPlan {
        auto_saved_path,
        export_messages,
    })
}
