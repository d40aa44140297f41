//! Workflow file loading
//!
//! Definitions are plain TOML or JSON files; the format is chosen by
//! file extension, mirroring what the settings directory stores.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::WorkflowConfig;

/// Load a workflow definition from a TOML or JSON file.
pub fn load_workflow_file(path: &Path) -> Result<WorkflowConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read workflow file {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "toml" => toml::from_str(&raw)
            .with_context(|| format!("invalid workflow TOML in {}", path.display())),
        "json" => serde_json::from_str(&raw)
            .with_context(|| format!("invalid workflow JSON in {}", path.display())),
        other => bail!("unsupported workflow format: {other:?}"),
    }
}

/// Discover sample workflows in a directory, keyed by file stem.
pub fn list_sample_workflows(dir: &Path) -> Vec<(String, PathBuf)> {
    let mut samples = Vec::new();
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return samples,
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        if matches!(extension.as_deref(), Some("toml") | Some("json")) {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                samples.push((stem.to_string(), path.clone()));
            }
        }
    }
    samples.sort();
    samples
}
