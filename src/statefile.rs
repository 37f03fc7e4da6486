//! State and desired-state files for the command-line driver

use crate::resource::{IndexConfig, IndexState};
use anyhow::{Context, Result};
use std::path::Path;

/// Load a desired-state file (YAML or JSON)
pub fn load_desired(path: &Path) -> Result<IndexConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read desired state {:?}", path))?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse desired state {:?}", path))
}

/// Load tracked state; a missing file means nothing is tracked
pub fn load_state(path: &Path) -> Result<Option<IndexState>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state {:?}", path))?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    let state = serde_json::from_str(&content).with_context(|| format!("Failed to parse state {:?}", path))?;
    Ok(Some(state))
}

/// Persist tracked state; `None` removes the file
pub fn save_state(path: &Path, state: Option<&IndexState>) -> Result<()> {
    match state {
        Some(state) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(state)?;
            std::fs::write(path, content).with_context(|| format!("Failed to write state {:?}", path))
        }
        None if path.exists() => {
            std::fs::remove_file(path).with_context(|| format!("Failed to remove state {:?}", path))
        }
        None => Ok(()),
    }
}
