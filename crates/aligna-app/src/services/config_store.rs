// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Config file persistence.

use std::path::Path;

use aligna_core::ScanConfig;
use aligna_core::error::Result;
use tracing::{debug, info, warn};

use super::data_dir::data_dir;

pub const CONFIG_FILE: &str = "config.json";

/// Read `config.json` from `data_dir`. Missing or unreadable files yield
/// `None` so the caller can fall back to defaults.
pub fn load_config(data_dir: &Path) -> Option<ScanConfig> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
        debug!(path = %path.display(), "No config file");
        return None;
    }
    match ScanConfig::from_json_file(&path) {
        Ok(config) => Some(config),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Ignoring unreadable config file");
            None
        }
    }
}

pub fn persist_config(data_dir: &Path, config: &ScanConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    config.save_json_file(&path)?;
    info!(path = %path.display(), "Config saved");
    Ok(())
}

/// The configuration the app should run with.
///
/// An explicit path must exist and parse. Otherwise the data directory's
/// `config.json` is used if present, then the built-in defaults.
pub fn effective_config(explicit: Option<&Path>) -> Result<ScanConfig> {
    match explicit {
        Some(path) => ScanConfig::from_json_file(path),
        None => Ok(load_config(&data_dir()).unwrap_or_default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aligna_core::config::{CanvasFit, ColorPipeline};

    #[test]
    fn persisted_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ScanConfig::default();
        config.ratio.canvas_fit = CanvasFit::Crop;
        config.enhance.color_pipeline = ColorPipeline::Detailed;
        config.session.debounce_ms = 90;

        persist_config(dir.path(), &config).unwrap();
        assert_eq!(load_config(dir.path()), Some(config));
    }

    #[test]
    fn missing_or_corrupt_file_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config(dir.path()), None);

        std::fs::write(dir.path().join(CONFIG_FILE), "{ not json").unwrap();
        assert_eq!(load_config(dir.path()), None);
    }

    #[test]
    fn explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(effective_config(Some(&missing)).is_err());

        let present = dir.path().join("custom.json");
        std::fs::write(&present, r#"{"rectify": {"min_dimension": 64}}"#).unwrap();
        let config = effective_config(Some(&present)).unwrap();
        assert_eq!(config.rectify.min_dimension, 64);
        assert_eq!(config.detection, ScanConfig::default().detection);
    }
}
