// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::PathBuf;

const APP_DIR: &str = "aligna";

/// Return the application data directory, creating it if needed.
pub fn data_dir() -> PathBuf {
    let base = base_dir(
        std::env::var("XDG_DATA_HOME").ok(),
        std::env::var("HOME").ok(),
    );
    let dir = base.join(APP_DIR);
    std::fs::create_dir_all(&dir).ok();
    dir
}

/// Pick the base data directory: XDG data dir, then `~/.local/share`, then
/// the system temp dir.
fn base_dir(xdg_data_home: Option<String>, home: Option<String>) -> PathBuf {
    if let Some(xdg) = xdg_data_home.filter(|dir| !dir.is_empty()) {
        return PathBuf::from(xdg);
    }
    if let Some(home) = home.filter(|dir| !dir.is_empty()) {
        return PathBuf::from(home).join(".local").join("share");
    }
    // Last resort
    std::env::temp_dir()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_takes_precedence() {
        let dir = base_dir(Some("/xdg".into()), Some("/home/ana".into()));
        assert_eq!(dir, PathBuf::from("/xdg"));
    }

    #[test]
    fn home_fallback_uses_local_share() {
        let dir = base_dir(None, Some("/home/ana".into()));
        assert_eq!(dir, PathBuf::from("/home/ana/.local/share"));
        let dir = base_dir(Some(String::new()), Some("/home/ana".into()));
        assert_eq!(dir, PathBuf::from("/home/ana/.local/share"));
    }

    #[test]
    fn temp_dir_is_last_resort() {
        assert_eq!(base_dir(None, None), std::env::temp_dir());
    }
}
