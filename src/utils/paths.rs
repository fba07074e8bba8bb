// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::{Path, PathBuf};

/// Normalize a user-supplied checkpoint path: strip spaces and expand a leading `~`.
pub fn normalize_path(raw: &str) -> PathBuf {
    let compact: String = raw.chars().filter(|c| *c != ' ').collect();
    expand_home(Path::new(&compact))
}

/// Expand a leading `~` component; any other path is returned unchanged.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}
