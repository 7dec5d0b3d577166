//! Locating the external tools vidgrab drives (yt-dlp, ffmpeg)

use crate::utils::error::{Result, VidgrabError};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Find a tool binary with priority:
/// 1. Explicitly configured path
/// 2. System PATH
/// 3. Common installation paths
pub fn find_tool(name: &str, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() && is_executable(path) {
            info!("Using configured {}: {}", name, path.display());
            return Ok(path.to_path_buf());
        }
        warn!("Configured {} is not executable: {}", name, path.display());
        return Err(VidgrabError::ToolNotFound(name.to_string()));
    }

    if let Ok(path) = which::which(name) {
        info!("Using system {}: {}", name, path.display());
        return Ok(path);
    }

    if let Some(path) = find_in_common_paths(name) {
        info!("Using {} from common path: {}", name, path.display());
        return Ok(path);
    }

    warn!("{} not found anywhere", name);
    Err(VidgrabError::ToolNotFound(name.to_string()))
}

fn find_in_common_paths(name: &str) -> Option<PathBuf> {
    let mut candidates = vec![
        // macOS Homebrew (Apple Silicon)
        PathBuf::from("/opt/homebrew/bin").join(name),
        // macOS Homebrew (Intel)
        PathBuf::from("/usr/local/bin").join(name),
        PathBuf::from("/usr/bin").join(name),
    ];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local").join("bin").join(name));
    }

    candidates.into_iter().find(|path| {
        debug!("Checking {}", path.display());
        path.exists() && is_executable(path)
    })
}

/// Check if a file is executable
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        match std::fs::metadata(path) {
            Ok(metadata) => metadata.is_file() && metadata.permissions().mode() & 0o111 != 0,
            Err(_) => false,
        }
    }

    #[cfg(not(unix))]
    {
        path.is_file()
    }
}
