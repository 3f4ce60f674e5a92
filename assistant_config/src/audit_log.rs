//! Location and creation of per-run audit log files.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local};
use tracing::info;

/// Path under the state home where logs live.
pub const AUDIT_LOG_SUBDIR: &str = "assistant/audit_logs";

const FILE_NAME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Pick the audit log directory.
///
/// `state_home` (`$XDG_STATE_HOME`) wins when set and non-empty; otherwise
/// `<home>/.local/state` is used.
pub fn resolve_audit_log_dir(
    state_home: Option<PathBuf>,
    home: Option<PathBuf>,
) -> anyhow::Result<PathBuf> {
    let state_home = match state_home.filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir,
        None => home
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join(".local")
            .join("state"),
    };
    Ok(state_home.join(AUDIT_LOG_SUBDIR))
}

/// Resolve the audit log directory from the environment and make sure it
/// exists.
pub fn audit_log_dir() -> anyhow::Result<PathBuf> {
    let dir = resolve_audit_log_dir(
        std::env::var_os("XDG_STATE_HOME").map(PathBuf::from),
        dirs::home_dir(),
    )?;
    ensure_private_dir(&dir)?;
    Ok(dir)
}

/// Create this run's audit log in the default directory.
pub fn create_audit_log() -> anyhow::Result<(PathBuf, File)> {
    create_audit_log_at(&audit_log_dir()?, Local::now())
}

/// Open `<dir>/<timestamp>.log` for appending, creating `dir` if needed.
///
/// An existing file with the same name is appended to, never truncated.
pub fn create_audit_log_at(dir: &Path, started: DateTime<Local>) -> anyhow::Result<(PathBuf, File)> {
    ensure_private_dir(dir)?;
    let path = dir.join(format!("{}.log", started.format(FILE_NAME_FORMAT)));

    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let file = options
        .open(&path)
        .with_context(|| format!("Failed to open audit log {}", path.display()))?;

    info!("Audit log: {}", path.display());
    Ok((path, file))
}

fn ensure_private_dir(dir: &Path) -> anyhow::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(dir)
        .with_context(|| format!("Failed to create audit log directory {}", dir.display()))
}
