use crate::api::BulkOps;
use crate::config::BulkConfig;
use crate::error::{BulkError, Result};
use crate::store::fs::FileClient;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const LOCAL_DIR: &str = ".bulkops";
pub const HOME_ENV: &str = "BULKOPS_HOME";

/// The configured API for one dataset directory. Config is read through `api.config()`.
pub struct BulkContext {
    pub api: BulkOps<FileClient>,
    pub data_dir: PathBuf,
}

/// Picks the dataset directory.
///
/// Order: an explicit path, then `$BULKOPS_HOME`, then a `.bulkops`
/// directory in `cwd` or any parent, then the platform data directory.
pub fn resolve_data_dir(cwd: &Path, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }

    if let Some(home) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(home));
    }

    if let Some(local) = find_local_dir(cwd) {
        return Ok(local);
    }

    ProjectDirs::from("com", "bulkops", "bulkops")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| BulkError::Config("could not determine a data directory".to_string()))
}

/// Walks up from `cwd` looking for a `.bulkops` directory.
pub fn find_local_dir(cwd: &Path) -> Option<PathBuf> {
    cwd.ancestors()
        .map(|dir| dir.join(LOCAL_DIR))
        .find(|candidate| candidate.is_dir())
}

pub fn initialize(cwd: &Path, explicit: Option<&Path>) -> Result<BulkContext> {
    let data_dir = resolve_data_dir(cwd, explicit)?;
    let config = BulkConfig::load(&data_dir)?;
    let client = FileClient::new(&data_dir);
    let api = BulkOps::new(client, config, &data_dir)?;

    Ok(BulkContext { api, data_dir })
}
