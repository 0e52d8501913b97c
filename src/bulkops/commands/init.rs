use crate::commands::{CmdMessage, CmdResult};
use crate::config::BulkConfig;
use crate::error::Result;
use crate::store::fs::FileClient;
use std::path::Path;

/// Creates an empty dataset and a default config, leaving existing files alone.
pub fn run(data_dir: &Path) -> Result<CmdResult> {
    let client = FileClient::new(data_dir);
    let created = client.ensure_initialized()?;

    let config_path = data_dir.join("config.json");
    if !config_path.exists() {
        BulkConfig::default().save(data_dir)?;
    }

    let mut result = CmdResult::default();
    result.paths.push(client.dataset_path());
    result.add_message(if created {
        CmdMessage::success(format!("Initialized dataset in {}", data_dir.display()))
    } else {
        CmdMessage::info(format!(
            "Dataset already initialized in {}",
            data_dir.display()
        ))
    });
    Ok(result)
}
