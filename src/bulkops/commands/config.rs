use crate::commands::{CmdMessage, CmdResult};
use crate::config::BulkConfig;
use crate::error::{BulkError, Result};
use std::path::Path;

#[derive(Debug, Clone)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub fn run(config_dir: &Path, action: ConfigAction) -> Result<CmdResult> {
    let mut config = BulkConfig::load(config_dir)?;
    let mut result = CmdResult::default();

    match action {
        ConfigAction::ShowAll => {}
        ConfigAction::ShowKey(key) => {
            let value = config
                .get(&key)
                .ok_or_else(|| BulkError::Config(format!("Unknown config key: {}", key)))?;
            result.add_message(CmdMessage::info(format!("{} = {}", key, value)));
            return Ok(result);
        }
        ConfigAction::Set(key, value) => {
            config.set(&key, &value)?;
            config.save(config_dir)?;
            result.add_message(CmdMessage::success(format!("{} set to {}", key, value)));
        }
    }

    Ok(result.with_config(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn show_all_returns_defaults() {
        let dir = tempdir().unwrap();
        let result = run(dir.path(), ConfigAction::ShowAll).unwrap();
        assert_eq!(result.config, Some(BulkConfig::default()));
    }

    #[test]
    fn set_persists_value() {
        let dir = tempdir().unwrap();
        run(
            dir.path(),
            ConfigAction::Set("max-documents".into(), "50".into()),
        )
        .unwrap();

        let result = run(dir.path(), ConfigAction::ShowKey("max-documents".into())).unwrap();
        assert_eq!(result.messages[0].content, "max-documents = 50");
        assert_eq!(BulkConfig::load(dir.path()).unwrap().max_documents, 50);
    }

    #[test]
    fn unknown_key_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(run(dir.path(), ConfigAction::ShowKey("nope".into())).is_err());
        assert!(run(dir.path(), ConfigAction::Set("nope".into(), "1".into())).is_err());
    }

    #[test]
    fn invalid_value_is_not_saved() {
        let dir = tempdir().unwrap();
        assert!(run(dir.path(), ConfigAction::Set("batch-size".into(), "0".into())).is_err());
        assert_eq!(BulkConfig::load(dir.path()).unwrap(), BulkConfig::default());
    }
}
