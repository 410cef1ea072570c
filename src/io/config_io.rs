use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::BoardConfig;

pub const CONFIG_FILE: &str = "boardsync.toml";

/// Keys `config set` accepts, and whether each takes an integer
const KEYS: &[(&str, bool)] = &[
    ("api.base_url", false),
    ("api.token_env", false),
    ("api.timeout_ms", true),
    ("sync.debounce_ms", true),
    ("sync.on_failure", false),
    ("sync.max_retries", true),
    ("sync.initial_backoff_ms", true),
    ("user.id", false),
];

/// Error type for configuration I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse boardsync.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not edit boardsync.toml: {0}")]
    EditError(#[from] toml_edit::TomlError),
    #[error("unknown config key '{0}'")]
    UnknownKey(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Walk up from `start` looking for `boardsync.toml`
pub fn discover_config(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load the config at `path`, or all defaults when there is none
pub fn load_config(path: Option<&Path>) -> Result<BoardConfig, ConfigError> {
    match path {
        Some(path) => Ok(read_config(path)?.0),
        None => Ok(BoardConfig::default()),
    }
}

/// Read the config, returning both the parsed config and the raw
/// toml_edit Document for round-trip-safe editing.
pub fn read_config(path: &Path) -> Result<(BoardConfig, toml_edit::DocumentMut), ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: BoardConfig = toml::from_str(&text)?;
    let doc: toml_edit::DocumentMut = text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(path: &Path, doc: &toml_edit::DocumentMut) -> Result<(), ConfigError> {
    fs::write(path, doc.to_string()).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Set `section.field` in the document. The edited document must still
/// parse as a valid config.
pub fn set_value(doc: &mut toml_edit::DocumentMut, key: &str, value: &str) -> Result<(), ConfigError> {
    let Some(&(_, numeric)) = KEYS.iter().find(|(k, _)| *k == key) else {
        return Err(ConfigError::UnknownKey(key.to_string()));
    };
    let Some((section, field)) = key.split_once('.') else {
        return Err(ConfigError::UnknownKey(key.to_string()));
    };
    let invalid = || ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    };

    let item = if numeric {
        let n: i64 = value.parse().map_err(|_| invalid())?;
        if n < 0 {
            return Err(invalid());
        }
        toml_edit::value(n)
    } else {
        toml_edit::value(value)
    };

    if !doc.contains_key(section) {
        doc[section] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    let previous = doc[section].get(field).cloned();
    doc[section][field] = item;

    if toml::from_str::<BoardConfig>(&doc.to_string()).is_err() {
        match previous {
            Some(previous) => doc[section][field] = previous,
            None => {
                if let Some(table) = doc[section].as_table_mut() {
                    table.remove(field);
                }
            }
        }
        return Err(invalid());
    }
    Ok(())
}
