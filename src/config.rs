use std::fs;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{FormatType, NodeId};
use crate::error::StanzaError;
use crate::hierarchy::DEFAULT_PSEUDO_ROOT_ID;
use crate::loader::DEFAULT_TIMEOUT;
use crate::transport::default_user_agent;
use crate::tree::FieldNames;

pub const DEFAULT_CONFIG_FILE: &str = "stanza-loader.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub format: Option<FormatType>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub fields: Option<FieldNames>,
    #[serde(default)]
    pub pseudo_root_id: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub timeout: Duration,
    pub format: FormatType,
    pub user_agent: String,
    pub fields: FieldNames,
    pub pseudo_root_id: NodeId,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        ConfigLoader::resolve_config(Config::default())
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or `stanza-loader.json` in the current directory when no
    /// path is given. A missing default file yields the defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, StanzaError> {
        let config_path = match path {
            Some(path) => Utf8PathBuf::from(path),
            None => Utf8PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| StanzaError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| StanzaError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            timeout: config
                .timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TIMEOUT),
            format: config.format.unwrap_or_default(),
            user_agent: config.user_agent.unwrap_or_else(default_user_agent),
            fields: config.fields.unwrap_or_default(),
            pseudo_root_id: config
                .pseudo_root_id
                .unwrap_or_else(|| NodeId::from(DEFAULT_PSEUDO_ROOT_ID)),
        }
    }
}
