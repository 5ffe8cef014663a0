use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_MAPPING_FILE: &str = "repo_project_mapping.json";
pub const DEFAULT_MASTER_TITLE: &str = "Master Project";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GITHUB_TOKEN is not set; export a token with the `project` scope before running")]
    MissingToken,
    #[error("GITHUB_TOKEN is set but blank")]
    BlankToken,
}

/// Everything the run needs, resolved once at startup and passed by reference
/// into the components that use it. Nothing below this reads the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    /// Account to reconcile. When absent the token's own account is used.
    pub login: Option<String>,
    pub mapping_path: PathBuf,
    pub master_title: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("GITHUB_TOKEN").ok_or(ConfigError::MissingToken)?;
        if token.trim().is_empty() {
            return Err(ConfigError::BlankToken);
        }
        let login = lookup("GITHUB_LOGIN").filter(|l| !l.trim().is_empty());
        Ok(Self {
            token,
            login,
            mapping_path: PathBuf::from(DEFAULT_MAPPING_FILE),
            master_title: DEFAULT_MASTER_TITLE.to_string(),
        })
    }
}
