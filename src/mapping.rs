use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

/// Real node ids are opaque base64-ish strings well past this length. Anything
/// shorter is a leftover placeholder from a hand-edited file and must not be
/// trusted, or it would permanently block re-provisioning for that entry.
const MIN_ID_LEN: usize = 8;

/// The persisted association between repositories and their boards, plus the
/// master board itself. Acts as a cache: a present id skips provisioning calls
/// on the next run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub master_board_id: Option<String>,
    #[serde(default)]
    pub repos: BTreeMap<String, String>,
}

impl Mapping {
    fn discard_implausible_ids(&mut self) {
        if let Some(id) = &self.master_board_id {
            if !plausible_id(id) {
                warn!(id = %id, "discarding implausible master board id from mapping");
                self.master_board_id = None;
            }
        }
        self.repos.retain(|repo, id| {
            let keep = plausible_id(id);
            if !keep {
                warn!(repo = %repo, id = %id, "discarding implausible board id from mapping");
            }
            keep
        });
    }
}

fn plausible_id(id: &str) -> bool {
    id.len() >= MIN_ID_LEN
}

pub struct MappingStore {
    path: PathBuf,
    data: Mapping,
}

impl MappingStore {
    /// Load the mapping from disk. A missing or unparseable file yields an
    /// empty mapping so a corrupted cache re-provisions instead of aborting.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut data = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(path = %path.display(), error = %err, "mapping file unreadable; starting empty");
                Mapping::default()
            })
        } else {
            Mapping::default()
        };
        data.discard_implausible_ids();
        Ok(Self { path, data })
    }

    pub fn mapping(&self) -> &Mapping {
        &self.data
    }

    pub fn master_board_id(&self) -> Option<&str> {
        self.data.master_board_id.as_deref()
    }

    pub fn repo_board_id(&self, repo: &str) -> Option<&str> {
        self.data.repos.get(repo).map(String::as_str)
    }

    pub fn set_master(&mut self, id: &str) -> Result<()> {
        self.data.master_board_id = Some(id.to_string());
        self.save()
    }

    pub fn record_repo(&mut self, repo: &str, board_id: &str) -> Result<()> {
        self.data.repos.insert(repo.to_string(), board_id.to_string());
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}
