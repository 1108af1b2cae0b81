//! Per-user identifier storage.
//!
//! Maps a Discord user id to the platform identifiers used by the stats
//! commands (Steam name, Epic name, Supercell player tag). Backed by a JSON
//! file with atomic saves; writes are last-write-wins per field.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::common::error::StoreError;
use crate::store::{atomic_write, read_json_or_empty};

/// A field of a user's identity record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Steam,
    Epic,
    Tag,
}

impl IdentityField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Steam => "steam",
            Self::Epic => "epic",
            Self::Tag => "tag",
        }
    }
}

impl FromStr for IdentityField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "steam" => Ok(Self::Steam),
            "epic" => Ok(Self::Epic),
            "tag" => Ok(Self::Tag),
            _ => Err(()),
        }
    }
}

/// What to clear with `!id clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearTarget {
    Field(IdentityField),
    All,
}

impl FromStr for ClearTarget {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            other => other.parse().map(Self::Field),
        }
    }
}

/// Identifiers registered by one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steam: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl IdentityRecord {
    pub fn get(&self, field: IdentityField) -> Option<&str> {
        match field {
            IdentityField::Steam => self.steam.as_deref(),
            IdentityField::Epic => self.epic.as_deref(),
            IdentityField::Tag => self.tag.as_deref(),
        }
    }

    fn set(&mut self, field: IdentityField, value: Option<String>) {
        match field {
            IdentityField::Steam => self.steam = value,
            IdentityField::Epic => self.epic = value,
            IdentityField::Tag => self.tag = value,
        }
    }

    fn is_empty(&self) -> bool {
        self.steam.is_none() && self.epic.is_none() && self.tag.is_none()
    }
}

type IdentityMap = HashMap<String, IdentityRecord>;

/// Durable store of per-user identity records.
pub struct IdentityStore {
    path: PathBuf,
    // None until first use; the file is loaded lazily.
    state: Mutex<Option<IdentityMap>>,
}

impl IdentityStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join("user_ids.json"),
            state: Mutex::new(None),
        }
    }

    /// Look up the record for a user. Absent users yield `None`.
    pub async fn get(&self, user_id: u64) -> Option<IdentityRecord> {
        let mut state = self.state.lock().await;
        let map = self.ensure_loaded(&mut state).await;
        map.get(&user_id.to_string()).cloned()
    }

    /// Insert or overwrite one field of a user's record. Other fields of
    /// the same record are left untouched.
    pub async fn set(
        &self,
        user_id: u64,
        field: IdentityField,
        value: &str,
    ) -> Result<(), StoreError> {
        let value = value.trim();
        debug_assert!(!value.is_empty(), "callers validate non-empty values");

        let mut state = self.state.lock().await;
        let map = self.ensure_loaded(&mut state).await;
        map.entry(user_id.to_string())
            .or_default()
            .set(field, Some(value.to_string()));
        self.save(map).await
    }

    /// Clear one field, or the whole record.
    pub async fn clear(&self, user_id: u64, target: ClearTarget) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let map = self.ensure_loaded(&mut state).await;
        let key = user_id.to_string();

        match target {
            ClearTarget::All => {
                map.remove(&key);
            }
            ClearTarget::Field(field) => {
                if let Some(record) = map.get_mut(&key) {
                    record.set(field, None);
                    if record.is_empty() {
                        map.remove(&key);
                    }
                }
            }
        }
        self.save(map).await
    }

    async fn ensure_loaded<'a>(&self, state: &'a mut Option<IdentityMap>) -> &'a mut IdentityMap {
        if state.is_none() {
            *state = Some(read_json_or_empty(&self.path).await.unwrap_or_default());
        }
        state.as_mut().unwrap()
    }

    async fn save(&self, map: &IdentityMap) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(map)?;
        atomic_write(&self.path, &content).await
    }
}
