//! Session persistence backends
//!
//! The engine calls `persist` after every state-mutating action; hosts
//! that keep their own state wire in [`NullStore`], everyone else gets a
//! pretty-printed JSON file they can inspect or hand-edit between
//! sessions.

use crate::error::{Error, Result};
use crate::game::table::Table;
use async_trait::async_trait;
use std::path::PathBuf;

use super::SessionStore;

/// Discards every persist call
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

#[async_trait]
impl SessionStore for NullStore {
    async fn persist(&self, _table: &Table) -> Result<()> {
        Ok(())
    }
}

/// Writes the whole table as pretty JSON to a fixed path
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read a previously persisted table back
    pub async fn load(&self) -> Result<Table> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::SessionStore(format!("read {}: {}", self.path.display(), e)))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[async_trait]
impl SessionStore for JsonFileStore {
    async fn persist(&self, table: &Table) -> Result<()> {
        let raw = serde_json::to_string_pretty(table)?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| Error::SessionStore(format!("write {}: {}", self.path.display(), e)))?;
        Ok(())
    }
}
