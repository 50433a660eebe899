//! JSON directory store, the on-disk layout written by the ingestion job.
//!
//! ```text
//! <root>/players/<player_id>.json   array of MatchRecord
//! <root>/reference_stats.json       array of ReferencePlayerStat
//! <root>/snippets.json              array of KnowledgeSnippet
//! ```
//!
//! Files are read on every call, so each invocation works on its own
//! snapshot of the data.

use match_data::{KnowledgeSnippet, MatchRecord, PlayerId, ReferencePlayerStat, Role};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{
    rank_snippets, select_reference_stats, MatchFilter, MatchSource, ReferenceSource, SnippetSource,
};
use crate::error::StoreError;

const PLAYERS_DIR: &str = "players";
const REFERENCE_FILE: &str = "reference_stats.json";
const SNIPPETS_FILE: &str = "snippets.json";

/// Read-only store over a JSON data directory.
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
}

impl JsonDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of a player's match file. Spaces and path separators in the id
    /// are replaced with underscores.
    pub fn player_path(&self, player_id: &PlayerId) -> PathBuf {
        let file_name: String = player_id
            .as_str()
            .chars()
            .map(|c| match c {
                ' ' | '/' | '\\' => '_',
                other => other,
            })
            .collect();
        self.root.join(PLAYERS_DIR).join(format!("{file_name}.json"))
    }

    pub fn reference_path(&self) -> PathBuf {
        self.root.join(REFERENCE_FILE)
    }

    pub fn snippets_path(&self) -> PathBuf {
        self.root.join(SNIPPETS_FILE)
    }
}

/// Read and decode a JSON file. A missing file is `Ok(None)`.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "data file not present");
            return Ok(None);
        }
        Err(e) => {
            return Err(StoreError::unavailable(
                format!("reading {}", path.display()),
                e,
            ))
        }
    };

    let value = serde_json::from_slice(&bytes).map_err(|e| {
        StoreError::unavailable(format!("decoding {}", path.display()), e)
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "loaded data file");
    Ok(Some(value))
}

impl MatchSource for JsonDirStore {
    fn get_matches(
        &self,
        player_id: &PlayerId,
        filter: &MatchFilter,
    ) -> Result<Vec<MatchRecord>, StoreError> {
        let path = self.player_path(player_id);
        let records: Vec<MatchRecord> =
            read_json(&path)?.ok_or_else(|| StoreError::NotFound(player_id.clone()))?;
        Ok(filter.apply(records))
    }
}

impl ReferenceSource for JsonDirStore {
    fn get_reference_stats(
        &self,
        role: Role,
        champion: Option<&str>,
    ) -> Result<Vec<ReferencePlayerStat>, StoreError> {
        let stats: Vec<ReferencePlayerStat> =
            read_json(&self.reference_path())?.unwrap_or_default();
        Ok(select_reference_stats(&stats, role, champion))
    }
}

impl SnippetSource for JsonDirStore {
    fn search_snippets(&self, query_terms: &[String]) -> Result<Vec<KnowledgeSnippet>, StoreError> {
        let snippets: Vec<KnowledgeSnippet> = read_json(&self.snippets_path())?.unwrap_or_default();
        Ok(rank_snippets(&snippets, query_terms))
    }
}
