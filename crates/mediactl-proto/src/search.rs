//! Local fuzzy search over the titles of every indexed library.

use chrono::{DateTime, Utc};
use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

use crate::protocol::Metadata;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    pub rating_key: String,
    pub title: String,
    pub kind: String,
    pub year: Option<u32>,
    pub section_id: String,
}

impl IndexEntry {
    pub fn from_metadata(section_id: &str, item: &Metadata) -> Self {
        Self {
            rating_key: item.rating_key.clone(),
            title: item.title.clone(),
            kind: item.kind.clone(),
            year: item.year,
            section_id: section_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionIndex {
    pub title: String,
    pub entries: Vec<IndexEntry>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Per-library summary shown by the search status tab.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionStatus {
    pub section_id: String,
    pub title: String,
    pub items: usize,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub score: i64,
    pub entry: IndexEntry,
}

pub struct SearchIndex {
    path: PathBuf,
    sections: RwLock<BTreeMap<String, SectionIndex>>,
}

impl SearchIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sections: RwLock::new(BTreeMap::new()),
        }
    }

    /// Load a persisted index; a missing or unreadable file yields an empty one.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let index = Self::new(path);
        match std::fs::read(&index.path) {
            Ok(bytes) => match serde_json::from_slice::<BTreeMap<String, SectionIndex>>(&bytes) {
                Ok(sections) => {
                    debug!("search: loaded {} sections", sections.len());
                    *index.write() = sections;
                }
                Err(e) => warn!("search: ignoring corrupt index {}: {}", index.path.display(), e),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("search: failed to read {}: {}", index.path.display(), e),
        }
        index
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, SectionIndex>> {
        self.sections.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, SectionIndex>> {
        self.sections.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn replace_section(&self, section_id: &str, title: &str, entries: Vec<IndexEntry>) {
        self.write().insert(
            section_id.to_string(),
            SectionIndex {
                title: title.to_string(),
                entries,
                updated_at: Some(Utc::now()),
            },
        );
    }

    /// Drop sections that are no longer on the server.
    pub fn retain_sections(&self, keep: &[String]) {
        self.write().retain(|id, _| keep.contains(id));
    }

    pub fn status(&self) -> Vec<SectionStatus> {
        self.read()
            .iter()
            .map(|(id, s)| SectionStatus {
                section_id: id.clone(),
                title: s.title.clone(),
                items: s.entries.len(),
                updated_at: s.updated_at,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().values().map(|s| s.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Best matches first; ties keep index order.
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let matcher = SkimMatcherV2::default().ignore_case();
        let sections = self.read();
        let mut hits: Vec<SearchHit> = sections
            .values()
            .flat_map(|s| s.entries.iter())
            .filter_map(|entry| {
                matcher
                    .fuzzy_match(&entry.title, query)
                    .map(|score| SearchHit {
                        score,
                        entry: entry.clone(),
                    })
            })
            .collect();
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(limit);
        hits
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let bytes = serde_json::to_vec(&*self.read())?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}
