//! Page Store
//!
//! Ordered in-memory page map with JSON load/save.

use std::collections::btree_map::{self, BTreeMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AriesError, Result};
use crate::wal::PageId;

use super::{Page, StagedPages};

/// All pages recovery may touch, keyed by page id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageStore {
    pages: BTreeMap<PageId, Page>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a page store snapshot
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let store: PageStore = serde_json::from_reader(reader)
            .map_err(|e| AriesError::Serialization(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), pages = store.len(), "loaded page store");
        Ok(store)
    }

    /// Save the page store, replacing `path` atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let temp_path = path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&temp_path)?);
            serde_json::to_writer_pretty(&mut writer, self)?;
            let file = writer.into_inner().map_err(|e| {
                AriesError::Serialization(format!("flush {}: {}", temp_path.display(), e))
            })?;
            file.sync_all()?;
        }

        // Atomic rename for crash safety
        fs::rename(&temp_path, path)?;
        info!(path = %path.display(), pages = self.len(), "saved page store");
        Ok(())
    }

    pub fn insert(&mut self, page_id: impl Into<PageId>, page: Page) {
        self.pages.insert(page_id.into(), page);
    }

    pub fn get(&self, page_id: &str) -> Option<&Page> {
        self.pages.get(page_id)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, PageId, Page> {
        self.pages.iter()
    }

    /// Start buffering writes against this store
    pub fn stage(&mut self) -> StagedPages<'_> {
        StagedPages::new(self)
    }

    pub(super) fn put(&mut self, page_id: PageId, page: Page) {
        self.pages.insert(page_id, page);
    }
}

impl<P: Into<PageId>> FromIterator<(P, Page)> for PageStore {
    fn from_iter<I: IntoIterator<Item = (P, Page)>>(iter: I) -> Self {
        Self {
            pages: iter.into_iter().map(|(id, page)| (id.into(), page)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PageStore {
    type Item = (&'a PageId, &'a Page);
    type IntoIter = btree_map::Iter<'a, PageId, Page>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages.iter()
    }
}
