//! Named collection of searchable entities.

use super::definition::SearchIndex;
use super::propagate::UpdateScope;
use crate::host::HostConnection;
use crate::{FullTextError, Result};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Every registered [`SearchIndex`], keyed by entity name.
///
/// Built once at startup, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct SearchRegistry {
    indexes: BTreeMap<String, SearchIndex>,
}

impl SearchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `index` under `name`. Names must be unique.
    pub fn register(&mut self, name: &str, index: SearchIndex) -> Result<()> {
        if self.indexes.contains_key(name) {
            return Err(FullTextError::validation(
                "name",
                format!("entity {} is already registered", name),
            ));
        }
        debug!("Registered searchable entity {} ({})", name, index.table());
        self.indexes.insert(name.to_string(), index);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SearchIndex> {
        self.indexes.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.indexes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Rebuild every row of one entity.
    pub fn reindex<C>(&self, conn: &mut C, name: &str) -> Result<usize>
    where
        C: HostConnection + ?Sized,
    {
        let index = self.get(name).ok_or_else(|| FullTextError::EntityNotFound {
            name: name.to_string(),
        })?;
        index.update_search_field(conn, UpdateScope::All, None)
    }

    /// Rebuild every entity that persists a search field, in name order.
    ///
    /// Stops at the first failure; earlier entities stay committed.
    pub fn reindex_all<C>(&self, conn: &mut C) -> Result<Vec<(String, usize)>>
    where
        C: HostConnection + ?Sized,
    {
        let mut updated = Vec::new();
        for (name, index) in &self.indexes {
            if index.search_field().is_none() {
                debug!("Skipping {}: no search field", name);
                continue;
            }
            let rows = index.update_search_field(conn, UpdateScope::All, None)?;
            updated.push((name.clone(), rows));
        }
        info!("Reindexed {} entit(ies)", updated.len());
        Ok(updated)
    }
}
