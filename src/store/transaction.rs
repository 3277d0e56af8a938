//! Write transactions over the catalogue.
//!
//! A [`Transaction`] holds the store's write guard for its whole lifetime and
//! records an undo entry for every change. Rolling back replays the entries
//! in reverse, so a failed check-then-write sequence leaves no trace. A
//! transaction dropped without [`Transaction::commit`], including during a
//! panic, rolls back.

use crate::store::models::{GeneLink, NewGeneLink, SearchHistory};
use crate::store::tables::Tables;
use crate::store::{StoreError, StoreResult};

/// A reversible change.
#[derive(Debug, Clone)]
enum Change {
    InsertGeneLink { id: u64 },
    DeleteGeneLink { index: usize, link: GeneLink },
    InsertSearchHistory { index: usize },
}

/// Changes made under one write lock.
pub struct Transaction<'a> {
    tables: &'a mut Tables,
    changes: Vec<Change>,
    committed: bool,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(tables: &'a mut Tables) -> Self {
        Self {
            tables,
            changes: Vec::new(),
            committed: false,
        }
    }

    /// Read access to the tables, including this transaction's changes.
    pub fn tables(&self) -> &Tables {
        self.tables
    }

    /// Number of changes recorded so far.
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    /// Insert a gene link, enforcing references and uniqueness of
    /// (tag, feature, allele).
    pub fn insert_gene_link(&mut self, new: NewGeneLink) -> StoreResult<GeneLink> {
        if self.tables.tag(new.tag_id).is_none() {
            return Err(StoreError::ConstraintViolation(format!(
                "gene link references missing tag {}",
                new.tag_id
            )));
        }
        if self.tables.feature(new.feature_id).is_none() {
            return Err(StoreError::ConstraintViolation(format!(
                "gene link references missing feature {}",
                new.feature_id
            )));
        }
        if self.tables.user(&new.user).is_none() {
            return Err(StoreError::ConstraintViolation(format!(
                "gene link references missing user {}",
                new.user
            )));
        }
        let duplicate = self.tables.gene_links.iter().any(|l| {
            l.tag_id == new.tag_id && l.feature_id == new.feature_id && l.allele == new.allele
        });
        if duplicate {
            return Err(StoreError::ConstraintViolation(format!(
                "duplicate key value violates unique constraint: tag {} already links feature {}",
                new.tag_id, new.feature_id
            )));
        }

        let link = GeneLink {
            id: self.tables.next_gene_link_id(),
            tag_id: new.tag_id,
            feature_id: new.feature_id,
            user: new.user,
            allele: new.allele,
        };
        self.tables.gene_links.push(link.clone());
        self.changes.push(Change::InsertGeneLink { id: link.id });
        Ok(link)
    }

    pub fn delete_gene_link(&mut self, id: u64) -> StoreResult<GeneLink> {
        let index = self
            .tables
            .gene_links
            .iter()
            .position(|l| l.id == id)
            .ok_or(StoreError::NotFound {
                table: "gene_links",
                id,
            })?;
        let link = self.tables.gene_links.remove(index);
        self.changes.push(Change::DeleteGeneLink {
            index,
            link: link.clone(),
        });
        Ok(link)
    }

    /// Record a search keyword for a user unless already present.
    /// Returns whether a new row was created.
    pub fn get_or_create_search(&mut self, user: &str, keyword: &str) -> bool {
        let exists = self
            .tables
            .search_history
            .iter()
            .any(|h| h.user == user && h.keyword == keyword);
        if exists {
            return false;
        }
        self.tables.search_history.push(SearchHistory {
            keyword: keyword.to_string(),
            user: user.to_string(),
        });
        self.changes.push(Change::InsertSearchHistory {
            index: self.tables.search_history.len() - 1,
        });
        true
    }

    /// Keep every change.
    pub(crate) fn commit(mut self) {
        self.committed = true;
    }

    /// Undo every change, newest first.
    pub(crate) fn rollback(mut self) {
        self.undo();
    }

    fn undo(&mut self) {
        let changes = std::mem::take(&mut self.changes);
        let count = changes.len();
        for change in changes.into_iter().rev() {
            match change {
                Change::InsertGeneLink { id } => {
                    self.tables.gene_links.retain(|l| l.id != id);
                }
                Change::DeleteGeneLink { index, link } => {
                    let index = index.min(self.tables.gene_links.len());
                    self.tables.gene_links.insert(index, link);
                }
                Change::InsertSearchHistory { index } => {
                    if index < self.tables.search_history.len() {
                        self.tables.search_history.remove(index);
                    }
                }
            }
        }
        if count > 0 {
            tracing::debug!(changes = count, "Transaction rolled back");
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.undo();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{Feature, Picture, Tag, TagGroup, User};

    fn tables() -> Tables {
        Tables {
            users: vec![User { username: "ann".into(), is_staff: false }],
            features: vec![Feature { feature_id: 5, uniquename: "GRMZM2G".into(), name: "wx1".into(), organism_id: 1 }],
            pictures: vec![Picture { id: 1, description: String::new(), owner: "ann".into(), is_private: false }],
            tag_groups: vec![TagGroup { id: 1, picture_id: 1, name: String::new(), user: "ann".into() }],
            tags: vec![Tag { id: 1, group_id: 1, description: String::new(), color: [0, 0, 0], user: "ann".into() }],
            ..Tables::default()
        }
    }

    fn link() -> NewGeneLink {
        NewGeneLink { tag_id: 1, feature_id: 5, user: "ann".into(), allele: None }
    }

    #[test]
    fn test_insert_and_duplicate() {
        let mut t = tables();
        let mut tx = Transaction::new(&mut t);
        let created = tx.insert_gene_link(link()).unwrap();
        assert_eq!(created.id, 1);
        let err = tx.insert_gene_link(link()).unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
        assert_eq!(tx.change_count(), 1);
    }

    #[test]
    fn test_dangling_reference_rejected() {
        let mut t = tables();
        let mut tx = Transaction::new(&mut t);
        let err = tx
            .insert_gene_link(NewGeneLink { feature_id: 99, ..link() })
            .unwrap_err();
        assert!(err.to_string().contains("missing feature 99"));
    }

    #[test]
    fn test_rollback_restores_tables() {
        let mut t = tables();
        t.gene_links.push(GeneLink { id: 7, tag_id: 1, feature_id: 5, user: "ann".into(), allele: Some("wx1-m".into()) });
        let before = t.clone();

        let mut tx = Transaction::new(&mut t);
        tx.insert_gene_link(link()).unwrap();
        tx.delete_gene_link(7).unwrap();
        assert!(tx.get_or_create_search("ann", "waxy"));
        assert!(!tx.get_or_create_search("ann", "waxy"));
        tx.rollback();

        assert_eq!(t, before);
    }

    #[test]
    fn test_uncommitted_drop_rolls_back() {
        let mut t = tables();
        let before = t.clone();
        {
            let mut tx = Transaction::new(&mut t);
            tx.insert_gene_link(link()).unwrap();
        }
        assert_eq!(t, before);

        let mut tx = Transaction::new(&mut t);
        tx.insert_gene_link(link()).unwrap();
        tx.commit();
        assert_eq!(t.gene_links.len(), 1);
    }

    #[test]
    fn test_delete_missing() {
        let mut t = tables();
        let mut tx = Transaction::new(&mut t);
        assert!(matches!(
            tx.delete_gene_link(3),
            Err(StoreError::NotFound { table: "gene_links", id: 3 })
        ));
    }
}
