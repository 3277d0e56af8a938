//! In-memory catalogue tables and the lookups handlers run against them.

use serde::{Deserialize, Serialize};

use crate::store::models::{
    Feature, GeneLink, Organism, Picture, PictureGeneId, PictureMgdb, PictureNote, SearchHistory,
    Tag, TagGroup, User, Variation,
};

/// Every table of the catalogue. This is also the snapshot file format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    pub users: Vec<User>,
    pub organisms: Vec<Organism>,
    pub features: Vec<Feature>,
    pub variations: Vec<Variation>,
    pub pictures: Vec<Picture>,
    pub tag_groups: Vec<TagGroup>,
    pub tags: Vec<Tag>,
    pub gene_links: Vec<GeneLink>,
    pub picture_notes: Vec<PictureNote>,
    pub picture_mgdb: Vec<PictureMgdb>,
    pub picture_gene_ids: Vec<PictureGeneId>,
    pub search_history: Vec<SearchHistory>,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub users: usize,
    pub features: usize,
    pub variations: usize,
    pub pictures: usize,
    pub tags: usize,
    pub gene_links: usize,
    pub search_history: usize,
}

impl Tables {
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            users: self.users.len(),
            features: self.features.len(),
            variations: self.variations.len(),
            pictures: self.pictures.len(),
            tags: self.tags.len(),
            gene_links: self.gene_links.len(),
            search_history: self.search_history.len(),
        }
    }

    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.iter().find(|u| u.username == username)
    }

    pub fn organism(&self, organism_id: u64) -> Option<&Organism> {
        self.organisms.iter().find(|o| o.organism_id == organism_id)
    }

    pub fn feature(&self, feature_id: u64) -> Option<&Feature> {
        self.features.iter().find(|f| f.feature_id == feature_id)
    }

    /// Features with exactly this name in the organism.
    pub fn features_matching(&self, name: &str, organism_id: u64) -> Vec<&Feature> {
        self.features
            .iter()
            .filter(|f| f.name == name && f.organism_id == organism_id)
            .collect()
    }

    /// Variations with exactly this name.
    pub fn variations_named(&self, name: &str) -> Vec<&Variation> {
        self.variations.iter().filter(|v| v.name == name).collect()
    }

    pub fn picture(&self, id: u64) -> Option<&Picture> {
        self.pictures.iter().find(|p| p.id == id)
    }

    pub fn tag(&self, id: u64) -> Option<&Tag> {
        self.tags.iter().find(|t| t.id == id)
    }

    pub fn tag_group(&self, id: u64) -> Option<&TagGroup> {
        self.tag_groups.iter().find(|g| g.id == id)
    }

    /// Picture the tag is drawn on.
    pub fn picture_of_tag(&self, tag: &Tag) -> Option<&Picture> {
        self.tag_group(tag.group_id)
            .and_then(|g| self.picture(g.picture_id))
    }

    /// Staff users and the picture's owner may modify a tag.
    pub fn can_write_tag(&self, username: Option<&str>, tag: &Tag) -> bool {
        let Some(user) = username.and_then(|name| self.user(name)) else {
            return false;
        };
        if user.is_staff {
            return true;
        }
        self.picture_of_tag(tag)
            .is_some_and(|picture| picture.owner == user.username)
    }

    /// Tags on public pictures are readable by everyone.
    pub fn can_read_tag(&self, username: Option<&str>, tag: &Tag) -> bool {
        let public = self.picture_of_tag(tag).is_some_and(|p| !p.is_private);
        public || self.can_write_tag(username, tag)
    }

    pub fn gene_link(&self, id: u64) -> Option<&GeneLink> {
        self.gene_links.iter().find(|l| l.id == id)
    }

    /// Links on a tag, ordered by id.
    pub fn gene_links_for_tag(&self, tag_id: u64) -> Vec<&GeneLink> {
        let mut links: Vec<&GeneLink> = self
            .gene_links
            .iter()
            .filter(|l| l.tag_id == tag_id)
            .collect();
        links.sort_by_key(|l| l.id);
        links
    }

    pub(crate) fn next_gene_link_id(&self) -> u64 {
        self.gene_links.iter().map(|l| l.id).max().unwrap_or(0) + 1
    }

    /// Keywords searched by a user, in first-use order.
    pub fn search_keywords(&self, username: &str) -> Vec<&str> {
        self.search_history
            .iter()
            .filter(|h| h.user == username)
            .map(|h| h.keyword.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> Tables {
        Tables {
            users: vec![
                User { username: "owner".into(), is_staff: false },
                User { username: "admin".into(), is_staff: true },
                User { username: "other".into(), is_staff: false },
            ],
            pictures: vec![
                Picture { id: 1, description: "leaf".into(), owner: "owner".into(), is_private: true },
                Picture { id: 2, description: "ear".into(), owner: "owner".into(), is_private: false },
            ],
            tag_groups: vec![
                TagGroup { id: 10, picture_id: 1, name: "g".into(), user: "owner".into() },
                TagGroup { id: 20, picture_id: 2, name: "g".into(), user: "owner".into() },
            ],
            tags: vec![
                Tag { id: 100, group_id: 10, description: String::new(), color: [0, 0, 0], user: "owner".into() },
                Tag { id: 200, group_id: 20, description: String::new(), color: [0, 0, 0], user: "owner".into() },
            ],
            ..Tables::default()
        }
    }

    #[test]
    fn test_write_permission() {
        let t = tables();
        let private = t.tag(100).unwrap();
        assert!(t.can_write_tag(Some("owner"), private));
        assert!(t.can_write_tag(Some("admin"), private));
        assert!(!t.can_write_tag(Some("other"), private));
        assert!(!t.can_write_tag(Some("ghost"), private));
        assert!(!t.can_write_tag(None, private));
    }

    #[test]
    fn test_read_permission() {
        let t = tables();
        assert!(!t.can_read_tag(None, t.tag(100).unwrap()));
        assert!(t.can_read_tag(Some("owner"), t.tag(100).unwrap()));
        assert!(t.can_read_tag(None, t.tag(200).unwrap()));
    }

    #[test]
    fn test_next_gene_link_id() {
        let mut t = tables();
        assert_eq!(t.next_gene_link_id(), 1);
        t.gene_links.push(GeneLink { id: 41, tag_id: 100, feature_id: 1, user: "owner".into(), allele: None });
        assert_eq!(t.next_gene_link_id(), 42);
    }
}
