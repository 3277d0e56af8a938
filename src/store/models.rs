//! Catalogue record types.
//!
//! Field names follow the snapshot file format.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    /// Staff users can write to every tag.
    #[serde(default)]
    pub is_staff: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organism {
    pub organism_id: u64,
    pub common_name: String,
}

/// A named genomic feature scoped to an organism.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub feature_id: u64,
    pub uniquename: String,
    pub name: String,
    pub organism_id: u64,
}

/// A named genetic variant (allele).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    pub variation_id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    pub id: u64,
    #[serde(default)]
    pub description: String,
    /// Username of the uploader.
    pub owner: String,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagGroup {
    pub id: u64,
    pub picture_id: u64,
    #[serde(default)]
    pub name: String,
    pub user: String,
}

/// An annotated region of a picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: u64,
    pub group_id: u64,
    #[serde(default)]
    pub description: String,
    /// RGB colour of the region outline.
    #[serde(default)]
    pub color: [u8; 3],
    pub user: String,
}

/// Association of a tag with a feature, made by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneLink {
    pub id: u64,
    pub tag_id: u64,
    pub feature_id: u64,
    pub user: String,
    #[serde(default)]
    pub allele: Option<String>,
}

/// Fields of a gene link before an id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGeneLink {
    pub tag_id: u64,
    pub feature_id: u64,
    pub user: String,
    pub allele: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictureNote {
    pub picture_id: u64,
    pub notes: String,
}

/// Gene annotations imported from MaizeGDB for a picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictureMgdb {
    pub picture_id: u64,
    #[serde(default)]
    pub locus_name: String,
    #[serde(default)]
    pub locus_full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PictureGeneId {
    pub picture_id: u64,
    pub gene_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHistory {
    pub keyword: String,
    pub user: String,
}
