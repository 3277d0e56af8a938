//! Image search (`/api/search`) and search history (`/api/searchHistory`).
//!
//! Search is a plain case-insensitive substring filter per enabled category;
//! results are not ranked. Categories are reported in a fixed order.

use std::sync::Arc;

use serde::Serialize;

use crate::store::{Store, Tables};
use crate::webservice::{
    DomainError, ErrorCode, FieldLimit, Payload, Resource, ServiceRequest, ServiceResult,
};

/// Searchable categories, each enabled by its own flag parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    ImageDescription,
    ImageNotes,
    GeneName,
    GeneSymbol,
    GeneId,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::ImageDescription,
        Category::ImageNotes,
        Category::GeneName,
        Category::GeneSymbol,
        Category::GeneId,
    ];

    /// Request parameter enabling this category.
    pub fn flag(self) -> &'static str {
        match self {
            Category::ImageDescription => "searchImageDesc",
            Category::ImageNotes => "searchImageNotes",
            Category::GeneName => "searchGeneName",
            Category::GeneSymbol => "searchGeneSymbol",
            Category::GeneId => "searchGeneID",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::ImageDescription => "Image Description",
            Category::ImageNotes => "Image Notes",
            Category::GeneName => "Gene Name",
            Category::GeneSymbol => "Gene Symbol",
            Category::GeneId => "Gene ID",
        }
    }

    /// Picture ids whose field contains `needle` (already lowercased),
    /// de-duplicated in first-seen order.
    fn matches(self, tables: &Tables, needle: &str) -> Vec<u64> {
        let hit = |text: &str| text.to_lowercase().contains(needle);
        let ids: Vec<u64> = match self {
            Category::ImageDescription => tables
                .pictures
                .iter()
                .filter(|p| hit(&p.description))
                .map(|p| p.id)
                .collect(),
            Category::ImageNotes => tables
                .picture_notes
                .iter()
                .filter(|n| hit(&n.notes))
                .map(|n| n.picture_id)
                .collect(),
            Category::GeneName => tables
                .picture_mgdb
                .iter()
                .filter(|m| hit(&m.locus_full_name))
                .map(|m| m.picture_id)
                .collect(),
            Category::GeneSymbol => tables
                .picture_mgdb
                .iter()
                .filter(|m| hit(&m.locus_name))
                .map(|m| m.picture_id)
                .collect(),
            Category::GeneId => tables
                .picture_gene_ids
                .iter()
                .filter(|g| hit(&g.gene_id))
                .map(|g| g.picture_id)
                .collect(),
        };
        let mut seen = Vec::with_capacity(ids.len());
        for id in ids {
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
        seen
    }
}

/// Matches for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResult {
    pub category: &'static str,
    pub picture_ids: Vec<u64>,
}

/// Run a search over the enabled categories.
pub fn search_pictures(tables: &Tables, query: &str, enabled: &[Category]) -> Vec<CategoryResult> {
    let needle = query.to_lowercase();
    Category::ALL
        .into_iter()
        .filter(|c| enabled.contains(c))
        .map(|c| CategoryResult {
            category: c.label(),
            picture_ids: c.matches(tables, &needle),
        })
        .collect()
}

/// Split a comma-delimited query; the first non-blank entry is the term.
pub fn query_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// The image search resource. GET only.
#[derive(Clone)]
pub struct ImageSearch {
    store: Arc<Store>,
}

impl ImageSearch {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

impl Resource for ImageSearch {
    fn name(&self) -> &'static str {
        "search"
    }

    fn get(&self, request: &ServiceRequest) -> ServiceResult<Payload> {
        let raw = request.param("query").unwrap_or_default();
        let terms = query_terms(&raw);
        let Some(term) = terms.first() else {
            return Err(DomainError::missing_parameter("query"));
        };
        let enabled: Vec<Category> = Category::ALL
            .into_iter()
            .filter(|c| request.flag(c.flag()))
            .collect();

        let candidates = self.store.read(|tables| search_pictures(tables, term, &enabled));

        if let Some(user) = request.user.as_deref() {
            let known = self.store.read(|tables| tables.user(user).is_some());
            if known {
                let created = self
                    .store
                    .transaction(|tx| Ok::<_, DomainError>(tx.get_or_create_search(user, term)))?;
                tracing::debug!(user, keyword = %term, created, "Search keyword recorded");
            }
        }

        let mut payload = request.payload();
        payload
            .put("query", term.as_str())
            .put("candidates", serde_json::to_value(&candidates).map_err(internal)?);
        Ok(payload)
    }
}

fn internal(err: serde_json::Error) -> DomainError {
    DomainError::with_detail(ErrorCode::InternalError, err.to_string())
}

/// Keywords previously searched by the acting user. GET only.
#[derive(Clone)]
pub struct SearchHistoryService {
    store: Arc<Store>,
}

impl SearchHistoryService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

impl Resource for SearchHistoryService {
    fn name(&self) -> &'static str {
        "searchHistory"
    }

    fn get(&self, request: &ServiceRequest) -> ServiceResult<Payload> {
        let user = request.user.as_deref().ok_or_else(DomainError::authentication)?;
        let keywords: Vec<String> = self.store.read(|tables| {
            if tables.user(user).is_none() {
                return Err(DomainError::authentication());
            }
            Ok(tables
                .search_keywords(user)
                .into_iter()
                .map(str::to_string)
                .collect())
        })?;
        let mut payload = Payload::new(FieldLimit::all());
        payload.put("keywords", keywords);
        Ok(payload)
    }
}
