//! Gene link creation.
//!
//! The whole check-then-insert sequence runs in one store transaction; any
//! failure leaves the catalogue untouched.

use crate::genelinks::payload::link_payload;
use crate::store::{Feature, NewGeneLink, Store, Tables, Tag};
use crate::webservice::{DomainError, ErrorCode, FieldLimit, Payload, ServiceResult};

/// How the caller identifies the tag to link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagRef {
    /// Primary key as received from the client.
    Key(String),
    /// A tag the caller has already loaded.
    Resolved(Tag),
}

/// Parameters of a new gene link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGeneLink {
    pub tag: TagRef,
    /// Feature name.
    pub name: Option<String>,
    pub allele: Option<String>,
    pub organism_id: Option<String>,
}

/// Create a gene link on behalf of `user`.
pub fn create_gene_link(
    store: &Store,
    user: Option<&str>,
    input: CreateGeneLink,
    limit: &FieldLimit,
) -> ServiceResult<Payload> {
    store.transaction(|tx| {
        let allele = resolve_allele(tx.tables(), input.allele.as_deref())?;
        let tag = resolve_tag(tx.tables(), input.tag)?;

        let username = match user {
            Some(name) if tx.tables().can_write_tag(Some(name), &tag) => name.to_string(),
            _ => return Err(DomainError::authentication()),
        };

        let feature_id = resolve_feature(
            tx.tables(),
            input.name.as_deref(),
            input.organism_id.as_deref(),
        )?
        .feature_id;

        let link = tx.insert_gene_link(NewGeneLink {
            tag_id: tag.id,
            feature_id,
            user: username,
            allele,
        })?;

        tracing::info!(
            gene_link = link.id,
            tag = link.tag_id,
            feature = link.feature_id,
            user = %link.user,
            "Gene link created"
        );
        link_payload(tx.tables(), &link, limit.clone())
    })
}

/// Resolve an optional allele name to the stored name.
///
/// An empty name means no allele. A malformed name, or one that matches no
/// variation or several, fails with `NO_MATCHING_ALLELE`.
pub fn resolve_allele(tables: &Tables, allele: Option<&str>) -> ServiceResult<Option<String>> {
    let Some(name) = allele.filter(|a| !a.is_empty()) else {
        return Ok(None);
    };
    if name.trim().is_empty() || name.chars().any(char::is_control) {
        return Err(DomainError::with_detail(ErrorCode::NoMatchingAllele, name));
    }
    match tables.variations_named(name).len() {
        1 => Ok(Some(name.to_string())),
        0 => Err(DomainError::with_detail(ErrorCode::NoMatchingAllele, name)),
        n => Err(DomainError::with_detail(
            ErrorCode::NoMatchingAllele,
            format!("{name} (matches {n} variations)"),
        )),
    }
}

/// Resolve a tag reference; keys must name exactly one tag.
pub fn resolve_tag(tables: &Tables, tag: TagRef) -> ServiceResult<Tag> {
    match tag {
        TagRef::Resolved(tag) => Ok(tag),
        TagRef::Key(key) => key
            .trim()
            .parse::<u64>()
            .ok()
            .and_then(|id| tables.tag(id))
            .cloned()
            .ok_or_else(|| DomainError::with_detail(ErrorCode::InvalidTagGroupKey, key)),
    }
}

/// Find the single feature with `name` in `organism_id`.
///
/// Both zero and several matches fail with `NO_MATCHING_FEATURE`; the
/// ambiguous case lists every candidate.
pub fn resolve_feature<'t>(
    tables: &'t Tables,
    name: Option<&str>,
    organism_id: Option<&str>,
) -> ServiceResult<&'t Feature> {
    let (Some(name), Some(organism)) = (name, organism_id) else {
        return Err(DomainError::with_detail(
            ErrorCode::NoMatchingFeature,
            "Could not find a feature with the parameters: ",
        ));
    };
    let params = format!("name: {name}, organismId: {organism}");

    let candidates = match organism.trim().parse::<u64>() {
        Ok(id) => tables.features_matching(name, id),
        Err(_) => Vec::new(),
    };

    match candidates.as_slice() {
        [feature] => Ok(feature),
        [] => Err(DomainError::with_detail(
            ErrorCode::NoMatchingFeature,
            format!("Could not find a feature with the parameters: {params}"),
        )),
        many => {
            let mut message = format!("Multiple matches for parameters: {params}\n\nResponses:\n");
            for feature in many {
                let organism = tables
                    .organism(feature.organism_id)
                    .map(|o| o.common_name.as_str())
                    .unwrap_or("unknown");
                message.push_str(&format!(
                    "\nuniquename: {}, name: {}, organism: {}",
                    feature.uniquename, feature.name, organism
                ));
            }
            Err(DomainError::with_detail(ErrorCode::NoMatchingFeature, message))
        }
    }
}
