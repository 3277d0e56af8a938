//! JSON shape of a gene link.

use serde_json::{json, Map, Value};

use crate::store::{GeneLink, Tables};
use crate::webservice::{DomainError, ErrorCode, FieldLimit, Payload, ServiceResult};

/// `{id, user, tagId, feature: {uniqueName, name, allele, organismId}}`,
/// restricted by `limit`.
pub fn link_payload(tables: &Tables, link: &GeneLink, limit: FieldLimit) -> ServiceResult<Payload> {
    let feature = tables.feature(link.feature_id).ok_or_else(|| {
        DomainError::with_detail(
            ErrorCode::InternalError,
            format!("gene link {} references missing feature {}", link.id, link.feature_id),
        )
    })?;

    let mut nested = Map::new();
    nested.insert("uniqueName".into(), json!(feature.uniquename));
    nested.insert("name".into(), json!(feature.name));
    nested.insert("allele".into(), json!(link.allele));
    nested.insert("organismId".into(), json!(feature.organism_id));

    let mut payload = Payload::new(limit);
    payload
        .put("id", link.id)
        .put("user", link.user.as_str())
        .put("tagId", link.tag_id)
        .put_nested("feature", nested);
    Ok(payload)
}

/// Payload object for a single link, for embedding in lists.
pub fn link_value(tables: &Tables, link: &GeneLink, limit: &FieldLimit) -> ServiceResult<Value> {
    link_payload(tables, link, limit.clone()).map(Payload::into_value)
}
