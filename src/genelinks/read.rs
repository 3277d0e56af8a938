//! Gene link lookup and deletion.

use serde_json::Value;

use crate::genelinks::payload::{link_payload, link_value};
use crate::store::{Store, Tables, Tag};
use crate::webservice::{DomainError, ErrorCode, FieldLimit, Payload, ServiceResult};

fn link_tag<'t>(tables: &'t Tables, tag_id: u64) -> ServiceResult<&'t Tag> {
    tables.tag(tag_id).ok_or_else(|| {
        DomainError::with_detail(ErrorCode::InvalidTagGroupKey, tag_id.to_string())
    })
}

/// A single link, readable when its tag is.
pub fn get_gene_link(
    store: &Store,
    user: Option<&str>,
    id: u64,
    limit: &FieldLimit,
) -> ServiceResult<Payload> {
    store.read(|tables| {
        let link = tables
            .gene_link(id)
            .ok_or_else(|| DomainError::with_detail(ErrorCode::NoMatchingGeneLink, id.to_string()))?;
        let tag = link_tag(tables, link.tag_id)?;
        if !tables.can_read_tag(user, tag) {
            return Err(DomainError::authentication());
        }
        link_payload(tables, link, limit.clone())
    })
}

/// All links on a tag as `{geneLinks: [...]}`; the limit applies per link.
pub fn list_gene_links(
    store: &Store,
    user: Option<&str>,
    tag_id: u64,
    limit: &FieldLimit,
) -> ServiceResult<Payload> {
    store.read(|tables| {
        let tag = link_tag(tables, tag_id)?;
        if !tables.can_read_tag(user, tag) {
            return Err(DomainError::authentication());
        }
        let links = tables
            .gene_links_for_tag(tag_id)
            .into_iter()
            .map(|link| link_value(tables, link, limit))
            .collect::<ServiceResult<Vec<Value>>>()?;

        let mut payload = Payload::new(FieldLimit::all());
        payload.put("geneLinks", links);
        Ok(payload)
    })
}

/// Delete a link; requires write permission on its tag. Returns the removed
/// link.
pub fn delete_gene_link(
    store: &Store,
    user: Option<&str>,
    id: u64,
    limit: &FieldLimit,
) -> ServiceResult<Payload> {
    store.transaction(|tx| {
        let (tag_id, payload) = {
            let tables = tx.tables();
            let link = tables.gene_link(id).ok_or_else(|| {
                DomainError::with_detail(ErrorCode::NoMatchingGeneLink, id.to_string())
            })?;
            let tag = link_tag(tables, link.tag_id)?;
            if !tables.can_write_tag(user, tag) {
                return Err(DomainError::authentication());
            }
            (tag.id, link_payload(tables, link, limit.clone())?)
        };
        tx.delete_gene_link(id)?;
        tracing::info!(gene_link = id, tag = tag_id, user = user.unwrap_or_default(), "Gene link deleted");
        Ok(payload)
    })
}
