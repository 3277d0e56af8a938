//! Gene link web service (`/api/geneLinks`).
//!
//! | Verb   | Parameters                                   | Result                  |
//! |--------|----------------------------------------------|-------------------------|
//! | GET    | `geneLinkId` or `tagId`                      | link, or `{geneLinks}`  |
//! | POST   | `tagId`, `name`, `organismId`, `allele`?     | created link (201)      |
//! | DELETE | `geneLinkId`                                 | deleted link            |
//!
//! Every verb honours the `fields` parameter.

pub mod create;
pub mod payload;
pub mod read;

use std::sync::Arc;

use crate::store::Store;
use crate::webservice::{DomainError, Payload, Resource, ServiceRequest, ServiceResult};

pub use create::{create_gene_link, CreateGeneLink, TagRef};
pub use read::{delete_gene_link, get_gene_link, list_gene_links};

/// The gene link resource.
#[derive(Clone)]
pub struct GeneLinks {
    store: Arc<Store>,
}

impl GeneLinks {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

impl Resource for GeneLinks {
    fn name(&self) -> &'static str {
        "geneLinks"
    }

    fn get(&self, request: &ServiceRequest) -> ServiceResult<Payload> {
        let user = request.user.as_deref();
        if let Some(id) = request.id_param("geneLinkId")? {
            return get_gene_link(&self.store, user, id, &request.fields);
        }
        match request.id_param("tagId")? {
            Some(tag_id) => list_gene_links(&self.store, user, tag_id, &request.fields),
            None => Err(DomainError::missing_parameter("geneLinkId or tagId")),
        }
    }

    fn create(&self, request: &ServiceRequest) -> ServiceResult<Payload> {
        let input = CreateGeneLink {
            tag: TagRef::Key(request.require("tagId")?),
            name: request.param("name"),
            allele: request.raw_param("allele"),
            organism_id: request.param("organismId"),
        };
        create_gene_link(&self.store, request.user.as_deref(), input, &request.fields)
    }

    fn delete(&self, request: &ServiceRequest) -> ServiceResult<Payload> {
        let id = request
            .id_param("geneLinkId")?
            .ok_or_else(|| DomainError::missing_parameter("geneLinkId"))?;
        delete_gene_link(&self.store, request.user.as_deref(), id, &request.fields)
    }
}
