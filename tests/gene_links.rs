//! Gene link service behaviour through the dispatcher.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{call, error_code, store, MAIZE, PRIVATE_TAG, PUBLIC_TAG};
use taxon_home::genelinks::{create_gene_link, CreateGeneLink, GeneLinks, TagRef};
use taxon_home::store::Tag;
use taxon_home::webservice::{ErrorCode, FieldLimit};

fn links_on(service: &GeneLinks, tag: u64) -> usize {
    let envelope = call(service, Method::GET, Some("owner"), json!({ "tagId": tag }));
    envelope.payload().unwrap()["geneLinks"].as_array().unwrap().len()
}

#[test]
fn test_create_returns_link_payload() {
    let store = store();
    let service = GeneLinks::new(store.clone());

    let envelope = call(
        &service,
        Method::POST,
        Some("owner"),
        json!({ "tagId": "100", "name": "wx1", "organismId": "4577", "allele": "wx1-m1" }),
    );

    assert_eq!(envelope.status(), StatusCode::CREATED);
    assert_eq!(
        envelope.payload().unwrap(),
        &json!({
            "id": 2,
            "user": "owner",
            "tagId": 100,
            "feature": {
                "uniqueName": "GRMZM2G024993",
                "name": "wx1",
                "allele": "wx1-m1",
                "organismId": MAIZE,
            }
        })
    );
    assert_eq!(store.counts().gene_links, 2);
}

#[test]
fn test_create_with_id_field_limit() {
    let service = GeneLinks::new(store());
    let envelope = call(
        &service,
        Method::POST,
        Some("curator"),
        json!({ "tagId": PUBLIC_TAG, "name": "wx1", "organismId": MAIZE, "fields": "id" }),
    );
    assert_eq!(envelope.payload().unwrap(), &json!({ "id": 2 }));
}

#[test]
fn test_nested_field_limit() {
    let service = GeneLinks::new(store());
    let envelope = call(
        &service,
        Method::GET,
        None,
        json!({ "geneLinkId": 1, "fields": "tagId,feature,name" }),
    );
    assert_eq!(
        envelope.payload().unwrap(),
        &json!({ "tagId": 100, "feature": { "name": "sh2" } })
    );

    let envelope = call(
        &service,
        Method::GET,
        None,
        json!({ "geneLinkId": 1, "fields": "tagId,name" }),
    );
    assert_eq!(envelope.payload().unwrap(), &json!({ "tagId": 100 }));
}

#[test]
fn test_unknown_allele_persists_nothing() {
    let store = store();
    let service = GeneLinks::new(store.clone());
    let envelope = call(
        &service,
        Method::POST,
        Some("owner"),
        json!({ "tagId": "100", "name": "wx1", "organismId": "4577", "allele": "no-such-allele" }),
    );
    assert_eq!(envelope.status(), StatusCode::NOT_FOUND);
    assert_eq!(error_code(&envelope), "NO_MATCHING_ALLELE");
    assert_eq!(store.counts().gene_links, 1);
}

#[test]
fn test_blank_allele_is_malformed() {
    let store = store();
    let service = GeneLinks::new(store.clone());
    let envelope = call(
        &service,
        Method::POST,
        Some("owner"),
        json!({ "tagId": "100", "name": "wx1", "organismId": "4577", "allele": "   " }),
    );
    assert_eq!(error_code(&envelope), "NO_MATCHING_ALLELE");
    assert_eq!(envelope.error().unwrap().detail(), Some("   "));
    assert_eq!(store.counts().gene_links, 1);
}

#[test]
fn test_ambiguous_allele_is_rejected() {
    let service = GeneLinks::new(store());
    let envelope = call(
        &service,
        Method::POST,
        Some("owner"),
        json!({ "tagId": "100", "name": "wx1", "organismId": "4577", "allele": "dup-allele" }),
    );
    assert_eq!(error_code(&envelope), "NO_MATCHING_ALLELE");
}

#[test]
fn test_unknown_feature_names_parameters() {
    let store = store();
    let service = GeneLinks::new(store.clone());
    let envelope = call(
        &service,
        Method::POST,
        Some("owner"),
        json!({ "tagId": "100", "name": "nope", "organismId": "4577" }),
    );
    let error = envelope.error().unwrap();
    assert_eq!(error.code().as_str(), "NO_MATCHING_FEATURE");
    assert_eq!(
        error.detail(),
        Some("Could not find a feature with the parameters: name: nope, organismId: 4577")
    );
    assert_eq!(store.counts().gene_links, 1);
}

#[test]
fn test_ambiguous_feature_lists_candidates() {
    let store = store();
    let service = GeneLinks::new(store.clone());
    let envelope = call(
        &service,
        Method::POST,
        Some("owner"),
        json!({ "tagId": "100", "name": "dup1", "organismId": "4577" }),
    );
    let detail = envelope.error().unwrap().detail().unwrap().to_string();
    assert!(detail.starts_with("Multiple matches for parameters: name: dup1, organismId: 4577"));
    assert!(detail.contains("uniquename: GRMZM5G800001, name: dup1, organism: maize"));
    assert!(detail.contains("uniquename: GRMZM5G800002, name: dup1, organism: maize"));
    assert_eq!(store.counts().gene_links, 1);
}

#[test]
fn test_feature_name_is_scoped_to_organism() {
    let service = GeneLinks::new(store());
    let envelope = call(
        &service,
        Method::POST,
        Some("owner"),
        json!({ "tagId": "100", "name": "wx1", "organismId": "3702" }),
    );
    assert!(envelope.is_success());
    assert_eq!(envelope.payload().unwrap()["feature"]["uniqueName"], "AT1G01010");
}

#[test]
fn test_create_without_permission_persists_nothing() {
    let store = store();
    let service = GeneLinks::new(store.clone());
    let params = json!({ "tagId": "100", "name": "wx1", "organismId": "4577", "allele": "wx1-m1" });

    for user in [Some("stranger"), Some("ghost"), None] {
        let envelope = call(&service, Method::POST, user, params.clone());
        assert_eq!(envelope.status(), StatusCode::FORBIDDEN);
        assert_eq!(error_code(&envelope), "AUTHENTICATION");
    }
    assert_eq!(store.counts().gene_links, 1);
}

#[test]
fn test_invalid_tag_key() {
    let service = GeneLinks::new(store());
    let envelope = call(
        &service,
        Method::POST,
        Some("owner"),
        json!({ "tagId": "abc", "name": "wx1", "organismId": "4577" }),
    );
    assert_eq!(error_code(&envelope), "INVALID_TAG_GROUP_KEY");
    assert_eq!(envelope.error().unwrap().detail(), Some("abc"));
}

#[test]
fn test_duplicate_link_is_integrity_error() {
    let store = store();
    let service = GeneLinks::new(store.clone());
    let envelope = call(
        &service,
        Method::POST,
        Some("owner"),
        json!({ "tagId": "100", "name": "sh2", "organismId": "4577" }),
    );
    assert_eq!(envelope.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&envelope), "INTEGRITY_ERROR");
    assert_eq!(store.counts().gene_links, 1);
}

#[test]
fn test_create_requires_tag() {
    let service = GeneLinks::new(store());
    let envelope = call(&service, Method::POST, Some("owner"), json!({ "name": "wx1" }));
    assert_eq!(error_code(&envelope), "MISSING_PARAMETER");
}

#[test]
fn test_get_by_id_and_by_tag() {
    let store = store();
    let service = GeneLinks::new(store.clone());

    let one = call(&service, Method::GET, None, json!({ "geneLinkId": "1" }));
    assert_eq!(one.status(), StatusCode::OK);
    assert_eq!(one.payload().unwrap()["feature"]["name"], "sh2");

    let missing = call(&service, Method::GET, None, json!({ "geneLinkId": "99" }));
    assert_eq!(error_code(&missing), "NO_MATCHING_GENE_LINK");

    let bad = call(&service, Method::GET, None, json!({ "geneLinkId": "x" }));
    assert_eq!(error_code(&bad), "INVALID_PARAMETER");

    assert_eq!(links_on(&service, PUBLIC_TAG), 1);

    let none = call(&service, Method::GET, None, json!({}));
    assert_eq!(error_code(&none), "MISSING_PARAMETER");
}

#[test]
fn test_private_tag_hidden_from_strangers() {
    let store = store();
    let service = GeneLinks::new(store.clone());

    let created = call(
        &service,
        Method::POST,
        Some("owner"),
        json!({ "tagId": PRIVATE_TAG, "name": "wx1", "organismId": MAIZE }),
    );
    assert!(created.is_success());

    let denied = call(&service, Method::GET, Some("stranger"), json!({ "tagId": PRIVATE_TAG }));
    assert_eq!(error_code(&denied), "AUTHENTICATION");

    let staff = call(&service, Method::GET, Some("curator"), json!({ "tagId": PRIVATE_TAG }));
    assert!(staff.is_success());
}

#[test]
fn test_delete_removes_exactly_one() {
    let store = store();
    let service = GeneLinks::new(store.clone());

    let denied = call(&service, Method::DELETE, Some("stranger"), json!({ "geneLinkId": 1 }));
    assert_eq!(error_code(&denied), "AUTHENTICATION");
    assert_eq!(store.counts().gene_links, 1);

    let deleted = call(&service, Method::DELETE, Some("owner"), json!({ "geneLinkId": 1 }));
    assert_eq!(deleted.status(), StatusCode::OK);
    assert_eq!(deleted.payload().unwrap()["id"], 1);
    assert_eq!(store.counts().gene_links, 0);

    let again = call(&service, Method::DELETE, Some("owner"), json!({ "geneLinkId": 1 }));
    assert_eq!(error_code(&again), "NO_MATCHING_GENE_LINK");
}

#[test]
fn test_unsupported_verb() {
    let service = GeneLinks::new(store());
    let envelope = call(&service, Method::PUT, Some("owner"), json!({ "geneLinkId": 1 }));
    assert_eq!(envelope.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(error_code(&envelope), "INVALID_METHOD");
}

fn resolved_create(tag: Tag) -> CreateGeneLink {
    CreateGeneLink {
        tag: TagRef::Resolved(tag),
        name: Some("wx1".into()),
        allele: None,
        organism_id: Some(MAIZE.to_string()),
    }
}

#[test]
fn test_resolved_tag_still_checks_permission() {
    let store = store();
    let tag = store.read(|t| t.tag(PUBLIC_TAG).cloned()).unwrap();

    let err = create_gene_link(&store, Some("stranger"), resolved_create(tag.clone()), &FieldLimit::all())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Authentication);
    assert_eq!(store.counts().gene_links, 1);

    let payload = create_gene_link(&store, Some("owner"), resolved_create(tag), &FieldLimit::all()).unwrap();
    assert_eq!(payload.get("tagId"), Some(&json!(PUBLIC_TAG)));
    assert_eq!(store.counts().gene_links, 2);
}

#[test]
fn test_resolved_tag_missing_from_store_is_integrity_error() {
    let store = store();
    let stale = Tag {
        id: 999,
        group_id: 10,
        description: "removed".into(),
        color: [0, 0, 0],
        user: "owner".into(),
    };

    let err = create_gene_link(&store, Some("owner"), resolved_create(stale), &FieldLimit::all())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::IntegrityError);
    assert!(err.detail().unwrap().contains("missing tag 999"));
    assert_eq!(store.counts().gene_links, 1);
}
