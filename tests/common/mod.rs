//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use serde_json::{Map, Value};
use tokio::net::TcpListener;

use taxon_home::config::AppConfig;
use taxon_home::store::{
    Feature, GeneLink, Organism, Picture, PictureGeneId, PictureMgdb, PictureNote, Store, Tables,
    Tag, TagGroup, User, Variation,
};
use taxon_home::webservice::{dispatch, Resource, ResultEnvelope, ServiceRequest};
use taxon_home::{HttpServer, Shutdown};

pub const MAIZE: u64 = 4577;
pub const PUBLIC_TAG: u64 = 100;
pub const PRIVATE_TAG: u64 = 200;
pub const ADMIN_KEY: &str = "test-admin-key";

/// A small catalogue:
/// - `owner` uploaded a public picture (tag 100) and a private one (tag 200)
/// - `curator` is staff, `stranger` owns nothing
/// - features `dup1` and allele `dup-allele` are ambiguous
/// - link 1 joins tag 100 to `sh2`
pub fn catalogue() -> Tables {
    Tables {
        users: vec![
            user("owner", false),
            user("curator", true),
            user("stranger", false),
        ],
        organisms: vec![
            Organism { organism_id: MAIZE, common_name: "maize".into() },
            Organism { organism_id: 3702, common_name: "arabidopsis".into() },
        ],
        features: vec![
            feature(1, "GRMZM2G024993", "wx1", MAIZE),
            feature(2, "GRMZM2G429899", "sh2", MAIZE),
            feature(3, "GRMZM5G800001", "dup1", MAIZE),
            feature(4, "GRMZM5G800002", "dup1", MAIZE),
            feature(5, "AT1G01010", "wx1", 3702),
        ],
        variations: vec![
            Variation { variation_id: 1, name: "wx1-m1".into() },
            Variation { variation_id: 2, name: "dup-allele".into() },
            Variation { variation_id: 3, name: "dup-allele".into() },
        ],
        pictures: vec![
            Picture {
                id: 1,
                description: "Waxy kernels on a mature ear".into(),
                owner: "owner".into(),
                is_private: false,
            },
            Picture {
                id: 2,
                description: "Leaf sheath lesion".into(),
                owner: "owner".into(),
                is_private: true,
            },
        ],
        tag_groups: vec![
            TagGroup { id: 10, picture_id: 1, name: "kernels".into(), user: "owner".into() },
            TagGroup { id: 20, picture_id: 2, name: "lesions".into(), user: "owner".into() },
        ],
        tags: vec![
            Tag {
                id: PUBLIC_TAG,
                group_id: 10,
                description: "waxy kernel".into(),
                color: [255, 0, 0],
                user: "owner".into(),
            },
            Tag {
                id: PRIVATE_TAG,
                group_id: 20,
                description: "lesion".into(),
                color: [0, 0, 255],
                user: "owner".into(),
            },
        ],
        gene_links: vec![GeneLink {
            id: 1,
            tag_id: PUBLIC_TAG,
            feature_id: 2,
            user: "owner".into(),
            allele: None,
        }],
        picture_notes: vec![PictureNote { picture_id: 2, notes: "possible waxy cross".into() }],
        picture_mgdb: vec![PictureMgdb {
            picture_id: 1,
            locus_name: "wx1".into(),
            locus_full_name: "waxy1".into(),
        }],
        picture_gene_ids: vec![PictureGeneId { picture_id: 1, gene_id: "GRMZM2G024993".into() }],
        ..Tables::default()
    }
}

fn user(name: &str, is_staff: bool) -> User {
    User { username: name.into(), is_staff }
}

fn feature(id: u64, uniquename: &str, name: &str, organism_id: u64) -> Feature {
    Feature {
        feature_id: id,
        uniquename: uniquename.into(),
        name: name.into(),
        organism_id,
    }
}

pub fn store() -> Arc<Store> {
    Arc::new(Store::new(catalogue()))
}

/// Build a request from a JSON object literal.
pub fn request(user: Option<&str>, params: Value) -> ServiceRequest {
    let params = match params {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    ServiceRequest::new(user.map(str::to_string), params)
}

pub fn call<R: Resource>(resource: &R, method: Method, user: Option<&str>, params: Value) -> ResultEnvelope {
    dispatch(resource, &method, &request(user, params))
}

/// Error code string of a failed envelope.
pub fn error_code(envelope: &ResultEnvelope) -> &'static str {
    envelope
        .error()
        .map(|e| e.code().as_str())
        .unwrap_or("NONE")
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.into();
    config
}

/// Serve the API on an ephemeral port until the returned handle is triggered.
pub async fn spawn_server(config: AppConfig, store: Arc<Store>) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let server = HttpServer::new(config, store);
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}
