//! Taxon Home web-service library: gene-link annotations and image search
//! over an annotated picture catalogue.

pub mod admin;
pub mod config;
pub mod genelinks;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod search;
pub mod store;
pub mod webservice;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
