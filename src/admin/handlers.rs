use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::store::TableCounts;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct CatalogueStats {
    pub tables: TableCounts,
    pub domain_errors: BTreeMap<&'static str, u64>,
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn get_stats(State(state): State<AppState>) -> Json<CatalogueStats> {
    Json(CatalogueStats {
        tables: state.store.counts(),
        domain_errors: state.errors.snapshot(),
    })
}
