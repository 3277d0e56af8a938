//! Response handling.
//!
//! # Responsibilities
//! - Turn a [`ResultEnvelope`] into the HTTP response
//! - Count domain errors per code for the admin API
//!
//! # Design Decisions
//! - Counting uses a concurrent map so handlers never contend on a lock

use std::collections::BTreeMap;

use axum::response::{IntoResponse, Response};
use dashmap::DashMap;

use crate::webservice::{ErrorCode, ResultEnvelope};

/// Domain errors seen since startup, per code.
#[derive(Debug, Default)]
pub struct ErrorTally {
    counts: DashMap<ErrorCode, u64>,
}

impl ErrorTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, code: ErrorCode) {
        *self.counts.entry(code).or_insert(0) += 1;
    }

    pub fn get(&self, code: ErrorCode) -> u64 {
        self.counts.get(&code).map(|c| *c.value()).unwrap_or(0)
    }

    /// Non-zero counts keyed by wire name.
    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        self.counts
            .iter()
            .filter(|entry| *entry.value() > 0)
            .map(|entry| (entry.key().as_str(), *entry.value()))
            .collect()
    }
}

/// Emit the envelope, counting it if it carries an error.
pub fn respond(envelope: ResultEnvelope, tally: &ErrorTally) -> Response {
    if let Some(error) = envelope.error() {
        tally.record(error.code());
    }
    envelope.into_response()
}
