//! Result envelope returned by every web-service handler.

use std::collections::BTreeSet;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{Map, Value};

use crate::webservice::errors::DomainError;

/// Optional set of field names a client asked for.
///
/// An unrestricted limit lets every key through.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldLimit {
    fields: Option<BTreeSet<String>>,
}

impl FieldLimit {
    /// A limit that emits every field.
    pub fn all() -> Self {
        Self { fields: None }
    }

    /// Restrict output to the given names.
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: Some(fields.into_iter().map(Into::into).collect()),
        }
    }

    /// Parse a comma-delimited `fields` parameter. Blank entries are ignored;
    /// a parameter with no names is unrestricted.
    pub fn parse(raw: Option<&str>) -> Self {
        let fields: BTreeSet<String> = raw
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();
        if fields.is_empty() {
            Self::all()
        } else {
            Self { fields: Some(fields) }
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.fields.is_some()
    }

    pub fn allows(&self, key: &str) -> bool {
        self.fields.as_ref().map_or(true, |f| f.contains(key))
    }

    /// Filter a nested object.
    ///
    /// Keys are filtered only when the limit names at least one of them, so
    /// asking for the parent alone yields the whole object.
    pub fn limit_nested(&self, object: Map<String, Value>) -> Map<String, Value> {
        match &self.fields {
            Some(fields) if object.keys().any(|k| fields.contains(k)) => object
                .into_iter()
                .filter(|(k, _)| fields.contains(k))
                .collect(),
            _ => object,
        }
    }
}

/// A success payload being assembled under a [`FieldLimit`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    limit: FieldLimit,
    object: Map<String, Value>,
}

impl Payload {
    pub fn new(limit: FieldLimit) -> Self {
        Self {
            limit,
            object: Map::new(),
        }
    }

    /// Insert a value if the limit allows the key.
    pub fn put(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        if self.limit.allows(key) {
            self.object.insert(key.to_string(), value.into());
        }
        self
    }

    /// Insert a nested object.
    ///
    /// The object is kept only when the limit names its key; its own keys
    /// are then filtered by [`FieldLimit::limit_nested`].
    pub fn put_nested(&mut self, key: &str, object: Map<String, Value>) -> &mut Self {
        if self.limit.allows(key) {
            let limited = self.limit.limit_nested(object);
            self.object.insert(key.to_string(), Value::Object(limited));
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.object.get(key)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.object)
    }
}

/// Outcome carried by a [`ResultEnvelope`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    Failure(DomainError),
}

/// Exactly one success payload or domain error, with its transport status.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEnvelope {
    outcome: Outcome,
    status: StatusCode,
}

impl ResultEnvelope {
    pub fn success(payload: Payload, status: StatusCode) -> Self {
        Self {
            outcome: Outcome::Success(payload.into_value()),
            status,
        }
    }

    pub fn failure(error: DomainError) -> Self {
        let status = error.status();
        Self {
            outcome: Outcome::Failure(error),
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn error(&self) -> Option<&DomainError> {
        match &self.outcome {
            Outcome::Failure(e) => Some(e),
            Outcome::Success(_) => None,
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Success(v) => Some(v),
            Outcome::Failure(_) => None,
        }
    }

    /// JSON body for the response.
    pub fn body(&self) -> Value {
        match &self.outcome {
            Outcome::Success(v) => v.clone(),
            Outcome::Failure(e) => serde_json::to_value(e.body()).unwrap_or(Value::Null),
        }
    }
}

impl IntoResponse for ResultEnvelope {
    fn into_response(self) -> Response {
        let status = self.status;
        match self.outcome {
            Outcome::Success(value) => (status, Json(value)).into_response(),
            Outcome::Failure(error) => (status, Json(error.body())).into_response(),
        }
    }
}
