//! Verb dispatch for web-service resources.
//!
//! # Responsibilities
//! - Map the request method onto a fixed [`Verb`]
//! - Invoke the resource's handler for that verb
//! - Turn the handler's result into a [`ResultEnvelope`]
//!
//! # Design Decisions
//! - Unknown methods never reach a handler; they become `INVALID_METHOD`
//! - This is the only place a [`DomainError`] turns into a response
//! - Resources override only the verbs they serve

use std::time::Instant;

use axum::http::{Method, StatusCode};
use serde_json::{Map, Value};

use crate::observability::metrics;
use crate::webservice::envelope::{FieldLimit, Payload, ResultEnvelope};
use crate::webservice::errors::{DomainError, ServiceResult};

/// Verbs a web-service resource can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Delete,
}

impl Verb {
    /// Map an HTTP method, rejecting everything outside GET/POST/DELETE.
    pub fn from_method(method: &Method) -> ServiceResult<Self> {
        match method {
            &Method::GET => Ok(Verb::Get),
            &Method::POST => Ok(Verb::Post),
            &Method::DELETE => Ok(Verb::Delete),
            other => Err(DomainError::invalid_method(other.as_str())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Delete => "DELETE",
        }
    }

    /// Status of a successful response.
    pub fn success_status(self) -> StatusCode {
        match self {
            Verb::Post => StatusCode::CREATED,
            Verb::Get | Verb::Delete => StatusCode::OK,
        }
    }
}

/// Everything a handler needs from the inbound request.
#[derive(Debug, Clone, Default)]
pub struct ServiceRequest {
    /// Acting user, `None` when anonymous.
    pub user: Option<String>,
    /// Query parameters merged with the body.
    pub params: Map<String, Value>,
    pub fields: FieldLimit,
}

impl ServiceRequest {
    pub fn new(user: Option<String>, params: Map<String, Value>) -> Self {
        let fields = FieldLimit::parse(params.get("fields").and_then(Value::as_str));
        Self { user, params, fields }
    }

    /// Non-empty string parameter. Numbers are accepted and rendered as text.
    pub fn param(&self, name: &str) -> Option<String> {
        match self.params.get(name)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// String parameter exactly as sent, blanks included. Numbers are
    /// rendered as text.
    pub fn raw_param(&self, name: &str) -> Option<String> {
        match self.params.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn require(&self, name: &str) -> ServiceResult<String> {
        self.param(name).ok_or_else(|| DomainError::missing_parameter(name))
    }

    /// Integer identifier parameter, `None` when absent.
    pub fn id_param(&self, name: &str) -> ServiceResult<Option<u64>> {
        match self.param(name) {
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| DomainError::invalid_parameter(name, &raw)),
            None => Ok(None),
        }
    }

    /// Boolean flag; only a case-insensitive "true" (or JSON `true`) is set.
    pub fn flag(&self, name: &str) -> bool {
        match self.params.get(name) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn payload(&self) -> Payload {
        Payload::new(self.fields.clone())
    }
}

/// A web-service resource. Verbs left unimplemented answer `INVALID_METHOD`.
pub trait Resource: Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &'static str;

    fn get(&self, _request: &ServiceRequest) -> ServiceResult<Payload> {
        Err(DomainError::invalid_method(Verb::Get.as_str()))
    }

    fn create(&self, _request: &ServiceRequest) -> ServiceResult<Payload> {
        Err(DomainError::invalid_method(Verb::Post.as_str()))
    }

    fn delete(&self, _request: &ServiceRequest) -> ServiceResult<Payload> {
        Err(DomainError::invalid_method(Verb::Delete.as_str()))
    }
}

/// Dispatch a request to `resource` and wrap the outcome.
pub fn dispatch<R>(resource: &R, method: &Method, request: &ServiceRequest) -> ResultEnvelope
where
    R: Resource + ?Sized,
{
    let start = Instant::now();
    let outcome = Verb::from_method(method).and_then(|verb| {
        let payload = match verb {
            Verb::Get => resource.get(request),
            Verb::Post => resource.create(request),
            Verb::Delete => resource.delete(request),
        }?;
        Ok((verb.success_status(), payload))
    });
    finish(resource.name(), method, outcome, start)
}

/// Envelope for a request that failed before reaching a handler, such as an
/// unreadable body. An unsupported verb is reported in preference to `error`.
pub fn reject<R>(resource: &R, method: &Method, error: DomainError) -> ResultEnvelope
where
    R: Resource + ?Sized,
{
    let error = Verb::from_method(method).err().unwrap_or(error);
    finish(resource.name(), method, Err(error), Instant::now())
}

fn finish(
    resource: &'static str,
    method: &Method,
    outcome: ServiceResult<(StatusCode, Payload)>,
    start: Instant,
) -> ResultEnvelope {
    let envelope = match outcome {
        Ok((status, payload)) => ResultEnvelope::success(payload, status),
        Err(error) => {
            tracing::warn!(
                resource,
                method = %method,
                code = %error.code(),
                detail = error.detail().unwrap_or_default(),
                "Web service error"
            );
            metrics::record_domain_error(resource, error.code());
            ResultEnvelope::failure(error)
        }
    };

    metrics::record_request(resource, method.as_str(), envelope.status().as_u16(), start);
    envelope
}
