//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) when the client sent none
//! - Identify the acting user from the configured header
//! - Merge query string and body into one parameter map
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body parameters override query parameters of the same name
//! - JSON bodies must be objects; form bodies are read as strings

use axum::{
    body::Bytes,
    extract::rejection::BytesRejection,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri},
};
use serde_json::{Map, Value};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::webservice::{DomainError, ErrorCode, ServiceRequest, ServiceResult};

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 request ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// The request ID set by the request-id layer, or "unknown".
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Acting username from `user_header`; blank values count as anonymous.
pub fn acting_user(headers: &HeaderMap, user_header: &HeaderName) -> Option<String> {
    headers
        .get(user_header)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

fn parse_form(bytes: &[u8], params: &mut Map<String, Value>) {
    for (key, value) in url::form_urlencoded::parse(bytes) {
        params.insert(key.into_owned(), Value::String(value.into_owned()));
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"))
}

/// Domain error for a body that could not be read, such as one over the
/// size limit.
pub fn body_error(rejection: BytesRejection) -> DomainError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        DomainError::with_detail(ErrorCode::PayloadTooLarge, rejection.body_text())
    } else {
        DomainError::invalid_parameter("body", &rejection.body_text())
    }
}

/// Collect the parameters of a request.
pub fn request_params(headers: &HeaderMap, uri: &Uri, body: &Bytes) -> ServiceResult<Map<String, Value>> {
    let mut params = Map::new();
    if let Some(query) = uri.query() {
        parse_form(query.as_bytes(), &mut params);
    }

    if body.is_empty() {
        return Ok(params);
    }

    if is_json(headers) {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(object)) => params.extend(object),
            Ok(_) => return Err(DomainError::invalid_parameter("body", "expected a JSON object")),
            Err(e) => return Err(DomainError::invalid_parameter("body", &e.to_string())),
        }
    } else {
        parse_form(body, &mut params);
    }
    Ok(params)
}

/// Build the handler-facing request.
pub fn service_request(
    headers: &HeaderMap,
    uri: &Uri,
    body: &Bytes,
    user_header: &HeaderName,
) -> ServiceResult<ServiceRequest> {
    let params = request_params(headers, uri, body)?;
    Ok(ServiceRequest::new(acting_user(headers, user_header), params))
}
