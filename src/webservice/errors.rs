//! Domain error taxonomy for the web services.
//!
//! Every failure a handler can report is a [`DomainError`]: a stable
//! [`ErrorCode`], the code's message and an optional detail string. Errors are
//! values; they are built whole and never mutated afterwards.

use axum::http::StatusCode;
use serde::Serialize;

use crate::store::StoreError;

/// Stable error codes exposed to web-service clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidMethod,
    InvalidTagGroupKey,
    Authentication,
    NoMatchingAllele,
    NoMatchingFeature,
    NoMatchingGeneLink,
    IntegrityError,
    MissingParameter,
    InvalidParameter,
    PayloadTooLarge,
    InternalError,
}

impl ErrorCode {
    /// All codes, in catalogue order.
    pub const ALL: [ErrorCode; 11] = [
        ErrorCode::InvalidMethod,
        ErrorCode::InvalidTagGroupKey,
        ErrorCode::Authentication,
        ErrorCode::NoMatchingAllele,
        ErrorCode::NoMatchingFeature,
        ErrorCode::NoMatchingGeneLink,
        ErrorCode::IntegrityError,
        ErrorCode::MissingParameter,
        ErrorCode::InvalidParameter,
        ErrorCode::PayloadTooLarge,
        ErrorCode::InternalError,
    ];

    /// Wire name of the code.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidMethod => "INVALID_METHOD",
            ErrorCode::InvalidTagGroupKey => "INVALID_TAG_GROUP_KEY",
            ErrorCode::Authentication => "AUTHENTICATION",
            ErrorCode::NoMatchingAllele => "NO_MATCHING_ALLELE",
            ErrorCode::NoMatchingFeature => "NO_MATCHING_FEATURE",
            ErrorCode::NoMatchingGeneLink => "NO_MATCHING_GENE_LINK",
            ErrorCode::IntegrityError => "INTEGRITY_ERROR",
            ErrorCode::MissingParameter => "MISSING_PARAMETER",
            ErrorCode::InvalidParameter => "INVALID_PARAMETER",
            ErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Message every error with this code carries.
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::InvalidMethod => "The HTTP method is not supported by this resource",
            ErrorCode::InvalidTagGroupKey => "The tag key does not match any tag",
            ErrorCode::Authentication => "You do not have permission to perform this action",
            ErrorCode::NoMatchingAllele => "No allele matches the given name",
            ErrorCode::NoMatchingFeature => "No unique feature matches the given parameters",
            ErrorCode::NoMatchingGeneLink => "The gene link does not exist",
            ErrorCode::IntegrityError => "The record could not be saved",
            ErrorCode::MissingParameter => "A required parameter is missing",
            ErrorCode::InvalidParameter => "A parameter has an invalid value",
            ErrorCode::PayloadTooLarge => "The request body exceeds the size limit",
            ErrorCode::InternalError => "An unexpected error occurred",
        }
    }

    /// Transport status for this code.
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::Authentication => StatusCode::FORBIDDEN,
            ErrorCode::InvalidTagGroupKey
            | ErrorCode::NoMatchingAllele
            | ErrorCode::NoMatchingFeature
            | ErrorCode::NoMatchingGeneLink => StatusCode::NOT_FOUND,
            ErrorCode::IntegrityError
            | ErrorCode::MissingParameter
            | ErrorCode::InvalidParameter => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidMethod => StatusCode::METHOD_NOT_ALLOWED,
            ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A web-service failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainError {
    code: ErrorCode,
    detail: Option<String>,
}

impl DomainError {
    /// Error with the code's message only.
    pub fn new(code: ErrorCode) -> Self {
        Self { code, detail: None }
    }

    /// Error carrying a detail string alongside the code's message.
    pub fn with_detail(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: Some(detail.into()),
        }
    }

    pub fn invalid_method(verb: impl Into<String>) -> Self {
        Self::with_detail(ErrorCode::InvalidMethod, verb)
    }

    pub fn authentication() -> Self {
        Self::new(ErrorCode::Authentication)
    }

    pub fn missing_parameter(name: &str) -> Self {
        Self::with_detail(ErrorCode::MissingParameter, name)
    }

    pub fn invalid_parameter(name: &str, value: &str) -> Self {
        Self::with_detail(ErrorCode::InvalidParameter, format!("{name}: {value}"))
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &'static str {
        self.code.message()
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }

    /// Message followed by the detail, if any.
    pub fn describe(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{} ({})", self.message(), detail),
            None => self.message().to_string(),
        }
    }

    /// JSON body sent to the client.
    pub fn body(&self) -> ErrorBody<'_> {
        ErrorBody {
            code: self.code,
            message: self.message(),
            detail: self.detail(),
        }
    }
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.describe())
    }
}

impl std::error::Error for DomainError {}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConstraintViolation(message) => {
                DomainError::with_detail(ErrorCode::IntegrityError, message)
            }
            StoreError::NotFound { table: "gene_links", id } => {
                DomainError::with_detail(ErrorCode::NoMatchingGeneLink, id.to_string())
            }
            other => DomainError::with_detail(ErrorCode::InternalError, other.to_string()),
        }
    }
}

/// Serialized form of a [`DomainError`].
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub code: ErrorCode,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<&'a str>,
}

/// Handler outcome.
pub type ServiceResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classes() {
        assert_eq!(ErrorCode::Authentication.status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::NoMatchingFeature.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::IntegrityError.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::InternalError.status(), StatusCode::INTERNAL_SERVER_ERROR);
        for code in ErrorCode::ALL {
            assert!(code.status().is_client_error() || code.status().is_server_error());
        }
    }

    #[test]
    fn test_body_serialization() {
        let err = DomainError::invalid_method("PATCH");
        let json = serde_json::to_value(err.body()).unwrap();
        assert_eq!(json["code"], "INVALID_METHOD");
        assert_eq!(json["detail"], "PATCH");
        assert!(json["message"].as_str().unwrap().contains("not supported"));

        let json = serde_json::to_value(DomainError::authentication().body()).unwrap();
        assert!(json.get("detail").is_none());
    }

    #[test]
    fn test_store_error_mapping() {
        let err = DomainError::from(StoreError::ConstraintViolation("duplicate".into()));
        assert_eq!(err.code(), ErrorCode::IntegrityError);
        assert_eq!(err.detail(), Some("duplicate"));

        let err = DomainError::from(StoreError::NotFound { table: "gene_links", id: 4 });
        assert_eq!(err.code(), ErrorCode::NoMatchingGeneLink);

        let err = DomainError::from(StoreError::NotFound { table: "tags", id: 4 });
        assert_eq!(err.code(), ErrorCode::InternalError);
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::with_detail(ErrorCode::NoMatchingAllele, "wx1");
        assert_eq!(err.to_string(), "NO_MATCHING_ALLELE: No allele matches the given name (wx1)");
    }
}
