//! Web-service protocol core.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → http/request.rs (acting user, merged parameters, field limit)
//!     → dispatcher.rs (verb → resource handler)
//!     → handler (genelinks, search) against the store
//!     → envelope.rs (payload or DomainError + status)
//!     → JSON response
//! ```
//!
//! # Design Decisions
//! - Handlers return `Result<Payload, DomainError>`; nothing is thrown
//! - Error codes are a closed enum with a fixed status mapping
//! - Field limits are applied while the payload is built

pub mod dispatcher;
pub mod envelope;
pub mod errors;

pub use dispatcher::{dispatch, reject, Resource, ServiceRequest, Verb};
pub use envelope::{FieldLimit, Outcome, Payload, ResultEnvelope};
pub use errors::{DomainError, ErrorCode, ServiceResult};
