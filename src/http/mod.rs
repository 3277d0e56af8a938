//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, acting user, parameters)
//!     → webservice dispatcher (verb → resource handler)
//!     → response.rs (envelope → status + JSON)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::ErrorTally;
pub use server::{AppState, HttpServer};
