//! HTTP envelope types and transport.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, request ID, tracing, timeout, body limit)
//!     → request.rs (transport-neutral Request)
//!     → routing (dispatch to exactly one handler)
//!     → response.rs (Response, converted back to axum)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{Query, Request, X_REQUEST_ID};
pub use response::Response;
pub use server::HttpServer;
