//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → shared.rs (load current table snapshot)
//!     → router.rs (scan routes in registration order)
//!     → pattern.rs (structural segment match, capture params)
//!     → Return: handler response, or synthesized 404/500
//!
//! Route registration:
//!     (method, pattern, handler)
//!     → method.rs (fixed method set)
//!     → pattern.rs (compile literal / :param / *rest segments)
//!     → router.rs (reject duplicates, append)
//!     → shared.rs (atomic snapshot swap)
//! ```
//!
//! # Design Decisions
//! - Registration order is priority: first match wins
//! - Deterministic: same table and request always pick the same route
//! - No regex in the hot path

pub mod method;
pub mod pattern;
pub mod router;
pub mod shared;

pub use method::Method;
pub use pattern::{Params, Pattern, Segment};
pub use router::{Route, Router};
pub use shared::SharedRouter;
