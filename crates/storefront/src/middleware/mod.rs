//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. CORS
//! 3. `TraceLayer` (request tracing)
//! 4. Request ID (add unique ID to each request)
//! 5. Error envelope (fill in the request path)
//!
//! Authentication is not a layer: handlers opt in through the
//! [`RequireAuth`] and [`RequireAdmin`] extractors.

pub mod auth;
pub mod error_envelope;
pub mod request_id;

pub use auth::{RequireAdmin, RequireAuth};
pub use error_envelope::error_envelope_middleware;
pub use request_id::request_id_middleware;
