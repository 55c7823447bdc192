//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions over the cart key-value store)

pub mod request_id;
pub mod session;

pub use request_id::{RequestId, request_id_middleware};
pub use session::{EXPIRED_SWEEP_INTERVAL, KvSessionStore, create_session_layer};
