//! Integration tests for Barbaro Nutrition.
//!
//! The tests drive the full storefront router in-process with
//! `tower::ServiceExt::oneshot`, so no server or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p barbaro-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_cart` - Cart API over HTTP, sessions, and checkout
//! - `cart_persistence` - Write-through persistence against a file-backed store
