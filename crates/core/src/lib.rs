//! Barbaro Core - Shared types library.
//!
//! This crate provides common types used across all Barbaro components:
//! - `storefront` - Public-facing e-commerce site and the persisted cart store
//! - `cli` - Command-line tools for inspecting and editing carts
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no logging,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices, and product snapshots
//! - [`cart`] - The cart model: merge-on-add, clamped quantities, derived totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartItem};
pub use types::*;
