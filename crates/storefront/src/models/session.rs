//! Session-related types.

/// Session keys.
pub mod keys {
    /// Key for the visitor's cart token.
    pub const CART_TOKEN: &str = "cart_token";
}
