//! Cart route handlers.
//!
//! Each visitor's cart token lives in the session; the cart itself is a
//! [`CartStore`] persisted in the shared key-value backend. Store work is
//! blocking I/O, so every operation runs on `spawn_blocking`.
//!
//! Concurrent requests for the same token are not serialized: the last write
//! wins.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use barbaro_core::{CurrencyCode, Price, ProductId};

use crate::cart::{CartStore, CartToken};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::session_keys;
use crate::state::AppState;

/// Cart item display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub id: ProductId,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: String,
    pub line_price: String,
    pub at_stock_limit: bool,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u64,
    pub subtotal: String,
    pub currency: CurrencyCode,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub fn empty(currency: CurrencyCode) -> Self {
        Self {
            items: Vec::new(),
            item_count: 0,
            subtotal: Price::new(rust_decimal::Decimal::ZERO, currency).display(),
            currency,
        }
    }

    /// Render the current state of a cart store.
    #[must_use]
    pub fn from_store(store: &CartStore, currency: CurrencyCode) -> Self {
        let items = store
            .items()
            .iter()
            .map(|item| CartItemView {
                id: item.product.id.clone(),
                name: item.product.name.clone(),
                image: item.product.image.clone(),
                quantity: item.quantity,
                unit_price: Price::new(item.product.price, currency).display(),
                line_price: Price::new(item.line_total(), currency).display(),
                at_stock_limit: item.at_stock_limit(),
            })
            .collect();

        Self {
            items,
            item_count: store.total_items(),
            subtotal: Price::new(store.total_price(), currency).display(),
            currency,
        }
    }
}

/// Cart count badge data.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CartCount {
    pub count: u64,
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub quantity: Option<u32>,
}

/// Update cart request body. Zero or negative quantities remove the item.
#[derive(Debug, Deserialize)]
pub struct UpdateCartRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart token from the session.
async fn get_cart_token(session: &Session) -> Option<CartToken> {
    session
        .get::<CartToken>(session_keys::CART_TOKEN)
        .await
        .ok()
        .flatten()
}

/// Get the cart token from the session, issuing a new one if absent.
async fn ensure_cart_token(session: &Session) -> Result<CartToken> {
    if let Some(token) = get_cart_token(session).await {
        return Ok(token);
    }

    let token = CartToken::generate();
    session.insert(session_keys::CART_TOKEN, token).await?;
    tracing::debug!(cart_token = %token, "Issued cart token");
    Ok(token)
}

/// Open the visitor's cart on the blocking pool and apply `f` to it.
async fn with_cart<T, F>(state: &AppState, token: CartToken, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut CartStore) -> T + Send + 'static,
{
    let storage = state.carts();
    let result = tokio::task::spawn_blocking(move || {
        let mut store = CartStore::for_token(storage, &token);
        f(&mut store)
    })
    .await?;
    Ok(result)
}

/// Render the visitor's cart, or an empty one if they have none yet.
async fn current_view(state: &AppState, token: Option<CartToken>) -> Result<CartView> {
    let currency = state.catalog().currency();
    match token {
        Some(token) => {
            with_cart(state, token, move |store| CartView::from_store(store, currency)).await
        }
        None => Ok(CartView::empty(currency)),
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let token = get_cart_token(&session).await;
    Ok(Json(current_view(&state, token).await?))
}

/// Add an item to the cart.
///
/// Issues a cart token on the visitor's first add. The product is snapshotted
/// from the catalog at this moment.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartView>> {
    let quantity = request.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::InvalidQuantity(
            "quantity must be at least 1".to_string(),
        ));
    }

    let product = state
        .catalog()
        .get(&request.product_id)
        .cloned()
        .ok_or_else(|| AppError::UnknownProduct(request.product_id.clone()))?;

    if !product.in_stock() {
        return Err(AppError::OutOfStock(product.id));
    }

    add_breadcrumb(
        "cart",
        "Added item",
        Some(&[("product_id", product.id.as_str())]),
    );

    let token = ensure_cart_token(&session).await?;
    let currency = state.catalog().currency();
    let view = with_cart(&state, token, move |store| {
        store.add_item(product, quantity);
        CartView::from_store(store, currency)
    })
    .await?;

    Ok(Json(view))
}

/// Set an item's quantity.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateCartRequest>,
) -> Result<Json<CartView>> {
    let currency = state.catalog().currency();
    let Some(token) = get_cart_token(&session).await else {
        return Ok(Json(CartView::empty(currency)));
    };

    let view = with_cart(&state, token, move |store| {
        store.update_quantity(&request.product_id, request.quantity);
        CartView::from_store(store, currency)
    })
    .await?;

    Ok(Json(view))
}

/// Remove an item from the cart.
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartView>> {
    let currency = state.catalog().currency();
    let Some(token) = get_cart_token(&session).await else {
        return Ok(Json(CartView::empty(currency)));
    };

    let view = with_cart(&state, token, move |store| {
        store.remove_item(&request.product_id);
        CartView::from_store(store, currency)
    })
    .await?;

    Ok(Json(view))
}

/// Empty the cart.
#[instrument(skip(state, session))]
pub async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let currency = state.catalog().currency();
    let Some(token) = get_cart_token(&session).await else {
        return Ok(Json(CartView::empty(currency)));
    };

    let view = with_cart(&state, token, move |store| {
        store.clear_cart();
        CartView::from_store(store, currency)
    })
    .await?;

    Ok(Json(view))
}

/// Get the cart count badge.
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<Json<CartCount>> {
    let count = match get_cart_token(&session).await {
        Some(token) => with_cart(&state, token, |store| store.total_items()).await?,
        None => 0,
    };

    Ok(Json(CartCount { count }))
}

/// Redirect to the hosted checkout.
///
/// Falls back to the cart page when the cart is empty or no checkout URL is
/// configured.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Result<Response> {
    let Some(token) = get_cart_token(&session).await else {
        return Ok(Redirect::to("/cart").into_response());
    };

    let Some(base_url) = state.config().checkout_url.clone() else {
        tracing::warn!("Checkout requested but STOREFRONT_CHECKOUT_URL is not set");
        return Ok(Redirect::to("/cart").into_response());
    };

    let target = with_cart(&state, token, move |store| checkout_url(&base_url, store)).await?;

    Ok(target.map_or_else(
        || Redirect::to("/cart").into_response(),
        |url| Redirect::to(&url).into_response(),
    ))
}

/// Build a cart permalink (`{base}/cart/{id}:{qty},{id}:{qty}`).
///
/// Returns `None` for an empty cart.
#[must_use]
pub fn checkout_url(base_url: &str, store: &CartStore) -> Option<String> {
    if store.items().is_empty() {
        return None;
    }

    let lines = store
        .items()
        .iter()
        .map(|item| {
            format!(
                "{}:{}",
                urlencoding::encode(item.product.id.as_str()),
                item.quantity
            )
        })
        .collect::<Vec<_>>()
        .join(",");

    Some(format!("{}/cart/{lines}", base_url.trim_end_matches('/')))
}
