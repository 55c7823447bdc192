//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use barbaro_core::{Price, ProductId, ProductSnapshot};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Product display data.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    pub id: ProductId,
    pub name: String,
    pub price: String,
    pub image: Option<String>,
    /// Stock ceiling; views disable increments once a cart line reaches it.
    pub stock: Option<u32>,
    pub in_stock: bool,
}

impl ProductView {
    fn new(product: &ProductSnapshot, state: &AppState) -> Self {
        Self {
            id: product.id.clone(),
            name: product.name.clone(),
            price: Price::new(product.price, state.catalog().currency()).display(),
            image: product.image.clone(),
            stock: product.stock,
            in_stock: product.in_stock(),
        }
    }
}

/// List all products.
pub async fn index(State(state): State<AppState>) -> Json<Vec<ProductView>> {
    let products = state
        .catalog()
        .products()
        .iter()
        .map(|product| ProductView::new(product, &state))
        .collect();

    Json(products)
}

/// Show a single product.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductView>> {
    let id = ProductId::new(id);
    let product = state
        .catalog()
        .get(&id)
        .ok_or(AppError::UnknownProduct(id))?;

    Ok(Json(ProductView::new(product, &state)))
}
