//! Product catalog endpoints

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    error::{ApiError, ApiResult},
    extract::ValidJson,
    middleware::AuthUser,
    models::{
        CreateProductRequest, MessageResponse, Product, ProductsResponse, UpdateProductRequest,
    },
    state::AppState,
    validation,
};

/// Active products
pub async fn list_products(State(state): State<AppState>) -> ApiResult<Json<ProductsResponse>> {
    let products = state.product_repository.list_active().await?;
    Ok(Json(ProductsResponse { products }))
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidJson(payload): ValidJson<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    user.require_admin()?;
    validation::validate_create_product(&payload).map_err(ApiError::Validation)?;

    let product = state.product_repository.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
    ValidJson(payload): ValidJson<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    user.require_admin()?;
    validation::validate_update_product(&payload).map_err(ApiError::Validation)?;

    let product = state.product_repository.update(id, &payload).await?;
    Ok(Json(product))
}

/// Soft delete
pub async fn delete_product(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    user.require_admin()?;

    state.product_repository.deactivate(id).await?;
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}
