use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    error::{json_error, ApiError, CatalogError},
    state::AppState,
};

use super::dto::{CreatedProductResponse, ProductDto, SearchQuery};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/search", get(search_products))
        .route("/products/:id", get(get_product))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(create_product))
        .route("/products/:id", put(update_product).delete(delete_product))
}

#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductDto>>, CatalogError> {
    let cancel = state.request_token();
    let products = state.catalog.list_products(&cancel).await?;
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn search_products(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<Vec<ProductDto>>, CatalogError> {
    let cancel = state.request_token();
    let products = state.catalog.search_products(&q.term, &cancel).await?;
    Ok(Json(products))
}

#[instrument(skip(state, path))]
pub async fn get_product(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = path?;
    let cancel = state.request_token();
    Ok(match state.catalog.get_product(id, &cancel).await? {
        Some(product) => Json(product).into_response(),
        None => not_found(id),
    })
}

/// POST /products → 201 with `Location` of the new product.
#[instrument(skip(state, body))]
pub async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<ProductDto>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;
    let cancel = state.request_token();
    let id = state.catalog.create_product(body, &cancel).await?;
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/v1/products/{id}"))],
        Json(CreatedProductResponse { id }),
    )
        .into_response())
}

/// PUT /products/:id. The id in the path wins over one in the body.
#[instrument(skip(state, path, body))]
pub async fn update_product(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<ProductDto>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = path?;
    let Json(mut body) = body?;
    body.id = id;
    let cancel = state.request_token();
    Ok(if state.catalog.update_product(body, &cancel).await? {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(id)
    })
}

#[instrument(skip(state, path))]
pub async fn delete_product(
    State(state): State<AppState>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = path?;
    let cancel = state.request_token();
    Ok(if state.catalog.delete_product(id, &cancel).await? {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(id)
    })
}

fn not_found(id: i32) -> Response {
    json_error(
        StatusCode::NOT_FOUND,
        "not_found",
        format!("Product {id} not found"),
    )
}
