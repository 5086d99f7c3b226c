use axum::{Json, Router, extract::State, routing::{get, put}};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    error::AppResult,
    extract::{AppJson, AppPath},
    middleware::auth::AuthUser,
    models::Cart,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/{item_id}", put(update_cart_item).delete(remove_cart_item))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current user's cart", body = ApiResponse<Cart>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::get_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Item added", body = ApiResponse<Cart>),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Product is out of stock")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::add_item(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/cart/{item_id}",
    params(("item_id" = Uuid, Path, description = "Cart item id")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity updated", body = ApiResponse<Cart>),
        (status = 404, description = "Cart or item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(item_id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::update_item_quantity(&state, &user, item_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{item_id}",
    params(("item_id" = Uuid, Path, description = "Cart item id")),
    responses(
        (status = 200, description = "Item removed", body = ApiResponse<Cart>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(item_id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::remove_item(&state, &user, item_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart cleared", body = ApiResponse<Cart>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::clear_cart(&state, &user).await?;
    Ok(Json(resp))
}
