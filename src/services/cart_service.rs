use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr, TransactionTrait, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    entity::{
        cart_items::{
            ActiveModel as CartItemActive, Column as ItemCol, Entity as CartItems,
            Model as CartItemModel,
        },
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem, line_total},
    response::ApiResponse,
    state::AppState,
};

const CONCURRENT_WRITE: &str = "Cart was modified concurrently, please retry";

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;
    let items = load_items(&state.orm, cart.id).await?;
    Ok(ApiResponse::success("OK", cart_view(cart, items)))
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    let product_id = payload
        .product_id
        .ok_or_else(|| AppError::Validation("Please provide product ID".into()))?;
    let quantity = payload.quantity.unwrap_or(1).max(1);

    let product = Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
    if !product.in_stock {
        return Err(AppError::Conflict("Product is out of stock".into()));
    }

    let cart = get_or_create_cart(&state.orm, user.user_id).await?;

    let txn = state.orm.begin().await?;
    let cart = reload_cart(&txn, cart.id).await?;
    let items = load_items(&txn, cart.id).await?;
    let now = Utc::now();

    match items.iter().find(|item| item.product_id == product_id) {
        Some(existing) => {
            tracing::debug!(cart_id = %cart.id, %product_id, "merging into existing cart line");
            let mut active: CartItemActive = existing.clone().into();
            active.quantity = Set(existing.quantity.saturating_add(quantity));
            active.updated_at = Set(now.into());
            active.update(&txn).await?;
        }
        None => {
            let position = items.iter().map(|item| item.position).max().unwrap_or(-1) + 1;
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                name: Set(product.name.clone()),
                price: Set(product.price),
                image: Set(product.image.clone()),
                quantity: Set(quantity),
                position: Set(position),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            }
            .insert(&txn)
            .await?;
        }
    }

    let items = load_items(&txn, cart.id).await?;
    let cart = persist_cart(&txn, cart, &items).await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.user_id, %product_id, quantity, "item added to cart");
    Ok(ApiResponse::success(
        "Item added to cart",
        cart_view(cart, items),
    ))
}

pub async fn update_item_quantity(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<Cart>> {
    let quantity = payload
        .quantity
        .ok_or_else(|| AppError::Validation("Please provide a valid quantity (minimum 1)".into()))?
        .max(1);

    let txn = state.orm.begin().await?;
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart not found".into()))?;

    let item = CartItems::find()
        .filter(ItemCol::CartId.eq(cart.id))
        .filter(ItemCol::Id.eq(item_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found in cart".into()))?;

    let mut active: CartItemActive = item.into();
    active.quantity = Set(quantity);
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;

    let items = load_items(&txn, cart.id).await?;
    let cart = persist_cart(&txn, cart, &items).await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.user_id, %item_id, quantity, "cart item updated");
    Ok(ApiResponse::success("Cart updated", cart_view(cart, items)))
}

/// Removing an item that is not in the cart is a no-op.
pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;

    let txn = state.orm.begin().await?;
    let cart = reload_cart(&txn, cart.id).await?;
    let removed = CartItems::delete_many()
        .filter(ItemCol::CartId.eq(cart.id))
        .filter(ItemCol::Id.eq(item_id))
        .exec(&txn)
        .await?;

    let items = load_items(&txn, cart.id).await?;
    let cart = persist_cart(&txn, cart, &items).await?;
    txn.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        %item_id,
        removed = removed.rows_affected,
        "cart item removed"
    );
    Ok(ApiResponse::success(
        "Item removed from cart",
        cart_view(cart, items),
    ))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;

    let txn = state.orm.begin().await?;
    let cart = reload_cart(&txn, cart.id).await?;
    let cart = empty_cart(&txn, cart).await?;
    txn.commit().await?;

    tracing::info!(user_id = %user.user_id, "cart cleared");
    Ok(ApiResponse::success("Cart cleared", cart_view(cart, Vec::new())))
}

/// Returns the user's cart, creating an empty one on first use.
pub async fn get_or_create_cart<C>(conn: &C, user_id: Uuid) -> AppResult<CartModel>
where
    C: ConnectionTrait,
{
    if let Some(cart) = find_cart(conn, user_id).await? {
        return Ok(cart);
    }

    let now = Utc::now();
    let inserted = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        total_amount: Set(0),
        version: Set(0),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await;

    match inserted {
        Ok(cart) => {
            tracing::debug!(%user_id, cart_id = %cart.id, "created cart");
            Ok(cart)
        }
        // Lost a creation race against another request for the same user.
        Err(err) if is_unique_violation(&err) => find_cart(conn, user_id)
            .await?
            .ok_or_else(|| AppError::internal("cart vanished after unique violation")),
        Err(err) => Err(err.into()),
    }
}

/// Drops every line and zeroes the total. Safe to repeat.
pub(crate) async fn empty_cart<C>(conn: &C, cart: CartModel) -> AppResult<CartModel>
where
    C: ConnectionTrait,
{
    CartItems::delete_many()
        .filter(ItemCol::CartId.eq(cart.id))
        .exec(conn)
        .await?;
    persist_cart(conn, cart, &[]).await
}

pub async fn load_items<C>(conn: &C, cart_id: Uuid) -> AppResult<Vec<CartItemModel>>
where
    C: ConnectionTrait,
{
    let items = CartItems::find()
        .filter(ItemCol::CartId.eq(cart_id))
        .order_by_asc(ItemCol::Position)
        .all(conn)
        .await?;
    Ok(items)
}

pub(crate) async fn find_cart<C>(conn: &C, user_id: Uuid) -> AppResult<Option<CartModel>>
where
    C: ConnectionTrait,
{
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?;
    Ok(cart)
}

async fn reload_cart<C>(conn: &C, cart_id: Uuid) -> AppResult<CartModel>
where
    C: ConnectionTrait,
{
    Carts::find_by_id(cart_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart not found".into()))
}

/// Recomputes the total from `items` and writes it with a compare-and-set
/// on `version`. A writer that lost the race gets `Conflict` and its
/// transaction is rolled back when dropped.
pub async fn persist_cart<C>(
    conn: &C,
    cart: CartModel,
    items: &[CartItemModel],
) -> AppResult<CartModel>
where
    C: ConnectionTrait,
{
    let total = line_total(items.iter().map(|item| (item.price, item.quantity)))?;
    let next_version = cart.version + 1;
    let now = Utc::now();

    let result = Carts::update_many()
        .col_expr(CartCol::TotalAmount, Expr::value(total))
        .col_expr(CartCol::Version, Expr::value(next_version))
        .col_expr(
            CartCol::UpdatedAt,
            Expr::value(sea_orm::prelude::DateTimeWithTimeZone::from(now)),
        )
        .filter(CartCol::Id.eq(cart.id))
        .filter(CartCol::Version.eq(cart.version))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        tracing::warn!(cart_id = %cart.id, version = cart.version, "cart version mismatch");
        return Err(AppError::Conflict(CONCURRENT_WRITE.into()));
    }

    Ok(CartModel {
        total_amount: total,
        version: next_version,
        updated_at: now.into(),
        ..cart
    })
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn cart_view(cart: CartModel, items: Vec<CartItemModel>) -> Cart {
    Cart {
        id: cart.id,
        user_id: cart.user_id,
        items: items
            .into_iter()
            .map(|item| CartItem {
                id: item.id,
                product_id: item.product_id,
                name: item.name,
                price: item.price,
                image: item.image,
                quantity: item.quantity,
            })
            .collect(),
        total_amount: cart.total_amount,
        created_at: cart.created_at.with_timezone(&Utc),
        updated_at: cart.updated_at.with_timezone(&Utc),
    }
}
