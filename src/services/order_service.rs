use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{CreateOrderRequest, OrderListQuery, UpdateOrderRequest},
    entity::{
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::Entity as Products,
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderCustomer, OrderItem, OrderStatus},
    response::{ApiResponse, Empty},
    services::cart_service,
    state::AppState,
};

pub const DEFAULT_SHIPPING_ADDRESS: &str = "Pickup in store";
pub const DEFAULT_CONTACT_NUMBER: &str = "Not provided";
const EMPTY_CART: &str = "Cart is empty. Please add items before placing an order.";

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<Vec<Order>>> {
    let mut condition = Condition::all();
    if !user.is_admin() {
        condition = condition.add(OrderCol::UserId.eq(user.user_id));
    }
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }

    let orders = Orders::find()
        .filter(condition)
        .order_by_desc(OrderCol::UpdatedAt)
        .order_by_desc(OrderCol::OrderDate)
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let user_ids: Vec<Uuid> = orders.iter().map(|o| o.user_id).collect();
    let customers = load_customers(&state.orm, user_ids).await?;
    let mut items_by_order: HashMap<Uuid, Vec<OrderItemModel>> = HashMap::new();
    if !ids.is_empty() {
        for item in OrderItems::find()
            .filter(OrderItemCol::OrderId.is_in(ids))
            .order_by_asc(OrderItemCol::Position)
            .all(&state.orm)
            .await?
        {
            items_by_order.entry(item.order_id).or_default().push(item);
        }
    }

    let data = orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            let customer = customers.get(&order.user_id).cloned();
            order_view(order, items, customer)
        })
        .collect();

    Ok(ApiResponse::list("Orders", data))
}

/// Converts the user's cart into an order. Every line's product is
/// re-checked here because stock may have changed since it was added.
pub async fn create_from_cart(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let cart = cart_service::find_cart(&txn, user.user_id)
        .await?
        .ok_or_else(|| AppError::Validation(EMPTY_CART.into()))?;
    let cart_items = cart_service::load_items(&txn, cart.id).await?;
    if cart_items.is_empty() {
        return Err(AppError::Validation(EMPTY_CART.into()));
    }

    for item in &cart_items {
        let product = Products::find_by_id(item.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product {} not found", item.name)))?;
        if !product.in_stock {
            return Err(AppError::Conflict(format!(
                "Product {} is out of stock",
                product.name
            )));
        }
    }

    let now = Utc::now();
    let order_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        shipping_address: Set(first_non_blank(
            [payload.shipping_address.as_deref(), Some(user.address.as_str())],
            DEFAULT_SHIPPING_ADDRESS,
        )),
        contact_number: Set(first_non_blank(
            [payload.contact_number.as_deref(), Some(user.phone.as_str())],
            DEFAULT_CONTACT_NUMBER,
        )),
        total_amount: Set(cart.total_amount),
        payment_method: Set(payload.payment_method.unwrap_or_default()),
        status: Set(OrderStatus::Pending),
        notes: Set(payload.notes.unwrap_or_default()),
        order_date: Set(now.into()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut order_items = Vec::with_capacity(cart_items.len());
    for (position, item) in cart_items.iter().enumerate() {
        let inserted = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(item.product_id),
            name: Set(item.name.clone()),
            price: Set(item.price),
            image: Set(item.image.clone()),
            quantity: Set(item.quantity),
            position: Set(position as i32),
        }
        .insert(&txn)
        .await?;
        order_items.push(inserted);
    }

    cart_service::empty_cart(&txn, cart).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        total_amount = order.total_amount,
        items = order_items.len(),
        "order created"
    );
    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_amount": order.total_amount }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        order_view(
            order,
            order_items,
            Some(OrderCustomer {
                id: user.user_id,
                name: user.name.clone(),
                email: user.email.clone(),
            }),
        ),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = find_order(&state.orm, id).await?;
    user.ensure_owner_or_admin(order.user_id, "Not authorized to access this order")?;

    let items = load_items(&state.orm, order.id).await?;
    let customer = load_customer(&state.orm, order.user_id).await?;
    Ok(ApiResponse::success("OK", order_view(order, items, customer)))
}

/// Only `status` and `notes` change; items and total are fixed at creation.
/// Any status may follow any other.
pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    if payload.status.is_none() && payload.notes.is_none() {
        return Err(AppError::Validation(
            "Please provide a status or notes to update".into(),
        ));
    }

    let existing = find_order(&state.orm, id).await?;
    user.ensure_owner_or_admin(existing.user_id, "Not authorized to update this order")?;

    let previous = existing.status;
    let mut active: OrderActive = existing.into();
    if let Some(status) = payload.status {
        if !previous.is_forward_transition(status) {
            tracing::warn!(
                order_id = %id,
                by = %user.user_id,
                from = ?previous,
                to = ?status,
                "order status moved off the fulfilment path"
            );
        }
        active.status = Set(status);
    }
    if let Some(notes) = payload.notes {
        active.notes = Set(notes);
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    tracing::info!(order_id = %order.id, status = ?order.status, "order updated");
    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    let items = load_items(&state.orm, order.id).await?;
    let customer = load_customer(&state.orm, order.user_id).await?;
    Ok(ApiResponse::success(
        "Order updated",
        order_view(order, items, customer),
    ))
}

pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Empty>> {
    let order = find_order(&state.orm, id).await?;
    user.ensure_owner_or_admin(order.user_id, "Not authorized to delete this order")?;

    let txn = state.orm.begin().await?;
    OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .exec(&txn)
        .await?;
    Orders::delete_by_id(order.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %id, by = %user.user_id, "order deleted");
    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Order deleted", Empty {}))
}

async fn find_order<C>(conn: &C, id: Uuid) -> AppResult<OrderModel>
where
    C: ConnectionTrait,
{
    Orders::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))
}

async fn load_items<C>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItemModel>>
where
    C: ConnectionTrait,
{
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::Position)
        .all(conn)
        .await?;
    Ok(items)
}

async fn load_customers<C>(
    conn: &C,
    user_ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, OrderCustomer>>
where
    C: ConnectionTrait,
{
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let customers = Users::find()
        .filter(UserCol::Id.is_in(user_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|user| {
            (
                user.id,
                OrderCustomer {
                    id: user.id,
                    name: user.name,
                    email: user.email,
                },
            )
        })
        .collect();
    Ok(customers)
}

async fn load_customer<C>(conn: &C, user_id: Uuid) -> AppResult<Option<OrderCustomer>>
where
    C: ConnectionTrait,
{
    let mut customers = load_customers(conn, vec![user_id]).await?;
    Ok(customers.remove(&user_id))
}

fn first_non_blank<'a, I>(candidates: I, fallback: &str) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn order_view(
    model: OrderModel,
    items: Vec<OrderItemModel>,
    customer: Option<OrderCustomer>,
) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        customer,
        items: items
            .into_iter()
            .map(|item| OrderItem {
                id: item.id,
                product_id: item.product_id,
                name: item.name,
                price: item.price,
                image: item.image,
                quantity: item.quantity,
            })
            .collect(),
        shipping_address: model.shipping_address,
        contact_number: model.contact_number,
        total_amount: model.total_amount,
        payment_method: model.payment_method,
        status: model.status,
        notes: model.notes,
        order_date: model.order_date.with_timezone(&Utc),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_non_blank_prefers_earliest_value() {
        assert_eq!(
            first_non_blank([Some("12 Clay Lane"), Some("Profile")], DEFAULT_SHIPPING_ADDRESS),
            "12 Clay Lane"
        );
        assert_eq!(
            first_non_blank([Some("   "), Some("Profile")], DEFAULT_SHIPPING_ADDRESS),
            "Profile"
        );
        assert_eq!(
            first_non_blank([None, Some("")], DEFAULT_SHIPPING_ADDRESS),
            DEFAULT_SHIPPING_ADDRESS
        );
    }
}
