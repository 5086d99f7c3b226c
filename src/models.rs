use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const DEFAULT_PRODUCT_IMAGE: &str = "no-image.jpg";
pub const CART_TOTAL_TOO_LARGE: &str = "Cart total too large";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ProductType {
    #[sea_orm(string_value = "vase")]
    #[serde(rename = "vase")]
    Vase,
    #[sea_orm(string_value = "pottery")]
    #[serde(rename = "pottery")]
    Pottery,
    #[sea_orm(string_value = "clay plate")]
    #[serde(rename = "clay plate")]
    ClayPlate,
    #[sea_orm(string_value = "clay matka")]
    #[serde(rename = "clay matka")]
    ClayMatka,
    #[sea_orm(string_value = "blue pottery")]
    #[serde(rename = "blue pottery")]
    BluePottery,
    #[sea_orm(string_value = "showpiece")]
    #[serde(rename = "showpiece")]
    Showpiece,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum Material {
    #[sea_orm(string_value = "clay")]
    Clay,
    #[sea_orm(string_value = "ceramic")]
    Ceramic,
}

/// Label only; no payment is ever collected.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    #[sea_orm(string_value = "cash")]
    Cash,
    #[sea_orm(string_value = "card")]
    Card,
    #[sea_orm(string_value = "online")]
    Online,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    fn rank(self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Processing => Some(1),
            OrderStatus::Shipped => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Whether moving from `self` to `next` follows the normal fulfilment
    /// path: forward along pending -> processing -> shipped -> delivered, or
    /// a cancellation of an order that has not reached a terminal state.
    /// Other moves are still permitted but are reported by the caller.
    pub fn is_forward_transition(self, next: OrderStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (Some(from), Some(to)) => to > from,
            (_, None) => true,
            (None, _) => false,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum ContactStatus {
    #[default]
    #[sea_orm(string_value = "New")]
    New,
    #[sea_orm(string_value = "In Progress")]
    #[serde(rename = "In Progress")]
    InProgress,
    #[sea_orm(string_value = "Resolved")]
    Resolved,
    #[sea_orm(string_value = "Closed")]
    Closed,
}

/// Identity returned alongside a session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub material: Material,
    /// Minor currency units.
    pub price: i64,
    pub image: String,
    pub in_stock: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub image: String,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartItem>,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: i64,
    pub image: String,
    pub quantity: i32,
}

/// Who placed an order, as shown in the back office.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub customer: Option<OrderCustomer>,
    pub items: Vec<OrderItem>,
    pub shipping_address: String,
    pub contact_number: String,
    pub total_amount: i64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub notes: String,
    pub order_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
}

/// Sum of `price * quantity` over `(price, quantity)` pairs.
///
/// Fails with `Validation` instead of wrapping when the total leaves `i64`.
pub fn line_total<I>(lines: I) -> AppResult<i64>
where
    I: IntoIterator<Item = (i64, i32)>,
{
    lines.into_iter().try_fold(0i64, |total, (price, quantity)| {
        price
            .checked_mul(i64::from(quantity))
            .and_then(|line| total.checked_add(line))
            .ok_or_else(|| AppError::Validation(CART_TOTAL_TOO_LARGE.into()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_matches_worked_example() {
        // 10.00 x 2 + 5.00 x 1
        assert_eq!(line_total([(1000, 2), (500, 1)]).unwrap(), 2500);
        assert_eq!(line_total(Vec::<(i64, i32)>::new()).unwrap(), 0);
    }

    #[test]
    fn line_total_rejects_overflow() {
        let err = line_total([(5_000_000_000, i32::MAX)]).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == CART_TOTAL_TOO_LARGE));

        let err = line_total([(i64::MAX, 1), (1, 1)]).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn labels_round_trip_through_json() {
        let ty: ProductType = serde_json::from_str("\"clay plate\"").unwrap();
        assert_eq!(ty, ProductType::ClayPlate);
        let status: ContactStatus = serde_json::from_str("\"In Progress\"").unwrap();
        assert_eq!(status, ContactStatus::InProgress);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert!(serde_json::from_str::<Material>("\"glass\"").is_err());
    }

    #[test]
    fn forward_transitions() {
        use OrderStatus::*;
        assert!(Pending.is_forward_transition(Processing));
        assert!(Processing.is_forward_transition(Delivered));
        assert!(Shipped.is_forward_transition(Cancelled));
        assert!(!Shipped.is_forward_transition(Pending));
        assert!(!Cancelled.is_forward_transition(Pending));
        assert!(!Delivered.is_forward_transition(Cancelled));
        assert!(Delivered.is_forward_transition(Delivered));
    }
}
