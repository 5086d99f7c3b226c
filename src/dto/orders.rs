use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::models::{OrderStatus, PaymentMethod};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub shipping_address: Option<String>,
    pub contact_number: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

/// Only status and notes are mutable once an order exists.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub status: Option<OrderStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}
