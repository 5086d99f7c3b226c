use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Option<Uuid>,
    /// Defaults to 1; values below 1 are raised to 1.
    pub quantity: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: Option<i32>,
}
