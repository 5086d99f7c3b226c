use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::models::{Material, ProductType};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<ProductType>,
    pub material: Option<Material>,
    pub price: Option<i64>,
    pub image: Option<String>,
    pub in_stock: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub product_type: Option<ProductType>,
    pub material: Option<Material>,
    pub price: Option<i64>,
    pub image: Option<String>,
    pub in_stock: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    #[serde(rename = "type")]
    pub product_type: Option<ProductType>,
    pub material: Option<Material>,
    #[serde(alias = "in_stock")]
    pub in_stock: Option<bool>,
}
