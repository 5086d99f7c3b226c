use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{CreateProductRequest, ProductQuery, UpdateProductRequest},
    entity::products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{DEFAULT_PRODUCT_IMAGE, Product},
    response::{ApiResponse, Empty},
    state::AppState,
    validation,
};

const NAME_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;
/// Upper bound on a unit price in minor units (10,000,000.00).
const MAX_PRICE: i64 = 1_000_000_000;

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<Vec<Product>>> {
    let mut condition = Condition::all();
    if let Some(product_type) = query.product_type {
        condition = condition.add(Column::ProductType.eq(product_type));
    }
    if let Some(material) = query.material {
        condition = condition.add(Column::Material.eq(material));
    }
    if let Some(in_stock) = query.in_stock {
        condition = condition.add(Column::InStock.eq(in_stock));
    }

    let items = Products::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    Ok(ApiResponse::list("Products", items))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let result = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(product_from_entity);
    let result = match result {
        Some(p) => p,
        None => return Err(AppError::NotFound("Product not found".into())),
    };
    Ok(ApiResponse::success("Product", result))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let name = validation::required(payload.name, "Please add a product name")?;
    validation::max_chars(&name, NAME_MAX, "Name")?;
    let description = validation::required(payload.description, "Please add a description")?;
    validation::max_chars(&description, DESCRIPTION_MAX, "Description")?;
    let product_type = payload
        .product_type
        .ok_or_else(|| AppError::Validation("Please specify the product type".into()))?;
    let material = payload
        .material
        .ok_or_else(|| AppError::Validation("Please specify the material".into()))?;
    let price = payload
        .price
        .ok_or_else(|| AppError::Validation("Please add a price".into()))?;
    validate_price(price)?;
    let image = payload
        .image
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .unwrap_or_else(|| DEFAULT_PRODUCT_IMAGE.to_string());

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(description),
        product_type: Set(product_type),
        material: Set(material),
        price: Set(price),
        image: Set(image),
        in_stock: Set(payload.in_stock.unwrap_or(true)),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(product_id = %product.id, "product created");
    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound("Product not found".into())),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        let name = validation::required(Some(name), "Please add a product name")?;
        validation::max_chars(&name, NAME_MAX, "Name")?;
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        let description = validation::required(Some(description), "Please add a description")?;
        validation::max_chars(&description, DESCRIPTION_MAX, "Description")?;
        active.description = Set(description);
    }
    if let Some(product_type) = payload.product_type {
        active.product_type = Set(product_type);
    }
    if let Some(material) = payload.material {
        active.material = Set(material);
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
        active.price = Set(price);
    }
    if let Some(image) = payload.image {
        let image = image.trim();
        active.image = Set(if image.is_empty() {
            DEFAULT_PRODUCT_IMAGE.to_string()
        } else {
            image.to_string()
        });
    }
    if let Some(in_stock) = payload.in_stock {
        active.in_stock = Set(in_stock);
    }

    let product = active.update(&state.orm).await?;

    tracing::info!(product_id = %product.id, in_stock = product.in_stock, "product updated");
    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success("Updated", product_from_entity(product)))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Empty>> {
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Product not found".into()));
    }

    tracing::info!(product_id = %id, "product deleted");
    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Deleted", Empty {}))
}

fn validate_price(price: i64) -> AppResult<()> {
    if price <= 0 {
        return Err(AppError::Validation("Price must be a positive number".into()));
    }
    if price > MAX_PRICE {
        return Err(AppError::Validation("Price is too large".into()));
    }
    Ok(())
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        product_type: model.product_type,
        material: model.material,
        price: model.price,
        image: model.image,
        in_stock: model.in_stock,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
