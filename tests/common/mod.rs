#![allow(dead_code)]

use art_heaven_api::{
    db::{create_orm_conn, run_migrations},
    entity::{products, users},
    middleware::auth::AuthUser,
    models::{DEFAULT_PRODUCT_IMAGE, Material, ProductType, Role},
    services::auth_service::hash_password,
    state::AppState,
};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_PASSWORD: &str = "password123";

/// Fresh in-memory database with the full schema applied.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let orm = create_orm_conn("sqlite::memory:").await?;
    run_migrations(&orm).await?;
    Ok(AppState::with_secret(orm, TEST_SECRET, Duration::hours(1)))
}

pub async fn create_user(state: &AppState, role: Role, email: &str) -> anyhow::Result<AuthUser> {
    let password_hash = hash_password(TEST_PASSWORD).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(email.split('@').next().unwrap_or("user").to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        role: Set(role),
        phone: Set(String::new()),
        address: Set(String::new()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser::from(user))
}

pub async fn create_product(
    state: &AppState,
    name: &str,
    price: i64,
    in_stock: bool,
) -> anyhow::Result<products::Model> {
    let product = products::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(format!("{name} made by hand")),
        product_type: Set(ProductType::Pottery),
        material: Set(Material::Clay),
        price: Set(price),
        image: Set(DEFAULT_PRODUCT_IMAGE.to_string()),
        in_stock: Set(in_stock),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}
