use art_heaven_api::{
    config::AppConfig,
    db::{OrmConn, create_orm_conn, run_migrations},
    entity::{products, users},
    models::{DEFAULT_PRODUCT_IMAGE, Material, ProductType, Role},
    services::auth_service::hash_password,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "Admin User", "admin@artheaven.com", "admin123", Role::Admin).await?;
    let user_id =
        ensure_user(&orm, "Regular User", "user@example.com", "password123", Role::User).await?;
    seed_products(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &OrmConn,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let existing = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?;

    // Existing accounts keep their password; only the role is enforced.
    if let Some(user) = existing {
        if user.role != role {
            let id = user.id;
            let mut active: users::ActiveModel = user.into();
            active.role = Set(role);
            active.update(orm).await?;
            return Ok(id);
        }
        return Ok(user.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        role: Set(role),
        phone: Set(String::new()),
        address: Set(String::new()),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;
    Ok(user.id)
}

async fn seed_products(orm: &OrmConn) -> anyhow::Result<()> {
    let catalog = [
        (
            "Terracotta Flower Vase",
            "Hand-thrown terracotta vase with a burnished finish.",
            ProductType::Vase,
            Material::Clay,
            149_900,
        ),
        (
            "Glazed Ceramic Vase",
            "Tall ceramic vase in a deep indigo glaze.",
            ProductType::Vase,
            Material::Ceramic,
            249_900,
        ),
        (
            "Rustic Serving Bowl",
            "Wheel-thrown pottery bowl, food safe and oven friendly.",
            ProductType::Pottery,
            Material::Ceramic,
            89_900,
        ),
        (
            "Clay Dinner Plate",
            "Earthen dinner plate fired at low temperature.",
            ProductType::ClayPlate,
            Material::Clay,
            39_900,
        ),
        (
            "Traditional Water Matka",
            "Porous clay pot that keeps drinking water naturally cool.",
            ProductType::ClayMatka,
            Material::Clay,
            69_900,
        ),
        (
            "Jaipur Blue Pottery Jar",
            "Quartz-based blue pottery jar with floral motifs.",
            ProductType::BluePottery,
            Material::Ceramic,
            199_900,
        ),
        (
            "Elephant Showpiece",
            "Hand-painted clay elephant for the mantelpiece.",
            ProductType::Showpiece,
            Material::Clay,
            59_900,
        ),
    ];

    let mut inserted = 0;
    for (name, description, product_type, material, price) in catalog {
        let exists = products::Entity::find()
            .filter(products::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        products::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            product_type: Set(product_type),
            material: Set(material),
            price: Set(price),
            image: Set(DEFAULT_PRODUCT_IMAGE.to_string()),
            in_stock: Set(true),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
        inserted += 1;
    }

    println!("Seeded {inserted} products");
    Ok(())
}
