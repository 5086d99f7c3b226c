mod common;

use art_heaven_api::{
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    entity::carts,
    error::AppError,
    models::{CART_TOTAL_TOO_LARGE, Cart, Role},
    services::cart_service,
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, sea_query::Expr};
use uuid::Uuid;

use common::{create_product, create_user, setup_state};

fn add(product_id: Uuid, quantity: Option<i32>) -> AddToCartRequest {
    AddToCartRequest {
        product_id: Some(product_id),
        quantity,
    }
}

fn assert_total_matches(cart: &Cart) {
    let expected: i64 = cart
        .items
        .iter()
        .map(|item| item.price * i64::from(item.quantity))
        .sum();
    assert_eq!(cart.total_amount, expected);
}

#[tokio::test]
async fn adding_the_same_product_twice_merges_lines() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::User, "buyer@example.com").await?;
    let vase = create_product(&state, "Blue Vase", 1000, true).await?;

    cart_service::add_item(&state, &user, add(vase.id, Some(1))).await?;
    let cart = cart_service::add_item(&state, &user, add(vase.id, Some(2)))
        .await?
        .data
        .expect("cart");

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.total_amount, 3000);
    Ok(())
}

#[tokio::test]
async fn total_tracks_every_mutation() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::User, "buyer@example.com").await?;
    let plate = create_product(&state, "Clay Plate", 450, true).await?;
    let matka = create_product(&state, "Water Matka", 1299, true).await?;

    let cart = cart_service::add_item(&state, &user, add(plate.id, Some(4)))
        .await?
        .data
        .expect("cart");
    assert_total_matches(&cart);

    let cart = cart_service::add_item(&state, &user, add(matka.id, None))
        .await?
        .data
        .expect("cart");
    assert_total_matches(&cart);
    assert_eq!(cart.total_amount, 450 * 4 + 1299);
    assert_eq!(cart.items[0].product_id, plate.id);
    assert_eq!(cart.items[1].product_id, matka.id);

    let plate_line = cart.items[0].id;
    let cart = cart_service::update_item_quantity(
        &state,
        &user,
        plate_line,
        UpdateCartItemRequest { quantity: Some(2) },
    )
    .await?
    .data
    .expect("cart");
    assert_total_matches(&cart);
    assert_eq!(cart.total_amount, 450 * 2 + 1299);

    let cart = cart_service::remove_item(&state, &user, plate_line)
        .await?
        .data
        .expect("cart");
    assert_total_matches(&cart);
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_amount, 1299);

    let cart = cart_service::clear_cart(&state, &user).await?.data.expect("cart");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_amount, 0);

    let fetched = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert!(fetched.items.is_empty());
    assert_eq!(fetched.total_amount, 0);
    Ok(())
}

#[tokio::test]
async fn quantities_below_one_are_raised() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::User, "buyer@example.com").await?;
    let bowl = create_product(&state, "Bowl", 700, true).await?;

    let cart = cart_service::add_item(&state, &user, add(bowl.id, Some(0)))
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items[0].quantity, 1);

    let cart = cart_service::update_item_quantity(
        &state,
        &user,
        cart.items[0].id,
        UpdateCartItemRequest { quantity: Some(-5) },
    )
    .await?
    .data
    .expect("cart");
    assert_eq!(cart.items[0].quantity, 1);
    assert_eq!(cart.total_amount, 700);

    let missing = cart_service::update_item_quantity(
        &state,
        &user,
        cart.items[0].id,
        UpdateCartItemRequest { quantity: None },
    )
    .await;
    assert!(matches!(missing, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn add_rejects_bad_products() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::User, "buyer@example.com").await?;
    let sold_out = create_product(&state, "Sold Out Jar", 900, false).await?;

    let err = cart_service::add_item(&state, &user, add(sold_out.id, Some(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(msg) if msg.contains("out of stock")));

    let err = cart_service::add_item(&state, &user, add(Uuid::new_v4(), Some(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = cart_service::add_item(&state, &user, AddToCartRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let cart = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert!(cart.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn remove_and_clear_are_idempotent() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::User, "buyer@example.com").await?;

    let cart = cart_service::remove_item(&state, &user, Uuid::new_v4())
        .await?
        .data
        .expect("cart");
    assert!(cart.items.is_empty());

    cart_service::clear_cart(&state, &user).await?;
    let cart = cart_service::clear_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.total_amount, 0);
    Ok(())
}

#[tokio::test]
async fn updating_someone_elses_line_is_not_found() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let owner = create_user(&state, Role::User, "owner@example.com").await?;
    let other = create_user(&state, Role::User, "other@example.com").await?;
    let vase = create_product(&state, "Vase", 1000, true).await?;

    let cart = cart_service::add_item(&state, &owner, add(vase.id, Some(1)))
        .await?
        .data
        .expect("cart");
    let line = cart.items[0].id;

    let no_cart = cart_service::update_item_quantity(
        &state,
        &other,
        line,
        UpdateCartItemRequest { quantity: Some(5) },
    )
    .await;
    assert!(matches!(no_cart, Err(AppError::NotFound(msg)) if msg == "Cart not found"));

    cart_service::get_cart(&state, &other).await?;
    let not_in_cart = cart_service::update_item_quantity(
        &state,
        &other,
        line,
        UpdateCartItemRequest { quantity: Some(5) },
    )
    .await;
    assert!(matches!(not_in_cart, Err(AppError::NotFound(msg)) if msg == "Item not found in cart"));
    Ok(())
}

#[tokio::test]
async fn oversized_totals_are_rejected_without_writing() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::User, "buyer@example.com").await?;
    // Inserted directly, above the price the catalog would accept.
    let statue = create_product(&state, "Bronze Statue", 5_000_000_000, true).await?;

    let err = cart_service::add_item(&state, &user, add(statue.id, Some(i32::MAX)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg == CART_TOTAL_TOO_LARGE));

    let cart = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_amount, 0);
    Ok(())
}

#[tokio::test]
async fn merge_that_would_overflow_keeps_previous_line() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::User, "buyer@example.com").await?;
    let statue = create_product(&state, "Bronze Statue", 5_000_000_000, true).await?;

    cart_service::add_item(&state, &user, add(statue.id, Some(1))).await?;
    let err = cart_service::add_item(&state, &user, add(statue.id, Some(i32::MAX)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let cart = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 1);
    assert_eq!(cart.total_amount, 5_000_000_000);
    Ok(())
}

#[tokio::test]
async fn stale_cart_version_is_a_conflict() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::User, "buyer@example.com").await?;
    let vase = create_product(&state, "Blue Vase", 1000, true).await?;

    cart_service::add_item(&state, &user, add(vase.id, Some(2))).await?;
    let stale = carts::Entity::find()
        .filter(carts::Column::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .expect("cart row");
    let mut items = cart_service::load_items(&state.orm, stale.id).await?;

    // A competing writer commits first.
    carts::Entity::update_many()
        .col_expr(
            carts::Column::Version,
            Expr::col(carts::Column::Version).add(1),
        )
        .filter(carts::Column::Id.eq(stale.id))
        .exec(&state.orm)
        .await?;

    items[0].quantity = 5;
    let err = cart_service::persist_cart(&state.orm, stale.clone(), &items)
        .await
        .unwrap_err();
    assert!(
        matches!(err, AppError::Conflict(msg) if msg == "Cart was modified concurrently, please retry")
    );

    let cart = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 2);
    assert_eq!(cart.total_amount, 2000);

    let row = carts::Entity::find_by_id(stale.id)
        .one(&state.orm)
        .await?
        .expect("cart row");
    assert_eq!(row.version, stale.version + 1);
    assert_eq!(row.total_amount, 2000);
    Ok(())
}
