mod common;

use art_heaven_api::{
    dto::auth::{ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest},
    entity::carts,
    error::AppError,
    middleware::auth::AuthUser,
    models::Role,
    services::{auth_service, cart_service},
    token::Claims,
};
use chrono::{Duration, Utc};
use sea_orm::EntityTrait;
use uuid::Uuid;

use common::{TEST_PASSWORD, create_user, setup_state};

fn register_request(name: &str, email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        name: Some(name.into()),
        email: Some(email.into()),
        password: Some(password.into()),
        ..Default::default()
    }
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: Some(email.into()),
        password: Some(password.into()),
    }
}

#[tokio::test]
async fn duplicate_email_is_a_conflict_regardless_of_other_fields() -> anyhow::Result<()> {
    let state = setup_state().await?;

    auth_service::register_user(&state, register_request("Meera", "meera@example.com", "secret1"))
        .await?;

    let err = auth_service::register_user(
        &state,
        register_request("Someone Else", "  MEERA@example.com ", "different-pass"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn registration_always_creates_plain_users() -> anyhow::Result<()> {
    let state = setup_state().await?;

    let payload: RegisterRequest = serde_json::from_value(serde_json::json!({
        "name": "Sneaky",
        "email": "sneaky@example.com",
        "password": "secret1",
        "role": "admin"
    }))?;
    let resp = auth_service::register_user(&state, payload).await?;
    let auth = resp.data.expect("auth payload");
    assert_eq!(auth.user.role, Role::User);
    assert_eq!(auth.user.email, "sneaky@example.com");

    let user = auth_service::verify_token(&state, &auth.token).await?;
    assert_eq!(user.id, auth.user.id);
    assert_eq!(user.role, Role::User);
    Ok(())
}

#[tokio::test]
async fn registration_validates_input() -> anyhow::Result<()> {
    let state = setup_state().await?;

    let missing = RegisterRequest {
        name: Some("No Email".into()),
        password: Some("secret1".into()),
        ..Default::default()
    };
    assert!(matches!(
        auth_service::register_user(&state, missing).await,
        Err(AppError::Validation(_))
    ));

    let short = register_request("Short", "short@example.com", "12345");
    assert!(matches!(
        auth_service::register_user(&state, short).await,
        Err(AppError::Validation(msg)) if msg.contains("6 characters")
    ));

    let bad_email = register_request("Bad", "not-an-email", "secret1");
    assert!(matches!(
        auth_service::register_user(&state, bad_email).await,
        Err(AppError::Validation(_))
    ));
    Ok(())
}

#[tokio::test]
async fn login_failures_share_one_message() -> anyhow::Result<()> {
    let state = setup_state().await?;
    create_user(&state, Role::User, "kiln@example.com").await?;

    let wrong_password = auth_service::login_user(&state, login_request("kiln@example.com", "nope"))
        .await
        .unwrap_err();
    let unknown_email =
        auth_service::login_user(&state, login_request("ghost@example.com", TEST_PASSWORD))
            .await
            .unwrap_err();

    match (wrong_password, unknown_email) {
        (AppError::Unauthorized(a), AppError::Unauthorized(b)) => assert_eq!(a, b),
        other => panic!("expected two Unauthorized errors, got {other:?}"),
    }

    let ok = auth_service::login_user(&state, login_request("Kiln@Example.com", TEST_PASSWORD))
        .await?;
    assert!(!ok.data.expect("auth payload").token.is_empty());
    Ok(())
}

#[tokio::test]
async fn token_failures_are_distinguishable() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::User, "glaze@example.com").await?;

    let past = (Utc::now() - Duration::minutes(10)).timestamp() as usize;
    let expired = state.tokens.sign(&Claims {
        sub: user.user_id.to_string(),
        iat: past - 60,
        exp: past,
    })?;
    let err = auth_service::verify_token(&state, &expired).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(msg) if msg.starts_with("Token expired")));

    let err = auth_service::verify_token(&state, "not.a.token").await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(msg) if msg.starts_with("Invalid token")));

    let orphan = state.tokens.issue(Uuid::new_v4())?;
    let err = auth_service::verify_token(&state, &orphan).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(msg) if msg.starts_with("User not found")));

    let valid = state.tokens.issue(user.user_id)?;
    assert_eq!(auth_service::verify_token(&state, &valid).await?.id, user.user_id);
    Ok(())
}

#[tokio::test]
async fn change_password_checks_current_and_length() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::User, "wheel@example.com").await?;

    let wrong_current = ChangePasswordRequest {
        current_password: Some("incorrect".into()),
        new_password: Some("brand-new-pass".into()),
    };
    assert!(matches!(
        auth_service::change_password(&state, user.user_id, wrong_current).await,
        Err(AppError::Unauthorized(_))
    ));

    let too_short = ChangePasswordRequest {
        current_password: Some(TEST_PASSWORD.into()),
        new_password: Some("123".into()),
    };
    assert!(matches!(
        auth_service::change_password(&state, user.user_id, too_short).await,
        Err(AppError::Validation(_))
    ));

    // Length is checked before the current password is verified.
    let short_and_wrong = ChangePasswordRequest {
        current_password: Some("incorrect".into()),
        new_password: Some("123".into()),
    };
    assert!(matches!(
        auth_service::change_password(&state, user.user_id, short_and_wrong).await,
        Err(AppError::Validation(msg)) if msg == "New password must be at least 6 characters"
    ));

    let good = ChangePasswordRequest {
        current_password: Some(TEST_PASSWORD.into()),
        new_password: Some("brand-new-pass".into()),
    };
    auth_service::change_password(&state, user.user_id, good).await?;

    assert!(
        auth_service::login_user(&state, login_request("wheel@example.com", TEST_PASSWORD))
            .await
            .is_err()
    );
    auth_service::login_user(&state, login_request("wheel@example.com", "brand-new-pass")).await?;
    Ok(())
}

#[tokio::test]
async fn only_admins_can_change_their_email() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, Role::User, "clay@example.com").await?;
    let admin = create_user(&state, Role::Admin, "boss@example.com").await?;

    let resp = auth_service::update_profile(
        &state,
        &user,
        UpdateProfileRequest {
            name: Some("Clay Lover".into()),
            email: Some("changed@example.com".into()),
            phone: Some("555-0101".into()),
            address: None,
        },
    )
    .await?;
    let profile = resp.data.expect("profile");
    assert_eq!(profile.name, "Clay Lover");
    assert_eq!(profile.phone, "555-0101");
    assert_eq!(profile.email, "clay@example.com");

    let taken = auth_service::update_profile(
        &state,
        &admin,
        UpdateProfileRequest {
            email: Some("clay@example.com".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(taken, Err(AppError::Conflict(_))));

    let resp = auth_service::update_profile(
        &state,
        &admin,
        UpdateProfileRequest {
            email: Some("Head@ArtHeaven.com".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(resp.data.expect("profile").email, "head@artheaven.com");
    Ok(())
}

#[tokio::test]
async fn admin_cannot_delete_own_account() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = create_user(&state, Role::Admin, "root@example.com").await?;

    let err = auth_service::delete_user(&state, &admin, admin.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg.contains("own account")));

    let missing = auth_service::delete_user(&state, &admin, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn deleting_a_user_removes_their_cart_and_sessions() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let admin = create_user(&state, Role::Admin, "root@example.com").await?;
    let user: AuthUser = create_user(&state, Role::User, "leaving@example.com").await?;
    let token = state.tokens.issue(user.user_id)?;
    cart_service::get_cart(&state, &user).await?;

    let listed = auth_service::list_users(&state).await?;
    assert_eq!(listed.count, Some(2));

    auth_service::delete_user(&state, &admin, user.user_id).await?;

    assert!(carts::Entity::find().all(&state.orm).await?.is_empty());
    let err = auth_service::verify_token(&state, &token).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(msg) if msg.starts_with("User not found")));
    Ok(())
}
