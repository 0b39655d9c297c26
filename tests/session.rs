//! Integration tests for the session surface.
//!
//! Requires `TEST_DATABASE_URL`; every test skips and passes without it.

use cartage::auth::{TokenIssuer, TokenKind};
use cartage::config::AuthConfig;
use cartage::db::{ClientExecutor, DbExecutor};
use cartage::domain::UserRole;
use cartage::schema::run_startup_migrations;
use cartage::service::accounts::{self, CreateUserRequest, UpdateSettingsRequest};
use cartage::service::session::{self, LoginRequest, RefreshRequest};
use cartage::ServiceError;
use uuid::Uuid;

fn test_executor() -> Option<ClientExecutor> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("skipping: TEST_DATABASE_URL not set");
            return None;
        }
    };
    let client = cartage::connect(&url).expect("Failed to connect to test database");
    let executor = ClientExecutor::new(client);
    run_startup_migrations(&executor).expect("Failed to run migrations");
    Some(executor)
}

fn issuer() -> TokenIssuer {
    TokenIssuer::new(&AuthConfig {
        secret: "integration-test-secret".to_string(),
        access_ttl_seconds: 900,
        refresh_ttl_seconds: 3600,
    })
}

fn create_account(executor: &ClientExecutor, role: UserRole) -> (String, String) {
    let username = format!("sess_{}", Uuid::new_v4().simple());
    let email = format!("{username}@example.com");
    accounts::create_user(
        executor,
        CreateUserRequest {
            username,
            email: email.clone(),
            password: "pass123".to_string(),
            first_name: Some("John".to_string()),
            last_name: Some("Doe".to_string()),
            role: Some(role),
            phone: None,
            country: None,
            city: None,
            address: None,
        },
    )
    .expect("Failed to create account");
    (email, "pass123".to_string())
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: Some(email.to_string()),
        password: Some(password.to_string()),
    }
}

#[test]
fn test_login_returns_tokens_and_capability_flags() {
    let Some(executor) = test_executor() else { return };
    let issuer = issuer();
    let (email, password) = create_account(&executor, UserRole::Employee);

    let body = session::login(&executor, &issuer, login_request(&email, &password)).unwrap();
    assert!(body["access"].is_string());
    assert!(body["refresh"].is_string());
    assert_eq!(body["user"]["role"], "employee");
    assert_eq!(body["user"]["is_employee"], true);
    assert_eq!(body["user"]["is_admin"], false);

    let access = body["access"].as_str().unwrap();
    assert!(issuer.verify(access, TokenKind::Access).is_ok());
}

#[test]
fn test_login_with_wrong_password_is_unauthorized() {
    let Some(executor) = test_executor() else { return };
    let issuer = issuer();
    let (email, _) = create_account(&executor, UserRole::Employee);

    let err = session::login(&executor, &issuer, login_request(&email, "wrong")).unwrap_err();
    assert!(matches!(err, ServiceError::Unauthorized(_)));
    assert_eq!(err.status(), 401);
}

#[test]
fn test_login_with_unknown_email_is_unauthorized() {
    let Some(executor) = test_executor() else { return };

    let err = session::login(
        &executor,
        &issuer(),
        login_request("nobody@example.com", "pass123"),
    )
    .unwrap_err();
    assert_eq!(err.status(), 401);
}

#[test]
fn test_customer_login_is_forbidden_even_with_valid_credentials() {
    let Some(executor) = test_executor() else { return };
    let issuer = issuer();
    let (email, password) = create_account(&executor, UserRole::Customer);

    let err = session::login(&executor, &issuer, login_request(&email, &password)).unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
    assert_eq!(err.status(), 403);
}

#[test]
fn test_login_requires_both_fields() {
    let Some(executor) = test_executor() else { return };

    let err = session::login(
        &executor,
        &issuer(),
        LoginRequest {
            email: Some("a@example.com".to_string()),
            password: None,
        },
    )
    .unwrap_err();
    assert_eq!(err.status(), 400);
}

#[test]
fn test_logout_revokes_and_rejects_reuse() {
    let Some(executor) = test_executor() else { return };
    let issuer = issuer();
    let (email, password) = create_account(&executor, UserRole::Admin);

    let body = session::login(&executor, &issuer, login_request(&email, &password)).unwrap();
    let refresh = body["refresh"].as_str().unwrap().to_string();

    let ok = session::logout(
        &executor,
        &issuer,
        RefreshRequest {
            refresh: Some(refresh.clone()),
        },
    )
    .unwrap();
    assert_eq!(ok["detail"], "Successfully logged out.");

    // Second logout with the same token is a client error, not a fault.
    let err = session::logout(
        &executor,
        &issuer,
        RefreshRequest {
            refresh: Some(refresh.clone()),
        },
    )
    .unwrap_err();
    assert_eq!(err.status(), 400);

    // And the revoked token no longer refreshes.
    let err = session::refresh(
        &executor,
        &issuer,
        RefreshRequest {
            refresh: Some(refresh),
        },
    )
    .unwrap_err();
    assert_eq!(err.status(), 401);
}

#[test]
fn test_logout_with_malformed_token_is_a_client_error() {
    let Some(executor) = test_executor() else { return };

    let err = session::logout(
        &executor,
        &issuer(),
        RefreshRequest {
            refresh: Some("garbage.token.here".to_string()),
        },
    )
    .unwrap_err();
    assert_eq!(err.status(), 400);
}

#[test]
fn test_refresh_rotates_access_token() {
    let Some(executor) = test_executor() else { return };
    let issuer = issuer();
    let (email, password) = create_account(&executor, UserRole::Employee);

    let body = session::login(&executor, &issuer, login_request(&email, &password)).unwrap();
    let refresh = body["refresh"].as_str().unwrap().to_string();

    let rotated = session::refresh(
        &executor,
        &issuer,
        RefreshRequest {
            refresh: Some(refresh),
        },
    )
    .unwrap();
    let access = rotated["access"].as_str().unwrap();
    assert!(issuer.verify(access, TokenKind::Access).is_ok());
    assert_eq!(rotated["user"]["email"], body["user"]["email"]);
}

#[test]
fn test_refresh_for_deleted_subject_is_not_found() {
    let Some(executor) = test_executor() else { return };
    let issuer = issuer();
    let (email, password) = create_account(&executor, UserRole::Employee);

    let body = session::login(&executor, &issuer, login_request(&email, &password)).unwrap();
    let refresh = body["refresh"].as_str().unwrap().to_string();
    let user_id = Uuid::parse_str(body["user"]["id"].as_str().unwrap()).unwrap();

    executor
        .execute("DELETE FROM users WHERE id = $1", &[&user_id])
        .unwrap();

    let err = session::refresh(
        &executor,
        &issuer,
        RefreshRequest {
            refresh: Some(refresh),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert_eq!(err.status(), 404);
}

#[test]
fn test_settings_update_round_trip() {
    let Some(executor) = test_executor() else { return };
    let issuer = issuer();
    let (email, password) = create_account(&executor, UserRole::Employee);
    let body = session::login(&executor, &issuer, login_request(&email, &password)).unwrap();
    let user_id = Uuid::parse_str(body["user"]["id"].as_str().unwrap()).unwrap();
    let account = cartage::domain::user::find_by_id(&executor, user_id)
        .unwrap()
        .unwrap();

    let updated = accounts::update_settings(
        &executor,
        account,
        UpdateSettingsRequest {
            email_notifications: Some(false),
            sms_notifications: Some(true),
            timezone: Some("Africa/Cairo".to_string()),
        },
    )
    .unwrap();
    assert!(!updated.email_notifications);
    assert!(updated.sms_notifications);

    let reloaded = cartage::domain::user::find_by_id(&executor, user_id)
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.timezone.as_deref(), Some("Africa/Cairo"));
    // Email and role are untouched by the settings surface.
    assert_eq!(reloaded.email, email);
    assert_eq!(reloaded.role, UserRole::Employee);
}
