//! Account creation and self-service profile/settings.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::password;
use crate::db::ClientExecutor;
use crate::db::DbExecutor;
use crate::domain::{user, Locker, User, UserRole};
use crate::provision;
use crate::service::ServiceError;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex"));

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    /// Base role; defaults to customer.
    #[serde(default)]
    pub role: Option<UserRole>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub email_notifications: Option<bool>,
    #[serde(default)]
    pub sms_notifications: Option<bool>,
    #[serde(default)]
    pub timezone: Option<String>,
}

fn validate_create(req: &CreateUserRequest) -> Result<(), ServiceError> {
    if req.username.trim().is_empty() {
        return Err(ServiceError::Validation("username is required".into()));
    }
    if !EMAIL_RE.is_match(&req.email) {
        return Err(ServiceError::Validation("a valid email is required".into()));
    }
    if req.password.len() < 6 {
        return Err(ServiceError::Validation(
            "password must be at least 6 characters".into(),
        ));
    }
    Ok(())
}

/// Create an account.
///
/// The user row is committed first; the locker-provisioning hook then runs
/// for customer accounts. A provisioning fault is logged and swallowed — the
/// created account is returned either way, with whatever lockers were made.
pub fn create_user(
    executor: &ClientExecutor,
    req: CreateUserRequest,
) -> Result<(User, Vec<Locker>), ServiceError> {
    validate_create(&req)?;

    if user::find_by_username(executor, &req.username)?.is_some() {
        return Err(ServiceError::Conflict("username already taken".into()));
    }
    if user::find_by_email(executor, &req.email)?.is_some() {
        return Err(ServiceError::Conflict("email already registered".into()));
    }

    let password_hash = password::hash_password(&req.password)
        .map_err(|e| ServiceError::Internal(format!("password hashing failed: {e}")))?;

    let now = Utc::now();
    let new_user = User {
        id: Uuid::new_v4(),
        username: req.username,
        email: req.email,
        password_hash,
        first_name: req.first_name.unwrap_or_default(),
        last_name: req.last_name.unwrap_or_default(),
        role: req.role.unwrap_or(UserRole::Customer),
        is_superuser: false,
        is_staff: false,
        is_active: true,
        phone: req.phone,
        country: req.country,
        city: req.city,
        address: req.address,
        email_notifications: true,
        sms_notifications: false,
        timezone: None,
        created_at: now,
        updated_at: now,
    };
    user::insert(executor, &new_user)?;

    // Post-commit hook: best-effort, must never block account creation.
    let lockers = match provision::provision_customer_lockers(executor, &new_user) {
        Ok(lockers) => lockers,
        Err(e) => {
            tracing::error!(
                "locker provisioning failed for {}: {e}",
                new_user.username
            );
            Vec::new()
        }
    };

    Ok((new_user, lockers))
}

/// Apply a partial profile update. Email and role are read-only here.
pub fn update_profile(
    db: &dyn DbExecutor,
    mut current: User,
    req: UpdateProfileRequest,
) -> Result<User, ServiceError> {
    if let Some(first_name) = req.first_name {
        current.first_name = first_name;
    }
    if let Some(last_name) = req.last_name {
        current.last_name = last_name;
    }
    if let Some(phone) = req.phone {
        current.phone = Some(phone);
    }
    if let Some(country) = req.country {
        current.country = Some(country);
    }
    if let Some(city) = req.city {
        current.city = Some(city);
    }
    if let Some(address) = req.address {
        current.address = Some(address);
    }
    user::update_profile(db, &current)?;
    Ok(current)
}

/// Apply a partial notification/timezone update.
pub fn update_settings(
    db: &dyn DbExecutor,
    mut current: User,
    req: UpdateSettingsRequest,
) -> Result<User, ServiceError> {
    if let Some(email_notifications) = req.email_notifications {
        current.email_notifications = email_notifications;
    }
    if let Some(sms_notifications) = req.sms_notifications {
        current.sms_notifications = sms_notifications;
    }
    if let Some(timezone) = req.timezone {
        current.timezone = Some(timezone);
    }
    user::update_settings(db, &current)?;
    Ok(current)
}

/// Identity payload used by login/refresh/me responses.
pub fn identity_json(user: &User) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "first_name": user.first_name,
        "last_name": user.last_name,
        "role": user.effective_role(),
        "is_super_admin": user.is_super_admin(),
        "is_admin": user.is_admin(),
        "is_employee": user.is_employee(),
    })
}

pub fn profile_json(user: &User) -> Value {
    json!({
        "id": user.id,
        "email": user.email,
        "first_name": user.first_name,
        "last_name": user.last_name,
        "role": user.effective_role(),
        "phone": user.phone,
        "country": user.country,
        "city": user.city,
        "address": user.address,
    })
}

pub fn settings_json(user: &User) -> Value {
    json!({
        "email_notifications": user.email_notifications,
        "sms_notifications": user.sms_notifications,
        "timezone": user.timezone,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateUserRequest {
        CreateUserRequest {
            username: "john_doe".to_string(),
            email: "john@example.com".to_string(),
            password: "pass123".to_string(),
            first_name: None,
            last_name: None,
            role: None,
            phone: None,
            country: None,
            city: None,
            address: None,
        }
    }

    #[test]
    fn test_validate_rejects_blank_username() {
        let mut req = request();
        req.username = "  ".to_string();
        assert!(matches!(
            validate_create(&req),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        for email in ["", "plainaddress", "a@b", "two words@example.com"] {
            let mut req = request();
            req.email = email.to_string();
            assert!(validate_create(&req).is_err(), "should reject {email:?}");
        }
    }

    #[test]
    fn test_validate_rejects_short_password() {
        let mut req = request();
        req.password = "abc".to_string();
        assert!(validate_create(&req).is_err());
    }

    #[test]
    fn test_validate_accepts_reasonable_request() {
        assert!(validate_create(&request()).is_ok());
    }

    #[test]
    fn test_identity_json_carries_capability_flags() {
        let now = Utc::now();
        let u = User {
            id: Uuid::new_v4(),
            username: "admin1".to_string(),
            email: "admin1@example.com".to_string(),
            password_hash: String::new(),
            first_name: "A".to_string(),
            last_name: "One".to_string(),
            role: UserRole::Admin,
            is_superuser: false,
            is_staff: false,
            is_active: true,
            phone: None,
            country: None,
            city: None,
            address: None,
            email_notifications: true,
            sms_notifications: false,
            timezone: None,
            created_at: now,
            updated_at: now,
        };
        let v = identity_json(&u);
        assert_eq!(v["role"], "admin");
        assert_eq!(v["is_admin"], true);
        assert_eq!(v["is_super_admin"], false);
        assert_eq!(v["is_employee"], true);
    }
}
