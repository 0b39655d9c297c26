//! Account records.
//!
//! The stored `role` is the immutable base role. Privilege escalation is a
//! read-time derivation over the `is_superuser`/`is_staff` flags — see
//! [`User::effective_role`] — so no save path ever rewrites a role.

use chrono::{DateTime, Utc};
use may_postgres::Row;
use std::str::FromStr;
use uuid::Uuid;

use crate::db::{DbError, DbExecutor, FromRow};
use crate::domain::enums::UserRole;

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    /// Base role as assigned at creation.
    pub role: UserRole,
    pub is_superuser: bool,
    pub is_staff: bool,
    pub is_active: bool,
    pub phone: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub timezone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Effective role: a superuser is always a super-admin; a staff-flagged
    /// account with a customer base role acts as an employee; everything else
    /// keeps its base role.
    pub fn effective_role(&self) -> UserRole {
        if self.is_superuser {
            UserRole::SuperAdmin
        } else if self.is_staff && self.role == UserRole::Customer {
            UserRole::Employee
        } else {
            self.role
        }
    }

    pub fn is_customer(&self) -> bool {
        self.effective_role() == UserRole::Customer
    }

    pub fn is_employee(&self) -> bool {
        matches!(
            self.effective_role(),
            UserRole::Employee | UserRole::Admin | UserRole::SuperAdmin
        )
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.effective_role(), UserRole::Admin | UserRole::SuperAdmin)
    }

    pub fn is_super_admin(&self) -> bool {
        self.effective_role() == UserRole::SuperAdmin
    }
}

impl FromRow for User {
    fn from_row(row: &Row) -> Result<Self, DbError> {
        let role_raw: String = row.try_get("role")?;
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            role: UserRole::from_str(&role_raw).map_err(|e| DbError::Parse(e.to_string()))?,
            is_superuser: row.try_get("is_superuser")?,
            is_staff: row.try_get("is_staff")?,
            is_active: row.try_get("is_active")?,
            phone: row.try_get("phone")?,
            country: row.try_get("country")?,
            city: row.try_get("city")?,
            address: row.try_get("address")?,
            email_notifications: row.try_get("email_notifications")?,
            sms_notifications: row.try_get("sms_notifications")?,
            timezone: row.try_get("timezone")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, role, \
     is_superuser, is_staff, is_active, phone, country, city, address, \
     email_notifications, sms_notifications, timezone, created_at, updated_at";

pub fn insert(db: &dyn DbExecutor, user: &User) -> Result<(), DbError> {
    db.execute(
        "INSERT INTO users (id, username, email, password_hash, first_name, last_name, role, \
         is_superuser, is_staff, is_active, phone, country, city, address, \
         email_notifications, sms_notifications, timezone, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)",
        &[
            &user.id,
            &user.username,
            &user.email,
            &user.password_hash,
            &user.first_name,
            &user.last_name,
            &user.role.as_str(),
            &user.is_superuser,
            &user.is_staff,
            &user.is_active,
            &user.phone,
            &user.country,
            &user.city,
            &user.address,
            &user.email_notifications,
            &user.sms_notifications,
            &user.timezone,
            &user.created_at,
            &user.updated_at,
        ],
    )?;
    Ok(())
}

pub fn find_by_id(db: &dyn DbExecutor, id: Uuid) -> Result<Option<User>, DbError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    db.query_opt(&sql, &[&id])?
        .map(|row| User::from_row(&row))
        .transpose()
}

pub fn find_by_email(db: &dyn DbExecutor, email: &str) -> Result<Option<User>, DbError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    db.query_opt(&sql, &[&email])?
        .map(|row| User::from_row(&row))
        .transpose()
}

pub fn find_by_username(db: &dyn DbExecutor, username: &str) -> Result<Option<User>, DbError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
    db.query_opt(&sql, &[&username])?
        .map(|row| User::from_row(&row))
        .transpose()
}

/// Customer accounts, oldest first.
pub fn list_customers(db: &dyn DbExecutor) -> Result<Vec<User>, DbError> {
    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users WHERE role = $1 AND NOT is_superuser AND NOT is_staff \
         ORDER BY created_at"
    );
    db.query_all(&sql, &[&UserRole::Customer.as_str()])?
        .iter()
        .map(User::from_row)
        .collect()
}

pub fn count_customers(db: &dyn DbExecutor) -> Result<i64, DbError> {
    let row = db.query_one(
        "SELECT COUNT(*) FROM users WHERE role = $1 AND NOT is_superuser AND NOT is_staff",
        &[&UserRole::Customer.as_str()],
    )?;
    Ok(row.get(0))
}

/// Persist the profile field set. Email and role are not written from here.
pub fn update_profile(db: &dyn DbExecutor, user: &User) -> Result<(), DbError> {
    db.execute(
        "UPDATE users SET first_name = $1, last_name = $2, phone = $3, country = $4, \
         city = $5, address = $6, updated_at = $7 WHERE id = $8",
        &[
            &user.first_name,
            &user.last_name,
            &user.phone,
            &user.country,
            &user.city,
            &user.address,
            &Utc::now(),
            &user.id,
        ],
    )?;
    Ok(())
}

/// Persist the notification/timezone preference set.
pub fn update_settings(db: &dyn DbExecutor, user: &User) -> Result<(), DbError> {
    db.execute(
        "UPDATE users SET email_notifications = $1, sms_notifications = $2, timezone = $3, \
         updated_at = $4 WHERE id = $5",
        &[
            &user.email_notifications,
            &user.sms_notifications,
            &user.timezone,
            &Utc::now(),
            &user.id,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            username: "john_doe".to_string(),
            email: "john@example.com".to_string(),
            password_hash: String::new(),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            role,
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
        }
    }

    #[test]
    fn test_effective_role_superuser_wins() {
        let mut u = base_user(UserRole::Customer);
        u.is_superuser = true;
        assert_eq!(u.effective_role(), UserRole::SuperAdmin);
        assert!(u.is_super_admin());
        assert!(u.is_admin());
        assert!(u.is_employee());
        assert!(!u.is_customer());
    }

    #[test]
    fn test_effective_role_staff_escalates_customer_only() {
        let mut u = base_user(UserRole::Customer);
        u.is_staff = true;
        assert_eq!(u.effective_role(), UserRole::Employee);

        let mut admin = base_user(UserRole::Admin);
        admin.is_staff = true;
        assert_eq!(admin.effective_role(), UserRole::Admin);
    }

    #[test]
    fn test_effective_role_plain_accounts_keep_base() {
        assert_eq!(base_user(UserRole::Customer).effective_role(), UserRole::Customer);
        assert_eq!(base_user(UserRole::Employee).effective_role(), UserRole::Employee);
        assert!(base_user(UserRole::Customer).is_customer());
    }

    #[test]
    fn test_capability_ladder() {
        let employee = base_user(UserRole::Employee);
        assert!(employee.is_employee());
        assert!(!employee.is_admin());

        let admin = base_user(UserRole::Admin);
        assert!(admin.is_employee());
        assert!(admin.is_admin());
        assert!(!admin.is_super_admin());
    }
}
