use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use super::user::Role;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Org {
    pub id: i32,
    pub name: String,
    pub domain: Option<String>,
    pub org_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub name: String,
    pub domain: Option<String>,
    pub org_code: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JoinRequest {
    pub id: i32,
    pub org_id: i32,
    pub user_id: i32,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

/// A join request joined with the requesting user, as listed to org admins.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PendingJoinRequest {
    pub id: i32,
    pub user_id: i32,
    pub email: String,
    pub user_code: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RoleChangeLog {
    pub id: i32,
    pub org_id: i32,
    pub user_id: i32,
    pub previous_role: Role,
    pub new_role: Role,
    pub changed_by: Option<i32>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RoleChangeInsert {
    pub org_id: i32,
    pub user_id: i32,
    pub previous_role: Role,
    pub new_role: Role,
    pub changed_by: i32,
}
