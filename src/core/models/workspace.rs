use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "field_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Barcode,
    Qrcode,
    Image,
}

impl FieldType {
    pub const ALL: [FieldType; 6] = [FieldType::Text, FieldType::Number, FieldType::Date, FieldType::Barcode, FieldType::Qrcode, FieldType::Image];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Barcode => "barcode",
            FieldType::Qrcode => "qrcode",
            FieldType::Image => "image",
        }
    }
}

impl FromStr for FieldType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Select a valid choice. {} is not one of the available choices.", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "workspace_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRole {
    Admin,
    Editor,
    Viewer,
}

impl WorkspaceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkspaceRole::Admin => "admin",
            WorkspaceRole::Editor => "editor",
            WorkspaceRole::Viewer => "viewer",
        }
    }

    pub fn can_edit(&self) -> bool {
        matches!(self, WorkspaceRole::Admin | WorkspaceRole::Editor)
    }

    pub fn can_manage(&self) -> bool {
        matches!(self, WorkspaceRole::Admin)
    }
}

impl FromStr for WorkspaceRole {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(WorkspaceRole::Admin),
            "editor" => Ok(WorkspaceRole::Editor),
            "viewer" => Ok(WorkspaceRole::Viewer),
            _ => Err(format!("Select a valid choice. {} is not one of the available choices.", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Workspace {
    pub id: i32,
    pub org_id: i32,
    pub name: String,
    pub description: String,
    pub workspace_code: String,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub org_id: i32,
    pub name: String,
    pub description: String,
    pub workspace_code: String,
    pub created_by: i32,
}

/// Position and size of a field on the label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for Layout {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, width: 1.0, height: 1.0 }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct WorkspaceField {
    pub id: i32,
    pub workspace_id: i32,
    pub name: String,
    pub field_type: FieldType,
    pub key: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
pub struct FieldInsert {
    pub workspace_id: i32,
    pub name: String,
    pub field_type: FieldType,
    pub key: String,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Membership {
    pub id: i32,
    pub workspace_id: i32,
    pub user_id: i32,
    pub role: WorkspaceRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Member {
    pub user_id: i32,
    pub email: String,
    pub role: WorkspaceRole,
    pub created_at: DateTime<Utc>,
}
