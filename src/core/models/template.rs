use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};

use super::workspace::{FieldType, Layout};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "template_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Retail,
    Shipping,
    Inventory,
    Asset,
    Food,
    Others,
}

impl Category {
    pub const ALL: [Category; 6] = [Category::Retail, Category::Shipping, Category::Inventory, Category::Asset, Category::Food, Category::Others];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Retail => "retail",
            Category::Shipping => "shipping",
            Category::Inventory => "inventory",
            Category::Asset => "asset",
            Category::Food => "food",
            Category::Others => "others",
        }
    }
}

impl FromStr for Category {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Select a valid choice. {} is not one of the available choices.", s))
    }
}

/// Validated template attributes shared by label and global templates.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateSpec {
    pub name: String,
    pub description: String,
    pub width_cm: f64,
    pub height_cm: f64,
    pub dpi: i32,
    pub category: Category,
    pub custom_category: String,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LabelTemplate {
    pub id: i32,
    pub workspace_id: i32,
    pub name: String,
    pub description: String,
    pub width_cm: f64,
    pub height_cm: f64,
    pub dpi: i32,
    pub category: Category,
    pub custom_category: String,
    pub template_code: String,
    pub is_base: bool,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl LabelTemplate {
    pub fn spec(&self) -> TemplateSpec {
        TemplateSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            width_cm: self.width_cm,
            height_cm: self.height_cm,
            dpi: self.dpi,
            category: self.category,
            custom_category: self.custom_category.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Insert {
    pub workspace_id: i32,
    pub spec: TemplateSpec,
    pub template_code: String,
    pub is_base: bool,
    pub created_by: i32,
}

/// Row shape of both `label_template_fields` and `global_template_fields`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TemplateField {
    pub id: i32,
    pub template_id: i32,
    pub name: String,
    pub field_type: FieldType,
    pub order: i32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl TemplateField {
    pub fn spec(&self) -> FieldSpec {
        FieldSpec {
            name: self.name.clone(),
            field_type: self.field_type,
            order: self.order,
            layout: Layout {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub order: i32,
    pub layout: Layout,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct GlobalTemplate {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub width_cm: f64,
    pub height_cm: f64,
    pub dpi: i32,
    pub category: Category,
    pub custom_category: String,
    pub is_active: bool,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl GlobalTemplate {
    pub fn spec(&self) -> TemplateSpec {
        TemplateSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            width_cm: self.width_cm,
            height_cm: self.height_cm,
            dpi: self.dpi,
            category: self.category,
            custom_category: self.custom_category.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GlobalInsert {
    pub spec: TemplateSpec,
    pub created_by: i32,
}
