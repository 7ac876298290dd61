//! Form payloads accepted by the handlers and their cleaning into core inputs.
//!
//! Every `clean` returns `Error::Form` carrying per-field messages, which the
//! handlers re-render next to the submitted page.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::core::models::template::{Category, FieldSpec, TemplateSpec};
use crate::core::models::user::Role;
use crate::core::models::workspace::{FieldType, Layout, WorkspaceRole};
use crate::error::Error;

pub static REQUIRED: &str = "This field is required.";
pub static NON_FIELD: &str = "__all__";
pub const MANUAL_FIELD_ROWS: usize = 5;

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: &str) {
        self.0.entry(field.to_owned()).or_default().push(message.to_owned());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.0.values().flatten().map(String::as_str)
    }

    pub fn into_result(self) -> Result<(), Error> {
        if self.is_empty() {
            return Ok(());
        }
        Err(Error::Form(self))
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errs: ValidationErrors) -> Self {
        let mut errors = FormErrors::default();
        for (field, list) in errs.field_errors() {
            for e in list {
                match &e.message {
                    Some(msg) => errors.add(field, msg),
                    None => errors.add(field, &e.code),
                }
            }
        }
        errors
    }
}

fn validated<T: Validate>(form: &T) -> FormErrors {
    match form.validate() {
        Ok(()) => FormErrors::default(),
        Err(errs) => errs.into(),
    }
}

fn choice<T>(errors: &mut FormErrors, field: &str, raw: &str) -> Option<T>
where
    T: FromStr<Err = String>,
{
    if raw.trim().is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(msg) => {
            errors.add(field, &msg);
            None
        }
    }
}

/// Numbers arrive as raw strings so a blank or malformed value becomes a
/// field message instead of a rejected payload. A blank value takes
/// `default`, or is required when there is none.
fn number<T: FromStr>(errors: &mut FormErrors, field: &str, raw: &str, default: Option<T>, invalid: &str) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        if default.is_none() {
            errors.add(field, REQUIRED);
        }
        return default;
    }
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            errors.add(field, invalid);
            None
        }
    }
}

fn decimal(errors: &mut FormErrors, field: &str, raw: &str, default: Option<f64>) -> Option<f64> {
    number(errors, field, raw, default, "Enter a number.")
}

fn whole(errors: &mut FormErrors, field: &str, raw: &str, default: Option<i32>) -> Option<i32> {
    number(errors, field, raw, default, "Enter a whole number.")
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(email(message = "Enter a valid email address."))]
    pub username: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
}

impl LoginForm {
    pub fn clean(self) -> Result<(String, String), Error> {
        let form = Self {
            username: self.username.trim().to_lowercase(),
            ..self
        };
        validated(&form).into_result()?;
        Ok((form.username, form.password))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SignupStep1Form {
    #[validate(email(message = "Enter a valid email address."), length(max = 254, message = "Ensure this value has at most 254 characters."))]
    pub email: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub password1: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub password2: String,
}

impl SignupStep1Form {
    /// Returns the lower-cased email and the password. The duplicate-email
    /// check needs the store and lives in `core::signup`.
    pub fn clean(self) -> Result<(String, String), Error> {
        let form = Self {
            email: self.email.trim().to_lowercase(),
            ..self
        };
        let mut errors = validated(&form);
        if !form.password1.is_empty() && !form.password2.is_empty() && form.password1 != form.password2 {
            errors.add("password2", "Passwords do not match.");
        }
        errors.into_result()?;
        Ok((form.email, form.password1))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SignupOrgForm {
    #[validate(length(max = 255, message = "Ensure this value has at most 255 characters."))]
    pub org_name: String,
}

impl SignupOrgForm {
    pub fn clean(self) -> Result<String, Error> {
        let mut errors = validated(&self);
        let name = self.org_name.trim().to_owned();
        if name.is_empty() {
            errors.add("org_name", REQUIRED);
        }
        errors.into_result()?;
        Ok(name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RoleChangeForm {
    pub role: String,
}

impl RoleChangeForm {
    pub fn clean(self) -> Result<Role, Error> {
        let mut errors = FormErrors::default();
        let role = choice(&mut errors, "role", &self.role);
        errors.into_result()?;
        role.ok_or_else(|| Error::form("role", REQUIRED))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct WorkspaceCreateForm {
    #[validate(length(max = 255, message = "Ensure this value has at most 255 characters."))]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl WorkspaceCreateForm {
    pub fn clean(self) -> Result<(String, String), Error> {
        let mut errors = validated(&self);
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            errors.add("name", REQUIRED);
        }
        errors.into_result()?;
        Ok((name, self.description.trim().to_owned()))
    }
}

/// Up to `MANUAL_FIELD_ROWS` rows named `field_name_<i>` / `field_type_<i>`.
/// Fully blank rows are skipped.
pub fn clean_manual_fields(raw: &HashMap<String, String>) -> Result<Vec<(String, FieldType)>, Error> {
    let mut errors = FormErrors::default();
    let mut rows = Vec::new();
    for i in 0..MANUAL_FIELD_ROWS {
        let name_key = format!("field_name_{}", i);
        let type_key = format!("field_type_{}", i);
        let name = raw.get(&name_key).map(|s| s.trim()).unwrap_or_default();
        let type_ = raw.get(&type_key).map(|s| s.trim()).unwrap_or_default();
        match (name.is_empty(), type_.is_empty()) {
            (true, true) => continue,
            (false, true) => errors.add(&type_key, "Select a field type."),
            (true, false) => errors.add(&name_key, REQUIRED),
            (false, false) => {
                if name.chars().count() > 255 {
                    errors.add(&name_key, "Ensure this value has at most 255 characters.");
                    continue;
                }
                if let Some(t) = choice(&mut errors, &type_key, type_) {
                    rows.push((name.to_owned(), t));
                }
            }
        }
    }
    errors.into_result()?;
    Ok(rows)
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LayoutForm {
    pub x: String,
    pub y: String,
    pub width: String,
    pub height: String,
}

impl LayoutForm {
    pub fn clean(self) -> Result<Layout, Error> {
        let mut errors = FormErrors::default();
        let layout = check_layout(&mut errors, [&self.x, &self.y, &self.width, &self.height], None);
        errors.into_result()?;
        layout.ok_or_else(|| Error::form(NON_FIELD, "Enter a valid layout."))
    }
}

/// Parses `[x, y, width, height]`. A blank origin takes `origin_default`.
fn check_layout(errors: &mut FormErrors, raw: [&str; 4], origin_default: Option<f64>) -> Option<Layout> {
    let x = decimal(errors, "x", raw[0], origin_default);
    let y = decimal(errors, "y", raw[1], origin_default);
    let width = decimal(errors, "width", raw[2], None);
    let height = decimal(errors, "height", raw[3], None);
    for (field, v) in [("x", x), ("y", y)] {
        if matches!(v, Some(v) if !v.is_finite() || v < 0.0) {
            errors.add(field, "Ensure this value is greater than or equal to 0.");
        }
    }
    for (field, v) in [("width", width), ("height", height)] {
        if matches!(v, Some(v) if !v.is_finite() || v <= 0.0) {
            errors.add(field, "Ensure this value is greater than 0.");
        }
    }
    Some(Layout {
        x: x?,
        y: y?,
        width: width?,
        height: height?,
    })
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct MembershipForm {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    pub role: String,
}

impl MembershipForm {
    pub fn clean(self) -> Result<(String, WorkspaceRole), Error> {
        let form = Self {
            email: self.email.trim().to_lowercase(),
            ..self
        };
        let mut errors = validated(&form);
        let role = choice(&mut errors, "role", &form.role);
        errors.into_result()?;
        let role = role.ok_or_else(|| Error::form("role", REQUIRED))?;
        Ok((form.email, role))
    }
}

const DEFAULT_DPI: i32 = 300;

/// Shared by label templates and global templates.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LabelTemplateForm {
    #[validate(length(max = 255, message = "Ensure this value has at most 255 characters."))]
    pub name: String,
    pub description: String,
    pub width_cm: String,
    pub height_cm: String,
    pub dpi: String,
    pub category: String,
    #[validate(length(max = 255, message = "Ensure this value has at most 255 characters."))]
    pub custom_category: String,
}

impl LabelTemplateForm {
    pub fn clean(self) -> Result<TemplateSpec, Error> {
        let mut errors = validated(&self);
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            errors.add("name", REQUIRED);
        }
        let width_cm = decimal(&mut errors, "width_cm", &self.width_cm, None);
        let height_cm = decimal(&mut errors, "height_cm", &self.height_cm, None);
        for (field, v) in [("width_cm", width_cm), ("height_cm", height_cm)] {
            if matches!(v, Some(v) if !v.is_finite() || v <= 0.0) {
                errors.add(field, "Ensure this value is greater than 0.");
            }
        }
        let dpi = whole(&mut errors, "dpi", &self.dpi, Some(DEFAULT_DPI));
        if matches!(dpi, Some(dpi) if !(72..=1200).contains(&dpi)) {
            errors.add("dpi", "Ensure this value is between 72 and 1200.");
        }
        let category: Option<Category> = choice(&mut errors, "category", &self.category);
        let custom_category = self.custom_category.trim().to_owned();
        if category == Some(Category::Others) && custom_category.is_empty() {
            errors.add("custom_category", "Please specify a category when selecting 'Others'.");
        }
        errors.into_result()?;
        let (Some(width_cm), Some(height_cm), Some(dpi)) = (width_cm, height_cm, dpi) else {
            return Err(Error::form(NON_FIELD, "Enter a valid label size."));
        };
        Ok(TemplateSpec {
            name,
            description: self.description.trim().to_owned(),
            width_cm,
            height_cm,
            dpi,
            category: category.ok_or_else(|| Error::form("category", REQUIRED))?,
            custom_category,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct TemplateDuplicateForm {
    #[validate(length(max = 255, message = "Ensure this value has at most 255 characters."))]
    pub name: String,
    pub description: String,
}

impl TemplateDuplicateForm {
    pub fn clean(self) -> Result<(String, String), Error> {
        let mut errors = validated(&self);
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            errors.add("name", REQUIRED);
        }
        errors.into_result()?;
        Ok((name, self.description.trim().to_owned()))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct TemplateFieldForm {
    #[validate(length(max = 255, message = "Ensure this value has at most 255 characters."))]
    pub name: String,
    pub field_type: String,
    pub order: String,
    pub x: String,
    pub y: String,
    pub width: String,
    pub height: String,
}

impl TemplateFieldForm {
    pub fn clean(self) -> Result<FieldSpec, Error> {
        let mut errors = validated(&self);
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            errors.add("name", REQUIRED);
        }
        let field_type = choice(&mut errors, "field_type", &self.field_type);
        let order = whole(&mut errors, "order", &self.order, Some(0));
        let layout = check_layout(&mut errors, [&self.x, &self.y, &self.width, &self.height], Some(0.0));
        errors.into_result()?;
        let (Some(order), Some(layout)) = (order, layout) else {
            return Err(Error::form(NON_FIELD, "Enter a valid layout."));
        };
        Ok(FieldSpec {
            name,
            field_type: field_type.ok_or_else(|| Error::form("field_type", REQUIRED))?,
            order,
            layout,
        })
    }
}
