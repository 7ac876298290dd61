use std::collections::HashMap;

use actix_multipart::Multipart;
use actix_web::web::{Form, Path};
use actix_web::HttpResponse;
use futures_util::TryStreamExt;
use serde::Serialize;

use crate::context::UserInfo;
use crate::core::models::workspace::{FieldType, Workspace};
use crate::core::organization::ACTION_DENIED;
use crate::core::ports::repository::TxStore;
use crate::core::template::{copy_global, create as create_template};
use crate::core::workspace::{accessible, add_fields as add_workspace_fields, add_member as add_workspace_member, create as create_workspace, csv_headers, delete_field as delete_workspace_field, detail as workspace_detail, remove_member as remove_workspace_member, update_layout as update_field_layout};
use crate::error::Error;
use crate::flash::{Message, Messages};
use crate::forms::{clean_manual_fields, LabelTemplateForm, LayoutForm, MembershipForm, WorkspaceCreateForm, MANUAL_FIELD_ROWS};
use crate::handlers::{current_user, or_flash, or_redirect, or_rerender, Manager};
use crate::response::{page, redirect_with};

const CSV_FIELD: &str = "template_file";
const PART_LIMIT: usize = 64 * 1024;

fn workspace_url(id: i32) -> String {
    format!("/workspaces/{}/", id)
}

#[derive(Debug, Serialize)]
struct WorkspaceList {
    workspaces: Vec<Workspace>,
    can_create: bool,
}

pub async fn list(user_info: UserInfo, manager: Manager, messages: Messages) -> Result<HttpResponse, Error> {
    let mut db = manager.acquire().await?;
    let user = current_user(&mut db, &user_info).await?;
    let workspaces = accessible(&mut db, &user).await?;
    Ok(page(
        messages,
        WorkspaceList {
            workspaces,
            can_create: user.is_org_admin(),
        },
    ))
}

#[derive(Debug, Serialize)]
struct NewWorkspace {
    field_types: [FieldType; 6],
    manual_rows: usize,
}

impl Default for NewWorkspace {
    fn default() -> Self {
        NewWorkspace {
            field_types: FieldType::ALL,
            manual_rows: MANUAL_FIELD_ROWS,
        }
    }
}

pub async fn new_page(user_info: UserInfo, manager: Manager, messages: Messages) -> Result<HttpResponse, Error> {
    let mut db = manager.acquire().await?;
    let user = current_user(&mut db, &user_info).await?;
    if !user.is_org_admin() {
        return Ok(redirect_with("/workspaces/", &[Message::error(ACTION_DENIED)]));
    }
    Ok(page(messages, NewWorkspace::default()))
}

/// Reads the text parts of the creation form and the header row of the
/// optional CSV upload. Only the first line of the upload is kept; the rest
/// is drained. Unknown parts are discarded.
async fn read_create_form(mut payload: Multipart) -> Result<(WorkspaceCreateForm, Vec<String>), Error> {
    let mut form = WorkspaceCreateForm::default();
    let mut columns = Vec::new();
    while let Some(mut field) = payload.try_next().await? {
        let name = field.content_disposition().get_name().unwrap_or_default().to_owned();
        let is_csv = name == CSV_FIELD;
        let mut keep = matches!(name.as_str(), "name" | "description") || is_csv;
        let mut content = Vec::new();
        while let Some(chunk) = field.try_next().await? {
            if !keep {
                continue;
            }
            let chunk = match chunk.iter().position(|b| *b == b'\n') {
                Some(end) if is_csv => {
                    keep = false;
                    &chunk[..end]
                }
                _ => &chunk[..],
            };
            if content.len() + chunk.len() > PART_LIMIT {
                let msg = if is_csv { "The header row is too long." } else { "Ensure this value is at most 64 KiB." };
                return Err(Error::form(&name, msg));
            }
            content.extend_from_slice(chunk);
        }
        match name.as_str() {
            "name" => form.name = String::from_utf8_lossy(&content).into_owned(),
            "description" => form.description = String::from_utf8_lossy(&content).into_owned(),
            CSV_FIELD if !content.is_empty() => columns = csv_headers(&content)?,
            _ => {}
        }
    }
    Ok((form, columns))
}

pub async fn create(user_info: UserInfo, payload: Multipart, manager: Manager, messages: Messages) -> Result<HttpResponse, Error> {
    let result = async {
        let (form, columns) = read_create_form(payload).await?;
        let (name, description) = form.clean()?;
        let mut tx = manager.begin().await?;
        let user = current_user(&mut tx, &user_info).await?;
        let workspace = create_workspace(&mut tx, &user, name, description, columns).await?;
        tx.commit().await?;
        let msg = Message::success(format!("Workspace '{}' created.", workspace.name));
        Ok::<_, Error>(redirect_with(&workspace_url(workspace.id), &[msg]))
    }
    .await;
    or_rerender(or_redirect(result, "/workspaces/"), messages, NewWorkspace::default())
}

pub async fn detail(user_info: UserInfo, workspace_id: Path<(i32,)>, manager: Manager, messages: Messages) -> Result<HttpResponse, Error> {
    let mut db = manager.acquire().await?;
    let user = current_user(&mut db, &user_info).await?;
    let detail = workspace_detail(&mut db, &user, workspace_id.into_inner().0).await?;
    Ok(page(messages, detail))
}

pub async fn add_fields(user_info: UserInfo, workspace_id: Path<(i32,)>, Form(raw): Form<HashMap<String, String>>, manager: Manager) -> Result<HttpResponse, Error> {
    let workspace_id = workspace_id.into_inner().0;
    let location = workspace_url(workspace_id);
    let result = async {
        let rows = clean_manual_fields(&raw)?;
        let mut tx = manager.begin().await?;
        let user = current_user(&mut tx, &user_info).await?;
        let added = add_workspace_fields(&mut tx, &user, workspace_id, rows).await?;
        tx.commit().await?;
        Ok::<_, Error>(redirect_with(&location, &[Message::success(format!("{} field(s) added.", added.len()))]))
    }
    .await;
    or_flash(result, &location)
}

pub async fn update_layout(user_info: UserInfo, path: Path<(i32, i32)>, Form(form): Form<LayoutForm>, manager: Manager) -> Result<HttpResponse, Error> {
    let (workspace_id, field_id) = path.into_inner();
    let location = workspace_url(workspace_id);
    let result = async {
        let layout = form.clean()?;
        let mut db = manager.acquire().await?;
        let user = current_user(&mut db, &user_info).await?;
        update_field_layout(&mut db, &user, workspace_id, field_id, layout).await?;
        Ok::<_, Error>(redirect_with(&location, &[Message::success("Field layout updated.")]))
    }
    .await;
    or_flash(result, &location)
}

pub async fn delete_field(user_info: UserInfo, path: Path<(i32, i32)>, manager: Manager) -> Result<HttpResponse, Error> {
    let (workspace_id, field_id) = path.into_inner();
    let location = workspace_url(workspace_id);
    let result = async {
        let mut db = manager.acquire().await?;
        let user = current_user(&mut db, &user_info).await?;
        delete_workspace_field(&mut db, &user, workspace_id, field_id).await?;
        Ok::<_, Error>(redirect_with(&location, &[Message::success("Field deleted.")]))
    }
    .await;
    or_redirect(result, &location)
}

pub async fn add_member(user_info: UserInfo, workspace_id: Path<(i32,)>, Form(form): Form<MembershipForm>, manager: Manager) -> Result<HttpResponse, Error> {
    let workspace_id = workspace_id.into_inner().0;
    let location = workspace_url(workspace_id);
    let result = async {
        let (email, role) = form.clean()?;
        let mut db = manager.acquire().await?;
        let user = current_user(&mut db, &user_info).await?;
        let (member, membership) = add_workspace_member(&mut db, &user, workspace_id, &email, role).await?;
        let msg = Message::success(format!("{} is now a {} of this workspace.", member.email, membership.role.as_str()));
        Ok::<_, Error>(redirect_with(&location, &[msg]))
    }
    .await;
    or_flash(result, &location)
}

pub async fn remove_member(user_info: UserInfo, path: Path<(i32, i32)>, manager: Manager) -> Result<HttpResponse, Error> {
    let (workspace_id, member_id) = path.into_inner();
    let location = workspace_url(workspace_id);
    let result = async {
        let mut db = manager.acquire().await?;
        let user = current_user(&mut db, &user_info).await?;
        remove_workspace_member(&mut db, &user, workspace_id, member_id).await?;
        Ok::<_, Error>(redirect_with(&location, &[Message::success("Member removed.")]))
    }
    .await;
    or_redirect(result, &location)
}

pub async fn add_template(user_info: UserInfo, workspace_id: Path<(i32,)>, Form(form): Form<LabelTemplateForm>, manager: Manager) -> Result<HttpResponse, Error> {
    let workspace_id = workspace_id.into_inner().0;
    let location = workspace_url(workspace_id);
    let result = async {
        let spec = form.clean()?;
        let mut db = manager.acquire().await?;
        let user = current_user(&mut db, &user_info).await?;
        let template = create_template(&mut db, &user, workspace_id, spec).await?;
        let msg = Message::success(format!("Template '{}' created.", template.name));
        Ok::<_, Error>(redirect_with(&format!("/templates/{}/", template.id), &[msg]))
    }
    .await;
    or_flash(result, &location)
}

pub async fn from_global(user_info: UserInfo, path: Path<(i32, i32)>, manager: Manager) -> Result<HttpResponse, Error> {
    let (workspace_id, global_id) = path.into_inner();
    let location = workspace_url(workspace_id);
    let result = async {
        let mut tx = manager.begin().await?;
        let user = current_user(&mut tx, &user_info).await?;
        let template = copy_global(&mut tx, &user, workspace_id, global_id).await?;
        tx.commit().await?;
        let msg = Message::success(format!("Template '{}' added from the global library.", template.name));
        Ok::<_, Error>(redirect_with(&format!("/templates/{}/", template.id), &[msg]))
    }
    .await;
    or_redirect(result, &location)
}
