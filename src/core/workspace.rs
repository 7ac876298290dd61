//! Workspaces, their fields and memberships.
//!
//! An org admin acts as workspace admin on every workspace of the org; anyone
//! else acts with their membership role. Workspaces the actor has no role on
//! are reported as `NotFound`.

use std::collections::HashSet;

use log::info;
use serde::Serialize;

use crate::core::auth::random_code;
use crate::core::models::template::LabelTemplate;
use crate::core::models::user::{Status, User};
use crate::core::models::workspace::{FieldInsert, FieldType, Insert, Layout, Member, Membership, Workspace, WorkspaceField, WorkspaceRole};
use crate::core::organization::{admin_org_id, ACTION_DENIED};
use crate::core::ports::repository::{MembershipCommon, Store, TemplateCommon, UserCommon, WorkspaceCommon, WorkspaceFieldCommon};
use crate::error::Error;

pub static EDIT_DENIED: &str = "You do not have permission to edit this workspace.";
pub static MANAGE_DENIED: &str = "Only workspace admins can manage members.";
pub static REMOVE_SELF: &str = "You cannot remove yourself from this workspace.";
pub static UNKNOWN_MEMBER: &str = "No active user with this email in your organisation.";

#[derive(Debug, Clone)]
pub struct Access {
    pub workspace: Workspace,
    pub role: WorkspaceRole,
}

impl Access {
    pub fn require_edit(&self) -> Result<(), Error> {
        if self.role.can_edit() {
            return Ok(());
        }
        Err(Error::PermissionDenied(EDIT_DENIED.to_owned()))
    }

    pub fn require_manage(&self) -> Result<(), Error> {
        if self.role.can_manage() {
            return Ok(());
        }
        Err(Error::PermissionDenied(MANAGE_DENIED.to_owned()))
    }
}

pub async fn access<S>(store: &mut S, actor: &User, workspace_id: i32) -> Result<Access, Error>
where
    S: Store,
{
    let workspace = WorkspaceCommon::get(store, workspace_id).await?.ok_or(Error::NotFound)?;
    if actor.org_id != Some(workspace.org_id) {
        return Err(Error::NotFound);
    }
    if actor.is_org_admin() {
        return Ok(Access {
            workspace,
            role: WorkspaceRole::Admin,
        });
    }
    match MembershipCommon::get(store, workspace.id, actor.id).await? {
        Some(m) => Ok(Access { workspace, role: m.role }),
        None => Err(Error::NotFound),
    }
}

pub async fn accessible<S>(store: &mut S, actor: &User) -> Result<Vec<Workspace>, Error>
where
    S: Store,
{
    match actor.org_id {
        Some(org_id) if actor.is_org_admin() => WorkspaceCommon::list_for_org(store, org_id).await,
        Some(_) => WorkspaceCommon::list_for_member(store, actor.id).await,
        None => Ok(Vec::new()),
    }
}

#[derive(Debug, Serialize)]
pub struct Detail {
    pub workspace: Workspace,
    pub role: WorkspaceRole,
    pub fields: Vec<WorkspaceField>,
    pub members: Vec<Member>,
    pub templates: Vec<LabelTemplate>,
}

pub async fn detail<S>(store: &mut S, actor: &User, workspace_id: i32) -> Result<Detail, Error>
where
    S: Store,
{
    let Access { workspace, role } = access(store, actor, workspace_id).await?;
    let fields = WorkspaceFieldCommon::list(store, workspace.id).await?;
    let members = MembershipCommon::list(store, workspace.id).await?;
    let templates = TemplateCommon::list(store, workspace.id).await?;
    Ok(Detail {
        workspace,
        role,
        fields,
        members,
        templates,
    })
}

/// Column names from the header row of an uploaded CSV, blanks dropped.
pub fn csv_headers(content: &[u8]) -> Result<Vec<String>, Error> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).flexible(true).from_reader(content);
    let headers = reader.headers()?;
    Ok(headers.iter().map(str::trim).filter(|h| !h.is_empty()).map(str::to_owned).collect())
}

/// snake_case key for a field name.
pub fn slugify(name: &str) -> String {
    let mut key = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            key.extend(c.to_lowercase());
        } else if !key.is_empty() && !key.ends_with('_') {
            key.push('_');
        }
    }
    let key = key.trim_end_matches('_');
    if key.is_empty() {
        return "field".to_owned();
    }
    key.to_owned()
}

fn unique_key(taken: &mut HashSet<String>, name: &str) -> String {
    let base = slugify(name);
    let mut key = base.clone();
    let mut n = 2;
    while taken.contains(&key) {
        key = format!("{}_{}", base, n);
        n += 1;
    }
    taken.insert(key.clone());
    key
}

async fn insert_fields<S>(store: &mut S, workspace_id: i32, fields: Vec<(String, FieldType)>) -> Result<Vec<WorkspaceField>, Error>
where
    S: Store,
{
    let mut taken: HashSet<String> = WorkspaceFieldCommon::list(store, workspace_id).await?.into_iter().map(|f| f.key).collect();
    let mut created = Vec::with_capacity(fields.len());
    for (name, field_type) in fields {
        let key = unique_key(&mut taken, &name);
        let field = WorkspaceFieldCommon::insert(
            store,
            FieldInsert {
                workspace_id,
                name,
                field_type,
                key,
                layout: Layout::default(),
            },
        )
        .await?;
        created.push(field);
    }
    Ok(created)
}

/// Creates the workspace, one text field per CSV column and the creator's
/// admin membership. Run inside a transaction.
pub async fn create<S>(store: &mut S, actor: &User, name: String, description: String, columns: Vec<String>) -> Result<Workspace, Error>
where
    S: Store,
{
    let org_id = admin_org_id(actor, ACTION_DENIED)?;
    let workspace = WorkspaceCommon::insert(
        store,
        Insert {
            org_id,
            name,
            description,
            workspace_code: random_code("WS"),
            created_by: actor.id,
        },
    )
    .await?;
    let fields = columns.into_iter().map(|c| (c, FieldType::Text)).collect();
    let fields = insert_fields(store, workspace.id, fields).await?;
    MembershipCommon::upsert(store, workspace.id, actor.id, WorkspaceRole::Admin).await?;
    info!("{} created workspace {} with {} fields", actor.email, workspace.workspace_code, fields.len());
    Ok(workspace)
}

pub async fn add_fields<S>(store: &mut S, actor: &User, workspace_id: i32, fields: Vec<(String, FieldType)>) -> Result<Vec<WorkspaceField>, Error>
where
    S: Store,
{
    access(store, actor, workspace_id).await?.require_edit()?;
    insert_fields(store, workspace_id, fields).await
}

pub async fn update_layout<S>(store: &mut S, actor: &User, workspace_id: i32, field_id: i32, layout: Layout) -> Result<(), Error>
where
    S: Store,
{
    access(store, actor, workspace_id).await?.require_edit()?;
    if !WorkspaceFieldCommon::update_layout(store, workspace_id, field_id, layout).await? {
        return Err(Error::NotFound);
    }
    Ok(())
}

pub async fn delete_field<S>(store: &mut S, actor: &User, workspace_id: i32, field_id: i32) -> Result<(), Error>
where
    S: Store,
{
    access(store, actor, workspace_id).await?.require_edit()?;
    if !WorkspaceFieldCommon::delete(store, workspace_id, field_id).await? {
        return Err(Error::NotFound);
    }
    Ok(())
}

/// Adds an active user of the same org, or changes the role of an existing
/// member.
pub async fn add_member<S>(store: &mut S, actor: &User, workspace_id: i32, email: &str, role: WorkspaceRole) -> Result<(User, Membership), Error>
where
    S: Store,
{
    let access = access(store, actor, workspace_id).await?;
    access.require_manage()?;
    let user = match UserCommon::get_by_email(store, email).await? {
        Some(u) if u.org_id == Some(access.workspace.org_id) && u.status == Status::Active => u,
        _ => return Err(Error::form("email", UNKNOWN_MEMBER)),
    };
    let membership = MembershipCommon::upsert(store, workspace_id, user.id, role).await?;
    info!("{} set {} as {:?} of workspace {}", actor.email, user.email, role, access.workspace.workspace_code);
    Ok((user, membership))
}

pub async fn remove_member<S>(store: &mut S, actor: &User, workspace_id: i32, user_id: i32) -> Result<(), Error>
where
    S: Store,
{
    access(store, actor, workspace_id).await?.require_manage()?;
    if user_id == actor.id {
        return Err(Error::PermissionDenied(REMOVE_SELF.to_owned()));
    }
    if !MembershipCommon::delete(store, workspace_id, user_id).await? {
        return Err(Error::NotFound);
    }
    Ok(())
}
