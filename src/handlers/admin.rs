//! Staff-only browsing of every table, with search, filters and paging.

use actix_web::web::{Data, Form, Path, Query};
use actix_web::HttpResponse;
use serde::Deserialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use crate::context::UserInfo;
use crate::core::models::organization::{JoinRequest, Org, RoleChangeLog};
use crate::core::models::template::{Category, GlobalTemplate, LabelTemplate, TemplateField};
use crate::core::models::user::{Role, Status, User};
use crate::core::models::workspace::{FieldType, Membership, Workspace, WorkspaceField, WorkspaceRole};
use crate::core::template::{add_global_field, create_global};
use crate::error::Error;
use crate::flash::{Message, Messages};
use crate::forms::{LabelTemplateForm, TemplateFieldForm};
use crate::handlers::{current_user, or_flash, or_redirect, Manager};
use crate::request::Pagination;
use crate::response::{page, redirect_with, List};

pub static STAFF_ONLY: &str = "Only staff can access the admin.";

async fn staff(manager: &Manager, user_info: &UserInfo) -> Result<User, Error> {
    let mut db = manager.acquire().await?;
    let user = current_user(&mut db, user_info).await?;
    if !(user.is_staff || user.is_superuser) {
        return Err(Error::PermissionDenied(STAFF_ONLY.to_owned()));
    }
    Ok(user)
}

/// Search and filter clauses of one admin list. `FROM` aliases the listed
/// table as `t`.
trait AdminFilter {
    const FROM: &'static str;
    const SEARCH: &'static [&'static str];
    fn q(&self) -> Option<&str>;
    fn push_filters(&self, stmt: &mut QueryBuilder<'static, Postgres>);
}

/// Substring pattern for `ILIKE`, matching `%`, `_` and `\` literally.
fn like_pattern(q: &str) -> String {
    let mut pattern = String::with_capacity(q.len() + 2);
    pattern.push('%');
    for c in q.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_where<F: AdminFilter>(stmt: &mut QueryBuilder<'static, Postgres>, filter: &F) {
    if let Some(q) = filter.q().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(q);
        stmt.push(" AND (");
        let mut sep = stmt.separated(" OR ");
        for col in F::SEARCH {
            sep.push(format!("{} ILIKE ", col)).push_bind_unseparated(pattern.clone());
        }
        stmt.push(")");
    }
    filter.push_filters(stmt);
}

async fn fetch_list<T, F>(db: &PgPool, filter: &F, pagination: Pagination) -> Result<List<T>, Error>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    F: AdminFilter,
{
    let mut count = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} WHERE 1 = 1", F::FROM));
    push_where(&mut count, filter);
    let (total,): (i64,) = count.build_query_as().fetch_one(db).await?;
    let mut stmt = QueryBuilder::new(format!("SELECT t.* FROM {} WHERE 1 = 1", F::FROM));
    push_where(&mut stmt, filter);
    stmt.push(" ORDER BY t.id DESC LIMIT ").push_bind(pagination.limit());
    stmt.push(" OFFSET ").push_bind(pagination.offset());
    let list = stmt.build_query_as::<T>().fetch_all(db).await?;
    Ok(List::new(list, total))
}

async fn admin_list<T, F>(user_info: UserInfo, filter: F, pagination: Pagination, manager: Manager, db: Data<PgPool>, messages: Messages) -> Result<HttpResponse, Error>
where
    T: for<'r> FromRow<'r, PgRow> + serde::Serialize + Send + Unpin,
    F: AdminFilter,
{
    let result = async {
        staff(&manager, &user_info).await?;
        let list: List<T> = fetch_list(&db, &filter, pagination).await?;
        Ok::<_, Error>(page(messages, list))
    }
    .await;
    or_redirect(result, "/")
}

#[derive(Debug, Default, Deserialize)]
pub struct OrgFilter {
    q: Option<String>,
}

impl AdminFilter for OrgFilter {
    const FROM: &'static str = "orgs AS t";
    const SEARCH: &'static [&'static str] = &["t.name", "t.domain", "t.org_code"];
    fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }
    fn push_filters(&self, _: &mut QueryBuilder<'static, Postgres>) {}
}

pub async fn orgs(user_info: UserInfo, Query(filter): Query<OrgFilter>, Query(pagination): Query<Pagination>, manager: Manager, db: Data<PgPool>, messages: Messages) -> Result<HttpResponse, Error> {
    admin_list::<Org, _>(user_info, filter, pagination, manager, db, messages).await
}

#[derive(Debug, Default, Deserialize)]
pub struct UserFilter {
    q: Option<String>,
    role: Option<Role>,
    status: Option<Status>,
    org: Option<i32>,
}

impl AdminFilter for UserFilter {
    const FROM: &'static str = "users AS t";
    const SEARCH: &'static [&'static str] = &["t.email", "t.user_code"];
    fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }
    fn push_filters(&self, stmt: &mut QueryBuilder<'static, Postgres>) {
        if let Some(role) = self.role {
            stmt.push(" AND t.role = ").push_bind(role);
        }
        if let Some(status) = self.status {
            stmt.push(" AND t.status = ").push_bind(status);
        }
        if let Some(org) = self.org {
            stmt.push(" AND t.org_id = ").push_bind(org);
        }
    }
}

pub async fn users(user_info: UserInfo, Query(filter): Query<UserFilter>, Query(pagination): Query<Pagination>, manager: Manager, db: Data<PgPool>, messages: Messages) -> Result<HttpResponse, Error> {
    admin_list::<User, _>(user_info, filter, pagination, manager, db, messages).await
}

#[derive(Debug, Default, Deserialize)]
pub struct JoinRequestFilter {
    q: Option<String>,
    is_approved: Option<bool>,
    org: Option<i32>,
}

impl AdminFilter for JoinRequestFilter {
    const FROM: &'static str = "org_join_requests AS t JOIN users AS u ON u.id = t.user_id JOIN orgs AS o ON o.id = t.org_id";
    const SEARCH: &'static [&'static str] = &["u.email", "o.name"];
    fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }
    fn push_filters(&self, stmt: &mut QueryBuilder<'static, Postgres>) {
        if let Some(approved) = self.is_approved {
            stmt.push(" AND t.is_approved = ").push_bind(approved);
        }
        if let Some(org) = self.org {
            stmt.push(" AND t.org_id = ").push_bind(org);
        }
    }
}

pub async fn join_requests(user_info: UserInfo, Query(filter): Query<JoinRequestFilter>, Query(pagination): Query<Pagination>, manager: Manager, db: Data<PgPool>, messages: Messages) -> Result<HttpResponse, Error> {
    admin_list::<JoinRequest, _>(user_info, filter, pagination, manager, db, messages).await
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkspaceFilter {
    q: Option<String>,
    org: Option<i32>,
}

impl AdminFilter for WorkspaceFilter {
    const FROM: &'static str = "workspaces AS t";
    const SEARCH: &'static [&'static str] = &["t.name", "t.workspace_code"];
    fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }
    fn push_filters(&self, stmt: &mut QueryBuilder<'static, Postgres>) {
        if let Some(org) = self.org {
            stmt.push(" AND t.org_id = ").push_bind(org);
        }
    }
}

pub async fn workspaces(user_info: UserInfo, Query(filter): Query<WorkspaceFilter>, Query(pagination): Query<Pagination>, manager: Manager, db: Data<PgPool>, messages: Messages) -> Result<HttpResponse, Error> {
    admin_list::<Workspace, _>(user_info, filter, pagination, manager, db, messages).await
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkspaceFieldFilter {
    q: Option<String>,
    workspace: Option<i32>,
    field_type: Option<FieldType>,
}

impl AdminFilter for WorkspaceFieldFilter {
    const FROM: &'static str = "workspace_fields AS t";
    const SEARCH: &'static [&'static str] = &["t.name", "t.key"];
    fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }
    fn push_filters(&self, stmt: &mut QueryBuilder<'static, Postgres>) {
        if let Some(workspace) = self.workspace {
            stmt.push(" AND t.workspace_id = ").push_bind(workspace);
        }
        if let Some(field_type) = self.field_type {
            stmt.push(" AND t.field_type = ").push_bind(field_type);
        }
    }
}

pub async fn workspace_fields(user_info: UserInfo, Query(filter): Query<WorkspaceFieldFilter>, Query(pagination): Query<Pagination>, manager: Manager, db: Data<PgPool>, messages: Messages) -> Result<HttpResponse, Error> {
    admin_list::<WorkspaceField, _>(user_info, filter, pagination, manager, db, messages).await
}

#[derive(Debug, Default, Deserialize)]
pub struct MembershipFilter {
    q: Option<String>,
    role: Option<WorkspaceRole>,
    workspace: Option<i32>,
}

impl AdminFilter for MembershipFilter {
    const FROM: &'static str = "workspace_memberships AS t JOIN users AS u ON u.id = t.user_id JOIN workspaces AS w ON w.id = t.workspace_id";
    const SEARCH: &'static [&'static str] = &["u.email", "w.name"];
    fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }
    fn push_filters(&self, stmt: &mut QueryBuilder<'static, Postgres>) {
        if let Some(role) = self.role {
            stmt.push(" AND t.role = ").push_bind(role);
        }
        if let Some(workspace) = self.workspace {
            stmt.push(" AND t.workspace_id = ").push_bind(workspace);
        }
    }
}

pub async fn memberships(user_info: UserInfo, Query(filter): Query<MembershipFilter>, Query(pagination): Query<Pagination>, manager: Manager, db: Data<PgPool>, messages: Messages) -> Result<HttpResponse, Error> {
    admin_list::<Membership, _>(user_info, filter, pagination, manager, db, messages).await
}

#[derive(Debug, Default, Deserialize)]
pub struct RoleChangeFilter {
    q: Option<String>,
    role: Option<Role>,
    org: Option<i32>,
}

impl AdminFilter for RoleChangeFilter {
    const FROM: &'static str = "org_role_change_logs AS t JOIN users AS u ON u.id = t.user_id";
    const SEARCH: &'static [&'static str] = &["u.email"];
    fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }
    fn push_filters(&self, stmt: &mut QueryBuilder<'static, Postgres>) {
        if let Some(role) = self.role {
            stmt.push(" AND t.new_role = ").push_bind(role);
        }
        if let Some(org) = self.org {
            stmt.push(" AND t.org_id = ").push_bind(org);
        }
    }
}

pub async fn role_changes(user_info: UserInfo, Query(filter): Query<RoleChangeFilter>, Query(pagination): Query<Pagination>, manager: Manager, db: Data<PgPool>, messages: Messages) -> Result<HttpResponse, Error> {
    admin_list::<RoleChangeLog, _>(user_info, filter, pagination, manager, db, messages).await
}

#[derive(Debug, Default, Deserialize)]
pub struct TemplateFilter {
    q: Option<String>,
    category: Option<Category>,
    is_base: Option<bool>,
    workspace: Option<i32>,
}

impl AdminFilter for TemplateFilter {
    const FROM: &'static str = "label_templates AS t";
    const SEARCH: &'static [&'static str] = &["t.name", "t.template_code"];
    fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }
    fn push_filters(&self, stmt: &mut QueryBuilder<'static, Postgres>) {
        if let Some(category) = self.category {
            stmt.push(" AND t.category = ").push_bind(category);
        }
        if let Some(is_base) = self.is_base {
            stmt.push(" AND t.is_base = ").push_bind(is_base);
        }
        if let Some(workspace) = self.workspace {
            stmt.push(" AND t.workspace_id = ").push_bind(workspace);
        }
    }
}

pub async fn templates(user_info: UserInfo, Query(filter): Query<TemplateFilter>, Query(pagination): Query<Pagination>, manager: Manager, db: Data<PgPool>, messages: Messages) -> Result<HttpResponse, Error> {
    admin_list::<LabelTemplate, _>(user_info, filter, pagination, manager, db, messages).await
}

#[derive(Debug, Default, Deserialize)]
pub struct TemplateFieldFilter {
    q: Option<String>,
    field_type: Option<FieldType>,
    template: Option<i32>,
}

impl AdminFilter for TemplateFieldFilter {
    const FROM: &'static str = "label_template_fields AS t";
    const SEARCH: &'static [&'static str] = &["t.name"];
    fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }
    fn push_filters(&self, stmt: &mut QueryBuilder<'static, Postgres>) {
        if let Some(field_type) = self.field_type {
            stmt.push(" AND t.field_type = ").push_bind(field_type);
        }
        if let Some(template) = self.template {
            stmt.push(" AND t.template_id = ").push_bind(template);
        }
    }
}

pub async fn template_fields(user_info: UserInfo, Query(filter): Query<TemplateFieldFilter>, Query(pagination): Query<Pagination>, manager: Manager, db: Data<PgPool>, messages: Messages) -> Result<HttpResponse, Error> {
    admin_list::<TemplateField, _>(user_info, filter, pagination, manager, db, messages).await
}

#[derive(Debug, Default, Deserialize)]
pub struct GlobalTemplateFilter {
    q: Option<String>,
    category: Option<Category>,
    is_active: Option<bool>,
}

impl AdminFilter for GlobalTemplateFilter {
    const FROM: &'static str = "global_templates AS t";
    const SEARCH: &'static [&'static str] = &["t.name", "t.description"];
    fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }
    fn push_filters(&self, stmt: &mut QueryBuilder<'static, Postgres>) {
        if let Some(category) = self.category {
            stmt.push(" AND t.category = ").push_bind(category);
        }
        if let Some(is_active) = self.is_active {
            stmt.push(" AND t.is_active = ").push_bind(is_active);
        }
    }
}

pub async fn global_templates(user_info: UserInfo, Query(filter): Query<GlobalTemplateFilter>, Query(pagination): Query<Pagination>, manager: Manager, db: Data<PgPool>, messages: Messages) -> Result<HttpResponse, Error> {
    admin_list::<GlobalTemplate, _>(user_info, filter, pagination, manager, db, messages).await
}

const GLOBALS_URL: &str = "/admin/global-templates/";

pub async fn create_global_template(user_info: UserInfo, Form(form): Form<LabelTemplateForm>, manager: Manager) -> Result<HttpResponse, Error> {
    let result = async {
        let spec = form.clean()?;
        let mut db = manager.acquire().await?;
        let user = current_user(&mut db, &user_info).await?;
        let global = create_global(&mut db, &user, spec).await?;
        let msg = Message::success(format!("Global template '{}' created.", global.name));
        Ok::<_, Error>(redirect_with(GLOBALS_URL, &[msg]))
    }
    .await;
    or_flash(result, GLOBALS_URL)
}

pub async fn add_global_template_field(user_info: UserInfo, global_id: Path<(i32,)>, Form(form): Form<TemplateFieldForm>, manager: Manager) -> Result<HttpResponse, Error> {
    let global_id = global_id.into_inner().0;
    let result = async {
        let spec = form.clean()?;
        let mut db = manager.acquire().await?;
        let user = current_user(&mut db, &user_info).await?;
        let field = add_global_field(&mut db, &user, global_id, spec).await?;
        let msg = Message::success(format!("Field '{}' added.", field.name));
        Ok::<_, Error>(redirect_with(GLOBALS_URL, &[msg]))
    }
    .await;
    or_flash(result, GLOBALS_URL)
}
