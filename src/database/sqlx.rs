use sqlx::pool::PoolConnection;
use sqlx::{query, query_as, query_scalar, Executor, PgPool, Postgres, Transaction};

use crate::core::models::{
    organization::{Insert as OrgInsert, JoinRequest, Org, PendingJoinRequest, RoleChangeInsert},
    template::{FieldSpec, GlobalInsert, GlobalTemplate, Insert as TemplateInsert, LabelTemplate, TemplateField, TemplateSpec},
    user::{Insert as UserInsert, Role, Status, User},
    workspace::{FieldInsert, Insert as WorkspaceInsert, Layout, Member, Membership, Workspace, WorkspaceField, WorkspaceRole},
};
use crate::core::ports::repository::{
    Common, GlobalTemplateCommon, JoinRequestCommon, MembershipCommon, OrgCommon, RoleChangeLogCommon, Store, TemplateCommon, TxStore, UserCommon, WorkspaceCommon,
    WorkspaceFieldCommon,
};
use crate::error::Error;

pub struct PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e>,
{
    executor: E,
}

impl<E> PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

#[derive(Clone)]
pub struct PgSqlxManager {
    pool: PgPool,
}

impl PgSqlxManager {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn begin(&self) -> Result<PgSqlx<Transaction<'static, Postgres>>, Error> {
        let tx = self.pool.begin().await?;
        Ok(PgSqlx { executor: tx })
    }

    pub async fn acquire(&self) -> Result<PgSqlx<PoolConnection<Postgres>>, Error> {
        let conn = self.pool.acquire().await?;
        Ok(PgSqlx { executor: conn })
    }
}

impl<E> OrgCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: OrgInsert) -> Result<Org, Error> {
        let org = query_as("INSERT INTO orgs (name, domain, org_code) VALUES ($1, $2, $3) RETURNING *")
            .bind(data.name)
            .bind(data.domain)
            .bind(data.org_code)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(org)
    }

    async fn get(&mut self, id: i32) -> Result<Org, Error> {
        let org = query_as("SELECT * FROM orgs WHERE id = $1").bind(id).fetch_one(&mut self.executor).await?;
        Ok(org)
    }

    async fn get_by_domain(&mut self, domain: &str) -> Result<Option<Org>, Error> {
        let org = query_as("SELECT * FROM orgs WHERE domain = $1")
            .bind(domain)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(org)
    }

    async fn get_or_create_by_domain(&mut self, data: OrgInsert) -> Result<(Org, bool), Error> {
        let created: Option<Org> = query_as(
            "INSERT INTO orgs (name, domain, org_code) VALUES ($1, $2, $3)
            ON CONFLICT (domain) DO NOTHING
            RETURNING *",
        )
        .bind(&data.name)
        .bind(&data.domain)
        .bind(&data.org_code)
        .fetch_optional(&mut self.executor)
        .await?;
        if let Some(org) = created {
            return Ok((org, true));
        }
        let org = query_as("SELECT * FROM orgs WHERE domain = $1")
            .bind(&data.domain)
            .fetch_one(&mut self.executor)
            .await?;
        Ok((org, false))
    }

    async fn update_name(&mut self, id: i32, name: &str) -> Result<(), Error> {
        query("UPDATE orgs SET name = $1 WHERE id = $2").bind(name).bind(id).execute(&mut self.executor).await?;
        Ok(())
    }
}

impl<E> UserCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: UserInsert) -> Result<User, Error> {
        let user = query_as(
            "INSERT INTO users (email, password, salt, org_id, role, status, user_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *",
        )
        .bind(data.email)
        .bind(data.password)
        .bind(data.salt)
        .bind(data.org_id)
        .bind(data.role)
        .bind(data.status)
        .bind(data.user_code)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(user)
    }

    async fn get(&mut self, id: i32) -> Result<User, Error> {
        let user = query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_one(&mut self.executor).await?;
        Ok(user)
    }

    async fn get_by_email(&mut self, email: &str) -> Result<Option<User>, Error> {
        let user = query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(user)
    }

    async fn email_exists(&mut self, email: &str) -> Result<bool, Error> {
        let exists = query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(exists)
    }

    async fn set_status(&mut self, id: i32, status: Status) -> Result<(), Error> {
        query("UPDATE users SET status = $1 WHERE id = $2").bind(status).bind(id).execute(&mut self.executor).await?;
        Ok(())
    }

    async fn set_role(&mut self, id: i32, role: Role) -> Result<(), Error> {
        query("UPDATE users SET role = $1 WHERE id = $2").bind(role).bind(id).execute(&mut self.executor).await?;
        Ok(())
    }

    async fn touch_last_login(&mut self, id: i32) -> Result<(), Error> {
        query("UPDATE users SET last_login = NOW() WHERE id = $1").bind(id).execute(&mut self.executor).await?;
        Ok(())
    }

    async fn org_admins(&mut self, org_id: i32) -> Result<Vec<User>, Error> {
        let admins = query_as("SELECT * FROM users WHERE org_id = $1 AND role = $2 AND status = $3 ORDER BY id")
            .bind(org_id)
            .bind(Role::Admin)
            .bind(Status::Active)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(admins)
    }
}

impl<E> JoinRequestCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, org_id: i32, user_id: i32) -> Result<JoinRequest, Error> {
        let request = query_as("INSERT INTO org_join_requests (org_id, user_id) VALUES ($1, $2) RETURNING *")
            .bind(org_id)
            .bind(user_id)
            .fetch_one(&mut self.executor)
            .await?;
        Ok(request)
    }

    async fn pending(&mut self, org_id: i32) -> Result<Vec<PendingJoinRequest>, Error> {
        let requests = query_as(
            "
        SELECT r.id, r.user_id, u.email, u.user_code, r.created_at
        FROM org_join_requests AS r
        JOIN users AS u ON r.user_id = u.id
        WHERE r.org_id = $1
            AND NOT r.is_approved
            AND u.status = $2
        ORDER BY r.created_at",
        )
        .bind(org_id)
        .bind(Status::Pending)
        .fetch_all(&mut self.executor)
        .await?;
        Ok(requests)
    }

    async fn get_unapproved_for_update(&mut self, id: i32, org_id: i32) -> Result<Option<JoinRequest>, Error> {
        let request = query_as("SELECT * FROM org_join_requests WHERE id = $1 AND org_id = $2 AND NOT is_approved FOR UPDATE")
            .bind(id)
            .bind(org_id)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(request)
    }

    async fn approve(&mut self, id: i32) -> Result<(), Error> {
        query("UPDATE org_join_requests SET is_approved = TRUE WHERE id = $1")
            .bind(id)
            .execute(&mut self.executor)
            .await?;
        Ok(())
    }
}

impl<E> RoleChangeLogCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: RoleChangeInsert) -> Result<i32, Error> {
        let id = query_scalar(
            "INSERT INTO org_role_change_logs (org_id, user_id, previous_role, new_role, changed_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id",
        )
        .bind(data.org_id)
        .bind(data.user_id)
        .bind(data.previous_role)
        .bind(data.new_role)
        .bind(data.changed_by)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(id)
    }
}

impl<E> WorkspaceCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: WorkspaceInsert) -> Result<Workspace, Error> {
        let ws = query_as(
            "INSERT INTO workspaces (org_id, name, description, workspace_code, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *",
        )
        .bind(data.org_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.workspace_code)
        .bind(data.created_by)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(ws)
    }

    async fn get(&mut self, id: i32) -> Result<Option<Workspace>, Error> {
        let ws = query_as("SELECT * FROM workspaces WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(ws)
    }

    async fn list_for_org(&mut self, org_id: i32) -> Result<Vec<Workspace>, Error> {
        let list = query_as("SELECT * FROM workspaces WHERE org_id = $1 ORDER BY name, id")
            .bind(org_id)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(list)
    }

    async fn list_for_member(&mut self, user_id: i32) -> Result<Vec<Workspace>, Error> {
        let list = query_as(
            "
        SELECT w.*
        FROM workspaces AS w
        JOIN workspace_memberships AS m ON w.id = m.workspace_id
        WHERE m.user_id = $1
        ORDER BY w.name, w.id",
        )
        .bind(user_id)
        .fetch_all(&mut self.executor)
        .await?;
        Ok(list)
    }
}

impl<E> WorkspaceFieldCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: FieldInsert) -> Result<WorkspaceField, Error> {
        let field = query_as(
            "INSERT INTO workspace_fields (workspace_id, name, field_type, key, x, y, width, height)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *",
        )
        .bind(data.workspace_id)
        .bind(data.name)
        .bind(data.field_type)
        .bind(data.key)
        .bind(data.layout.x)
        .bind(data.layout.y)
        .bind(data.layout.width)
        .bind(data.layout.height)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(field)
    }

    async fn list(&mut self, workspace_id: i32) -> Result<Vec<WorkspaceField>, Error> {
        let list = query_as("SELECT * FROM workspace_fields WHERE workspace_id = $1 ORDER BY id")
            .bind(workspace_id)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(list)
    }

    async fn update_layout(&mut self, workspace_id: i32, id: i32, layout: Layout) -> Result<bool, Error> {
        let res = query("UPDATE workspace_fields SET x = $1, y = $2, width = $3, height = $4 WHERE id = $5 AND workspace_id = $6")
            .bind(layout.x)
            .bind(layout.y)
            .bind(layout.width)
            .bind(layout.height)
            .bind(id)
            .bind(workspace_id)
            .execute(&mut self.executor)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete(&mut self, workspace_id: i32, id: i32) -> Result<bool, Error> {
        let res = query("DELETE FROM workspace_fields WHERE id = $1 AND workspace_id = $2")
            .bind(id)
            .bind(workspace_id)
            .execute(&mut self.executor)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

impl<E> MembershipCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn get(&mut self, workspace_id: i32, user_id: i32) -> Result<Option<Membership>, Error> {
        let m = query_as("SELECT * FROM workspace_memberships WHERE workspace_id = $1 AND user_id = $2")
            .bind(workspace_id)
            .bind(user_id)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(m)
    }

    async fn upsert(&mut self, workspace_id: i32, user_id: i32, role: WorkspaceRole) -> Result<Membership, Error> {
        let m = query_as(
            "INSERT INTO workspace_memberships (workspace_id, user_id, role) VALUES ($1, $2, $3)
            ON CONFLICT (workspace_id, user_id) DO UPDATE SET role = EXCLUDED.role, updated_at = NOW()
            RETURNING *",
        )
        .bind(workspace_id)
        .bind(user_id)
        .bind(role)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(m)
    }

    async fn delete(&mut self, workspace_id: i32, user_id: i32) -> Result<bool, Error> {
        let res = query("DELETE FROM workspace_memberships WHERE workspace_id = $1 AND user_id = $2")
            .bind(workspace_id)
            .bind(user_id)
            .execute(&mut self.executor)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list(&mut self, workspace_id: i32) -> Result<Vec<Member>, Error> {
        let list = query_as(
            "
        SELECT m.user_id, u.email, m.role, m.created_at
        FROM workspace_memberships AS m
        JOIN users AS u ON m.user_id = u.id
        WHERE m.workspace_id = $1
        ORDER BY m.created_at, m.id",
        )
        .bind(workspace_id)
        .fetch_all(&mut self.executor)
        .await?;
        Ok(list)
    }
}

impl<E> TemplateCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: TemplateInsert) -> Result<LabelTemplate, Error> {
        let spec = data.spec;
        let t = query_as(
            "INSERT INTO label_templates
                (workspace_id, name, description, width_cm, height_cm, dpi, category, custom_category, template_code, is_base, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *",
        )
        .bind(data.workspace_id)
        .bind(spec.name)
        .bind(spec.description)
        .bind(spec.width_cm)
        .bind(spec.height_cm)
        .bind(spec.dpi)
        .bind(spec.category)
        .bind(spec.custom_category)
        .bind(data.template_code)
        .bind(data.is_base)
        .bind(data.created_by)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(t)
    }

    async fn get(&mut self, id: i32) -> Result<Option<LabelTemplate>, Error> {
        let t = query_as("SELECT * FROM label_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(t)
    }

    async fn list(&mut self, workspace_id: i32) -> Result<Vec<LabelTemplate>, Error> {
        let list = query_as("SELECT * FROM label_templates WHERE workspace_id = $1 ORDER BY created_at DESC, id DESC")
            .bind(workspace_id)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(list)
    }

    async fn update(&mut self, id: i32, spec: &TemplateSpec) -> Result<(), Error> {
        query(
            "UPDATE label_templates
            SET name = $1, description = $2, width_cm = $3, height_cm = $4, dpi = $5, category = $6, custom_category = $7
            WHERE id = $8",
        )
        .bind(&spec.name)
        .bind(&spec.description)
        .bind(spec.width_cm)
        .bind(spec.height_cm)
        .bind(spec.dpi)
        .bind(spec.category)
        .bind(&spec.custom_category)
        .bind(id)
        .execute(&mut self.executor)
        .await?;
        Ok(())
    }

    async fn delete(&mut self, id: i32) -> Result<(), Error> {
        query("DELETE FROM label_templates WHERE id = $1").bind(id).execute(&mut self.executor).await?;
        Ok(())
    }

    async fn insert_field(&mut self, template_id: i32, spec: &FieldSpec) -> Result<TemplateField, Error> {
        let field = query_as(
            r#"INSERT INTO label_template_fields (template_id, name, field_type, "order", x, y, width, height)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *"#,
        )
        .bind(template_id)
        .bind(&spec.name)
        .bind(spec.field_type)
        .bind(spec.order)
        .bind(spec.layout.x)
        .bind(spec.layout.y)
        .bind(spec.layout.width)
        .bind(spec.layout.height)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(field)
    }

    async fn fields(&mut self, template_id: i32) -> Result<Vec<TemplateField>, Error> {
        let list = query_as(r#"SELECT * FROM label_template_fields WHERE template_id = $1 ORDER BY "order", id"#)
            .bind(template_id)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(list)
    }

    async fn delete_field(&mut self, template_id: i32, id: i32) -> Result<bool, Error> {
        let res = query("DELETE FROM label_template_fields WHERE id = $1 AND template_id = $2")
            .bind(id)
            .bind(template_id)
            .execute(&mut self.executor)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}

impl<E> GlobalTemplateCommon for PgSqlx<E>
where
    for<'e> &'e mut E: Executor<'e, Database = Postgres>,
{
    async fn insert(&mut self, data: GlobalInsert) -> Result<GlobalTemplate, Error> {
        let spec = data.spec;
        let g = query_as(
            "INSERT INTO global_templates (name, description, width_cm, height_cm, dpi, category, custom_category, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *",
        )
        .bind(spec.name)
        .bind(spec.description)
        .bind(spec.width_cm)
        .bind(spec.height_cm)
        .bind(spec.dpi)
        .bind(spec.category)
        .bind(spec.custom_category)
        .bind(data.created_by)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(g)
    }

    async fn get(&mut self, id: i32) -> Result<Option<GlobalTemplate>, Error> {
        let g = query_as("SELECT * FROM global_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut self.executor)
            .await?;
        Ok(g)
    }

    async fn list_active(&mut self) -> Result<Vec<GlobalTemplate>, Error> {
        let list = query_as("SELECT * FROM global_templates WHERE is_active ORDER BY category, name")
            .fetch_all(&mut self.executor)
            .await?;
        Ok(list)
    }

    async fn insert_field(&mut self, template_id: i32, spec: &FieldSpec) -> Result<TemplateField, Error> {
        let field = query_as(
            r#"INSERT INTO global_template_fields (template_id, name, field_type, "order", x, y, width, height)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *"#,
        )
        .bind(template_id)
        .bind(&spec.name)
        .bind(spec.field_type)
        .bind(spec.order)
        .bind(spec.layout.x)
        .bind(spec.layout.y)
        .bind(spec.layout.width)
        .bind(spec.layout.height)
        .fetch_one(&mut self.executor)
        .await?;
        Ok(field)
    }

    async fn fields(&mut self, template_id: i32) -> Result<Vec<TemplateField>, Error> {
        let list = query_as(r#"SELECT * FROM global_template_fields WHERE template_id = $1 ORDER BY "order", id"#)
            .bind(template_id)
            .fetch_all(&mut self.executor)
            .await?;
        Ok(list)
    }
}

impl Store for PgSqlx<PoolConnection<Postgres>> {}
impl<'a> Store for PgSqlx<Transaction<'a, Postgres>> {}
impl Common for PgSqlx<PoolConnection<Postgres>> {}
impl<'a> Common for PgSqlx<Transaction<'a, Postgres>> {}

impl<'a> TxStore for PgSqlx<Transaction<'a, Postgres>> {
    async fn commit(self) -> Result<(), Error> {
        self.executor.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        self.executor.rollback().await?;
        Ok(())
    }
}
