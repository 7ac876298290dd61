use crate::core::models::{
    organization::{Insert as OrgInsert, JoinRequest, Org, PendingJoinRequest, RoleChangeInsert},
    template::{FieldSpec, GlobalInsert, GlobalTemplate, Insert as TemplateInsert, LabelTemplate, TemplateField, TemplateSpec},
    user::{Insert as UserInsert, Role, Status, User},
    workspace::{FieldInsert, Insert as WorkspaceInsert, Layout, Member, Membership, Workspace, WorkspaceField, WorkspaceRole},
};
use crate::error::Error;

pub trait OrgCommon {
    async fn insert(&mut self, data: OrgInsert) -> Result<Org, Error>;
    async fn get(&mut self, id: i32) -> Result<Org, Error>;
    async fn get_by_domain(&mut self, domain: &str) -> Result<Option<Org>, Error>;
    /// Inserts unless an org already owns `data.domain`; the flag tells
    /// whether a row was created.
    async fn get_or_create_by_domain(&mut self, data: OrgInsert) -> Result<(Org, bool), Error>;
    async fn update_name(&mut self, id: i32, name: &str) -> Result<(), Error>;
}

pub trait UserCommon {
    async fn insert(&mut self, data: UserInsert) -> Result<User, Error>;
    async fn get(&mut self, id: i32) -> Result<User, Error>;
    async fn get_by_email(&mut self, email: &str) -> Result<Option<User>, Error>;
    async fn email_exists(&mut self, email: &str) -> Result<bool, Error>;
    async fn set_status(&mut self, id: i32, status: Status) -> Result<(), Error>;
    async fn set_role(&mut self, id: i32, role: Role) -> Result<(), Error>;
    async fn touch_last_login(&mut self, id: i32) -> Result<(), Error>;
    async fn org_admins(&mut self, org_id: i32) -> Result<Vec<User>, Error>;
}

pub trait JoinRequestCommon {
    async fn insert(&mut self, org_id: i32, user_id: i32) -> Result<JoinRequest, Error>;
    /// Unapproved requests of `org_id` whose user is still pending.
    async fn pending(&mut self, org_id: i32) -> Result<Vec<PendingJoinRequest>, Error>;
    /// Locks the row until the surrounding transaction ends.
    async fn get_unapproved_for_update(&mut self, id: i32, org_id: i32) -> Result<Option<JoinRequest>, Error>;
    async fn approve(&mut self, id: i32) -> Result<(), Error>;
}

pub trait RoleChangeLogCommon {
    async fn insert(&mut self, data: RoleChangeInsert) -> Result<i32, Error>;
}

pub trait WorkspaceCommon {
    async fn insert(&mut self, data: WorkspaceInsert) -> Result<Workspace, Error>;
    async fn get(&mut self, id: i32) -> Result<Option<Workspace>, Error>;
    async fn list_for_org(&mut self, org_id: i32) -> Result<Vec<Workspace>, Error>;
    async fn list_for_member(&mut self, user_id: i32) -> Result<Vec<Workspace>, Error>;
}

pub trait WorkspaceFieldCommon {
    async fn insert(&mut self, data: FieldInsert) -> Result<WorkspaceField, Error>;
    async fn list(&mut self, workspace_id: i32) -> Result<Vec<WorkspaceField>, Error>;
    async fn update_layout(&mut self, workspace_id: i32, id: i32, layout: Layout) -> Result<bool, Error>;
    async fn delete(&mut self, workspace_id: i32, id: i32) -> Result<bool, Error>;
}

pub trait MembershipCommon {
    async fn get(&mut self, workspace_id: i32, user_id: i32) -> Result<Option<Membership>, Error>;
    async fn upsert(&mut self, workspace_id: i32, user_id: i32, role: WorkspaceRole) -> Result<Membership, Error>;
    async fn delete(&mut self, workspace_id: i32, user_id: i32) -> Result<bool, Error>;
    async fn list(&mut self, workspace_id: i32) -> Result<Vec<Member>, Error>;
}

pub trait TemplateCommon {
    async fn insert(&mut self, data: TemplateInsert) -> Result<LabelTemplate, Error>;
    async fn get(&mut self, id: i32) -> Result<Option<LabelTemplate>, Error>;
    async fn list(&mut self, workspace_id: i32) -> Result<Vec<LabelTemplate>, Error>;
    async fn update(&mut self, id: i32, spec: &TemplateSpec) -> Result<(), Error>;
    async fn delete(&mut self, id: i32) -> Result<(), Error>;
    async fn insert_field(&mut self, template_id: i32, spec: &FieldSpec) -> Result<TemplateField, Error>;
    async fn fields(&mut self, template_id: i32) -> Result<Vec<TemplateField>, Error>;
    async fn delete_field(&mut self, template_id: i32, id: i32) -> Result<bool, Error>;
}

pub trait GlobalTemplateCommon {
    async fn insert(&mut self, data: GlobalInsert) -> Result<GlobalTemplate, Error>;
    async fn get(&mut self, id: i32) -> Result<Option<GlobalTemplate>, Error>;
    async fn list_active(&mut self) -> Result<Vec<GlobalTemplate>, Error>;
    async fn insert_field(&mut self, template_id: i32, spec: &FieldSpec) -> Result<TemplateField, Error>;
    async fn fields(&mut self, template_id: i32) -> Result<Vec<TemplateField>, Error>;
}

pub trait Common:
    OrgCommon + UserCommon + JoinRequestCommon + RoleChangeLogCommon + WorkspaceCommon + WorkspaceFieldCommon + MembershipCommon + TemplateCommon + GlobalTemplateCommon
{
}

pub trait Store: Common {}

pub trait TxStore: Store {
    async fn commit(self) -> Result<(), Error>;
    async fn rollback(self) -> Result<(), Error>;
}
