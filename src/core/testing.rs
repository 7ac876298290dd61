//! In-memory store backing the core workflow tests.

use chrono::Utc;

use crate::core::auth::{hash_password, random_code, random_salt};
use crate::core::models::organization::{Insert as OrgInsert, JoinRequest, Org, PendingJoinRequest, RoleChangeInsert, RoleChangeLog};
use crate::core::models::template::{FieldSpec, GlobalInsert, GlobalTemplate, Insert as TemplateInsert, LabelTemplate, TemplateField, TemplateSpec};
use crate::core::models::user::{Insert as UserInsert, Role, Status, User};
use crate::core::models::workspace::{FieldInsert, Insert as WorkspaceInsert, Layout, Member, Membership, Workspace, WorkspaceField, WorkspaceRole};
use crate::core::ports::repository::{
    Common, GlobalTemplateCommon, JoinRequestCommon, MembershipCommon, OrgCommon, RoleChangeLogCommon, Store, TemplateCommon, TxStore, UserCommon, WorkspaceCommon,
    WorkspaceFieldCommon,
};
use crate::error::Error;

#[derive(Debug, Default, Clone)]
pub struct MemStore {
    next_id: i32,
    pub orgs: Vec<Org>,
    pub users: Vec<User>,
    pub join_requests: Vec<JoinRequest>,
    pub role_changes: Vec<RoleChangeLog>,
    pub workspaces: Vec<Workspace>,
    pub workspace_fields: Vec<WorkspaceField>,
    pub memberships: Vec<Membership>,
    pub templates: Vec<LabelTemplate>,
    pub template_fields: Vec<TemplateField>,
    pub globals: Vec<GlobalTemplate>,
    pub global_fields: Vec<TemplateField>,
}

impl MemStore {
    fn id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn seed_org(&mut self, name: &str, domain: Option<&str>) -> i32 {
        let id = self.id();
        self.orgs.push(Org {
            id,
            name: name.to_owned(),
            domain: domain.map(str::to_owned),
            org_code: random_code("ORG"),
            created_at: Utc::now(),
        });
        id
    }

    fn seed(&mut self, email: &str, password: &str, org_id: Option<i32>, role: Role, status: Status, is_staff: bool) -> i32 {
        let id = self.id();
        let salt = random_salt();
        self.users.push(User {
            id,
            email: email.to_owned(),
            password: hash_password(password, &salt),
            salt,
            org_id,
            role,
            status,
            user_code: random_code("USR"),
            is_staff,
            is_superuser: false,
            date_joined: Utc::now(),
            last_login: None,
        });
        id
    }

    /// An operator with the given password.
    pub fn seed_user(&mut self, email: &str, password: &str, org_id: Option<i32>, status: Status) -> i32 {
        self.seed(email, password, org_id, Role::Operator, status, false)
    }

    /// An active org admin whose password is `pw`.
    pub fn seed_admin(&mut self, email: &str, org_id: i32) -> i32 {
        self.seed(email, "pw", Some(org_id), Role::Admin, Status::Active, false)
    }

    pub fn seed_staff(&mut self, email: &str) -> i32 {
        self.seed(email, "pw", None, Role::Operator, Status::Active, true)
    }

    pub fn seed_join_request(&mut self, org_id: i32, user_id: i32) -> i32 {
        let id = self.id();
        self.join_requests.push(JoinRequest {
            id,
            org_id,
            user_id,
            is_approved: false,
            created_at: Utc::now(),
        });
        id
    }

    pub fn user(&self, id: i32) -> User {
        self.users.iter().find(|u| u.id == id).cloned().expect("seeded user")
    }

    fn user_mut(&mut self, id: i32) -> Result<&mut User, Error> {
        self.users.iter_mut().find(|u| u.id == id).ok_or(Error::NotFound)
    }
}

impl OrgCommon for MemStore {
    async fn insert(&mut self, data: OrgInsert) -> Result<Org, Error> {
        let id = self.id();
        let org = Org {
            id,
            name: data.name,
            domain: data.domain,
            org_code: data.org_code,
            created_at: Utc::now(),
        };
        self.orgs.push(org.clone());
        Ok(org)
    }

    async fn get(&mut self, id: i32) -> Result<Org, Error> {
        self.orgs.iter().find(|o| o.id == id).cloned().ok_or(Error::NotFound)
    }

    async fn get_by_domain(&mut self, domain: &str) -> Result<Option<Org>, Error> {
        Ok(self.orgs.iter().find(|o| o.domain.as_deref() == Some(domain)).cloned())
    }

    async fn get_or_create_by_domain(&mut self, data: OrgInsert) -> Result<(Org, bool), Error> {
        if let Some(org) = self.orgs.iter().find(|o| o.domain.is_some() && o.domain == data.domain) {
            return Ok((org.clone(), false));
        }
        let org = OrgCommon::insert(self, data).await?;
        Ok((org, true))
    }

    async fn update_name(&mut self, id: i32, name: &str) -> Result<(), Error> {
        let org = self.orgs.iter_mut().find(|o| o.id == id).ok_or(Error::NotFound)?;
        org.name = name.to_owned();
        Ok(())
    }
}

impl UserCommon for MemStore {
    async fn insert(&mut self, data: UserInsert) -> Result<User, Error> {
        let id = self.id();
        let user = User {
            id,
            email: data.email,
            password: data.password,
            salt: data.salt,
            org_id: data.org_id,
            role: data.role,
            status: data.status,
            user_code: data.user_code,
            is_staff: false,
            is_superuser: false,
            date_joined: Utc::now(),
            last_login: None,
        };
        self.users.push(user.clone());
        Ok(user)
    }

    async fn get(&mut self, id: i32) -> Result<User, Error> {
        Ok(self.user_mut(id)?.clone())
    }

    async fn get_by_email(&mut self, email: &str) -> Result<Option<User>, Error> {
        Ok(self.users.iter().find(|u| u.email == email).cloned())
    }

    async fn email_exists(&mut self, email: &str) -> Result<bool, Error> {
        Ok(self.users.iter().any(|u| u.email == email))
    }

    async fn set_status(&mut self, id: i32, status: Status) -> Result<(), Error> {
        self.user_mut(id)?.status = status;
        Ok(())
    }

    async fn set_role(&mut self, id: i32, role: Role) -> Result<(), Error> {
        self.user_mut(id)?.role = role;
        Ok(())
    }

    async fn touch_last_login(&mut self, id: i32) -> Result<(), Error> {
        self.user_mut(id)?.last_login = Some(Utc::now());
        Ok(())
    }

    async fn org_admins(&mut self, org_id: i32) -> Result<Vec<User>, Error> {
        Ok(self
            .users
            .iter()
            .filter(|u| u.org_id == Some(org_id) && u.role == Role::Admin && u.status == Status::Active)
            .cloned()
            .collect())
    }
}

impl JoinRequestCommon for MemStore {
    async fn insert(&mut self, org_id: i32, user_id: i32) -> Result<JoinRequest, Error> {
        let id = self.seed_join_request(org_id, user_id);
        self.join_requests.iter().find(|r| r.id == id).cloned().ok_or(Error::NotFound)
    }

    async fn pending(&mut self, org_id: i32) -> Result<Vec<PendingJoinRequest>, Error> {
        let mut list = Vec::new();
        for r in self.join_requests.iter().filter(|r| r.org_id == org_id && !r.is_approved) {
            if let Some(u) = self.users.iter().find(|u| u.id == r.user_id && u.status == Status::Pending) {
                list.push(PendingJoinRequest {
                    id: r.id,
                    user_id: u.id,
                    email: u.email.clone(),
                    user_code: u.user_code.clone(),
                    created_at: r.created_at,
                });
            }
        }
        Ok(list)
    }

    async fn get_unapproved_for_update(&mut self, id: i32, org_id: i32) -> Result<Option<JoinRequest>, Error> {
        Ok(self.join_requests.iter().find(|r| r.id == id && r.org_id == org_id && !r.is_approved).cloned())
    }

    async fn approve(&mut self, id: i32) -> Result<(), Error> {
        let r = self.join_requests.iter_mut().find(|r| r.id == id).ok_or(Error::NotFound)?;
        r.is_approved = true;
        Ok(())
    }
}

impl RoleChangeLogCommon for MemStore {
    async fn insert(&mut self, data: RoleChangeInsert) -> Result<i32, Error> {
        let id = self.id();
        self.role_changes.push(RoleChangeLog {
            id,
            org_id: data.org_id,
            user_id: data.user_id,
            previous_role: data.previous_role,
            new_role: data.new_role,
            changed_by: Some(data.changed_by),
            changed_at: Utc::now(),
        });
        Ok(id)
    }
}

impl WorkspaceCommon for MemStore {
    async fn insert(&mut self, data: WorkspaceInsert) -> Result<Workspace, Error> {
        let id = self.id();
        let ws = Workspace {
            id,
            org_id: data.org_id,
            name: data.name,
            description: data.description,
            workspace_code: data.workspace_code,
            created_by: Some(data.created_by),
            created_at: Utc::now(),
        };
        self.workspaces.push(ws.clone());
        Ok(ws)
    }

    async fn get(&mut self, id: i32) -> Result<Option<Workspace>, Error> {
        Ok(self.workspaces.iter().find(|w| w.id == id).cloned())
    }

    async fn list_for_org(&mut self, org_id: i32) -> Result<Vec<Workspace>, Error> {
        Ok(self.workspaces.iter().filter(|w| w.org_id == org_id).cloned().collect())
    }

    async fn list_for_member(&mut self, user_id: i32) -> Result<Vec<Workspace>, Error> {
        let ids: Vec<i32> = self.memberships.iter().filter(|m| m.user_id == user_id).map(|m| m.workspace_id).collect();
        Ok(self.workspaces.iter().filter(|w| ids.contains(&w.id)).cloned().collect())
    }
}

impl WorkspaceFieldCommon for MemStore {
    async fn insert(&mut self, data: FieldInsert) -> Result<WorkspaceField, Error> {
        let id = self.id();
        let field = WorkspaceField {
            id,
            workspace_id: data.workspace_id,
            name: data.name,
            field_type: data.field_type,
            key: data.key,
            x: data.layout.x,
            y: data.layout.y,
            width: data.layout.width,
            height: data.layout.height,
        };
        self.workspace_fields.push(field.clone());
        Ok(field)
    }

    async fn list(&mut self, workspace_id: i32) -> Result<Vec<WorkspaceField>, Error> {
        Ok(self.workspace_fields.iter().filter(|f| f.workspace_id == workspace_id).cloned().collect())
    }

    async fn update_layout(&mut self, workspace_id: i32, id: i32, layout: Layout) -> Result<bool, Error> {
        match self.workspace_fields.iter_mut().find(|f| f.id == id && f.workspace_id == workspace_id) {
            Some(f) => {
                f.x = layout.x;
                f.y = layout.y;
                f.width = layout.width;
                f.height = layout.height;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&mut self, workspace_id: i32, id: i32) -> Result<bool, Error> {
        let before = self.workspace_fields.len();
        self.workspace_fields.retain(|f| !(f.id == id && f.workspace_id == workspace_id));
        Ok(self.workspace_fields.len() < before)
    }
}

impl MembershipCommon for MemStore {
    async fn get(&mut self, workspace_id: i32, user_id: i32) -> Result<Option<Membership>, Error> {
        Ok(self.memberships.iter().find(|m| m.workspace_id == workspace_id && m.user_id == user_id).cloned())
    }

    async fn upsert(&mut self, workspace_id: i32, user_id: i32, role: WorkspaceRole) -> Result<Membership, Error> {
        if let Some(m) = self.memberships.iter_mut().find(|m| m.workspace_id == workspace_id && m.user_id == user_id) {
            m.role = role;
            m.updated_at = Utc::now();
            return Ok(m.clone());
        }
        let id = self.id();
        let now = Utc::now();
        let m = Membership {
            id,
            workspace_id,
            user_id,
            role,
            created_at: now,
            updated_at: now,
        };
        self.memberships.push(m.clone());
        Ok(m)
    }

    async fn delete(&mut self, workspace_id: i32, user_id: i32) -> Result<bool, Error> {
        let before = self.memberships.len();
        self.memberships.retain(|m| !(m.workspace_id == workspace_id && m.user_id == user_id));
        Ok(self.memberships.len() < before)
    }

    async fn list(&mut self, workspace_id: i32) -> Result<Vec<Member>, Error> {
        let mut list = Vec::new();
        for m in self.memberships.iter().filter(|m| m.workspace_id == workspace_id) {
            if let Some(u) = self.users.iter().find(|u| u.id == m.user_id) {
                list.push(Member {
                    user_id: u.id,
                    email: u.email.clone(),
                    role: m.role,
                    created_at: m.created_at,
                });
            }
        }
        Ok(list)
    }
}

fn field_of(id: i32, template_id: i32, spec: &FieldSpec) -> TemplateField {
    TemplateField {
        id,
        template_id,
        name: spec.name.clone(),
        field_type: spec.field_type,
        order: spec.order,
        x: spec.layout.x,
        y: spec.layout.y,
        width: spec.layout.width,
        height: spec.layout.height,
    }
}

fn sorted(mut fields: Vec<TemplateField>) -> Vec<TemplateField> {
    fields.sort_by_key(|f| (f.order, f.id));
    fields
}

impl TemplateCommon for MemStore {
    async fn insert(&mut self, data: TemplateInsert) -> Result<LabelTemplate, Error> {
        let id = self.id();
        let spec = data.spec;
        let t = LabelTemplate {
            id,
            workspace_id: data.workspace_id,
            name: spec.name,
            description: spec.description,
            width_cm: spec.width_cm,
            height_cm: spec.height_cm,
            dpi: spec.dpi,
            category: spec.category,
            custom_category: spec.custom_category,
            template_code: data.template_code,
            is_base: data.is_base,
            created_by: Some(data.created_by),
            created_at: Utc::now(),
        };
        self.templates.push(t.clone());
        Ok(t)
    }

    async fn get(&mut self, id: i32) -> Result<Option<LabelTemplate>, Error> {
        Ok(self.templates.iter().find(|t| t.id == id).cloned())
    }

    async fn list(&mut self, workspace_id: i32) -> Result<Vec<LabelTemplate>, Error> {
        Ok(self.templates.iter().filter(|t| t.workspace_id == workspace_id).cloned().collect())
    }

    async fn update(&mut self, id: i32, spec: &TemplateSpec) -> Result<(), Error> {
        let t = self.templates.iter_mut().find(|t| t.id == id).ok_or(Error::NotFound)?;
        t.name = spec.name.clone();
        t.description = spec.description.clone();
        t.width_cm = spec.width_cm;
        t.height_cm = spec.height_cm;
        t.dpi = spec.dpi;
        t.category = spec.category;
        t.custom_category = spec.custom_category.clone();
        Ok(())
    }

    async fn delete(&mut self, id: i32) -> Result<(), Error> {
        self.templates.retain(|t| t.id != id);
        self.template_fields.retain(|f| f.template_id != id);
        Ok(())
    }

    async fn insert_field(&mut self, template_id: i32, spec: &FieldSpec) -> Result<TemplateField, Error> {
        let id = self.id();
        let field = field_of(id, template_id, spec);
        self.template_fields.push(field.clone());
        Ok(field)
    }

    async fn fields(&mut self, template_id: i32) -> Result<Vec<TemplateField>, Error> {
        Ok(sorted(self.template_fields.iter().filter(|f| f.template_id == template_id).cloned().collect()))
    }

    async fn delete_field(&mut self, template_id: i32, id: i32) -> Result<bool, Error> {
        let before = self.template_fields.len();
        self.template_fields.retain(|f| !(f.id == id && f.template_id == template_id));
        Ok(self.template_fields.len() < before)
    }
}

impl GlobalTemplateCommon for MemStore {
    async fn insert(&mut self, data: GlobalInsert) -> Result<GlobalTemplate, Error> {
        let id = self.id();
        let spec = data.spec;
        let g = GlobalTemplate {
            id,
            name: spec.name,
            description: spec.description,
            width_cm: spec.width_cm,
            height_cm: spec.height_cm,
            dpi: spec.dpi,
            category: spec.category,
            custom_category: spec.custom_category,
            is_active: true,
            created_by: Some(data.created_by),
            created_at: Utc::now(),
        };
        self.globals.push(g.clone());
        Ok(g)
    }

    async fn get(&mut self, id: i32) -> Result<Option<GlobalTemplate>, Error> {
        Ok(self.globals.iter().find(|g| g.id == id).cloned())
    }

    async fn list_active(&mut self) -> Result<Vec<GlobalTemplate>, Error> {
        Ok(self.globals.iter().filter(|g| g.is_active).cloned().collect())
    }

    async fn insert_field(&mut self, template_id: i32, spec: &FieldSpec) -> Result<TemplateField, Error> {
        let id = self.id();
        let field = field_of(id, template_id, spec);
        self.global_fields.push(field.clone());
        Ok(field)
    }

    async fn fields(&mut self, template_id: i32) -> Result<Vec<TemplateField>, Error> {
        Ok(sorted(self.global_fields.iter().filter(|f| f.template_id == template_id).cloned().collect()))
    }
}

impl Common for MemStore {}

impl Store for MemStore {}

impl TxStore for MemStore {
    async fn commit(self) -> Result<(), Error> {
        Ok(())
    }

    async fn rollback(self) -> Result<(), Error> {
        Ok(())
    }
}
