use log::info;
use serde::Serialize;

use crate::core::auth::random_code;
use crate::core::label_codes::{barcode_png, qr_png};
use crate::core::models::template::{FieldSpec, GlobalInsert, GlobalTemplate, Insert, LabelTemplate, TemplateField, TemplateSpec};
use crate::core::models::user::User;
use crate::core::models::workspace::{FieldType, WorkspaceRole};
use crate::core::ports::repository::{GlobalTemplateCommon, Store, TemplateCommon};
use crate::core::workspace::{access, Access};
use crate::error::Error;

pub static STAFF_ONLY: &str = "Only staff can manage global templates.";

async fn template_access<S>(store: &mut S, actor: &User, template_id: i32) -> Result<(LabelTemplate, Access), Error>
where
    S: Store,
{
    let template = TemplateCommon::get(store, template_id).await?.ok_or(Error::NotFound)?;
    let access = access(store, actor, template.workspace_id).await?;
    Ok((template, access))
}

async fn copy_fields<S>(store: &mut S, template_id: i32, fields: &[TemplateField]) -> Result<(), Error>
where
    S: Store,
{
    for field in fields {
        TemplateCommon::insert_field(store, template_id, &field.spec()).await?;
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct Detail {
    pub template: LabelTemplate,
    pub role: WorkspaceRole,
    pub fields: Vec<TemplateField>,
}

pub async fn detail<S>(store: &mut S, actor: &User, template_id: i32) -> Result<Detail, Error>
where
    S: Store,
{
    let (template, access) = template_access(store, actor, template_id).await?;
    let fields = TemplateCommon::fields(store, template.id).await?;
    Ok(Detail {
        template,
        role: access.role,
        fields,
    })
}

pub async fn create<S>(store: &mut S, actor: &User, workspace_id: i32, spec: TemplateSpec) -> Result<LabelTemplate, Error>
where
    S: Store,
{
    access(store, actor, workspace_id).await?.require_edit()?;
    let template = TemplateCommon::insert(
        store,
        Insert {
            workspace_id,
            spec,
            template_code: random_code("TPL"),
            is_base: false,
            created_by: actor.id,
        },
    )
    .await?;
    info!("{} created template {}", actor.email, template.template_code);
    Ok(template)
}

pub async fn update<S>(store: &mut S, actor: &User, template_id: i32, spec: TemplateSpec) -> Result<(), Error>
where
    S: Store,
{
    let (template, access) = template_access(store, actor, template_id).await?;
    access.require_edit()?;
    TemplateCommon::update(store, template.id, &spec).await
}

/// Copies the template and its fields under a new name. Run inside a
/// transaction.
pub async fn duplicate<S>(store: &mut S, actor: &User, template_id: i32, name: String, description: String) -> Result<LabelTemplate, Error>
where
    S: Store,
{
    let (source, access) = template_access(store, actor, template_id).await?;
    access.require_edit()?;
    let copy = TemplateCommon::insert(
        store,
        Insert {
            workspace_id: source.workspace_id,
            spec: TemplateSpec {
                name,
                description,
                ..source.spec()
            },
            template_code: random_code("TPL"),
            is_base: false,
            created_by: actor.id,
        },
    )
    .await?;
    let fields = TemplateCommon::fields(store, source.id).await?;
    copy_fields(store, copy.id, &fields).await?;
    info!("{} duplicated template {} as {}", actor.email, source.template_code, copy.template_code);
    Ok(copy)
}

/// Returns the workspace the template belonged to.
pub async fn delete<S>(store: &mut S, actor: &User, template_id: i32) -> Result<i32, Error>
where
    S: Store,
{
    let (template, access) = template_access(store, actor, template_id).await?;
    access.require_edit()?;
    TemplateCommon::delete(store, template.id).await?;
    info!("{} deleted template {}", actor.email, template.template_code);
    Ok(template.workspace_id)
}

pub async fn add_field<S>(store: &mut S, actor: &User, template_id: i32, spec: FieldSpec) -> Result<TemplateField, Error>
where
    S: Store,
{
    let (template, access) = template_access(store, actor, template_id).await?;
    access.require_edit()?;
    TemplateCommon::insert_field(store, template.id, &spec).await
}

pub async fn delete_field<S>(store: &mut S, actor: &User, template_id: i32, field_id: i32) -> Result<(), Error>
where
    S: Store,
{
    let (template, access) = template_access(store, actor, template_id).await?;
    access.require_edit()?;
    if !TemplateCommon::delete_field(store, template.id, field_id).await? {
        return Err(Error::NotFound);
    }
    Ok(())
}

pub async fn active_globals<S>(store: &mut S) -> Result<Vec<GlobalTemplate>, Error>
where
    S: Store,
{
    GlobalTemplateCommon::list_active(store).await
}

/// Copies an active global template into the workspace as a base template.
/// Run inside a transaction.
pub async fn copy_global<S>(store: &mut S, actor: &User, workspace_id: i32, global_id: i32) -> Result<LabelTemplate, Error>
where
    S: Store,
{
    access(store, actor, workspace_id).await?.require_edit()?;
    let global = match GlobalTemplateCommon::get(store, global_id).await? {
        Some(g) if g.is_active => g,
        _ => return Err(Error::NotFound),
    };
    let template = TemplateCommon::insert(
        store,
        Insert {
            workspace_id,
            spec: global.spec(),
            template_code: random_code("TPL"),
            is_base: true,
            created_by: actor.id,
        },
    )
    .await?;
    let fields = GlobalTemplateCommon::fields(store, global.id).await?;
    copy_fields(store, template.id, &fields).await?;
    info!("{} copied global template {} into workspace {}", actor.email, global.id, workspace_id);
    Ok(template)
}

fn require_staff(actor: &User) -> Result<(), Error> {
    if actor.is_staff || actor.is_superuser {
        return Ok(());
    }
    Err(Error::PermissionDenied(STAFF_ONLY.to_owned()))
}

pub async fn create_global<S>(store: &mut S, actor: &User, spec: TemplateSpec) -> Result<GlobalTemplate, Error>
where
    S: Store,
{
    require_staff(actor)?;
    GlobalTemplateCommon::insert(store, GlobalInsert { spec, created_by: actor.id }).await
}

pub async fn add_global_field<S>(store: &mut S, actor: &User, global_id: i32, spec: FieldSpec) -> Result<TemplateField, Error>
where
    S: Store,
{
    require_staff(actor)?;
    let global = GlobalTemplateCommon::get(store, global_id).await?.ok_or(Error::NotFound)?;
    GlobalTemplateCommon::insert_field(store, global.id, &spec).await
}

#[derive(Debug, Serialize)]
pub struct PreviewField {
    #[serde(flatten)]
    pub field: TemplateField,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Preview {
    pub template: LabelTemplate,
    pub fields: Vec<PreviewField>,
}

/// Renders every barcode and QR field with `sample`, or the field name when
/// no sample is given.
pub async fn preview<S>(store: &mut S, actor: &User, template_id: i32, sample: Option<&str>) -> Result<Preview, Error>
where
    S: Store,
{
    let (template, _) = template_access(store, actor, template_id).await?;
    let mut fields = Vec::new();
    for field in TemplateCommon::fields(store, template.id).await? {
        let data = sample.unwrap_or(&field.name);
        let image = match field.field_type {
            FieldType::Barcode => Some(barcode_png(data)?),
            FieldType::Qrcode => Some(qr_png(data)?),
            _ => None,
        };
        fields.push(PreviewField { field, image });
    }
    Ok(Preview { template, fields })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::models::template::Category;
    use crate::core::models::user::Status;
    use crate::core::models::workspace::Layout;
    use crate::core::testing::MemStore;
    use crate::core::workspace::{add_member, create as create_workspace};

    fn spec(name: &str) -> TemplateSpec {
        TemplateSpec {
            name: name.to_owned(),
            description: String::new(),
            width_cm: 5.0,
            height_cm: 3.0,
            dpi: 300,
            category: Category::Retail,
            custom_category: String::new(),
        }
    }

    fn field(name: &str, field_type: FieldType, order: i32) -> FieldSpec {
        FieldSpec {
            name: name.to_owned(),
            field_type,
            order,
            layout: Layout::default(),
        }
    }

    async fn setup() -> (MemStore, User, User, i32) {
        let mut store = MemStore::default();
        let org = store.seed_org("Acme Inc", Some("acme.com"));
        let admin = store.seed_admin("bob@acme.com", org);
        let viewer = store.seed_user("vi@acme.com", "pw", Some(org), Status::Active);
        let admin = store.user(admin);
        let ws = create_workspace(&mut store, &admin, "Shelf".into(), String::new(), vec![]).await.unwrap();
        add_member(&mut store, &admin, ws.id, "vi@acme.com", WorkspaceRole::Viewer).await.unwrap();
        let viewer = store.user(viewer);
        (store, admin, viewer, ws.id)
    }

    #[tokio::test]
    async fn test_duplicate_copies_fields() {
        let (mut store, admin, _, ws) = setup().await;
        let source = create(&mut store, &admin, ws, spec("Shelf tag")).await.unwrap();
        add_field(&mut store, &admin, source.id, field("SKU", FieldType::Barcode, 1)).await.unwrap();
        add_field(&mut store, &admin, source.id, field("Price", FieldType::Number, 2)).await.unwrap();

        let copy = duplicate(&mut store, &admin, source.id, "Shelf tag (large)".into(), "copy".into()).await.unwrap();
        assert_ne!(copy.id, source.id);
        assert_ne!(copy.template_code, source.template_code);
        assert_eq!(copy.name, "Shelf tag (large)");
        assert_eq!(copy.width_cm, source.width_cm);
        assert!(!copy.is_base);

        let names: Vec<_> = detail(&mut store, &admin, copy.id).await.unwrap().fields.into_iter().map(|f| (f.name, f.order)).collect();
        assert_eq!(names, vec![("SKU".to_owned(), 1), ("Price".to_owned(), 2)]);
    }

    #[tokio::test]
    async fn test_viewer_reads_but_cannot_edit() {
        let (mut store, admin, viewer, ws) = setup().await;
        let t = create(&mut store, &admin, ws, spec("Shelf tag")).await.unwrap();
        assert_eq!(detail(&mut store, &viewer, t.id).await.unwrap().role, WorkspaceRole::Viewer);
        assert!(matches!(update(&mut store, &viewer, t.id, spec("Renamed")).await, Err(Error::PermissionDenied(_))));
        assert!(matches!(delete(&mut store, &viewer, t.id).await, Err(Error::PermissionDenied(_))));
        assert!(matches!(create(&mut store, &viewer, ws, spec("Mine")).await, Err(Error::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (mut store, admin, _, ws) = setup().await;
        let t = create(&mut store, &admin, ws, spec("Shelf tag")).await.unwrap();
        update(&mut store, &admin, t.id, spec("Renamed")).await.unwrap();
        assert_eq!(detail(&mut store, &admin, t.id).await.unwrap().template.name, "Renamed");
        assert_eq!(delete(&mut store, &admin, t.id).await.unwrap(), ws);
        assert!(matches!(detail(&mut store, &admin, t.id).await, Err(Error::NotFound)));
    }

    #[tokio::test]
    async fn test_global_copy_is_base() {
        let (mut store, admin, _, ws) = setup().await;
        let staff = store.seed_staff("ops@labelcraft.io");
        let staff = store.user(staff);
        assert!(matches!(create_global(&mut store, &admin, spec("Pallet")).await, Err(Error::PermissionDenied(_))));

        let global = create_global(&mut store, &staff, spec("Pallet")).await.unwrap();
        add_global_field(&mut store, &staff, global.id, field("SSCC", FieldType::Barcode, 0)).await.unwrap();
        assert_eq!(active_globals(&mut store).await.unwrap().len(), 1);

        let t = copy_global(&mut store, &admin, ws, global.id).await.unwrap();
        assert!(t.is_base);
        assert_eq!(t.name, "Pallet");
        let fields = detail(&mut store, &admin, t.id).await.unwrap().fields;
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_type, FieldType::Barcode);
    }

    #[tokio::test]
    async fn test_preview_renders_code_fields() {
        let (mut store, admin, viewer, ws) = setup().await;
        let t = create(&mut store, &admin, ws, spec("Shelf tag")).await.unwrap();
        add_field(&mut store, &admin, t.id, field("SKU", FieldType::Barcode, 0)).await.unwrap();
        add_field(&mut store, &admin, t.id, field("Link", FieldType::Qrcode, 1)).await.unwrap();
        add_field(&mut store, &admin, t.id, field("Name", FieldType::Text, 2)).await.unwrap();

        let preview = preview(&mut store, &viewer, t.id, Some("12345")).await.unwrap();
        let images: Vec<_> = preview.fields.iter().map(|f| f.image.is_some()).collect();
        assert_eq!(images, vec![true, true, false]);
        assert!(preview.fields[0].image.as_ref().unwrap().starts_with("data:image/png;base64,"));
    }
}
