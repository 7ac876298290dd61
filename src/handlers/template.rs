use actix_web::web::{Form, Path, Query};
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

use crate::context::UserInfo;
use crate::core::models::template::GlobalTemplate;
use crate::core::ports::repository::TxStore;
use crate::core::template::{active_globals, add_field as add_template_field, delete as delete_template, delete_field as delete_template_field, detail as template_detail, duplicate as duplicate_template, preview as template_preview, update};
use crate::error::Error;
use crate::flash::{Message, Messages};
use crate::forms::{LabelTemplateForm, TemplateDuplicateForm, TemplateFieldForm};
use crate::handlers::{current_user, or_flash, or_redirect, Manager};
use crate::response::{page, redirect_with};

fn template_url(id: i32) -> String {
    format!("/templates/{}/", id)
}

pub async fn detail(user_info: UserInfo, template_id: Path<(i32,)>, manager: Manager, messages: Messages) -> Result<HttpResponse, Error> {
    let mut db = manager.acquire().await?;
    let user = current_user(&mut db, &user_info).await?;
    let detail = template_detail(&mut db, &user, template_id.into_inner().0).await?;
    Ok(page(messages, detail))
}

pub async fn edit(user_info: UserInfo, template_id: Path<(i32,)>, Form(form): Form<LabelTemplateForm>, manager: Manager) -> Result<HttpResponse, Error> {
    let template_id = template_id.into_inner().0;
    let location = template_url(template_id);
    let result = async {
        let spec = form.clean()?;
        let mut db = manager.acquire().await?;
        let user = current_user(&mut db, &user_info).await?;
        update(&mut db, &user, template_id, spec).await?;
        Ok::<_, Error>(redirect_with(&location, &[Message::success("Template updated.")]))
    }
    .await;
    or_flash(result, &location)
}

pub async fn duplicate(user_info: UserInfo, template_id: Path<(i32,)>, Form(form): Form<TemplateDuplicateForm>, manager: Manager) -> Result<HttpResponse, Error> {
    let template_id = template_id.into_inner().0;
    let location = template_url(template_id);
    let result = async {
        let (name, description) = form.clean()?;
        let mut tx = manager.begin().await?;
        let user = current_user(&mut tx, &user_info).await?;
        let copy = duplicate_template(&mut tx, &user, template_id, name, description).await?;
        tx.commit().await?;
        let msg = Message::success(format!("Template duplicated as '{}'.", copy.name));
        Ok::<_, Error>(redirect_with(&template_url(copy.id), &[msg]))
    }
    .await;
    or_flash(result, &location)
}

pub async fn delete(user_info: UserInfo, template_id: Path<(i32,)>, manager: Manager) -> Result<HttpResponse, Error> {
    let template_id = template_id.into_inner().0;
    let result = async {
        let mut db = manager.acquire().await?;
        let user = current_user(&mut db, &user_info).await?;
        let workspace_id = delete_template(&mut db, &user, template_id).await?;
        Ok::<_, Error>(redirect_with(&format!("/workspaces/{}/", workspace_id), &[Message::success("Template deleted.")]))
    }
    .await;
    or_redirect(result, &template_url(template_id))
}

pub async fn add_field(user_info: UserInfo, template_id: Path<(i32,)>, Form(form): Form<TemplateFieldForm>, manager: Manager) -> Result<HttpResponse, Error> {
    let template_id = template_id.into_inner().0;
    let location = template_url(template_id);
    let result = async {
        let spec = form.clean()?;
        let mut db = manager.acquire().await?;
        let user = current_user(&mut db, &user_info).await?;
        let field = add_template_field(&mut db, &user, template_id, spec).await?;
        Ok::<_, Error>(redirect_with(&location, &[Message::success(format!("Field '{}' added.", field.name))]))
    }
    .await;
    or_flash(result, &location)
}

pub async fn delete_field(user_info: UserInfo, path: Path<(i32, i32)>, manager: Manager) -> Result<HttpResponse, Error> {
    let (template_id, field_id) = path.into_inner();
    let location = template_url(template_id);
    let result = async {
        let mut db = manager.acquire().await?;
        let user = current_user(&mut db, &user_info).await?;
        delete_template_field(&mut db, &user, template_id, field_id).await?;
        Ok::<_, Error>(redirect_with(&location, &[Message::success("Field deleted.")]))
    }
    .await;
    or_redirect(result, &location)
}

#[derive(Debug, Default, Deserialize)]
pub struct Sample {
    pub data: Option<String>,
}

pub async fn preview(user_info: UserInfo, template_id: Path<(i32,)>, sample: Query<Sample>, manager: Manager, messages: Messages) -> Result<HttpResponse, Error> {
    let mut db = manager.acquire().await?;
    let user = current_user(&mut db, &user_info).await?;
    let data = sample.data.as_deref().map(str::trim).filter(|d| !d.is_empty());
    let preview = template_preview(&mut db, &user, template_id.into_inner().0, data).await?;
    Ok(page(messages, preview))
}

#[derive(Debug, Serialize)]
struct Globals {
    templates: Vec<GlobalTemplate>,
}

pub async fn globals(user_info: UserInfo, manager: Manager, messages: Messages) -> Result<HttpResponse, Error> {
    let mut db = manager.acquire().await?;
    current_user(&mut db, &user_info).await?;
    let templates = active_globals(&mut db).await?;
    Ok(page(messages, Globals { templates }))
}

#[cfg(test)]
mod test {
    use super::*;
    use actix_web::http::header::LOCATION;
    use actix_web::http::StatusCode;
    use actix_web::test::{call_service, init_service, TestRequest};
    use actix_web::web::{post, Data};
    use actix_web::{App, HttpMessage};

    use crate::flash::FLASH_COOKIE;
    use crate::handlers::test::lazy_manager;
    use crate::session::JWT_TOKEN;

    #[actix_web::test]
    async fn test_others_without_custom_category_is_flashed() {
        let app = init_service(App::new().app_data(Data::new(lazy_manager())).route("/templates/{id}/edit/", post().to(edit))).await;
        let req = TestRequest::post()
            .uri("/templates/7/edit/")
            .set_form([("name", "Box"), ("width_cm", "5"), ("height_cm", "3"), ("dpi", "300"), ("category", "others")])
            .to_request();
        req.extensions_mut().insert(UserInfo { id: 1 });
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(LOCATION).unwrap(), "/templates/7/");
        assert!(resp.response().cookies().any(|c| c.name() == FLASH_COOKIE));
    }

    #[actix_web::test]
    async fn test_blank_width_is_flashed() {
        let app = init_service(App::new().app_data(Data::new(lazy_manager())).route("/templates/{id}/edit/", post().to(edit))).await;
        let req = TestRequest::post()
            .uri("/templates/7/edit/")
            .set_form([("name", "Box"), ("width_cm", ""), ("height_cm", "3"), ("category", "retail")])
            .to_request();
        req.extensions_mut().insert(UserInfo { id: 1 });
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(LOCATION).unwrap(), "/templates/7/");
        assert!(resp.response().cookies().any(|c| c.name() == FLASH_COOKIE));
    }

    #[actix_web::test]
    async fn test_unsigned_request_goes_to_login() {
        let app = init_service(App::new().app_data(Data::new(lazy_manager())).route("/templates/{id}/delete/", post().to(delete))).await;
        let resp = call_service(&app, TestRequest::post().uri("/templates/7/delete/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(LOCATION).unwrap(), "/login/");
        assert!(resp.response().cookies().any(|c| c.name() == JWT_TOKEN && c.value().is_empty()));
    }
}
