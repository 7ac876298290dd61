pub mod admin;
pub mod codes;
pub mod org;
pub mod signup;
pub mod template;
pub mod workspace;

use actix_web::web::{Data, Form, Query};
use actix_web::HttpResponse;
use log::info;
use serde::Serialize;
use serde_json::json;

use crate::context::UserInfo;
use crate::core::auth::authenticate;
use crate::core::models::{organization::Org, user::User, workspace::Workspace};
use crate::core::ports::repository::{OrgCommon, Store, UserCommon};
use crate::core::workspace::accessible;
use crate::database::sqlx::PgSqlxManager;
use crate::error::Error;
use crate::flash::{Message, Messages};
use crate::forms::LoginForm;
use crate::request::Next;
use crate::response::{form_page, page, redirect_setting, redirect_with};
use crate::session::{Sessions, LOGIN_PATH};

pub type Manager = Data<PgSqlxManager>;

/// The signed-in user. A session whose user vanished or is still pending
/// counts as no session.
pub(crate) async fn current_user<S>(store: &mut S, user_info: &UserInfo) -> Result<User, Error>
where
    S: Store,
{
    let user = match UserCommon::get(store, user_info.id).await {
        Ok(user) => user,
        Err(Error::DatabaseError(sqlx::Error::RowNotFound)) | Err(Error::NotFound) => return Err(Error::Unauthorized),
        Err(e) => return Err(e),
    };
    if user.is_pending() {
        return Err(Error::Unauthorized);
    }
    Ok(user)
}

/// Turns a permission failure into a redirect carrying the message.
pub(crate) fn or_redirect(result: Result<HttpResponse, Error>, location: &str) -> Result<HttpResponse, Error> {
    match result {
        Err(Error::PermissionDenied(msg)) => Ok(redirect_with(location, &[Message::error(msg)])),
        other => other,
    }
}

/// For sub-forms posted from a detail page: form errors and permission
/// failures both come back to `location` as flash messages.
pub(crate) fn or_flash(result: Result<HttpResponse, Error>, location: &str) -> Result<HttpResponse, Error> {
    match or_redirect(result, location) {
        Err(Error::Form(errors)) => {
            let msgs: Vec<Message> = errors.messages().map(Message::error).collect();
            Ok(redirect_with(location, &msgs))
        }
        other => other,
    }
}

/// Turns form errors into the re-rendered page.
pub(crate) fn or_rerender<T>(result: Result<HttpResponse, Error>, messages: Messages, data: T) -> Result<HttpResponse, Error>
where
    T: Serialize,
{
    match result {
        Err(Error::Form(errors)) => Ok(form_page(messages, errors, data)),
        other => other,
    }
}

pub async fn login_page(messages: Messages, next: Query<Next>) -> HttpResponse {
    page(messages, json!({ "next": next.safe() }))
}

async fn try_login(form: LoginForm, next: &Next, manager: &PgSqlxManager, sessions: &Sessions) -> Result<HttpResponse, Error> {
    let (email, password) = form.clean()?;
    let mut db = manager.acquire().await?;
    let user = authenticate(&mut db, &email, &password).await?;
    info!("{} logged in", user.email);
    let location = next.safe().unwrap_or(sessions.login_redirect_url());
    Ok(redirect_setting(location, [sessions.login_cookie(user.id)?]))
}

pub async fn login(Form(form): Form<LoginForm>, next: Query<Next>, manager: Manager, sessions: Data<Sessions>, messages: Messages) -> Result<HttpResponse, Error> {
    let result = try_login(form, &next, &manager, &sessions).await;
    or_rerender(result, messages, json!({ "next": next.safe() }))
}

pub async fn logout(sessions: Data<Sessions>) -> HttpResponse {
    redirect_setting(LOGIN_PATH, [sessions.logout_cookie()])
}

#[derive(Debug, Serialize)]
struct Dashboard {
    user: User,
    org: Option<Org>,
    is_org_admin: bool,
    workspaces: Vec<Workspace>,
}

pub async fn dashboard(user_info: UserInfo, manager: Manager, messages: Messages) -> Result<HttpResponse, Error> {
    let mut db = manager.acquire().await?;
    let user = current_user(&mut db, &user_info).await?;
    let org = match user.org_id {
        Some(id) => Some(OrgCommon::get(&mut db, id).await?),
        None => None,
    };
    let workspaces = accessible(&mut db, &user).await?;
    Ok(page(
        messages,
        Dashboard {
            is_org_admin: user.is_org_admin(),
            user,
            org,
            workspaces,
        },
    ))
}
