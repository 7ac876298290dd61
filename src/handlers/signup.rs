use actix_web::web::{Data, Form};
use actix_web::{HttpRequest, HttpResponse};
use serde_json::json;

use crate::core::ports::notifier::Notifier;
use crate::core::ports::repository::TxStore;
use crate::core::signup::{create_org_admin, submit_credentials, StagedSignup, Step1};
use crate::database::sqlx::PgSqlxManager;
use crate::error::Error;
use crate::flash::Messages;
use crate::forms::{SignupOrgForm, SignupStep1Form};
use crate::handlers::{or_rerender, Manager};
use crate::response::{page, redirect, redirect_setting};
use crate::session::Sessions;

pub async fn step1_page(messages: Messages) -> HttpResponse {
    page(messages, json!({}))
}

async fn submit<N>(form: SignupStep1Form, manager: &PgSqlxManager, sessions: &Sessions, notifier: &N) -> Result<HttpResponse, Error>
where
    N: Notifier,
{
    let (email, password) = form.clean()?;
    let mut tx = manager.begin().await?;
    match submit_credentials(&mut tx, email, &password).await? {
        Step1::Pending { org, user, admins } => {
            tx.commit().await?;
            notifier.join_requested(&org, &admins, &user);
            Ok(page(
                Messages::default(),
                json!({
                    "pending": true,
                    "org": org.name,
                    "email": user.email,
                }),
            ))
        }
        Step1::NameOrg(stage) => {
            tx.rollback().await?;
            Ok(redirect_setting("/signup/org/", [sessions.stage_cookie(stage)?]))
        }
    }
}

pub async fn step1<N>(Form(form): Form<SignupStep1Form>, manager: Manager, sessions: Data<Sessions>, notifier: Data<N>, messages: Messages) -> Result<HttpResponse, Error>
where
    N: Notifier + 'static,
{
    let result = submit(form, &manager, &sessions, notifier.get_ref()).await;
    or_rerender(result, messages, json!({}))
}

pub async fn org_page(req: HttpRequest, sessions: Data<Sessions>, messages: Messages) -> HttpResponse {
    match sessions.staged(&req) {
        Some(stage) => page(messages, json!({ "email": stage.email })),
        None => redirect("/signup/"),
    }
}

async fn name_org(form: SignupOrgForm, stage: StagedSignup, manager: &PgSqlxManager, sessions: &Sessions) -> Result<HttpResponse, Error> {
    let org_name = form.clean()?;
    let mut tx = manager.begin().await?;
    let (_, user) = create_org_admin(&mut tx, stage, org_name).await?;
    tx.commit().await?;
    Ok(redirect_setting(sessions.login_redirect_url(), [sessions.login_cookie(user.id)?, sessions.clear_stage_cookie()]))
}

pub async fn org(req: HttpRequest, Form(form): Form<SignupOrgForm>, manager: Manager, sessions: Data<Sessions>, messages: Messages) -> Result<HttpResponse, Error> {
    let stage = match sessions.staged(&req) {
        Some(stage) => stage,
        None => return Ok(redirect("/signup/")),
    };
    let email = stage.email.clone();
    let result = name_org(form, stage, &manager, &sessions).await;
    or_rerender(result, messages, json!({ "email": email }))
}
