use actix_web::web::{Data, Form, Path};
use actix_web::HttpResponse;
use serde::Serialize;

use crate::context::UserInfo;
use crate::core::models::organization::{Org, PendingJoinRequest};
use crate::core::ports::notifier::Notifier;
use crate::core::ports::repository::TxStore;
use crate::core::organization::{approve_request, change_role as change_member_role, pending_requests};
use crate::error::Error;
use crate::flash::{Message, Messages};
use crate::forms::RoleChangeForm;
use crate::handlers::{current_user, or_redirect, Manager};
use crate::response::{page, redirect_with};

#[derive(Debug, Serialize)]
struct Requests {
    org: Org,
    pending_requests: Vec<PendingJoinRequest>,
}

pub async fn requests(user_info: UserInfo, manager: Manager, messages: Messages) -> Result<HttpResponse, Error> {
    let result = async {
        let mut db = manager.acquire().await?;
        let user = current_user(&mut db, &user_info).await?;
        let (org, pending_requests) = pending_requests(&mut db, &user).await?;
        Ok::<_, Error>(page(messages, Requests { org, pending_requests }))
    }
    .await;
    or_redirect(result, "/")
}

pub async fn approve<N>(user_info: UserInfo, request_id: Path<(i32,)>, manager: Manager, notifier: Data<N>) -> Result<HttpResponse, Error>
where
    N: Notifier + 'static,
{
    let request_id = request_id.into_inner().0;
    let result = async {
        let mut tx = manager.begin().await?;
        let admin = current_user(&mut tx, &user_info).await?;
        let approved = approve_request(&mut tx, &admin, request_id).await?;
        tx.commit().await?;
        notifier.join_approved(&approved, &admin);
        let msg = Message::success(format!("{} has been approved and can now use Labelcraft.", approved.email));
        Ok::<_, Error>(redirect_with("/org/requests/", &[msg]))
    }
    .await;
    or_redirect(result, "/")
}

pub async fn change_role(user_info: UserInfo, user_id: Path<(i32,)>, Form(form): Form<RoleChangeForm>, manager: Manager) -> Result<HttpResponse, Error> {
    let user_id = user_id.into_inner().0;
    let role = match form.clean() {
        Ok(role) => role,
        Err(_) => return Ok(redirect_with("/", &[Message::error("Select a valid role.")])),
    };
    let result = async {
        let mut tx = manager.begin().await?;
        let admin = current_user(&mut tx, &user_info).await?;
        let (member, changed) = change_member_role(&mut tx, &admin, user_id, role).await?;
        tx.commit().await?;
        let msg = if changed {
            Message::success(format!("{} is now {}.", member.email, role.as_str()))
        } else {
            Message::info(format!("{} already has the {} role.", member.email, role.as_str()))
        };
        Ok::<_, Error>(redirect_with("/", &[msg]))
    }
    .await;
    or_redirect(result, "/")
}
