use log::info;

use crate::core::models::organization::{Org, PendingJoinRequest, RoleChangeInsert};
use crate::core::models::user::{Role, Status, User};
use crate::core::ports::repository::{JoinRequestCommon, OrgCommon, RoleChangeLogCommon, Store, UserCommon};
use crate::error::Error;

pub static VIEW_DENIED: &str = "You do not have permission to view this page.";
pub static ACTION_DENIED: &str = "You do not have permission to perform this action.";
pub static OWN_ROLE: &str = "You cannot change your own role.";

/// Org of an org admin, or `PermissionDenied` carrying `message`.
pub fn admin_org_id(actor: &User, message: &str) -> Result<i32, Error> {
    match actor.org_id {
        Some(org_id) if actor.role == Role::Admin => Ok(org_id),
        _ => Err(Error::PermissionDenied(message.to_owned())),
    }
}

pub async fn pending_requests<S>(store: &mut S, actor: &User) -> Result<(Org, Vec<PendingJoinRequest>), Error>
where
    S: Store,
{
    let org_id = admin_org_id(actor, VIEW_DENIED)?;
    let org = OrgCommon::get(store, org_id).await?;
    let requests = JoinRequestCommon::pending(store, org_id).await?;
    Ok((org, requests))
}

/// Marks the request approved and activates its user. Callers run this
/// inside one transaction; the request row stays locked until commit, so a
/// concurrent second approval finds nothing and fails with `NotFound`.
pub async fn approve_request<S>(store: &mut S, actor: &User, request_id: i32) -> Result<User, Error>
where
    S: Store,
{
    let org_id = admin_org_id(actor, ACTION_DENIED)?;
    let request = JoinRequestCommon::get_unapproved_for_update(store, request_id, org_id)
        .await?
        .ok_or(Error::NotFound)?;
    JoinRequestCommon::approve(store, request.id).await?;
    UserCommon::set_status(store, request.user_id, Status::Active).await?;
    let user = UserCommon::get(store, request.user_id).await?;
    info!("{} approved join request {} of {}", actor.email, request.id, user.email);
    Ok(user)
}

/// Changes the org role of a member and logs it. Returns the member and
/// whether anything changed.
pub async fn change_role<S>(store: &mut S, actor: &User, user_id: i32, role: Role) -> Result<(User, bool), Error>
where
    S: Store,
{
    let org_id = admin_org_id(actor, ACTION_DENIED)?;
    if actor.id == user_id {
        return Err(Error::PermissionDenied(OWN_ROLE.to_owned()));
    }
    let mut member = UserCommon::get(store, user_id).await?;
    if member.org_id != Some(org_id) {
        return Err(Error::NotFound);
    }
    if member.role == role {
        return Ok((member, false));
    }
    UserCommon::set_role(store, member.id, role).await?;
    RoleChangeLogCommon::insert(
        store,
        RoleChangeInsert {
            org_id,
            user_id: member.id,
            previous_role: member.role,
            new_role: role,
            changed_by: actor.id,
        },
    )
    .await?;
    info!("{} changed role of {} from {} to {}", actor.email, member.email, member.role.as_str(), role.as_str());
    member.role = role;
    Ok((member, true))
}
