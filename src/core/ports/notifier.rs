use crate::core::models::{organization::Org, user::User};

/// Outbound notifications about membership changes.
pub trait Notifier {
    fn join_requested(&self, org: &Org, admins: &[User], applicant: &User);
    fn join_approved(&self, approved: &User, approved_by: &User);
}
