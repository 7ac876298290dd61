use log::info;

use crate::core::models::{organization::Org, user::User};
use crate::core::ports::notifier::Notifier;

/// Writes notifications to the log instead of sending mail.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn join_requested(&self, org: &Org, admins: &[User], applicant: &User) {
        if admins.is_empty() {
            info!("join request from {} to org {} has no admin to notify", applicant.email, org.org_code);
            return;
        }
        for admin in admins {
            info!("notify {}: {} asked to join {}", admin.email, applicant.email, org.name);
        }
    }

    fn join_approved(&self, approved: &User, approved_by: &User) {
        info!("notify {}: join request approved by {}", approved.email, approved_by.email);
    }
}
