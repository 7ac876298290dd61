//! Two-step signup. Step one either files a join request against the org
//! that already owns the email's company domain, or stages the credentials
//! for step two, where the user names a new org and becomes its admin.

use log::info;

use crate::core::auth::{hash_password, random_code, random_salt};
use crate::core::domains::{is_generic_email_domain, split_email_domain};
use crate::core::models::organization::{Insert as OrgInsert, Org};
use crate::core::models::user::{Insert as UserInsert, Role, Status, User};
use crate::core::ports::repository::{JoinRequestCommon, OrgCommon, Store, UserCommon};
use crate::error::Error;
use crate::forms::NON_FIELD;

pub static EMAIL_TAKEN: &str = "An account with this email already exists.";

/// Credentials carried from step one to step two. `password` is already
/// hashed with `salt`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedSignup {
    pub email: String,
    pub password: String,
    pub salt: String,
    pub domain: String,
}

#[derive(Debug)]
pub enum Step1 {
    /// A pending user and an unapproved join request were created.
    Pending { org: Org, user: User, admins: Vec<User> },
    /// No org to join; continue to org naming.
    NameOrg(StagedSignup),
}

pub async fn submit_credentials<S>(store: &mut S, email: String, password: &str) -> Result<Step1, Error>
where
    S: Store,
{
    if UserCommon::email_exists(store, &email).await? {
        return Err(Error::form("email", EMAIL_TAKEN));
    }
    let domain = split_email_domain(&email);
    let salt = random_salt();
    let hashed = hash_password(password, &salt);

    let existing = if is_generic_email_domain(&domain) {
        None
    } else {
        OrgCommon::get_by_domain(store, &domain).await?
    };

    let org = match existing {
        Some(org) => org,
        None => {
            return Ok(Step1::NameOrg(StagedSignup {
                email,
                password: hashed,
                salt,
                domain,
            }))
        }
    };

    let user = UserCommon::insert(
        store,
        UserInsert {
            email,
            password: hashed,
            salt,
            org_id: Some(org.id),
            role: Role::Operator,
            status: Status::Pending,
            user_code: random_code("USR"),
        },
    )
    .await?;
    JoinRequestCommon::insert(store, org.id, user.id).await?;
    let admins = UserCommon::org_admins(store, org.id).await?;
    info!("{} requested to join org {} ({})", user.email, org.name, org.org_code);
    Ok(Step1::Pending { org, user, admins })
}

/// Resolves or creates the org for the staged domain and creates its admin.
/// Generic domains always get a fresh org without a domain.
pub async fn create_org_admin<S>(store: &mut S, stage: StagedSignup, org_name: String) -> Result<(Org, User), Error>
where
    S: Store,
{
    if UserCommon::email_exists(store, &stage.email).await? {
        return Err(Error::form(NON_FIELD, EMAIL_TAKEN));
    }

    let org = if is_generic_email_domain(&stage.domain) || stage.domain.is_empty() {
        OrgCommon::insert(
            store,
            OrgInsert {
                name: org_name,
                domain: None,
                org_code: random_code("ORG"),
            },
        )
        .await?
    } else {
        let (mut org, created) = OrgCommon::get_or_create_by_domain(
            store,
            OrgInsert {
                name: org_name.clone(),
                domain: Some(stage.domain.clone()),
                org_code: random_code("ORG"),
            },
        )
        .await?;
        if !created && org.name.is_empty() {
            OrgCommon::update_name(store, org.id, &org_name).await?;
            org.name = org_name;
        }
        org
    };

    let user = UserCommon::insert(
        store,
        UserInsert {
            email: stage.email,
            password: stage.password,
            salt: stage.salt,
            org_id: Some(org.id),
            role: Role::Admin,
            status: Status::Active,
            user_code: random_code("USR"),
        },
    )
    .await?;
    info!("{} created org {} ({}) as admin", user.email, org.name, org.org_code);
    Ok((org, user))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::auth::authenticate;
    use crate::core::testing::MemStore;

    fn staged(outcome: Step1) -> StagedSignup {
        match outcome {
            Step1::NameOrg(stage) => stage,
            other => panic!("expected org naming step, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generic_domains_always_name_an_org() {
        let mut store = MemStore::default();
        store.seed_org("Gmail Squatters", Some("gmail.com"));
        store.seed_org("Someone's Shop", None);
        for email in ["alice@gmail.com", "raj@rediffmail.com", "kim@icloud.com"] {
            let stage = staged(submit_credentials(&mut store, email.into(), "pw").await.unwrap());
            assert_eq!(stage.email, email);
        }
        assert!(store.users.is_empty());
        assert!(store.join_requests.is_empty());
    }

    #[tokio::test]
    async fn test_first_company_user_names_org_and_becomes_admin() {
        let mut store = MemStore::default();
        let stage = staged(submit_credentials(&mut store, "bob@acme.com".into(), "hunter2").await.unwrap());
        assert_eq!(stage.domain, "acme.com");
        assert_ne!(stage.password, "hunter2");

        let (org, user) = create_org_admin(&mut store, stage, "Acme Inc".into()).await.unwrap();
        assert_eq!(org.domain.as_deref(), Some("acme.com"));
        assert_eq!(org.name, "Acme Inc");
        assert_eq!(user.email, "bob@acme.com");
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.status, Status::Active);
        assert_eq!(user.org_id, Some(org.id));
        assert!(authenticate(&mut store, "bob@acme.com", "hunter2").await.is_ok());
    }

    #[tokio::test]
    async fn test_existing_company_org_files_pending_join_request() {
        let mut store = MemStore::default();
        let org_id = store.seed_org("Acme Inc", Some("acme.com"));
        let admin = store.seed_admin("bob@acme.com", org_id);

        let outcome = submit_credentials(&mut store, "carol@acme.com".into(), "pw").await.unwrap();
        let (org, user, admins) = match outcome {
            Step1::Pending { org, user, admins } => (org, user, admins),
            other => panic!("expected pending, got {:?}", other),
        };
        assert_eq!(org.id, org_id);
        assert_eq!(user.status, Status::Pending);
        assert_eq!(user.role, Role::Operator);
        assert_eq!(admins.iter().map(|a| a.id).collect::<Vec<_>>(), vec![admin]);

        let requests: Vec<_> = store.join_requests.iter().filter(|r| r.user_id == user.id).collect();
        assert_eq!(requests.len(), 1);
        assert!(!requests[0].is_approved);
        assert_eq!(requests[0].org_id, org_id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let mut store = MemStore::default();
        let org_id = store.seed_org("Acme Inc", Some("acme.com"));
        store.seed_admin("bob@acme.com", org_id);
        match submit_credentials(&mut store, "bob@acme.com".into(), "pw").await {
            Err(Error::Form(errors)) => assert_eq!(errors.get("email").unwrap(), [EMAIL_TAKEN.to_owned()]),
            other => panic!("expected form error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generic_signups_get_separate_orgs() {
        let mut store = MemStore::default();
        let a = staged(submit_credentials(&mut store, "a@gmail.com".into(), "pw").await.unwrap());
        let (org_a, _) = create_org_admin(&mut store, a, "A Studio".into()).await.unwrap();
        let b = staged(submit_credentials(&mut store, "b@gmail.com".into(), "pw").await.unwrap());
        let (org_b, user_b) = create_org_admin(&mut store, b, "B Bakery".into()).await.unwrap();
        assert_ne!(org_a.id, org_b.id);
        assert_eq!(org_b.domain, None);
        assert_eq!(user_b.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_org_created_between_steps_is_resolved() {
        let mut store = MemStore::default();
        let stage = staged(submit_credentials(&mut store, "dan@globex.com".into(), "pw").await.unwrap());
        let existing = store.seed_org("Globex", Some("globex.com"));
        let (org, user) = create_org_admin(&mut store, stage, "Globex Corporation".into()).await.unwrap();
        assert_eq!(org.id, existing);
        assert_eq!(org.name, "Globex");
        assert_eq!(user.org_id, Some(existing));
    }

    #[tokio::test]
    async fn test_step_two_rejects_taken_email() {
        let mut store = MemStore::default();
        let stage = staged(submit_credentials(&mut store, "eve@initech.com".into(), "pw").await.unwrap());
        store.seed_user("eve@initech.com", "pw", None, Status::Active);
        assert!(matches!(create_org_admin(&mut store, stage, "Initech".into()).await, Err(Error::Form(_))));
    }
}
