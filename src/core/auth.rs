use hex::ToHex;
use log::info;
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

use crate::core::models::user::User;
use crate::core::ports::repository::{Store, UserCommon};
use crate::error::Error;
use crate::forms::NON_FIELD;

pub static INVALID_LOGIN: &str = "Please enter a correct email and password. Note that both fields may be case-sensitive.";
pub static AWAITING_APPROVAL: &str = "Your account is awaiting admin approval. Please try again later.";

pub fn hash_password(pass: &str, slt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pass);
    hasher.update(slt);
    hasher.finalize().encode_hex()
}

pub fn random_salt() -> String {
    random_chars(32)
}

fn random_chars(n: usize) -> String {
    thread_rng().sample_iter(&Alphanumeric).take(n).map(char::from).collect()
}

/// Public identifier such as `ORG-7F3K2Q9A`.
pub fn random_code(prefix: &str) -> String {
    format!("{}-{}", prefix, random_chars(8).to_uppercase())
}

/// Checks credentials and the approval gate, then records the login time.
pub async fn authenticate<S>(store: &mut S, email: &str, password: &str) -> Result<User, Error>
where
    S: Store,
{
    let user = match UserCommon::get_by_email(store, email).await? {
        Some(user) if hash_password(password, &user.salt) == user.password => user,
        _ => return Err(Error::form(NON_FIELD, INVALID_LOGIN)),
    };
    if user.is_pending() {
        info!("login refused for pending user {}", user.email);
        return Err(Error::form(NON_FIELD, AWAITING_APPROVAL));
    }
    UserCommon::touch_last_login(store, user.id).await?;
    Ok(user)
}
