use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Claims carried by a signed token. They must include a unix-timestamp
/// `exp`, which the tokener enforces on verification.
pub trait Payload: Serialize + for<'d> Deserialize<'d> {}

pub trait Tokener<P: Payload> {
    fn gen_token(&self, payload: &P) -> Result<String, Error>;
    fn verify_token(&self, token: &str) -> Result<P, Error>;
}
