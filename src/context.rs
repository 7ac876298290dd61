use actix_web::{FromRequest, HttpMessage};
use std::future::{ready, Ready};

use crate::error::Error;

/// Id of the signed-in user, placed in the request extensions by the session
/// middleware.
#[derive(Debug, Clone)]
pub struct UserInfo {
    pub id: i32,
}

impl FromRequest for UserInfo {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;
    fn from_request(req: &actix_web::HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        if let Some(user) = req.extensions().get::<Self>() {
            ready(Ok(user.clone()))
        } else {
            ready(Err(Error::Unauthorized))
        }
    }
}
