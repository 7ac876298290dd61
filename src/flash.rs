use std::future::{ready, Ready};

use actix_web::cookie::time::Duration;
use actix_web::cookie::Cookie;
use actix_web::{FromRequest, HttpRequest};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

pub static FLASH_COOKIE: &str = "FLASH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub level: Level,
    pub text: String,
}

impl Message {
    pub fn success(text: impl Into<String>) -> Self {
        Self { level: Level::Success, text: text.into() }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self { level: Level::Info, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { level: Level::Error, text: text.into() }
    }
}

pub fn cookie(messages: &[Message]) -> Cookie<'static> {
    let payload = serde_json::to_vec(messages).unwrap_or_default();
    Cookie::build(FLASH_COOKIE, URL_SAFE_NO_PAD.encode(payload))
        .path("/")
        .http_only(true)
        .max_age(Duration::minutes(5))
        .finish()
}

pub fn clear_cookie() -> Cookie<'static> {
    let mut c = Cookie::build(FLASH_COOKIE, "").path("/").finish();
    c.make_removal();
    c
}

fn decode(value: &str) -> Vec<Message> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

/// Messages queued by the previous response. Malformed cookies read as empty.
#[derive(Debug, Clone, Default)]
pub struct Messages(pub Vec<Message>);

impl Messages {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromRequest for Messages {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let messages = req.cookie(FLASH_COOKIE).map(|c| decode(c.value())).unwrap_or_default();
        ready(Ok(Messages(messages)))
    }
}
