//! Signed cookies: the login session and the staged signup state between the
//! two signup steps.

use std::ops::Add;

use actix_web::cookie::time::Duration as CookieDuration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::core::signup::StagedSignup;
use crate::core::tokener::{Payload, Tokener};
use crate::error::Error;
use crate::impls::tokener::jwt::JWT;

pub static JWT_TOKEN: &str = "JWT_TOKEN";
pub static LOGIN_PATH: &str = "/login/";
pub static SIGNUP_TOKEN: &str = "SIGNUP_TOKEN";

#[derive(Debug, Deserialize, Serialize)]
pub struct Claim {
    pub user: String,
    pub exp: i64,
}

impl Payload for Claim {}

/// Staged signup keys. `signup_password` holds the salted hash.
#[derive(Debug, Deserialize, Serialize)]
pub struct SignupClaim {
    pub signup_email: String,
    pub signup_password: String,
    pub signup_salt: String,
    pub signup_domain: String,
    pub exp: i64,
}

impl Payload for SignupClaim {}

impl From<SignupClaim> for StagedSignup {
    fn from(c: SignupClaim) -> Self {
        StagedSignup {
            email: c.signup_email,
            password: c.signup_password,
            salt: c.signup_salt,
            domain: c.signup_domain,
        }
    }
}

#[derive(Clone)]
pub struct Sessions {
    tokener: JWT,
    session_days: i64,
    stage_minutes: i64,
    secure: bool,
    login_redirect_url: String,
}

/// Expires the named cookie on the client.
pub fn removal(name: &'static str) -> Cookie<'static> {
    let mut c = Cookie::build(name, "").path("/").finish();
    c.make_removal();
    c
}

impl Sessions {
    pub fn new(config: &Config) -> Self {
        Self {
            tokener: JWT::new(config.jwt_secret.clone()),
            session_days: config.session_days,
            stage_minutes: config.signup_stage_minutes,
            secure: config.cookie_secure,
            login_redirect_url: config.login_redirect_url.clone(),
        }
    }

    pub fn login_redirect_url(&self) -> &str {
        &self.login_redirect_url
    }

    fn cookie(&self, name: &'static str, value: String, max_age: CookieDuration) -> Cookie<'static> {
        Cookie::build(name, value)
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(max_age)
            .finish()
    }


    pub fn login_cookie(&self, user_id: i32) -> Result<Cookie<'static>, Error> {
        let claim = Claim {
            user: user_id.to_string(),
            exp: chrono::Utc::now().add(chrono::Duration::days(self.session_days)).timestamp(),
        };
        let token = self.tokener.gen_token(&claim)?;
        Ok(self.cookie(JWT_TOKEN, token, CookieDuration::days(self.session_days)))
    }

    pub fn logout_cookie(&self) -> Cookie<'static> {
        removal(JWT_TOKEN)
    }

    /// User id of a valid session, read from the session cookie or a bearer
    /// `Authorization` header.
    pub fn authenticate(&self, req: &HttpRequest) -> Option<i32> {
        let token = match req.cookie(JWT_TOKEN) {
            Some(c) => c.value().to_owned(),
            None => {
                let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
                header.strip_prefix("Bearer ").unwrap_or(header).to_owned()
            }
        };
        let claim: Claim = self.tokener.verify_token(&token).ok()?;
        claim.user.parse().ok()
    }

    pub fn stage_cookie(&self, stage: StagedSignup) -> Result<Cookie<'static>, Error> {
        let claim = SignupClaim {
            signup_email: stage.email,
            signup_password: stage.password,
            signup_salt: stage.salt,
            signup_domain: stage.domain,
            exp: chrono::Utc::now().add(chrono::Duration::minutes(self.stage_minutes)).timestamp(),
        };
        let token = self.tokener.gen_token(&claim)?;
        Ok(self.cookie(SIGNUP_TOKEN, token, CookieDuration::minutes(self.stage_minutes)))
    }

    pub fn staged(&self, req: &HttpRequest) -> Option<StagedSignup> {
        let c = req.cookie(SIGNUP_TOKEN)?;
        let claim: SignupClaim = self.tokener.verify_token(c.value()).ok()?;
        if claim.signup_email.is_empty() || claim.signup_password.is_empty() {
            return None;
        }
        Some(claim.into())
    }

    pub fn clear_stage_cookie(&self) -> Cookie<'static> {
        removal(SIGNUP_TOKEN)
    }
}

#[cfg(test)]
pub(crate) fn test_sessions() -> Sessions {
    Sessions::new(&Config {
        database_url: "postgres://localhost/labelcraft_test".into(),
        jwt_secret: b"test-secret".to_vec(),
        bind_addr: "127.0.0.1:0".into(),
        db_max_connections: 1,
        session_days: 30,
        signup_stage_minutes: 30,
        login_redirect_url: "/".into(),
        cookie_secure: false,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_login_cookie_authenticates() {
        let sessions = test_sessions();
        let cookie = sessions.login_cookie(42).unwrap();
        assert!(cookie.http_only().unwrap_or(false));
        let req = TestRequest::default().cookie(cookie).to_http_request();
        assert_eq!(sessions.authenticate(&req), Some(42));
    }

    #[test]
    fn test_bearer_header_authenticates() {
        let sessions = test_sessions();
        let token = sessions.login_cookie(7).unwrap().value().to_owned();
        let req = TestRequest::default().insert_header((AUTHORIZATION, format!("Bearer {}", token))).to_http_request();
        assert_eq!(sessions.authenticate(&req), Some(7));
    }

    #[test]
    fn test_tampered_cookie_rejected() {
        let sessions = test_sessions();
        let req = TestRequest::default().cookie(Cookie::new(JWT_TOKEN, "not-a-token")).to_http_request();
        assert_eq!(sessions.authenticate(&req), None);
    }

    #[test]
    fn test_stage_cookie_round_trip() {
        let sessions = test_sessions();
        let stage = StagedSignup {
            email: "bob@acme.com".into(),
            password: "hash".into(),
            salt: "salt".into(),
            domain: "acme.com".into(),
        };
        let cookie = sessions.stage_cookie(stage.clone()).unwrap();
        let req = TestRequest::default().cookie(cookie).to_http_request();
        assert_eq!(sessions.staged(&req), Some(stage));
        assert_eq!(sessions.staged(&TestRequest::default().to_http_request()), None);
    }
}
