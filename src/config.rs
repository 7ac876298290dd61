use std::fmt::Display;
use std::str::FromStr;

use crate::error::Error;

pub static DATABASE_URL: &str = "DATABASE_URL";
pub static JWT_SECRET: &str = "JWT_SECRET";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: Vec<u8>,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub session_days: i64,
    pub signup_stage_minutes: i64,
    pub login_redirect_url: String,
    pub cookie_secure: bool,
}

impl Config {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, Error> {
        dotenv::dotenv().ok();
        let database_url = dotenv::var(DATABASE_URL)?;
        let jwt_secret = dotenv::var(JWT_SECRET)?;
        if jwt_secret.is_empty() {
            return Err(Error::ConfigError(format!("{} must not be empty", JWT_SECRET)));
        }
        Ok(Self {
            database_url,
            jwt_secret: jwt_secret.into_bytes(),
            bind_addr: parse_or("BIND_ADDR", dotenv::var("BIND_ADDR").ok(), "0.0.0.0:8000".to_owned())?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", dotenv::var("DB_MAX_CONNECTIONS").ok(), 5)?,
            session_days: parse_or("SESSION_DAYS", dotenv::var("SESSION_DAYS").ok(), 30)?,
            signup_stage_minutes: parse_or("SIGNUP_STAGE_MINUTES", dotenv::var("SIGNUP_STAGE_MINUTES").ok(), 30)?,
            login_redirect_url: parse_or("LOGIN_REDIRECT_URL", dotenv::var("LOGIN_REDIRECT_URL").ok(), "/".to_owned())?,
            cookie_secure: parse_or("COOKIE_SECURE", dotenv::var("COOKIE_SECURE").ok(), false)?,
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, Error>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Ok(default),
        Some(v) => v.trim().parse().map_err(|e| Error::ConfigError(format!("invalid value for {}: {}", key, e))),
    }
}
