pub mod auth;
pub mod domains;
pub mod label_codes;
pub mod models;
pub mod organization;
pub mod ports;
pub mod signup;
pub mod template;
#[cfg(test)]
pub mod testing;
pub mod tokener;
pub mod workspace;
