pub mod organization;
pub mod template;
pub mod user;
pub mod workspace;
