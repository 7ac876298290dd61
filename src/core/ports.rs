pub mod notifier;
pub mod repository;
