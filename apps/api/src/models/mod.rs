pub mod application;
pub mod billing;
pub mod campaign;
pub mod job;
pub mod support;
pub mod user;
