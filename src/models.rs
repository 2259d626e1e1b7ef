pub mod auth;
pub mod employee;
pub mod rbac;
pub mod user;
