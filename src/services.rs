pub mod auth;
pub use auth::AuthService;
pub mod employee_service;
pub use employee_service::EmployeeService;
pub mod rbac_service;
pub use rbac_service::RbacService;
pub mod token;
pub use token::{AccessGrant, TokenCodec, TokenError};
pub mod user_service;
pub use user_service::UserService;
