// src/models/employee.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// HR service records, as exposed by this service.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub organization: Option<Organization>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Position {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub department: Option<Department>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Employee {
    pub id: i64,
    pub user_id: String,
    #[schema(example = "EMP-0001")]
    pub code: String,
    /// Lower-case status name, e.g. `active`. Empty when HR did not say.
    #[schema(example = "active")]
    pub status: String,
    pub position_id: Option<i64>,
    pub joining_at: Option<DateTime<Utc>>,
    pub org_id: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub position: Option<Position>,
}
