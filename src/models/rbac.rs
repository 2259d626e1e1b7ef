// src/models/rbac.rs

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Read-only snapshots of data owned by the Permission service.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Permission {
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub id: String,

    #[schema(example = "user:read")]
    pub code: String,

    #[schema(example = "Read users")]
    pub name: String,

    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Role {
    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub id: String,

    #[schema(example = "hr_manager")]
    pub code: String,

    #[schema(example = "HR Manager")]
    pub name: String,

    #[schema(example = "#1e88e5")]
    pub color: Option<String>,

    pub description: Option<String>,

    pub perms: Vec<Permission>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Everything the Permission service tells us about one user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RolesAndPerms {
    pub roles: Vec<Role>,
    /// Directly assigned permissions, for API responses only.
    pub perms: Vec<Permission>,
    /// Codes reachable through `roles`; this is what goes into the access token.
    pub permission_codes: BTreeSet<String>,
}
