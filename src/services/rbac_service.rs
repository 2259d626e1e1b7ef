// src/services/rbac_service.rs

use std::collections::BTreeSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    clients::PermissionGateway,
    common::error::AppError,
    models::rbac::{Role, RolesAndPerms},
};

/// Reads and writes a user's role/permission assignments in the Permission
/// service. Reads are load-bearing: any failure aborts the caller.
#[derive(Clone)]
pub struct RbacService {
    gateway: Arc<dyn PermissionGateway>,
}

impl RbacService {
    pub fn new(gateway: Arc<dyn PermissionGateway>) -> Self {
        Self { gateway }
    }

    pub async fn get_roles_and_perms(&self, user_id: Uuid) -> Result<RolesAndPerms, AppError> {
        let (perms, roles) = tokio::try_join!(
            async {
                self.gateway
                    .get_user_perms(user_id)
                    .await
                    .map_err(|e| AppError::dependency("fetch user permissions", e))
            },
            async {
                self.gateway
                    .get_user_roles(user_id)
                    .await
                    .map_err(|e| AppError::dependency("fetch user roles", e))
            },
        )?;

        let permission_codes = flatten_role_perms(&roles);

        Ok(RolesAndPerms {
            roles,
            perms,
            permission_codes,
        })
    }

    /// Replaces whichever assignment lists are given. `None` leaves that list alone.
    pub async fn assign(
        &self,
        user_id: Uuid,
        perm_ids: Option<&[Uuid]>,
        role_ids: Option<&[Uuid]>,
    ) -> Result<(), AppError> {
        if let Some(ids) = perm_ids {
            self.gateway
                .update_user_perms(user_id, ids)
                .await
                .map_err(|e| AppError::dependency("assign user permissions", e))?;
        }
        if let Some(ids) = role_ids {
            self.gateway
                .update_user_roles(user_id, ids)
                .await
                .map_err(|e| AppError::dependency("assign user roles", e))?;
        }
        Ok(())
    }

    /// Removes every assignment of a deleted user. Best-effort: each failed
    /// step comes back as a warning instead of an error.
    pub async fn cleanup(&self, user_id: Uuid) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Err(e) = self.gateway.delete_user_perms(user_id).await {
            tracing::warn!("⚠️ Could not delete permissions of user {}: {}", user_id, e);
            warnings.push(format!("failed to delete user permissions: {}", e));
        }
        if let Err(e) = self.gateway.delete_user_roles(user_id).await {
            tracing::warn!("⚠️ Could not delete roles of user {}: {}", user_id, e);
            warnings.push(format!("failed to delete user roles: {}", e));
        }

        warnings
    }
}

/// Union of the permission codes embedded in `roles`.
pub fn flatten_role_perms(roles: &[Role]) -> BTreeSet<String> {
    roles
        .iter()
        .flat_map(|role| role.perms.iter())
        .map(|perm| perm.code.clone())
        .collect()
}
