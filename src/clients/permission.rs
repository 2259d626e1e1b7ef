// src/clients/permission.rs

use std::time::Duration;

use async_trait::async_trait;
use tonic::transport::Channel;
use uuid::Uuid;

use super::{lazy_channel, GatewayError};
use crate::models::rbac::{Permission, Role};
use crate::proto::{permission as pb, timestamp_to_datetime};

const SERVICE: &str = "PermissionService";

#[async_trait]
pub trait PermissionGateway: Send + Sync {
    async fn get_user_perms(&self, user_id: Uuid) -> Result<Vec<Permission>, GatewayError>;

    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, GatewayError>;

    /// Replaces the user's direct permission assignments.
    async fn update_user_perms(&self, user_id: Uuid, perm_ids: &[Uuid]) -> Result<(), GatewayError>;

    /// Replaces the user's role assignments.
    async fn update_user_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> Result<(), GatewayError>;

    async fn delete_user_perms(&self, user_id: Uuid) -> Result<(), GatewayError>;

    async fn delete_user_roles(&self, user_id: Uuid) -> Result<(), GatewayError>;
}

#[derive(Clone)]
pub struct GrpcPermissionGateway {
    client: pb::permission_service_client::PermissionServiceClient<Channel>,
}

impl GrpcPermissionGateway {
    pub fn connect_lazy(addr: &str, timeout: Duration) -> anyhow::Result<Self> {
        let channel = lazy_channel(addr, timeout)?;
        Ok(Self {
            client: pb::permission_service_client::PermissionServiceClient::new(channel),
        })
    }
}

fn ids_to_strings(ids: &[Uuid]) -> Vec<String> {
    ids.iter().map(Uuid::to_string).collect()
}

#[async_trait]
impl PermissionGateway for GrpcPermissionGateway {
    async fn get_user_perms(&self, user_id: Uuid) -> Result<Vec<Permission>, GatewayError> {
        let mut client = self.client.clone();
        let response = client
            .get_user_perms(pb::GetUserPermsRequest {
                user_id: user_id.to_string(),
            })
            .await
            .map_err(|status| GatewayError::rpc(SERVICE, "GetUserPerms", status))?;

        Ok(response.into_inner().perms.into_iter().map(Permission::from).collect())
    }

    async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, GatewayError> {
        let mut client = self.client.clone();
        let response = client
            .get_user_roles(pb::GetUserRolesRequest {
                user_id: user_id.to_string(),
            })
            .await
            .map_err(|status| GatewayError::rpc(SERVICE, "GetUserRoles", status))?;

        Ok(response.into_inner().roles.into_iter().map(Role::from).collect())
    }

    async fn update_user_perms(&self, user_id: Uuid, perm_ids: &[Uuid]) -> Result<(), GatewayError> {
        let mut client = self.client.clone();
        client
            .update_user_perms(pb::UpdateUserPermsRequest {
                user_id: user_id.to_string(),
                perm_ids: ids_to_strings(perm_ids),
            })
            .await
            .map_err(|status| GatewayError::rpc(SERVICE, "UpdateUserPerms", status))?;
        Ok(())
    }

    async fn update_user_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> Result<(), GatewayError> {
        let mut client = self.client.clone();
        client
            .update_user_roles(pb::UpdateUserRolesRequest {
                user_id: user_id.to_string(),
                role_ids: ids_to_strings(role_ids),
            })
            .await
            .map_err(|status| GatewayError::rpc(SERVICE, "UpdateUserRoles", status))?;
        Ok(())
    }

    async fn delete_user_perms(&self, user_id: Uuid) -> Result<(), GatewayError> {
        let mut client = self.client.clone();
        client
            .delete_user_perms_by_user_id(pb::DeleteUserPermsByUserIdRequest {
                user_id: user_id.to_string(),
            })
            .await
            .map_err(|status| GatewayError::rpc(SERVICE, "DeleteUserPermsByUserId", status))?;
        Ok(())
    }

    async fn delete_user_roles(&self, user_id: Uuid) -> Result<(), GatewayError> {
        let mut client = self.client.clone();
        client
            .delete_user_roles_by_user_id(pb::DeleteUserRolesByUserIdRequest {
                user_id: user_id.to_string(),
            })
            .await
            .map_err(|status| GatewayError::rpc(SERVICE, "DeleteUserRolesByUserId", status))?;
        Ok(())
    }
}

impl From<pb::Perm> for Permission {
    fn from(p: pb::Perm) -> Self {
        Self {
            id: p.id,
            code: p.code,
            name: p.name,
            description: p.description,
        }
    }
}

impl From<pb::Role> for Role {
    fn from(r: pb::Role) -> Self {
        Self {
            id: r.id,
            code: r.code,
            name: r.name,
            color: r.color,
            description: r.description,
            perms: r.perms.into_iter().map(Permission::from).collect(),
            created_at: timestamp_to_datetime(r.created_at),
            updated_at: timestamp_to_datetime(r.updated_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_conversion_keeps_embedded_perms() {
        let role = pb::Role {
            id: "r1".into(),
            code: "hr_manager".into(),
            name: "HR Manager".into(),
            color: Some("#fff".into()),
            description: None,
            perms: vec![pb::Perm {
                id: "p1".into(),
                code: "user:read".into(),
                name: "Read users".into(),
                description: None,
            }],
            created_at: None,
            updated_at: Some(prost_types::Timestamp {
                seconds: 1_700_000_000,
                nanos: 0,
            }),
        };

        let role = Role::from(role);

        assert_eq!(role.code, "hr_manager");
        assert_eq!(role.perms.len(), 1);
        assert_eq!(role.perms[0].code, "user:read");
        assert!(role.created_at.is_none());
        assert_eq!(role.updated_at.map(|t| t.timestamp()), Some(1_700_000_000));
    }
}
