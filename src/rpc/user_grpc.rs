// src/rpc/user_grpc.rs

use tonic::{Request, Response, Status};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        auth::{Account, AccountStatus, Gender, LoginUserPayload, User},
        employee::Employee,
        rbac::{Permission, Role},
        user::{AccountInput, AccountUpdateInput, CreateUserPayload, Pagination, UpdateUserPayload},
    },
    proto::{
        datetime_to_timestamp,
        user::{self as pb, user_service_server::UserService},
    },
};

pub use pb::user_service_server::UserServiceServer;

#[derive(Clone)]
pub struct UserGrpcService {
    state: AppState,
}

impl UserGrpcService {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn into_server(self) -> UserServiceServer<Self> {
        UserServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl UserService for UserGrpcService {
    async fn create_user(
        &self,
        request: Request<pb::CreateUserRequest>,
    ) -> Result<Response<pb::CreateUserResponse>, Status> {
        let req = request.into_inner();
        let account = req
            .account
            .ok_or_else(|| AppError::InvalidInput("account is required".into()))?;

        let payload = CreateUserPayload {
            first_name: req.first_name,
            last_name: req.last_name,
            gender: req.gender.parse::<Gender>()?,
            email: req.email,
            phone: req.phone,
            ward_code: req.ward_code,
            address: req.address,
            avatar: req.avatar,
            company_id: req.company_id,
            account: AccountInput {
                username: account.username,
                password: account.password,
            },
            perm_ids: parse_ids(&req.perm_ids)?,
            role_ids: parse_ids(&req.role_ids)?,
        };
        payload.validate().map_err(AppError::from)?;

        let created = self.state.user_service.create_user(payload).await?;

        Ok(Response::new(pb::CreateUserResponse {
            user: Some(user_to_pb(created.user, created.account)),
        }))
    }

    async fn get_user(
        &self,
        request: Request<pb::GetUserRequest>,
    ) -> Result<Response<pb::GetUserResponse>, Status> {
        let id = parse_id(&request.into_inner().id)?;

        let detail = self.state.user_service.get_user(id).await?;

        Ok(Response::new(pb::GetUserResponse {
            user: Some(user_to_pb(detail.user.user, detail.user.account)),
            roles: detail.roles.into_iter().map(role_to_pb).collect(),
            perms: detail.perms.into_iter().map(perm_to_pb).collect(),
        }))
    }

    async fn get_users_by_ids(
        &self,
        request: Request<pb::GetUsersByIdsRequest>,
    ) -> Result<Response<pb::GetUsersByIdsResponse>, Status> {
        let req = request.into_inner();
        let ids = parse_ids(&req.ids)?;

        let list = self
            .state
            .user_service
            .get_users_by_ids(&ids, pagination(req.page, req.page_size))
            .await?;

        Ok(Response::new(pb::GetUsersByIdsResponse {
            users: list.users.into_iter().map(|u| user_to_pb(u, None)).collect(),
        }))
    }

    async fn list_users(
        &self,
        request: Request<pb::ListUsersRequest>,
    ) -> Result<Response<pb::ListUsersResponse>, Status> {
        let req = request.into_inner();

        let list = self
            .state
            .user_service
            .list_users(pagination(req.page, req.page_size))
            .await?;

        Ok(Response::new(pb::ListUsersResponse {
            users: list.users.into_iter().map(|u| user_to_pb(u, None)).collect(),
        }))
    }

    async fn update_user(
        &self,
        request: Request<pb::UpdateUserRequest>,
    ) -> Result<Response<pb::UpdateUserResponse>, Status> {
        let req = request.into_inner();
        let id = parse_id(&req.id)?;

        let account = if req.username.is_some() || req.password.is_some() || req.status.is_some() {
            Some(AccountUpdateInput {
                username: req.username,
                password: req.password,
                status: req.status.as_deref().map(str::parse::<AccountStatus>).transpose()?,
            })
        } else {
            None
        };

        let payload = UpdateUserPayload {
            first_name: req.first_name,
            last_name: req.last_name,
            gender: req.gender.as_deref().map(str::parse::<Gender>).transpose()?,
            email: req.email,
            phone: req.phone,
            ward_code: req.ward_code,
            address: req.address,
            avatar: req.avatar,
            company_id: req.company_id,
            account,
            perm_ids: req.perm_ids.map(|l| parse_ids(&l.ids)).transpose()?,
            role_ids: req.role_ids.map(|l| parse_ids(&l.ids)).transpose()?,
        };
        payload.validate().map_err(AppError::from)?;

        let updated = self.state.user_service.update_user(id, payload).await?;

        Ok(Response::new(pb::UpdateUserResponse {
            user: Some(user_to_pb(updated.user, updated.account)),
        }))
    }

    async fn delete_user(
        &self,
        request: Request<pb::DeleteUserRequest>,
    ) -> Result<Response<pb::DeleteUserResponse>, Status> {
        let id = parse_id(&request.into_inner().id)?;

        let outcome = self.state.user_service.delete_user(id).await?;

        Ok(Response::new(pb::DeleteUserResponse {
            success: outcome.success,
            warnings: outcome.warnings,
        }))
    }

    async fn login(
        &self,
        request: Request<pb::LoginRequest>,
    ) -> Result<Response<pb::LoginResponse>, Status> {
        let req = request.into_inner();
        let payload = LoginUserPayload {
            username: req.username,
            password: req.password,
        };
        payload.validate().map_err(AppError::from)?;

        let login = self.state.auth_service.login(payload).await?;

        Ok(Response::new(pb::LoginResponse {
            access_token: login.access_token,
            refresh_token: login.refresh_token,
            user: Some(user_to_pb(login.user, Some(login.account))),
            employee: login.employee.map(employee_to_pb),
            roles: login.roles.into_iter().map(role_to_pb).collect(),
            perms: login.perms.into_iter().map(perm_to_pb).collect(),
        }))
    }

    async fn decode_token(
        &self,
        request: Request<pb::DecodeTokenRequest>,
    ) -> Result<Response<pb::DecodeTokenResponse>, Status> {
        let token = request.into_inner().token;

        let me = self.state.auth_service.decode_token(&token).await?;

        Ok(Response::new(pb::DecodeTokenResponse {
            user: Some(user_to_pb(me.user.user, me.user.account)),
            employee: me.employee.map(employee_to_pb),
            roles: me.roles.into_iter().map(role_to_pb).collect(),
            perms: me.perms.into_iter().map(perm_to_pb).collect(),
        }))
    }

    async fn refresh_token(
        &self,
        request: Request<pb::RefreshTokenRequest>,
    ) -> Result<Response<pb::RefreshTokenResponse>, Status> {
        let token = request.into_inner().refresh_token;

        let refreshed = self.state.auth_service.refresh_token(&token).await?;

        Ok(Response::new(pb::RefreshTokenResponse {
            access_token: refreshed.access_token,
            refresh_token: refreshed.refresh_token,
            token_type: refreshed.token_type,
            expires_in: refreshed.expires_in,
        }))
    }
}

// ---
// Request parsing
// ---

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidInput(format!("'{}' is not a valid id", raw)))
}

fn parse_ids(raw: &[String]) -> Result<Vec<Uuid>, AppError> {
    raw.iter().map(|id| parse_id(id)).collect()
}

/// Zero or negative means "use the default".
fn pagination(page: i32, page_size: i32) -> Pagination {
    Pagination {
        page: u32::try_from(page).ok().filter(|p| *p > 0),
        page_size: u32::try_from(page_size).ok().filter(|s| *s > 0),
    }
}

// ---
// Domain -> wire
// ---

fn account_to_pb(account: Account) -> pb::Account {
    pb::Account {
        id: account.id.to_string(),
        username: account.username,
        status: account.status.as_str().to_string(),
        created_at: Some(datetime_to_timestamp(account.created_at)),
        updated_at: Some(datetime_to_timestamp(account.updated_at)),
    }
}

fn user_to_pb(user: User, account: Option<Account>) -> pb::User {
    pb::User {
        id: user.id.to_string(),
        first_name: user.first_name,
        last_name: user.last_name,
        gender: user.gender.as_str().to_string(),
        phone: user.phone,
        email: user.email,
        ward_code: user.ward_code,
        address: user.address,
        avatar: user.avatar,
        company_id: user.company_id,
        created_at: Some(datetime_to_timestamp(user.created_at)),
        updated_at: Some(datetime_to_timestamp(user.updated_at)),
        account: account.map(account_to_pb),
    }
}

fn perm_to_pb(perm: Permission) -> pb::Perm {
    pb::Perm {
        code: perm.code,
        name: perm.name,
        description: perm.description,
    }
}

fn role_to_pb(role: Role) -> pb::Role {
    pb::Role {
        code: role.code,
        name: role.name,
        color: role.color,
        description: role.description,
        perms: role.perms.into_iter().map(perm_to_pb).collect(),
    }
}

fn employee_to_pb(employee: Employee) -> pb::Employee {
    pb::Employee {
        id: employee.id,
        code: employee.code,
        status: employee.status,
        position_id: employee.position_id,
        org_id: employee.org_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_paging_falls_back_to_defaults() {
        assert_eq!(pagination(0, -5).limit_offset(), (20, 0));
        assert_eq!(pagination(3, 10).limit_offset(), (10, 20));
        assert_eq!(pagination(1, 1000).limit_offset(), (100, 0));
    }

    #[test]
    fn bad_ids_are_invalid_input() {
        assert!(matches!(parse_id("nope"), Err(AppError::InvalidInput(_))));
        assert_eq!(
            parse_ids(&[Uuid::nil().to_string()]).unwrap(),
            vec![Uuid::nil()]
        );
    }
}
