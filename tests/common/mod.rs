#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use uuid::Uuid;

use hrm_user_service::{
    clients::{GatewayError, HrGateway, PermissionGateway},
    config::{AppState, Config},
    db::MemoryCredentialStore,
    models::{
        auth::{Gender, LoginUserPayload, RegisterUserPayload},
        employee::Employee,
        rbac::{Permission, Role},
    },
};

pub const PASSWORD: &str = "pw123456";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".into(),
        db_max_connections: 1,
        jwt_secret: "integration-test-secret".into(),
        jwt_issuer: "hrm-user-service-test".into(),
        access_token_ttl: chrono::Duration::minutes(15),
        refresh_token_ttl: chrono::Duration::hours(168),
        bcrypt_cost: 4,
        hr_service_addr: "http://127.0.0.1:1".into(),
        permission_service_addr: "http://127.0.0.1:1".into(),
        rpc_timeout: StdDuration::from_secs(1),
        request_timeout: StdDuration::from_secs(10),
        http_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        grpc_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
    }
}

// ---
// Fake Permission service
// ---

#[derive(Default)]
pub struct FakePermissionService {
    /// Roles every user holds.
    pub roles: Mutex<Vec<Role>>,
    /// Directly assigned permissions every user holds.
    pub direct: Mutex<Vec<Permission>>,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    /// Fails role assignment only, after permission assignment went through.
    pub fail_role_writes: AtomicBool,
    pub fail_deletes: AtomicBool,
    /// user id -> (perm ids, role ids) last assigned
    pub assignments: Mutex<HashMap<Uuid, (Vec<Uuid>, Vec<Uuid>)>>,
    pub cleaned_up: Mutex<Vec<Uuid>>,
}

impl FakePermissionService {
    pub fn set_roles(&self, roles: Vec<Role>) {
        *self.roles.lock().unwrap() = roles;
    }
}

fn down(method: &'static str) -> GatewayError {
    GatewayError::rpc("PermissionService", method, tonic::Status::unavailable("connection refused"))
}

#[async_trait]
impl PermissionGateway for FakePermissionService {
    async fn get_user_perms(&self, _user_id: Uuid) -> Result<Vec<Permission>, GatewayError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(down("GetUserPerms"));
        }
        Ok(self.direct.lock().unwrap().clone())
    }

    async fn get_user_roles(&self, _user_id: Uuid) -> Result<Vec<Role>, GatewayError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(down("GetUserRoles"));
        }
        Ok(self.roles.lock().unwrap().clone())
    }

    async fn update_user_perms(&self, user_id: Uuid, perm_ids: &[Uuid]) -> Result<(), GatewayError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(down("UpdateUserPerms"));
        }
        self.assignments.lock().unwrap().entry(user_id).or_default().0 = perm_ids.to_vec();
        Ok(())
    }

    async fn update_user_roles(&self, user_id: Uuid, role_ids: &[Uuid]) -> Result<(), GatewayError> {
        if self.fail_writes.load(Ordering::SeqCst) || self.fail_role_writes.load(Ordering::SeqCst) {
            return Err(down("UpdateUserRoles"));
        }
        self.assignments.lock().unwrap().entry(user_id).or_default().1 = role_ids.to_vec();
        Ok(())
    }

    async fn delete_user_perms(&self, user_id: Uuid) -> Result<(), GatewayError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(down("DeleteUserPermsByUserId"));
        }
        if let Some(assigned) = self.assignments.lock().unwrap().get_mut(&user_id) {
            assigned.0.clear();
        }
        self.cleaned_up.lock().unwrap().push(user_id);
        Ok(())
    }

    async fn delete_user_roles(&self, user_id: Uuid) -> Result<(), GatewayError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(down("DeleteUserRolesByUserId"));
        }
        if let Some(assigned) = self.assignments.lock().unwrap().get_mut(&user_id) {
            assigned.1.clear();
        }
        Ok(())
    }
}

// ---
// Fake HR service
// ---

#[derive(Default)]
pub struct FakeHrService {
    pub employee: Mutex<Option<Employee>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl HrGateway for FakeHrService {
    async fn get_employee_by_user_id(&self, user_id: Uuid) -> Result<Option<Employee>, GatewayError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GatewayError::rpc(
                "HrService",
                "GetEmployeeByUserId",
                tonic::Status::deadline_exceeded("timeout"),
            ));
        }
        Ok(self.employee.lock().unwrap().clone().map(|mut e| {
            e.user_id = user_id.to_string();
            e
        }))
    }
}

// ---
// Fixtures
// ---

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryCredentialStore>,
    pub perms: Arc<FakePermissionService>,
    pub hr: Arc<FakeHrService>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryCredentialStore::new());
        let perms = Arc::new(FakePermissionService::default());
        let hr = Arc::new(FakeHrService::default());

        let state = AppState::from_parts(config, store.clone(), perms.clone(), hr.clone());

        Self { state, store, perms, hr }
    }
}

pub fn permission(code: &str) -> Permission {
    Permission {
        id: Uuid::new_v4().to_string(),
        code: code.into(),
        name: code.into(),
        description: None,
    }
}

pub fn role(code: &str, perm_codes: &[&str]) -> Role {
    Role {
        id: Uuid::new_v4().to_string(),
        code: code.into(),
        name: code.into(),
        color: None,
        description: None,
        perms: perm_codes.iter().map(|c| permission(c)).collect(),
        created_at: None,
        updated_at: None,
    }
}

pub fn employee(id: i64, org_id: Option<i64>, status: &str) -> Employee {
    Employee {
        id,
        user_id: String::new(),
        code: format!("EMP-{:04}", id),
        status: status.into(),
        position_id: None,
        joining_at: None,
        org_id,
        created_at: None,
        updated_at: None,
        position: None,
    }
}

pub fn register_payload(username: &str, phone: &str) -> RegisterUserPayload {
    RegisterUserPayload {
        username: username.into(),
        password: PASSWORD.into(),
        first_name: "Alice".into(),
        last_name: "Nguyen".into(),
        email: None,
        phone: phone.into(),
        ward_code: None,
        address: None,
        avatar: None,
        gender: Gender::Female,
        company_id: None,
    }
}

pub fn login_payload(username: &str, password: &str) -> LoginUserPayload {
    LoginUserPayload {
        username: username.into(),
        password: password.into(),
    }
}
