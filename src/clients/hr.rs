// src/clients/hr.rs

use std::time::Duration;

use async_trait::async_trait;
use tonic::{transport::Channel, Code};
use uuid::Uuid;

use super::{lazy_channel, GatewayError};
use crate::models::employee::{Department, Employee, Organization, Position};
use crate::proto::{hr as pb, timestamp_to_datetime};

const SERVICE: &str = "HrService";

#[async_trait]
pub trait HrGateway: Send + Sync {
    /// `Ok(None)` when HR has no employee record for the user.
    async fn get_employee_by_user_id(&self, user_id: Uuid) -> Result<Option<Employee>, GatewayError>;
}

#[derive(Clone)]
pub struct GrpcHrGateway {
    client: pb::hr_service_client::HrServiceClient<Channel>,
}

impl GrpcHrGateway {
    pub fn connect_lazy(addr: &str, timeout: Duration) -> anyhow::Result<Self> {
        let channel = lazy_channel(addr, timeout)?;
        Ok(Self {
            client: pb::hr_service_client::HrServiceClient::new(channel),
        })
    }
}

#[async_trait]
impl HrGateway for GrpcHrGateway {
    async fn get_employee_by_user_id(&self, user_id: Uuid) -> Result<Option<Employee>, GatewayError> {
        let mut client = self.client.clone();
        let request = pb::GetEmployeeByUserIdRequest {
            user_id: user_id.to_string(),
        };

        match client.get_employee_by_user_id(request).await {
            Ok(response) => Ok(Some(Employee::from(response.into_inner()))),
            Err(status) if status.code() == Code::NotFound => Ok(None),
            Err(status) => Err(GatewayError::rpc(SERVICE, "GetEmployeeByUserId", status)),
        }
    }
}

/// "EMPLOYEE_STATUS_ACTIVE" -> "active"; unknown or unspecified -> "".
fn status_name(raw: i32) -> String {
    match pb::EmployeeStatus::try_from(raw) {
        Ok(pb::EmployeeStatus::Unspecified) | Err(_) => String::new(),
        Ok(status) => status
            .as_str_name()
            .trim_start_matches("EMPLOYEE_STATUS_")
            .to_lowercase(),
    }
}

impl From<pb::Organization> for Organization {
    fn from(o: pb::Organization) -> Self {
        Self {
            id: o.id,
            name: o.name,
            code: o.code,
        }
    }
}

impl From<pb::Department> for Department {
    fn from(d: pb::Department) -> Self {
        Self {
            id: d.id,
            name: d.name,
            code: d.code,
            organization: d.organization.map(Organization::from),
        }
    }
}

impl From<pb::Position> for Position {
    fn from(p: pb::Position) -> Self {
        Self {
            id: p.id,
            name: p.name,
            code: p.code,
            department: p.department.map(Department::from),
        }
    }
}

impl From<pb::Employee> for Employee {
    fn from(e: pb::Employee) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            code: e.code,
            status: status_name(e.status),
            position_id: e.position_id,
            joining_at: timestamp_to_datetime(e.joining_at),
            org_id: e.org_id,
            created_at: timestamp_to_datetime(e.created_at),
            updated_at: timestamp_to_datetime(e.updated_at),
            position: e.position.map(Position::from),
        }
    }
}
