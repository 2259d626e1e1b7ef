// src/services/employee_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::{clients::HrGateway, models::employee::Employee};

/// Employee affiliation is optional metadata: a failing HR service degrades
/// the answer to "no employee" instead of failing the caller.
#[derive(Clone)]
pub struct EmployeeService {
    gateway: Arc<dyn HrGateway>,
}

impl EmployeeService {
    pub fn new(gateway: Arc<dyn HrGateway>) -> Self {
        Self { gateway }
    }

    pub async fn get_employee_info(&self, user_id: Uuid) -> Option<Employee> {
        match self.gateway.get_employee_by_user_id(user_id).await {
            Ok(employee) => employee,
            Err(e) => {
                tracing::warn!("⚠️ Employee lookup for user {} failed, continuing without it: {}", user_id, e);
                None
            }
        }
    }
}
