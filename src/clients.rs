// src/clients.rs
//
// Gateways to the sibling services. Services depend on the traits; the gRPC
// implementations are wired in `AppState::new`.

pub mod hr;
pub mod permission;

use std::time::Duration;

use thiserror::Error;
use tonic::transport::{Channel, Endpoint};

pub use hr::{GrpcHrGateway, HrGateway};
pub use permission::{GrpcPermissionGateway, PermissionGateway};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{service}.{method} returned {}: {}", .status.code(), .status.message())]
    Rpc {
        service: &'static str,
        method: &'static str,
        #[source]
        status: tonic::Status,
    },
}

impl GatewayError {
    pub fn rpc(service: &'static str, method: &'static str, status: tonic::Status) -> Self {
        GatewayError::Rpc {
            service,
            method,
            status,
        }
    }

    pub fn code(&self) -> tonic::Code {
        match self {
            GatewayError::Rpc { status, .. } => status.code(),
        }
    }
}

/// Builds a channel that connects on first use. Every call on it is bounded
/// by `timeout`.
pub(crate) fn lazy_channel(addr: &str, timeout: Duration) -> anyhow::Result<Channel> {
    let endpoint = Endpoint::from_shared(addr.to_string())?
        .connect_timeout(timeout)
        .timeout(timeout);
    Ok(endpoint.connect_lazy())
}
