// src/config.rs

use std::{env, net::SocketAddr, str::FromStr, sync::Arc, time::Duration as StdDuration};

use anyhow::Context;
use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::{
    clients::{GrpcHrGateway, GrpcPermissionGateway, HrGateway, PermissionGateway},
    db::{CredentialStore, PgCredentialStore},
    services::{AuthService, EmployeeService, RbacService, TokenCodec, UserService},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("invalid duration '{0}'")]
    InvalidDuration(String),
}

/// Process configuration, read once at start-up.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub access_token_ttl: chrono::Duration,
    pub refresh_token_ttl: chrono::Duration,
    pub bcrypt_cost: u32,
    pub hr_service_addr: String,
    pub permission_service_addr: String,
    pub rpc_timeout: StdDuration,
    pub request_timeout: StdDuration,
    pub http_addr: SocketAddr,
    pub grpc_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = required("JWT_SECRET")?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 5)?,
            jwt_secret,
            jwt_issuer: optional("JWT_ISSUER").unwrap_or_else(|| "hrm-user-service".into()),
            access_token_ttl: token_ttl_var("JWT_ACCESS_TOKEN_DURATION", "15m")?,
            refresh_token_ttl: token_ttl_var("JWT_REFRESH_TOKEN_DURATION", "168h")?,
            bcrypt_cost: parsed("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            hr_service_addr: optional("HR_SERVICE_ADDR").unwrap_or_else(|| "http://127.0.0.1:50052".into()),
            permission_service_addr: optional("PERMISSION_SERVICE_ADDR")
                .unwrap_or_else(|| "http://127.0.0.1:50053".into()),
            rpc_timeout: std_duration_var("RPC_TIMEOUT", "5s")?,
            request_timeout: std_duration_var("REQUEST_TIMEOUT", "30s")?,
            http_addr: parsed("HTTP_ADDR", SocketAddr::from(([0, 0, 0, 0], 8089)))?,
            grpc_addr: parsed("GRPC_ADDR", SocketAddr::from(([0, 0, 0, 0], 50051)))?,
        })
    }
}

fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::Missing(var))
}

fn parsed<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(var) {
        None => Ok(default),
        Some(value) => {
            let result = value.trim().parse::<T>();
            result.map_err(|e| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            })
        }
    }
}

fn duration_var(var: &'static str, default: &str) -> Result<chrono::Duration, ConfigError> {
    let value = optional(var).unwrap_or_else(|| default.to_string());
    parse_duration(&value).map_err(|e| ConfigError::Invalid {
        var,
        value,
        reason: e.to_string(),
    })
}

fn token_ttl_var(var: &'static str, default: &str) -> Result<chrono::Duration, ConfigError> {
    check_token_ttl(var, duration_var(var, default)?)
}

/// A token lifetime must be positive and leave a representable expiry.
fn check_token_ttl(var: &'static str, ttl: chrono::Duration) -> Result<chrono::Duration, ConfigError> {
    let reason = if ttl <= chrono::Duration::zero() {
        "must be positive"
    } else if Utc::now().checked_add_signed(ttl).is_none() {
        "is too large"
    } else {
        return Ok(ttl);
    };
    Err(ConfigError::Invalid {
        var,
        value: ttl.to_string(),
        reason: reason.into(),
    })
}

fn std_duration_var(var: &'static str, default: &str) -> Result<StdDuration, ConfigError> {
    let duration = duration_var(var, default)?;
    duration.to_std().map_err(|_| ConfigError::Invalid {
        var,
        value: duration.to_string(),
        reason: "must not be negative".into(),
    })
}

/// Parses durations such as `15m`, `1h30m`, `500ms` or `-1s`.
/// Units: `ms`, `s`, `m`, `h`, `d`.
pub fn parse_duration(input: &str) -> Result<chrono::Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(input.to_string());

    let s = input.trim();
    let (negative, mut rest) = match s.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, s),
    };
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total = chrono::Duration::zero();
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).ok_or_else(invalid)?;
        if digits == 0 {
            return Err(invalid());
        }
        let amount: i64 = rest[..digits].parse().map_err(|_| invalid())?;
        rest = &rest[digits..];

        let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => chrono::Duration::try_milliseconds(amount),
            "s" => chrono::Duration::try_seconds(amount),
            "m" => chrono::Duration::try_minutes(amount),
            "h" => chrono::Duration::try_hours(amount),
            "d" => chrono::Duration::try_days(amount),
            _ => None,
        }
        .ok_or_else(invalid)?;
        rest = &rest[unit_len..];

        total = total.checked_add(&part).ok_or_else(invalid)?;
    }

    Ok(if negative { -total } else { total })
}

// ---
// Shared application state
// ---

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub user_service: UserService,
}

impl AppState {
    /// Production wiring: Postgres store and gRPC gateways.
    pub fn new(config: Config, db_pool: PgPool) -> anyhow::Result<Self> {
        let permission_gateway = GrpcPermissionGateway::connect_lazy(&config.permission_service_addr, config.rpc_timeout)
            .context("invalid PERMISSION_SERVICE_ADDR")?;
        let hr_gateway = GrpcHrGateway::connect_lazy(&config.hr_service_addr, config.rpc_timeout)
            .context("invalid HR_SERVICE_ADDR")?;

        Ok(Self::from_parts(
            config,
            Arc::new(PgCredentialStore::new(db_pool)),
            Arc::new(permission_gateway),
            Arc::new(hr_gateway),
        ))
    }

    /// Builds the dependency graph from already constructed collaborators.
    pub fn from_parts(
        config: Config,
        store: Arc<dyn CredentialStore>,
        permission_gateway: Arc<dyn PermissionGateway>,
        hr_gateway: Arc<dyn HrGateway>,
    ) -> Self {
        let tokens = TokenCodec::new(config.jwt_secret.as_bytes(), config.jwt_issuer.clone());
        let rbac = RbacService::new(permission_gateway);
        let employees = EmployeeService::new(hr_gateway);

        let auth_service = AuthService::new(&config, store.clone(), rbac.clone(), employees, tokens);
        let user_service = UserService::new(&config, store, rbac);

        Self {
            config: Arc::new(config),
            auth_service,
            user_service,
        }
    }
}

pub async fn connect_db(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(StdDuration::from_secs(3))
        .connect(&config.database_url)
        .await
        .context("failed to connect to the database")?;

    tracing::info!("✅ Database connection established");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_and_compound_durations() {
        assert_eq!(parse_duration("15m").unwrap(), chrono::Duration::minutes(15));
        assert_eq!(parse_duration("168h").unwrap(), chrono::Duration::hours(168));
        assert_eq!(
            parse_duration("1h30m").unwrap(),
            chrono::Duration::minutes(90)
        );
        assert_eq!(parse_duration("500ms").unwrap(), chrono::Duration::milliseconds(500));
        assert_eq!(parse_duration("2d").unwrap(), chrono::Duration::days(2));
    }

    #[test]
    fn leading_minus_negates() {
        assert_eq!(parse_duration("-1s").unwrap(), chrono::Duration::seconds(-1));
    }

    #[test]
    fn token_lifetimes_must_be_positive() {
        for ttl in [chrono::Duration::zero(), parse_duration("-1s").unwrap()] {
            let err = check_token_ttl("JWT_ACCESS_TOKEN_DURATION", ttl).unwrap_err();
            assert!(err.to_string().contains("must be positive"), "{}", err);
        }
    }

    #[test]
    fn token_lifetimes_must_fit_the_calendar() {
        let huge = parse_duration("300000000d").unwrap();

        let err = check_token_ttl("JWT_REFRESH_TOKEN_DURATION", huge).unwrap_err();

        assert!(err.to_string().contains("too large"), "{}", err);
        assert_eq!(
            check_token_ttl("JWT_REFRESH_TOKEN_DURATION", chrono::Duration::minutes(15)).unwrap(),
            chrono::Duration::minutes(15)
        );
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "-", "15", "m", "15x", "1h30", "ten minutes", "1.5h"] {
            assert!(parse_duration(bad).is_err(), "'{}' was accepted", bad);
        }
    }
}
