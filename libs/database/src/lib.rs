//! Database connectivity for the workspace services.
//!
//! # Features
//!
//! - `postgres` (default) - PostgreSQL support with SeaORM
//! - `config` - `core_config::FromEnv` for [`postgres::PostgresConfig`]
//!
//! # Example
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::common::RetryConfig;
//! use database::postgres::{PostgresConfig, connect_from_config_with_retry};
//!
//! let config = PostgresConfig::from_env()?;
//! let db = connect_from_config_with_retry(config, Some(RetryConfig::new().with_max_retries(5))).await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult, RetryConfig, retry, retry_with_backoff};
