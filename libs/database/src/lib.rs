//! Database connectors and helpers.
//!
//! # Features
//!
//! - `postgres` (default) - PostgreSQL via SeaORM, plus the per-request [`postgres::UnitOfWork`]
//! - `config` - `core_config::FromEnv` support for [`postgres::PostgresConfig`]
//!
//! # Example
//!
//! ```ignore
//! use database::postgres::{self, PostgresConfig, UnitOfWork};
//! use migration::Migrator;
//!
//! let db = postgres::connect_from_config_with_retry(PostgresConfig::new(url), None).await?;
//! postgres::run_migrations::<Migrator>(&db, "scaffold_api").await?;
//!
//! let uow = UnitOfWork::begin(&db).await?;
//! // ... statements against uow.connection() ...
//! uow.commit().await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult};
