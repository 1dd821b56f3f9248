//! PostgreSQL connection management, health checks and the per-request unit of work.

mod config;
mod connector;
mod health;
mod unit_of_work;

pub use config::PostgresConfig;
pub use connector::{connect_from_config_with_retry, connect_with_options, run_migrations};
pub use health::check_health;
pub use unit_of_work::UnitOfWork;

// Re-export SeaORM types for convenience
pub use sea_orm::{ConnectOptions, DatabaseConnection, DatabaseTransaction, DbErr};
pub use sea_orm_migration::MigratorTrait;
