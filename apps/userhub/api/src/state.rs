//! Application state management.
//!
//! This module defines the shared application state used to build the routers.

use domain_operations::OperationStatusStore;

/// Shared application state.
///
/// Cloning is cheap: the connection pool and the status store are both
/// reference-counted.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL connection pool, absent in in-memory mode
    pub db: Option<database::postgres::DatabaseConnection>,
    /// Status of create/delete operations, shared by the users and status routes
    pub operations: OperationStatusStore,
}
