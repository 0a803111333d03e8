//! Users Domain
//!
//! Create, delete and list users. Create and delete run as tracked
//! operations whose status can be looked up through `domain_operations`.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, operation id header
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Duplicate check, password hashing, retry + status tracking
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + in-memory and PostgreSQL implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entity, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_operations::OperationStatusStore;
//! use domain_users::{handlers, InMemoryUserRepository, UserService};
//!
//! let operations = OperationStatusStore::new();
//! let service = UserService::new(InMemoryUserRepository::new()).with_operations(operations);
//!
//! let router = axum::Router::new().nest("/users", handlers::router(service));
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{CreateUser, CreateUserResponse, DeleteUserResponse, User, UserResponse};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
