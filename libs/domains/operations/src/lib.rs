//! Operations Domain
//!
//! Tracks the status of long-running create/delete operations by an opaque
//! operation id.
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← GET /status/{operationId}
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌─────────────┐
//! │    Store    │ ◄── │   Tracker   │  ← spawned work + retry, writes transitions
//! └─────────────┘     └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_operations::{handlers, OperationStatusStore};
//!
//! let store = OperationStatusStore::new();
//! let router = axum::Router::new().nest("/status", handlers::router(store.clone()));
//! ```

pub mod handlers;
pub mod models;
pub mod store;
pub mod tracker;

pub use models::{OperationId, OperationStatus, StatusResponse};
pub use store::OperationStatusStore;
pub use tracker::run_tracked;
