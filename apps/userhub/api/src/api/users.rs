use axum::Router;
use domain_users::{InMemoryUserRepository, PgUserRepository, UserRepository, UserService, handlers};

use crate::state::AppState;

pub fn router(state: &AppState) -> Router {
    match &state.db {
        Some(db) => handlers::router(service(PgUserRepository::new(db.clone()), state)),
        None => handlers::router(service(InMemoryUserRepository::new(), state)),
    }
}

fn service<R: UserRepository + 'static>(repository: R, state: &AppState) -> UserService<R> {
    UserService::new(repository)
        .with_operations(state.operations.clone())
        .with_retry(state.config.retry.clone())
}
