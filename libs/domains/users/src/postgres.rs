use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    SqlErr,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{UserError, UserResult},
    models::User,
    repository::UserRepository,
};

/// Map a SeaORM error onto the user error taxonomy.
///
/// Unique violations become [`UserError::DuplicateEmail`] (email is the only
/// unique column besides the primary key). Connection-level and statement
/// runtime failures are treated as transient.
pub fn classify_db_err(err: DbErr, email: Option<&str>) -> UserError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            return UserError::DuplicateEmail(email.unwrap_or_default().to_string());
        }
        Some(other) => return UserError::Internal(format!("Database error: {}", other)),
        None => {}
    }

    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) | DbErr::Exec(_) | DbErr::Query(_) => {
            UserError::DataAccess(err.to_string())
        }
        other => UserError::Internal(format!("Database error: {}", other)),
    }
}

/// PostgreSQL implementation of UserRepository
#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| classify_db_err(e, None))?;

        Ok(model.map(Into::into))
    }

    async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let model = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| classify_db_err(e, None))?;

        Ok(model.map(Into::into))
    }

    async fn insert(&self, user: User) -> UserResult<User> {
        let email = user.email.clone();
        let active_model: entity::ActiveModel = user.into();

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| classify_db_err(e, Some(&email)))?;

        tracing::info!(user_id = %model.id, "Inserted user");
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> UserResult<bool> {
        let result = entity::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| classify_db_err(e, None))?;

        if result.rows_affected > 0 {
            tracing::info!(user_id = %id, "Deleted user");
        }
        Ok(result.rows_affected > 0)
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        let models = entity::Entity::find()
            .order_by_asc(entity::Column::CreatedAt)
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| classify_db_err(e, None))?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}
