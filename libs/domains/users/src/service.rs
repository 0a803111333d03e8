use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use database::common::{RetryConfig, retry_when};
use domain_operations::{OperationId, OperationStatusStore, run_tracked};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, User, UserResponse, normalize_email};
use crate::repository::UserRepository;

/// Service layer for User business logic
///
/// Create and delete run as tracked operations: each call is dispatched onto
/// the runtime under the service's [`RetryConfig`], with status transitions
/// written to the shared [`OperationStatusStore`]. Only
/// [`UserError::is_transient`] failures are retried; duplicate email and
/// not-found outcomes resolve after a single attempt.
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
    operations: OperationStatusStore,
    retry: RetryConfig,
}

impl<R: UserRepository + 'static> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
            operations: OperationStatusStore::new(),
            retry: RetryConfig::default(),
        }
    }

    /// Share a status store with other components (e.g. the status endpoint)
    pub fn with_operations(mut self, operations: OperationStatusStore) -> Self {
        self.operations = operations;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn operations(&self) -> &OperationStatusStore {
        &self.operations
    }

    /// Create a new user with a hashed password
    ///
    /// Every attempt re-checks the email before writing, and the repository's
    /// uniqueness rule decides races between concurrent creates.
    pub async fn create_user(
        &self,
        operation_id: &OperationId,
        input: CreateUser,
    ) -> UserResult<UserResponse> {
        let input = Arc::new(CreateUser {
            email: normalize_email(&input.email),
            ..input
        });
        let repository = Arc::clone(&self.repository);

        let created = run_tracked(
            &self.operations,
            operation_id,
            &self.retry,
            UserError::is_transient,
            move || {
                let repository = Arc::clone(&repository);
                let input = Arc::clone(&input);
                async move { create_attempt(&*repository, &input).await }
            },
        )
        .await?;

        tracing::info!(operation_id = %operation_id, user_id = %created.id, "Created user");
        Ok(created.into())
    }

    /// Delete a user by ID
    pub async fn delete_user(&self, operation_id: &OperationId, id: Uuid) -> UserResult<()> {
        let repository = Arc::clone(&self.repository);

        run_tracked(
            &self.operations,
            operation_id,
            &self.retry,
            UserError::is_transient,
            move || {
                let repository = Arc::clone(&repository);
                async move { delete_attempt(&*repository, id).await }
            },
        )
        .await?;

        tracing::info!(operation_id = %operation_id, user_id = %id, "Deleted user");
        Ok(())
    }

    /// List all users, oldest first
    pub async fn list_users(&self) -> UserResult<Vec<UserResponse>> {
        let users = retry_when(|| self.repository.list(), &self.retry, UserError::is_transient).await?;
        Ok(users.into_iter().map(Into::into).collect())
    }
}

async fn create_attempt<R: UserRepository + ?Sized>(
    repository: &R,
    input: &CreateUser,
) -> UserResult<User> {
    if repository.find_by_email(&input.email).await?.is_some() {
        return Err(UserError::DuplicateEmail(input.email.clone()));
    }

    let password_hash = hash_password(input.password.clone()).await?;
    let user = User::new(
        input.first_name.clone(),
        input.last_name.clone(),
        &input.email,
        password_hash,
    );

    repository.insert(user).await
}

/// One delete attempt: existence check, then removal.
///
/// The check keeps retries safe but means a delete that committed before a
/// transient error surfaced is reported as `NotFound` on the next attempt.
async fn delete_attempt<R: UserRepository + ?Sized>(repository: &R, id: Uuid) -> UserResult<()> {
    if repository.find_by_id(id).await?.is_none() {
        return Err(UserError::NotFound(id));
    }

    // Lost a race with another delete
    if !repository.delete(id).await? {
        return Err(UserError::NotFound(id));
    }
    Ok(())
}

/// Argon2 is CPU-bound, so it runs on the blocking pool.
async fn hash_password(password: String) -> UserResult<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| UserError::PasswordHash(e.to_string()))
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{InMemoryUserRepository, MockUserRepository};
    use argon2::{PasswordHash, PasswordVerifier};
    use async_trait::async_trait;
    use domain_operations::OperationStatus;
    use mockall::predicate;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Barrier;

    fn fast_retry() -> RetryConfig {
        RetryConfig::new().with_initial_delay(1).with_max_delay(5)
    }

    fn input(email: &str) -> CreateUser {
        CreateUser {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password: "secret".into(),
        }
    }

    fn existing(email: &str) -> User {
        User::new("Grace".into(), "Hopper".into(), email, "hash".into())
    }

    /// Lets every caller pass the email check before any of them inserts.
    struct RacingRepository {
        inner: InMemoryUserRepository,
        barrier: Barrier,
    }

    #[async_trait]
    impl UserRepository for RacingRepository {
        async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
            let found = self.inner.find_by_email(email).await?;
            self.barrier.wait().await;
            Ok(found)
        }

        async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
            self.inner.find_by_id(id).await
        }

        async fn insert(&self, user: User) -> UserResult<User> {
            self.inner.insert(user).await
        }

        async fn delete(&self, id: Uuid) -> UserResult<bool> {
            self.inner.delete(id).await
        }

        async fn list(&self) -> UserResult<Vec<User>> {
            self.inner.list().await
        }
    }

    /// Fails the first `failures` inserts with a transient error, writing nothing.
    struct FlakyRepository {
        inner: InMemoryUserRepository,
        failures: u32,
        inserts: AtomicU32,
    }

    #[async_trait]
    impl UserRepository for FlakyRepository {
        async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
            self.inner.find_by_email(email).await
        }

        async fn find_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
            self.inner.find_by_id(id).await
        }

        async fn insert(&self, user: User) -> UserResult<User> {
            let attempt = self.inserts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                return Err(UserError::DataAccess("connection reset".into()));
            }
            self.inner.insert(user).await
        }

        async fn delete(&self, id: Uuid) -> UserResult<bool> {
            self.inner.delete(id).await
        }

        async fn list(&self) -> UserResult<Vec<User>> {
            self.inner.list().await
        }
    }

    #[tokio::test]
    async fn test_create_stores_hash_not_plaintext() {
        let repo = InMemoryUserRepository::new();
        let service = UserService::new(repo.clone()).with_retry(fast_retry());
        let op = OperationId::generate();

        let created = service.create_user(&op, input("ada@example.com")).await.unwrap();

        let stored = repo.find_by_id(created.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret");

        let parsed = PasswordHash::new(&stored.password_hash).unwrap();
        assert!(Argon2::default().verify_password(b"secret", &parsed).is_ok());
        assert_eq!(
            service.operations().get_status(op.as_str()),
            OperationStatus::Completed.to_string()
        );
    }

    #[tokio::test]
    async fn test_create_normalizes_email() {
        let service = UserService::new(InMemoryUserRepository::new());
        let created = service
            .create_user(&OperationId::generate(), input("  Ada@Example.com "))
            .await
            .unwrap();

        assert_eq!(created.email, "ada@example.com");

        let result = service
            .create_user(&OperationId::generate(), input("ADA@example.com"))
            .await;
        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_duplicate_detected_by_check_is_not_retried() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_email()
            .with(predicate::eq("ada@example.com"))
            .times(1)
            .returning(|email| Ok(Some(existing(email))));
        mock_repo.expect_insert().never();

        let service = UserService::new(mock_repo).with_retry(fast_retry());
        let op = OperationId::generate();
        let result = service.create_user(&op, input("ada@example.com")).await;

        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
        assert_eq!(
            service.operations().get_status(op.as_str()),
            OperationStatus::Failed.to_string()
        );
    }

    #[tokio::test]
    async fn test_duplicate_detected_on_insert_is_not_retried() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_find_by_email().times(1).returning(|_| Ok(None));
        mock_repo
            .expect_insert()
            .times(1)
            .returning(|user| Err(UserError::DuplicateEmail(user.email)));

        let service = UserService::new(mock_repo).with_retry(fast_retry());
        let result = service
            .create_user(&OperationId::generate(), input("ada@example.com"))
            .await;

        assert!(matches!(result, Err(UserError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_transient_failures_exhaust_attempts() {
        let mut mock_repo = MockUserRepository::new();
        mock_repo.expect_find_by_email().times(3).returning(|_| Ok(None));
        mock_repo
            .expect_insert()
            .times(3)
            .returning(|_| Err(UserError::DataAccess("connection refused".into())));

        let service = UserService::new(mock_repo).with_retry(fast_retry());
        let op = OperationId::generate();
        let result = service.create_user(&op, input("ada@example.com")).await;

        assert!(matches!(result, Err(UserError::DataAccess(_))));
        assert_eq!(
            service.operations().get_status(op.as_str()),
            OperationStatus::Failed.to_string()
        );
    }

    #[tokio::test]
    async fn test_transient_failure_then_success_writes_one_row() {
        let inner = InMemoryUserRepository::new();
        let service = UserService::new(FlakyRepository {
            inner: inner.clone(),
            failures: 1,
            inserts: AtomicU32::new(0),
        })
        .with_retry(fast_retry());
        let op = OperationId::generate();

        let created = service.create_user(&op, input("ada@example.com")).await.unwrap();

        let users = inner.list().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, created.id);
        assert_eq!(
            service.operations().get_status(op.as_str()),
            OperationStatus::Completed.to_string()
        );
    }

    #[tokio::test]
    async fn test_concurrent_creates_same_email_one_wins() {
        let inner = InMemoryUserRepository::new();
        let service = UserService::new(RacingRepository {
            inner: inner.clone(),
            barrier: Barrier::new(2),
        })
        .with_retry(fast_retry());

        let first_op = OperationId::generate();
        let second_op = OperationId::generate();
        let (first, second) = tokio::join!(
            service.create_user(&first_op, input("ada@example.com")),
            service.create_user(&second_op, input("ada@example.com")),
        );

        let outcomes = [first, second];
        let succeeded = outcomes.iter().filter(|r| r.is_ok()).count();
        let duplicates = outcomes
            .iter()
            .filter(|r| matches!(r, Err(UserError::DuplicateEmail(_))))
            .count();

        assert_eq!(succeeded, 1);
        assert_eq!(duplicates, 1);
        assert_eq!(inner.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_user_is_not_found() {
        let id = Uuid::now_v7();
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_id()
            .with(predicate::eq(id))
            .times(1)
            .returning(|_| Ok(None));
        mock_repo.expect_delete().never();

        let service = UserService::new(mock_repo).with_retry(fast_retry());
        let op = OperationId::generate();
        let result = service.delete_user(&op, id).await;

        assert!(matches!(result, Err(UserError::NotFound(missing)) if missing == id));
        assert_eq!(
            service.operations().get_status(op.as_str()),
            OperationStatus::Failed.to_string()
        );
    }

    #[tokio::test]
    async fn test_delete_known_user_removes_it() {
        let repo = InMemoryUserRepository::new();
        let service = UserService::new(repo.clone()).with_retry(fast_retry());
        let created = service
            .create_user(&OperationId::generate(), input("ada@example.com"))
            .await
            .unwrap();

        let op = OperationId::generate();
        service.delete_user(&op, created.id).await.unwrap();

        assert!(repo.find_by_id(created.id).await.unwrap().is_none());
        assert_eq!(
            service.operations().get_status(op.as_str()),
            OperationStatus::Completed.to_string()
        );
    }

    #[tokio::test]
    async fn test_hash_password_off_runtime_verifies() {
        let hash = hash_password("secret".to_string()).await.unwrap();

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default().verify_password(b"secret", &parsed).is_ok());
        assert!(Argon2::default().verify_password(b"other", &parsed).is_err());
    }

    #[tokio::test]
    async fn test_delete_transient_failure_then_success() {
        let id = Uuid::now_v7();
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_id()
            .with(predicate::eq(id))
            .times(2)
            .returning(|_| Ok(Some(existing("grace@example.com"))));
        let mut calls = 0;
        mock_repo
            .expect_delete()
            .with(predicate::eq(id))
            .times(2)
            .returning(move |_| {
                calls += 1;
                if calls == 1 {
                    Err(UserError::DataAccess("connection reset".into()))
                } else {
                    Ok(true)
                }
            });

        let service = UserService::new(mock_repo).with_retry(fast_retry());
        let op = OperationId::generate();
        let result = service.delete_user(&op, id).await;

        assert!(result.is_ok());
        assert_eq!(
            service.operations().get_status(op.as_str()),
            OperationStatus::Completed.to_string()
        );
    }

    #[tokio::test]
    async fn test_delete_transient_failures_exhaust_attempts() {
        let id = Uuid::now_v7();
        let mut mock_repo = MockUserRepository::new();
        mock_repo
            .expect_find_by_id()
            .times(3)
            .returning(|_| Ok(Some(existing("grace@example.com"))));
        mock_repo
            .expect_delete()
            .times(3)
            .returning(|_| Err(UserError::DataAccess("connection refused".into())));

        let service = UserService::new(mock_repo).with_retry(fast_retry());
        let op = OperationId::generate();
        let result = service.delete_user(&op, id).await;

        assert!(matches!(result, Err(UserError::DataAccess(_))));
        assert_eq!(
            service.operations().get_status(op.as_str()),
            OperationStatus::Failed.to_string()
        );
    }

    #[tokio::test]
    async fn test_delete_committed_before_transient_error_reports_not_found() {
        let id = Uuid::now_v7();
        let mut mock_repo = MockUserRepository::new();
        let mut lookups = 0;
        mock_repo
            .expect_find_by_id()
            .with(predicate::eq(id))
            .times(2)
            .returning(move |_| {
                lookups += 1;
                if lookups == 1 {
                    Ok(Some(existing("grace@example.com")))
                } else {
                    Ok(None)
                }
            });
        // The row is gone but the acknowledgement was lost.
        mock_repo
            .expect_delete()
            .with(predicate::eq(id))
            .times(1)
            .returning(|_| Err(UserError::DataAccess("connection reset".into())));

        let service = UserService::new(mock_repo).with_retry(fast_retry());
        let op = OperationId::generate();
        let result = service.delete_user(&op, id).await;

        assert!(matches!(result, Err(UserError::NotFound(_))));
        assert_eq!(
            service.operations().get_status(op.as_str()),
            OperationStatus::Failed.to_string()
        );
    }

    #[tokio::test]
    async fn test_list_retries_transient_failure() {
        let mut mock_repo = MockUserRepository::new();
        let mut calls = 0;
        mock_repo.expect_list().times(2).returning(move || {
            calls += 1;
            if calls == 1 {
                Err(UserError::DataAccess("timeout".into()))
            } else {
                Ok(vec![existing("grace@example.com")])
            }
        });

        let service = UserService::new(mock_repo).with_retry(fast_retry());
        let users = service.list_users().await.unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].email, "grace@example.com");
    }
}
