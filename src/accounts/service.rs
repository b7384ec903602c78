use std::sync::Arc;

use tracing::info;

use crate::db::models::{NewDevice, NewUser};
use crate::db::{Store, StoreError};
use crate::error::ServiceError;

/// Placeholder location for the device assigned at registration.
const DEFAULT_PLACE: &str = "Not specified";

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Registers a new account and assigns its default microcontroller,
    /// named `"<username>'s MCU"`.
    ///
    /// All three fields are required and checked before anything is written.
    /// The user row and the device row land in one store transaction, so a
    /// failure after the user insert leaves no partial state behind. A taken
    /// username is detected through the store's uniqueness constraint rather
    /// than a separate existence query.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: &str,
    ) -> Result<i64, ServiceError> {
        if username.is_empty() || password.is_empty() || email.is_empty() {
            return Err(ServiceError::Validation("All fields are required."));
        }

        let password_hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;

        let user = NewUser {
            username: username.to_owned(),
            password_hash,
            email: email.to_owned(),
        };
        let device = NewDevice {
            name: format!("{username}'s MCU"),
            place: DEFAULT_PLACE.to_owned(),
        };

        let user_id = self
            .store
            .create_user_with_device(user, device)
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation => ServiceError::DuplicateUsername,
                other => ServiceError::Store(other),
            })?;

        info!(username = %username, user_id, "registered user with default MCU");
        Ok(user_id)
    }

    /// Verifies credentials and returns the account id. No session or token
    /// is issued; callers treat the id as an ordinary request parameter on
    /// subsequent calls.
    pub async fn login(&self, username: &str, password: &str) -> Result<i64, ServiceError> {
        let user = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if !bcrypt::verify(password, &user.password_hash)? {
            return Err(ServiceError::BadCredentials);
        }

        info!(username = %username, user_id = user.id, "login succeeded");
        Ok(user.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::mem::MemStore;

    fn service(store: &Arc<MemStore>) -> AccountService {
        AccountService::new(store.clone())
    }

    #[tokio::test]
    async fn register_rejects_missing_fields_before_writing() {
        let store = Arc::new(MemStore::new());
        let accounts = service(&store);

        let err = accounts.register("alice", "", "a@example.com").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.user_count().await, 0);
        assert_eq!(store.device_count().await, 0);
    }

    #[tokio::test]
    async fn register_then_login_round_trips_the_user_id() {
        let store = Arc::new(MemStore::new());
        let accounts = service(&store);

        let registered = accounts
            .register("alice", "hunter2", "a@example.com")
            .await
            .unwrap();
        let logged_in = accounts.login("alice", "hunter2").await.unwrap();
        assert_eq!(registered, logged_in);
    }

    #[tokio::test]
    async fn login_distinguishes_unknown_user_from_bad_password() {
        let store = Arc::new(MemStore::new());
        let accounts = service(&store);
        accounts
            .register("alice", "hunter2", "a@example.com")
            .await
            .unwrap();

        let err = accounts.login("bob", "hunter2").await.unwrap_err();
        assert!(matches!(err, ServiceError::UserNotFound));

        let err = accounts.login("alice", "wrongpass").await.unwrap_err();
        assert!(matches!(err, ServiceError::BadCredentials));
    }

    #[tokio::test]
    async fn duplicate_registration_maps_to_duplicate_username() {
        let store = Arc::new(MemStore::new());
        let accounts = service(&store);
        accounts
            .register("alice", "hunter2", "a@example.com")
            .await
            .unwrap();

        let err = accounts
            .register("alice", "other", "b@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateUsername));
        assert_eq!(store.user_count().await, 1);
    }
}
