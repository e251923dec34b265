use async_trait::async_trait;
use catalogo_core::{NewUser, User, now_utc, unix_micros};
use catalogo_storage::{StorageError, UserStorage};

use crate::keys;
use crate::storage::{KvStorage, kv_error};

#[async_trait]
impl UserStorage for KvStorage {
    /// Check-then-insert on the email key. Two concurrent registrations of
    /// the same email can both pass the check; the later write wins.
    async fn create(&self, user: NewUser) -> Result<User, StorageError> {
        let data_key = keys::user_data(&user.email);
        if self.kv().get(&data_key).await.map_err(kv_error)?.is_some() {
            return Err(StorageError::already_exists("user", user.email));
        }

        let user = User::from_new(user, now_utc());
        self.write_json(&data_key, &user).await?;
        self.kv()
            .set(&keys::user_id(&user.id), &user.email, None)
            .await
            .map_err(kv_error)?;
        self.kv()
            .index_add(keys::USER_INDEX, &user.email, unix_micros(user.created_at))
            .await
            .map_err(kv_error)?;
        tracing::debug!(id = %user.id, "user created");
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StorageError> {
        self.read_json(&keys::user_data(email)).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StorageError> {
        let Some(email) = self.kv().get(&keys::user_id(id)).await.map_err(kv_error)? else {
            return Ok(None);
        };
        let user: Option<User> = self.read_json(&keys::user_data(&email)).await?;
        // The pointer may outlive a re-registered email.
        Ok(user.filter(|u| u.id == id))
    }

    async fn delete(&self, id: &str) -> Result<Option<User>, StorageError> {
        let Some(user) = UserStorage::find_by_id(self, id).await? else {
            return Ok(None);
        };
        self.kv()
            .delete(&keys::user_data(&user.email))
            .await
            .map_err(kv_error)?;
        self.kv()
            .delete(&keys::user_id(id))
            .await
            .map_err(kv_error)?;
        self.kv()
            .index_remove(keys::USER_INDEX, &user.email)
            .await
            .map_err(kv_error)?;
        Ok(Some(user))
    }

    fn backend_name(&self) -> &'static str {
        "kv"
    }
}
