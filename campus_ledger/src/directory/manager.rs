//! User directory manager.

use super::{
    errors::{DirectoryError, DirectoryResult},
    models::{NewUser, User, UserUpdate},
};
use crate::Money;
use crate::store::{Collection, KeyValueStore};
use chrono::Utc;
use std::sync::Arc;

/// User directory over the `users` collection
#[derive(Clone)]
pub struct UserDirectory {
    users: Collection<User>,
}

impl UserDirectory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            users: Collection::new(store),
        }
    }

    /// All users
    pub async fn list(&self) -> DirectoryResult<Vec<User>> {
        Ok(self.users.all().await?)
    }

    /// Active accounts with the student role
    pub async fn active_students(&self) -> DirectoryResult<Vec<User>> {
        Ok(self
            .users
            .filter(|u| u.is_active && u.is_student())
            .await?)
    }

    /// Register a new account
    ///
    /// # Errors
    ///
    /// * `InvalidUsername` - Username is empty
    /// * `UsernameTaken` - Another account has the same username ignoring case
    pub async fn create(&self, new_user: NewUser) -> DirectoryResult<User> {
        let username = new_user.username.trim().to_string();
        if username.is_empty() {
            return Err(DirectoryError::InvalidUsername);
        }

        let user = User {
            id: format!("user-{}", uuid::Uuid::new_v4()),
            username,
            password: new_user.password,
            role: new_user.role,
            firstname: new_user.firstname,
            lastname: new_user.lastname,
            email: new_user.email,
            is_active: new_user.is_active,
            created_at: Utc::now(),
            wallet_balance: new_user.wallet_balance.max(0),
        };

        self.users
            .modify(|users| {
                if users.iter().any(|u| u.has_username(&user.username)) {
                    return Err(DirectoryError::UsernameTaken(user.username.clone()));
                }
                users.push(user.clone());
                Ok(())
            })
            .await?;

        log::info!("Created {} account {}", user.role, user.username);
        Ok(user)
    }

    /// User by id
    pub async fn find(&self, id: &str) -> DirectoryResult<Option<User>> {
        Ok(self.users.find(id).await?)
    }

    /// User by username, ignoring case
    pub async fn find_by_username(&self, username: &str) -> DirectoryResult<Option<User>> {
        Ok(self
            .users
            .all()
            .await?
            .into_iter()
            .find(|u| u.has_username(username)))
    }

    /// User whose id or username equals `key`
    pub async fn find_by_id_or_username(&self, key: &str) -> DirectoryResult<Option<User>> {
        Ok(self
            .users
            .all()
            .await?
            .into_iter()
            .find(|u| u.id == key || u.has_username(key)))
    }

    /// Merge the provided fields into the user with `id`
    pub async fn update(&self, id: &str, changes: UserUpdate) -> DirectoryResult<User> {
        if changes
            .username
            .as_deref()
            .is_some_and(|name| name.trim().is_empty())
        {
            return Err(DirectoryError::InvalidUsername);
        }
        if let Some(balance) = changes.wallet_balance.filter(|b| *b < 0) {
            return Err(DirectoryError::InvalidAmount(balance));
        }

        let updated = self
            .users
            .modify(|users| {
                if let Some(username) = &changes.username {
                    if users.iter().any(|u| u.id != id && u.has_username(username)) {
                        return Err(DirectoryError::UsernameTaken(username.trim().to_string()));
                    }
                }

                match users.iter_mut().find(|u| u.id == id) {
                    Some(user) => {
                        changes.apply(user);
                        Ok(user.clone())
                    }
                    None => Err(DirectoryError::UserNotFound(id.to_string())),
                }
            })
            .await?;

        log::info!("Updated account {}", updated.username);
        Ok(updated)
    }

    /// Remove the user with `id`
    pub async fn delete(&self, id: &str) -> DirectoryResult<()> {
        if !self.users.remove(id).await? {
            return Err(DirectoryError::UserNotFound(id.to_string()));
        }
        log::info!("Deleted account {id}");
        Ok(())
    }

    /// Wallet balance, or 0 when the user is unknown
    pub async fn get_wallet(&self, username: &str) -> DirectoryResult<Money> {
        Ok(self
            .find_by_username(username)
            .await?
            .map(|u| u.wallet_balance)
            .unwrap_or(0))
    }

    /// Add `delta` to the wallet and return the new balance.
    ///
    /// The check and the write happen in one atomic update, so the balance
    /// never goes negative even under concurrent adjustments.
    ///
    /// # Errors
    ///
    /// * `UserNotFound` - No user with this username
    /// * `InsufficientBalance` - Balance would drop below zero (nothing changes)
    pub async fn adjust_wallet(&self, username: &str, delta: Money) -> DirectoryResult<Money> {
        let updated = self
            .users
            .update_where(
                |u: &User| u.has_username(username),
                |user| {
                    let next = user
                        .wallet_balance
                        .checked_add(delta)
                        .ok_or(DirectoryError::InvalidAmount(delta))?;
                    if next < 0 {
                        return Err(DirectoryError::InsufficientBalance {
                            available: user.wallet_balance,
                            required: delta.saturating_neg(),
                        });
                    }
                    user.wallet_balance = next;
                    Ok(())
                },
            )
            .await?
            .ok_or_else(|| DirectoryError::UserNotFound(username.to_string()))?;

        log::info!(
            "Wallet of {} adjusted by {delta}, balance {}",
            updated.username,
            updated.wallet_balance
        );
        Ok(updated.wallet_balance)
    }

    /// Overwrite the wallet balance
    pub async fn set_wallet(&self, username: &str, amount: Money) -> DirectoryResult<Money> {
        if amount < 0 {
            return Err(DirectoryError::InvalidAmount(amount));
        }

        let updated = self
            .users
            .update_where(
                |u: &User| u.has_username(username),
                |user| {
                    user.wallet_balance = amount;
                    Ok::<_, DirectoryError>(())
                },
            )
            .await?
            .ok_or_else(|| DirectoryError::UserNotFound(username.to_string()))?;

        log::info!("Wallet of {} set to {amount}", updated.username);
        Ok(updated.wallet_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Role;
    use crate::store::MemoryStore;

    fn directory() -> UserDirectory {
        UserDirectory::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_rejects_duplicates() {
        let users = directory();
        let alice = users
            .create(NewUser::new("alice", "pw", Role::Student))
            .await
            .unwrap();
        assert!(alice.id.starts_with("user-"));

        let dup = users.create(NewUser::new("ALICE", "x", Role::Admin)).await;
        assert!(matches!(dup, Err(DirectoryError::UsernameTaken(_))));

        let blank = users.create(NewUser::new("  ", "x", Role::Admin)).await;
        assert!(matches!(blank, Err(DirectoryError::InvalidUsername)));
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_id() {
        let users = directory();
        let result = users.update("user-missing", UserUpdate::default()).await;
        assert!(matches!(result, Err(DirectoryError::UserNotFound(_))));
        assert!(matches!(
            users.delete("user-missing").await,
            Err(DirectoryError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_rejects_taken_username() {
        let users = directory();
        users
            .create(NewUser::new("alice", "pw", Role::Student))
            .await
            .unwrap();
        let bob = users
            .create(NewUser::new("bob", "pw", Role::Student))
            .await
            .unwrap();

        let result = users
            .update(
                &bob.id,
                UserUpdate {
                    username: Some("Alice".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(DirectoryError::UsernameTaken(_))));

        // Renaming to itself with different case is fine
        let renamed = users
            .update(
                &bob.id,
                UserUpdate {
                    username: Some("Bob".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.username, "Bob");
    }

    #[tokio::test]
    async fn test_wallet_never_goes_negative() {
        let users = directory();
        users
            .create(NewUser::new("alice", "pw", Role::Student))
            .await
            .unwrap();

        assert_eq!(users.adjust_wallet("alice", 40).await.unwrap(), 40);
        let result = users.adjust_wallet("alice", -100).await;
        assert!(matches!(
            result,
            Err(DirectoryError::InsufficientBalance {
                available: 40,
                required: 100
            })
        ));
        assert_eq!(users.get_wallet("alice").await.unwrap(), 40);
    }

    #[tokio::test]
    async fn test_wallet_of_unknown_user() {
        let users = directory();
        assert_eq!(users.get_wallet("ghost").await.unwrap(), 0);
        assert!(matches!(
            users.adjust_wallet("ghost", 10).await,
            Err(DirectoryError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_set_wallet_rejects_negative() {
        let users = directory();
        users
            .create(NewUser::new("alice", "pw", Role::Student))
            .await
            .unwrap();
        assert!(matches!(
            users.set_wallet("alice", -1).await,
            Err(DirectoryError::InvalidAmount(-1))
        ));
        assert_eq!(users.set_wallet("alice", 900).await.unwrap(), 900);
    }

    #[tokio::test]
    async fn test_lookup_by_id_or_username() {
        let users = directory();
        let alice = users
            .create(NewUser::new("alice", "pw", Role::Student))
            .await
            .unwrap();
        assert!(users.find_by_id_or_username(&alice.id).await.unwrap().is_some());
        assert!(users.find_by_id_or_username("Alice").await.unwrap().is_some());
        assert!(users.find_by_id_or_username("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_active_students_excludes_staff_and_inactive() {
        let users = directory();
        users
            .create(NewUser::new("alice", "pw", Role::Student))
            .await
            .unwrap();
        users
            .create(NewUser::new("carol", "pw", Role::Student).inactive())
            .await
            .unwrap();
        users
            .create(NewUser::new("root", "pw", Role::Admin))
            .await
            .unwrap();

        let students = users.active_students().await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].username, "alice");
    }
}
